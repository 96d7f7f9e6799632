//! # Gamepad Module
//!
//! Reads two analog sticks from a Linux evdev gamepad and turns them into
//! [`FlightAxes`].
//!
//! ## Controller Detection
//!
//! Without an explicit device path, the first PS5 DualSense is used:
//! - Vendor ID: 0x054c (Sony)
//! - Product ID: 0x0ce6 (DualSense, both wired and Bluetooth)
//!
//! ## Stick Assignments
//!
//! | Axis | evdev Code | Flight axis |
//! |------|------------|-------------|
//! | Left Stick X | ABS_X | Yaw |
//! | Left Stick Y | ABS_Y | Thrust (up deflection only) |
//! | Right Stick X | ABS_Z | Roll |
//! | Right Stick Y | ABS_RZ | Pitch |
//!
//! Raw stick values are 0-255 with 128 at center; Y axes read 0 at full up.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use evdev::{AbsoluteAxisType, Device, InputEvent, InputEventKind};
use tracing::{debug, info, warn};

use super::calibration::AxisCalibration;
use super::{FlightAxes, FlightAxesSource};
use crate::config::ControllerConfig;
use crate::error::{CommanderError, Result};

/// PS5 DualSense vendor ID (Sony)
const DUALSENSE_VENDOR_ID: u16 = 0x054c;

/// PS5 DualSense product ID (wired and Bluetooth)
const DUALSENSE_PRODUCT_ID: u16 = 0x0ce6;

/// Raw axis minimum.
pub const AXIS_MIN: i32 = 0;
/// Raw axis maximum.
pub const AXIS_MAX: i32 = 255;
/// Raw axis center value.
pub const AXIS_CENTER: i32 = 128;

/// Raw positions of both sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickState {
    pub left_x: i32,
    pub left_y: i32,
    pub right_x: i32,
    pub right_y: i32,
}

impl Default for StickState {
    fn default() -> Self {
        Self {
            left_x: AXIS_CENTER,
            left_y: AXIS_CENTER,
            right_x: AXIS_CENTER,
            right_y: AXIS_CENTER,
        }
    }
}

impl StickState {
    /// Updates the stick positions from one evdev event.
    ///
    /// Non-stick events (buttons, triggers, motion sensors, sync) are ignored.
    pub fn apply_event(&mut self, event: &InputEvent) {
        if let InputEventKind::AbsAxis(axis) = event.kind() {
            match axis {
                AbsoluteAxisType::ABS_X => self.left_x = event.value(),
                AbsoluteAxisType::ABS_Y => self.left_y = event.value(),
                // DualSense reports the right stick on ABS_Z / ABS_RZ
                AbsoluteAxisType::ABS_Z => self.right_x = event.value(),
                AbsoluteAxisType::ABS_RZ => self.right_y = event.value(),
                _ => {}
            }
        }
    }

    /// Converts raw stick positions to calibrated flight axes.
    #[must_use]
    pub fn to_axes(&self, calibration: &AxisCalibration) -> FlightAxes {
        // Stick at center means zero thrust; only pushing up adds thrust
        let thrust_raw = (-normalize(self.left_y)).max(0.0);

        FlightAxes {
            roll: calibration.roll.apply(normalize(self.right_x)),
            pitch: calibration.pitch.apply(-normalize(self.right_y)),
            yaw: calibration.yaw.apply(normalize(self.left_x)),
            thrust: calibration.thrust.apply(thrust_raw).max(0.0),
        }
    }
}

/// Maps a raw 0-255 axis to -1.0..=1.0 around the 128 center.
#[inline]
fn normalize(value: i32) -> f32 {
    let centered = value.clamp(AXIS_MIN, AXIS_MAX) - AXIS_CENTER;
    (centered as f32 / (AXIS_MAX - AXIS_CENTER) as f32).clamp(-1.0, 1.0)
}

/// Gamepad-backed [`FlightAxesSource`]
///
/// A dedicated thread blocks on evdev and keeps the latest [`StickState`];
/// `sample` only copies that snapshot.
pub struct GamepadSource {
    sticks: Arc<Mutex<StickState>>,
    connected: Arc<AtomicBool>,
    calibration: AxisCalibration,
    device_path: String,
}

impl std::fmt::Debug for GamepadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadSource")
            .field("device_path", &self.device_path)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl GamepadSource {
    /// Open the gamepad named in the config, or auto-detect a DualSense
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no DualSense found during auto-detection
    /// - `Controller`: the configured device could not be opened
    /// - `Io`: the reader thread could not be spawned
    pub fn open(config: &ControllerConfig) -> Result<Self> {
        let (device, device_path) = if config.device_path.is_empty() {
            find_dualsense()?
        } else {
            let device = Device::open(&config.device_path).map_err(|e| {
                CommanderError::Controller(format!("Failed to open {}: {}", config.device_path, e))
            })?;
            (device, config.device_path.clone())
        };

        info!(
            "Using gamepad {} at {}",
            device.name().unwrap_or("<unnamed>"),
            device_path
        );

        Self::spawn_reader(device, device_path, AxisCalibration::from_config(config))
    }

    fn spawn_reader(
        mut device: Device,
        device_path: String,
        calibration: AxisCalibration,
    ) -> Result<Self> {
        let sticks = Arc::new(Mutex::new(StickState::default()));
        let connected = Arc::new(AtomicBool::new(true));

        let thread_sticks = Arc::clone(&sticks);
        let thread_connected = Arc::clone(&connected);
        let thread_path = device_path.clone();

        std::thread::Builder::new()
            .name("gamepad-reader".to_string())
            .spawn(move || loop {
                match device.fetch_events() {
                    Ok(events) => {
                        let events: Vec<InputEvent> = events.collect();
                        if let Ok(mut state) = thread_sticks.lock() {
                            for event in &events {
                                state.apply_event(event);
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Gamepad {} stopped delivering events: {}", thread_path, e);
                        thread_connected.store(false, Ordering::Release);
                        break;
                    }
                }
            })?;

        Ok(Self {
            sticks,
            connected,
            calibration,
            device_path,
        })
    }

    /// Path of the evdev node in use
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl FlightAxesSource for GamepadSource {
    async fn sample(&mut self) -> Result<FlightAxes> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(CommanderError::Controller(format!(
                "Gamepad {} disconnected",
                self.device_path
            )));
        }

        let sticks = *self
            .sticks
            .lock()
            .map_err(|_| CommanderError::Controller("Gamepad state poisoned".to_string()))?;

        Ok(sticks.to_axes(&self.calibration))
    }
}

/// Scan `/dev/input/event*` for the first DualSense
fn find_dualsense() -> Result<(Device, String)> {
    let input_dir = Path::new("/dev/input");
    if !input_dir.exists() {
        return Err(CommanderError::Controller(
            "/dev/input directory not found".to_string(),
        ));
    }

    let mut paths: Vec<_> = std::fs::read_dir(input_dir)
        .map_err(|e| CommanderError::Controller(format!("Failed to read /dev/input: {}", e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false)
        })
        .collect();

    // Deterministic choice when several gamepads are plugged in
    paths.sort();

    for path in paths {
        match Device::open(&path) {
            Ok(device) => {
                let id = device.input_id();
                debug!(
                    "Found input device: {} (vendor: 0x{:04x}, product: 0x{:04x})",
                    path.display(),
                    id.vendor(),
                    id.product()
                );
                if id.vendor() == DUALSENSE_VENDOR_ID && id.product() == DUALSENSE_PRODUCT_ID {
                    return Ok((device, path.to_string_lossy().to_string()));
                }
            }
            Err(e) => debug!("Could not open {}: {}", path.display(), e),
        }
    }

    Err(CommanderError::ControllerNotFound)
}
