//! Gamepad input on Windows via `Windows.Gaming.Input`.
//!
//! Uses the same two-stick layout as the evdev source on Linux: right stick
//! for roll/pitch, left X for yaw, left Y up-deflection for thrust.
//! Thumbstick readings are already -1.0..=1.0 with Y positive up.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use windows::Gaming::Input::Gamepad;

use super::calibration::AxisCalibration;
use super::{FlightAxes, FlightAxesSource};
use crate::config::ControllerConfig;
use crate::error::{CommanderError, Result};

/// Gamepads show up a short while after process start
const DETECT_ATTEMPTS: u32 = 10;
const DETECT_INTERVAL: Duration = Duration::from_millis(100);

/// Map thumbstick readings to calibrated flight axes
pub fn axes_from_thumbsticks(
    left_x: f64,
    left_y: f64,
    right_x: f64,
    right_y: f64,
    calibration: &AxisCalibration,
) -> FlightAxes {
    let unit = |value: f64| (value as f32).clamp(-1.0, 1.0);

    FlightAxes {
        roll: calibration.roll.apply(unit(right_x)),
        pitch: calibration.pitch.apply(unit(right_y)),
        yaw: calibration.yaw.apply(unit(left_x)),
        thrust: calibration.thrust.apply(unit(left_y).max(0.0)).max(0.0),
    }
}

/// First connected gamepad, polled on every `sample`
pub struct WinRtGamepadSource {
    gamepad: Gamepad,
    calibration: AxisCalibration,
}

impl std::fmt::Debug for WinRtGamepadSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinRtGamepadSource").finish_non_exhaustive()
    }
}

impl WinRtGamepadSource {
    /// Wait briefly for a gamepad and use the first one found
    ///
    /// `device_path` has no meaning here and is ignored.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no gamepad appeared within about a second
    /// - `Ble`: the WinRT call itself failed
    pub fn open(config: &ControllerConfig) -> Result<Self> {
        for attempt in 0..DETECT_ATTEMPTS {
            let gamepads = Gamepad::Gamepads()?;
            if gamepads.Size()? > 0 {
                info!("Using gamepad 0 of {}", gamepads.Size()?);
                return Ok(Self {
                    gamepad: gamepads.GetAt(0)?,
                    calibration: AxisCalibration::from_config(config),
                });
            }
            debug!("No gamepad yet (attempt {})", attempt + 1);
            std::thread::sleep(DETECT_INTERVAL);
        }

        Err(CommanderError::ControllerNotFound)
    }
}

#[async_trait]
impl FlightAxesSource for WinRtGamepadSource {
    async fn sample(&mut self) -> Result<FlightAxes> {
        let reading = self.gamepad.GetCurrentReading().map_err(|e| {
            CommanderError::Controller(format!("Gamepad read failed: {}", e.message()))
        })?;

        Ok(axes_from_thumbsticks(
            reading.LeftThumbstickX,
            reading.LeftThumbstickY,
            reading.RightThumbstickX,
            reading.RightThumbstickY,
            &self.calibration,
        ))
    }
}
