//! # Controller Module
//!
//! Flight input for the command loop.
//!
//! This module handles:
//! - The [`FlightAxesSource`] seam the command loop samples from
//! - Gamepad detection and stick reading (evdev on Linux, Windows.Gaming.Input
//!   on Windows)
//! - Applying deadzones and exponential curves

pub mod calibration;
#[cfg(target_os = "linux")]
pub mod gamepad;
#[cfg(windows)]
pub mod winrt_gamepad;

use async_trait::async_trait;

use crate::error::Result;

/// Normalized stick positions, sampled as one snapshot.
///
/// - `roll`: -1.0 full left, 1.0 full right
/// - `pitch`: -1.0 full backward, 1.0 full forward
/// - `yaw`: -1.0 full counter-clockwise, 1.0 full clockwise
/// - `thrust`: 0.0 no thrust, 1.0 full thrust
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlightAxes {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub thrust: f32,
}

impl FlightAxes {
    pub fn new(roll: f32, pitch: f32, yaw: f32, thrust: f32) -> Self {
        Self {
            roll,
            pitch,
            yaw,
            thrust,
        }
    }
}

/// Supplies flight axes to the command loop, once per iteration
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FlightAxesSource: Send {
    /// Current axes snapshot
    ///
    /// An error ends the command loop (e.g. the gamepad was unplugged).
    async fn sample(&mut self) -> Result<FlightAxes>;
}
