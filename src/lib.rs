//! # CRTP Commander Library
//!
//! Fly a Crazyflie over Bluetooth LE with a gamepad.
//!
//! This library provides the pieces for streaming CRTP commander setpoints
//! (roll, pitch, yaw, thrust) to a Crazyflie through its GATT CRTP service,
//! sampled from a gamepad in a continuous command loop.

pub mod commander;
pub mod config;
pub mod controller;
pub mod crtp;
pub mod error;
pub mod logging;
pub mod transport;
