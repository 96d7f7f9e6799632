//! # CRTP Protocol Module
//!
//! Implementation of the commander part of the Crazy RealTime Protocol (CRTP).
//!
//! This module handles:
//! - Commander packet encoding (roll, pitch, yaw, thrust)
//! - Commander packet decoding
//! - Header layout and GATT service/characteristic identifiers

pub mod protocol;
pub mod encoder;
pub mod decoder;
