//! # CRTP Packet Decoder
//!
//! Decodes commander packets back into setpoints.

use bytes::Buf;

use super::protocol::*;
use crate::error::{CommanderError, Result};

/// Decode a commander packet
///
/// # Arguments
///
/// * `packet` - Complete packet bytes (header + roll + pitch + yaw + thrust)
///
/// # Returns
///
/// * `Result<FlightSetpoint>` - Decoded setpoint, or error if invalid
///
/// # Errors
///
/// Returns error if:
/// - Packet is not exactly 15 bytes
/// - Header is not the commander header (0x30)
pub fn decode_commander_packet(packet: &[u8]) -> Result<FlightSetpoint> {
    if packet.len() != CRTP_COMMANDER_PACKET_SIZE {
        return Err(CommanderError::CrtpProtocol(format!(
            "Invalid commander packet length: expected {} bytes, got {}",
            CRTP_COMMANDER_PACKET_SIZE,
            packet.len()
        )));
    }

    let mut buf = packet;
    let header = buf.get_u8();
    if header != CRTP_COMMANDER_HEADER {
        return Err(CommanderError::CrtpProtocol(format!(
            "Invalid commander header: 0x{:02X}",
            header
        )));
    }

    Ok(FlightSetpoint {
        roll: buf.get_f32_le(),
        pitch: buf.get_f32_le(),
        yaw: buf.get_f32_le(),
        thrust: buf.get_u16_le(),
    })
}
