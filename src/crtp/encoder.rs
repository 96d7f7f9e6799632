//! # CRTP Packet Encoder
//!
//! Encodes commander setpoints into CRTP commander packets.

use bytes::BufMut;

use super::protocol::*;

/// Encode a roll/pitch/yaw/thrust setpoint into a commander packet
///
/// All multi-byte fields are written little-endian regardless of the host
/// byte order.
///
/// # Arguments
///
/// * `roll` - Roll angle in degrees
/// * `pitch` - Pitch angle in degrees
/// * `yaw` - Yaw rate in degrees per second
/// * `thrust` - Raw 16-bit thrust
///
/// # Returns
///
/// * `[u8; 15]` - Complete packet (header + roll + pitch + yaw + thrust)
///
/// # Examples
///
/// ```
/// use crtp_commander::crtp::encoder::encode_commander_packet;
///
/// let packet = encode_commander_packet(1.0, 0.0, 0.0, 0);
/// assert_eq!(packet[0], 0x30);
/// assert_eq!(&packet[1..5], &[0x00, 0x00, 0x80, 0x3F]);
/// ```
pub fn encode_commander_packet(
    roll: f32,
    pitch: f32,
    yaw: f32,
    thrust: u16,
) -> [u8; CRTP_COMMANDER_PACKET_SIZE] {
    let mut packet = [0u8; CRTP_COMMANDER_PACKET_SIZE];
    let mut buf = &mut packet[..];

    buf.put_u8(CRTP_COMMANDER_HEADER);
    buf.put_f32_le(roll);
    buf.put_f32_le(pitch);
    buf.put_f32_le(yaw);
    buf.put_u16_le(thrust);

    packet
}

/// Encode a [`FlightSetpoint`] into a commander packet
pub fn encode_setpoint(setpoint: &FlightSetpoint) -> [u8; CRTP_COMMANDER_PACKET_SIZE] {
    encode_commander_packet(setpoint.roll, setpoint.pitch, setpoint.yaw, setpoint.thrust)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_commander_packet_length() {
        let packet = encode_commander_packet(0.0, 0.0, 0.0, 0);
        assert_eq!(packet.len(), 15);
    }

    #[test]
    fn test_header_is_constant() {
        for (roll, pitch, yaw, thrust) in [
            (0.0, 0.0, 0.0, 0),
            (-30.0, 30.0, 200.0, u16::MAX),
            (f32::MAX, f32::MIN, f32::NAN, 12345),
        ] {
            let packet = encode_commander_packet(roll, pitch, yaw, thrust);
            assert_eq!(packet[0], CRTP_COMMANDER_HEADER);
        }
    }

    #[test]
    fn test_roll_one_is_little_endian() {
        let packet = encode_commander_packet(1.0, 0.0, 0.0, 0);
        assert_eq!(&packet[1..5], &[0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn test_field_offsets() {
        let packet = encode_commander_packet(1.0, -2.0, 0.5, 0xABCD);

        assert_eq!(&packet[1..5], &1.0f32.to_le_bytes());
        assert_eq!(&packet[5..9], &(-2.0f32).to_le_bytes());
        assert_eq!(&packet[9..13], &0.5f32.to_le_bytes());
        // Thrust low byte first
        assert_eq!(&packet[13..15], &[0xCD, 0xAB]);
    }

    #[test]
    fn test_all_zero_setpoint() {
        let packet = encode_setpoint(&FlightSetpoint::ZERO);

        let mut expected = [0u8; 15];
        expected[0] = 0x30;
        assert_eq!(packet, expected);
    }

    #[test]
    fn test_encode_setpoint_matches_fields() {
        let setpoint = FlightSetpoint {
            roll: 12.5,
            pitch: -7.25,
            yaw: 180.0,
            thrust: 52429,
        };

        assert_eq!(
            encode_setpoint(&setpoint),
            encode_commander_packet(12.5, -7.25, 180.0, 52429)
        );
    }
}
