//! # CRTP Protocol Constants and Types
//!
//! Core protocol definitions for the CRTP commander port and the CRTP GATT
//! service exposed by the Crazyflie over Bluetooth LE.

/// CRTP port carrying roll/pitch/yaw/thrust setpoints
pub const CRTP_PORT_COMMANDER: u8 = 3;

/// Commander channel used for RPYT setpoints
pub const CRTP_CHANNEL_COMMANDER: u8 = 0;

/// Link bits are always zero on the BLE transport
pub const CRTP_LINK: u8 = 0;

/// Commander packet header (port 3, link 0, channel 0)
pub const CRTP_COMMANDER_HEADER: u8 = 0x30;

/// Commander packet size: header(1) + roll(4) + pitch(4) + yaw(4) + thrust(2)
pub const CRTP_COMMANDER_PACKET_SIZE: usize = 15;

/// Largest payload the basic CRTP characteristic accepts in a single write
pub const CRTP_BASIC_MAX_PAYLOAD: usize = 20;

/// Full-scale thrust multiplier (thrust fraction 1.0 maps here before saturation)
pub const CRTP_THRUST_SCALE: f64 = 65536.0;

/// CRTP GATT service
pub const CRTP_SERVICE_UUID: u128 = 0x00000201_1c7f_4f9e_947b_43b7c00a9a08;

/// Basic characteristic, read/write for payloads of at most 20 bytes
pub const CRTP_CHAR_UUID: u128 = 0x00000202_1c7f_4f9e_947b_43b7c00a9a08;

/// Up characteristic, outbound payloads larger than 20 bytes
pub const CRTP_UP_CHAR_UUID: u128 = 0x00000203_1c7f_4f9e_947b_43b7c00a9a08;

/// Down characteristic, inbound payloads larger than 20 bytes
pub const CRTP_DOWN_CHAR_UUID: u128 = 0x00000204_1c7f_4f9e_947b_43b7c00a9a08;

/// Build a CRTP header byte from a port and channel
///
/// Layout is `pppp llcc`: port in the high nibble, link bits, channel in the
/// two low bits.
///
/// # Examples
///
/// ```
/// use crtp_commander::crtp::protocol::{crtp_header, CRTP_COMMANDER_HEADER};
///
/// assert_eq!(crtp_header(3, 0), CRTP_COMMANDER_HEADER);
/// ```
pub const fn crtp_header(port: u8, channel: u8) -> u8 {
    ((port & 0x0F) << 4) | ((CRTP_LINK & 0x03) << 2) | (channel & 0x03)
}

/// Format a 128-bit UUID in the canonical 8-4-4-4-12 form
pub fn format_uuid(uuid: u128) -> String {
    let hex = format!("{:032x}", uuid);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Wire-ready commander setpoint
///
/// Roll and pitch are in degrees, yaw is a rate in degrees per second and
/// thrust is the raw 16-bit motor command.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FlightSetpoint {
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub thrust: u16,
}

impl FlightSetpoint {
    /// All axes at zero; also unlocks thrust on the firmware side
    pub const ZERO: FlightSetpoint = FlightSetpoint {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        thrust: 0,
    };
}
