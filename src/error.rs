//! # Error Types
//!
//! Custom error types for CRTP Commander using `thiserror`.
//!
//! Operational outcomes on the BLE link (device not paired, characteristic
//! missing, write not acknowledged) are reported as `bool` by the transport.
//! The variants below cover everything else, including misuse of the
//! transport and command loop state machines.

use thiserror::Error;

/// Main error type for CRTP Commander
#[derive(Debug, Error)]
pub enum CommanderError {
    /// CRTP protocol errors
    #[error("CRTP protocol error: {0}")]
    CrtpProtocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Controller errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No supported gamepad found
    #[error("No gamepad found")]
    ControllerNotFound,

    /// Errors reported by the Bluetooth LE stack
    #[error("Bluetooth LE error: {0}")]
    Ble(String),

    /// `send` called on a transport that is not connected
    #[error("CRTP transport is not connected")]
    NotConnected,

    /// Payload does not fit the basic CRTP characteristic
    #[error("payload of {len} bytes exceeds the {max} byte characteristic limit")]
    PayloadTooLarge { len: usize, max: usize },

    /// `start` called while the command loop is already running
    #[error("command loop is already running")]
    AlreadyRunning,
}

/// Result type alias for CRTP Commander
pub type Result<T> = std::result::Result<T, CommanderError>;

#[cfg(windows)]
impl From<windows::core::Error> for CommanderError {
    fn from(err: windows::core::Error) -> Self {
        CommanderError::Ble(err.message())
    }
}
