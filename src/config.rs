//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and field is optional; anything missing falls back to the
//! defaults below.
//!
//! ```toml
//! [scaling]
//! max_pitch_roll_rate = 30.0   # degrees at full stick
//! max_yaw_rate = 200.0         # degrees per second at full stick
//! max_thrust_percent = 0.8     # fraction of full thrust at full stick
//!
//! [controller]
//! device_path = ""             # empty = auto-detect DualSense
//! deadzone_stick = 0.05
//!
//! [logging]
//! level = "info"
//! file_logging_enabled = false
//! ```

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{CommanderError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scaling: ScalingConfig,
    pub controller: ControllerConfig,
    pub logging: LoggingConfig,
}

/// Setpoint scaling applied to normalized stick input
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ScalingConfig {
    /// Roll/pitch angle at full deflection, in degrees
    #[serde(default = "default_max_pitch_roll_rate")]
    pub max_pitch_roll_rate: f32,

    /// Yaw rate at full deflection, in degrees per second
    #[serde(default = "default_max_yaw_rate")]
    pub max_yaw_rate: f32,

    /// Thrust fraction at full deflection (0.0 to 1.0)
    #[serde(default = "default_max_thrust_percent")]
    pub max_thrust_percent: f32,
}

/// Gamepad configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ControllerConfig {
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone_stick")]
    pub deadzone_stick: f32,

    #[serde(default = "default_expo_roll")]
    pub expo_roll: f32,

    #[serde(default = "default_expo_pitch")]
    pub expo_pitch: f32,

    #[serde(default = "default_expo_yaw")]
    pub expo_yaw: f32,

    #[serde(default = "default_expo_thrust")]
    pub expo_thrust: f32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub file_logging_enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_file_name_prefix")]
    pub file_name_prefix: String,

    /// How often `fly` reports the packet count
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
}

// Default value functions
fn default_max_pitch_roll_rate() -> f32 { 30.0 }
fn default_max_yaw_rate() -> f32 { 200.0 }
fn default_max_thrust_percent() -> f32 { 0.8 }

fn default_deadzone_stick() -> f32 { 0.05 }
fn default_expo_roll() -> f32 { 0.0 }
fn default_expo_pitch() -> f32 { 0.0 }
fn default_expo_yaw() -> f32 { 0.0 }
fn default_expo_thrust() -> f32 { 0.0 }

fn default_log_level() -> String { "info".to_string() }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_file_name_prefix() -> String { "crtp-commander.log".to_string() }
fn default_status_interval_ms() -> u64 { 1000 }

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            max_pitch_roll_rate: default_max_pitch_roll_rate(),
            max_yaw_rate: default_max_yaw_rate(),
            max_thrust_percent: default_max_thrust_percent(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            deadzone_stick: default_deadzone_stick(),
            expo_roll: default_expo_roll(),
            expo_pitch: default_expo_pitch(),
            expo_yaw: default_expo_yaw(),
            expo_thrust: default_expo_thrust(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_logging_enabled: false,
            log_dir: default_log_dir(),
            file_name_prefix: default_file_name_prefix(),
            status_interval_ms: default_status_interval_ms(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> CommanderError {
    CommanderError::Config(toml::de::Error::custom(msg))
}

impl ScalingConfig {
    /// Validate scaling multipliers
    ///
    /// # Errors
    ///
    /// Returns error if any multiplier is non-finite or outside its range:
    /// - `max_pitch_roll_rate`: (0, 90]
    /// - `max_yaw_rate`: (0, 720]
    /// - `max_thrust_percent`: (0, 1]
    pub fn validate(&self) -> Result<()> {
        for (name, value, max) in [
            ("max_pitch_roll_rate", self.max_pitch_roll_rate, 90.0),
            ("max_yaw_rate", self.max_yaw_rate, 720.0),
            ("max_thrust_percent", self.max_thrust_percent, 1.0),
        ] {
            if !value.is_finite() || value <= 0.0 || value > max {
                return Err(invalid(format!("{} must be greater than 0 and at most {}", name, max)));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crtp_commander::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.scaling.validate()?;

        if !(0.0..=0.25).contains(&self.controller.deadzone_stick) {
            return Err(invalid("deadzone_stick must be between 0.0 and 0.25"));
        }

        for (name, value) in [
            ("expo_roll", self.controller.expo_roll),
            ("expo_pitch", self.controller.expo_pitch),
            ("expo_yaw", self.controller.expo_yaw),
            ("expo_thrust", self.controller.expo_thrust),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{} must be between 0.0 and 1.0", name)));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        if self.logging.file_logging_enabled
            && (self.logging.log_dir.is_empty() || self.logging.file_name_prefix.is_empty())
        {
            return Err(invalid(
                "log_dir and file_name_prefix cannot be empty when file logging is enabled",
            ));
        }

        if self.logging.status_interval_ms == 0 || self.logging.status_interval_ms > 60000 {
            return Err(invalid("status_interval_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_max_pitch_roll_rate(), 30.0);
        assert_eq!(default_max_yaw_rate(), 200.0);
        assert_eq!(default_max_thrust_percent(), 0.8);
        assert_eq!(default_deadzone_stick(), 0.05);
        assert_eq!(default_log_level(), "info");
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_status_interval_ms(), 1000);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_section_uses_field_defaults() {
        let config = Config::from_toml(
            r#"
[scaling]
max_yaw_rate = 120.0
"#,
        )
        .unwrap();

        assert_eq!(config.scaling.max_yaw_rate, 120.0);
        assert_eq!(config.scaling.max_pitch_roll_rate, 30.0);
        assert_eq!(config.scaling.max_thrust_percent, 0.8);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[scaling]
max_pitch_roll_rate = 20.0
max_yaw_rate = 150.0
max_thrust_percent = 0.6

[controller]
device_path = "/dev/input/event7"
expo_roll = 0.3

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.scaling.max_pitch_roll_rate, 20.0);
        assert_eq!(config.scaling.max_thrust_percent, 0.6);
        assert_eq!(config.controller.device_path, "/dev/input/event7");
        assert_eq!(config.controller.expo_roll, 0.3);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/crtp-commander.toml");
        assert!(matches!(result, Err(CommanderError::Io(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("[scaling\nmax_yaw_rate = ");
        assert!(matches!(result, Err(CommanderError::Config(_))));
    }

    #[test]
    fn test_wrong_type() {
        let result = Config::from_toml("[scaling]\nmax_yaw_rate = \"fast\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_thrust_percent_bounds() {
        let mut config = Config::default();
        config.scaling.max_thrust_percent = 1.0;
        assert!(config.validate().is_ok());

        config.scaling.max_thrust_percent = 1.01;
        assert!(config.validate().is_err());

        config.scaling.max_thrust_percent = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pitch_roll_rate_bounds() {
        let mut config = Config::default();
        config.scaling.max_pitch_roll_rate = 90.0;
        assert!(config.validate().is_ok());

        config.scaling.max_pitch_roll_rate = 90.5;
        assert!(config.validate().is_err());

        config.scaling.max_pitch_roll_rate = -10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaw_rate_bounds() {
        let mut config = Config::default();
        config.scaling.max_yaw_rate = 721.0;
        assert!(config.validate().is_err());

        config.scaling.max_yaw_rate = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_stick_out_of_range() {
        let mut config = Config::default();
        config.controller.deadzone_stick = 0.3;
        assert!(config.validate().is_err());

        config.controller.deadzone_stick = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expo_out_of_range() {
        let mut config = Config::default();
        config.controller.expo_pitch = 1.1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.controller.expo_thrust = -0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_level() {
        let mut config = Config::default();
        config.logging.level = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_file_logging_enabled() {
        let mut config = Config::default();
        config.logging.file_logging_enabled = true;
        config.logging.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_file_logging_disabled() {
        let mut config = Config::default();
        config.logging.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_status_interval_bounds() {
        let mut config = Config::default();
        config.logging.status_interval_ms = 0;
        assert!(config.validate().is_err());

        config.logging.status_interval_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_default_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }
}
