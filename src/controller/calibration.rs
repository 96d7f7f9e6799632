//! # Calibration Module
//!
//! Applies deadzones and exponential curves to normalized stick inputs.
//!
//! ## Deadzone
//!
//! Small deflections around center are reported as exactly 0.0 so a resting
//! stick never produces roll/pitch/yaw drift. Beyond the deadzone the
//! remaining travel is rescaled to the full range.
//!
//! ## Exponential Curves
//!
//! `output = (1 - expo) * input + expo * input³`
//!
//! - `expo = 0.0`: Linear response
//! - `expo = 0.3`: Softer around center, full deflection unchanged
//!
//! ## Usage
//!
//! ```
//! use crtp_commander::controller::calibration::Calibration;
//!
//! let cal = Calibration::new(0.05, 0.3);
//! assert_eq!(cal.apply(0.02), 0.0);
//! assert!((cal.apply(1.0) - 1.0).abs() < 0.001);
//! ```

use crate::config::ControllerConfig;

/// Deadzone and expo for one axis.
///
/// Input and output are in the range -1.0 to 1.0, where 0.0 is center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    deadzone: f32,
    expo: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self::linear()
    }
}

impl Calibration {
    /// Creates a calibration, clamping deadzone to 0.0..=0.25 and expo to 0.0..=1.0.
    #[must_use]
    pub fn new(deadzone: f32, expo: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 0.25),
            expo: expo.clamp(0.0, 1.0),
        }
    }

    /// No deadzone, no expo.
    #[must_use]
    pub fn linear() -> Self {
        Self {
            deadzone: 0.0,
            expo: 0.0,
        }
    }

    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    #[must_use]
    pub fn expo(&self) -> f32 {
        self.expo
    }

    /// Applies deadzone then expo, preserving the sign of the input.
    ///
    /// Inputs outside -1.0..=1.0 are clamped first.
    #[must_use]
    pub fn apply(&self, input: f32) -> f32 {
        let clamped = input.clamp(-1.0, 1.0);
        let magnitude = self.shape(self.cut_deadzone(clamped.abs()));
        magnitude.copysign(clamped)
    }

    #[inline]
    fn cut_deadzone(&self, magnitude: f32) -> f32 {
        if magnitude <= self.deadzone {
            0.0
        } else {
            (magnitude - self.deadzone) / (1.0 - self.deadzone)
        }
    }

    #[inline]
    fn shape(&self, magnitude: f32) -> f32 {
        if self.expo == 0.0 {
            magnitude
        } else {
            (1.0 - self.expo) * magnitude + self.expo * magnitude * magnitude * magnitude
        }
    }
}

/// Calibration for the four flight axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCalibration {
    pub roll: Calibration,
    pub pitch: Calibration,
    pub yaw: Calibration,
    pub thrust: Calibration,
}

impl Default for AxisCalibration {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}

impl AxisCalibration {
    /// Builds per-axis calibration from the `[controller]` config section.
    ///
    /// All sticks share the stick deadzone; each axis has its own expo.
    #[must_use]
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            roll: Calibration::new(config.deadzone_stick, config.expo_roll),
            pitch: Calibration::new(config.deadzone_stick, config.expo_pitch),
            yaw: Calibration::new(config.deadzone_stick, config.expo_yaw),
            thrust: Calibration::new(config.deadzone_stick, config.expo_thrust),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_linear_is_identity() {
        let cal = Calibration::linear();
        for input in [-1.0, -0.5, 0.0, 0.25, 1.0] {
            assert!(approx(cal.apply(input), input));
        }
    }

    #[test]
    fn test_deadzone_zeroes_small_inputs() {
        let cal = Calibration::new(0.1, 0.0);
        assert_eq!(cal.apply(0.05), 0.0);
        assert_eq!(cal.apply(-0.1), 0.0);
        assert!(cal.apply(0.11) > 0.0);
    }

    #[test]
    fn test_deadzone_rescales_remaining_range() {
        let cal = Calibration::new(0.2, 0.0);
        // Halfway between deadzone edge and full deflection
        assert!(approx(cal.apply(0.6), 0.5));
        assert!(approx(cal.apply(-0.6), -0.5));
        assert!(approx(cal.apply(1.0), 1.0));
    }

    #[test]
    fn test_expo_softens_center_keeps_endpoints() {
        let cal = Calibration::new(0.0, 0.5);
        // 0.5 * 0.5 + 0.5 * 0.125 = 0.3125
        assert!(approx(cal.apply(0.5), 0.3125));
        assert!(approx(cal.apply(1.0), 1.0));
        assert!(approx(cal.apply(-1.0), -1.0));
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let cal = Calibration::new(0.05, 0.3);
        assert!(approx(cal.apply(3.0), 1.0));
        assert!(approx(cal.apply(-3.0), -1.0));
    }

    #[test]
    fn test_new_clamps_parameters() {
        let cal = Calibration::new(0.9, 2.0);
        assert_eq!(cal.deadzone(), 0.25);
        assert_eq!(cal.expo(), 1.0);

        let cal = Calibration::new(-1.0, -1.0);
        assert_eq!(cal.deadzone(), 0.0);
        assert_eq!(cal.expo(), 0.0);
    }

    #[test]
    fn test_axis_calibration_from_config() {
        let config = ControllerConfig {
            device_path: String::new(),
            deadzone_stick: 0.1,
            expo_roll: 0.1,
            expo_pitch: 0.2,
            expo_yaw: 0.3,
            expo_thrust: 0.0,
        };
        let cal = AxisCalibration::from_config(&config);

        assert_eq!(cal.roll, Calibration::new(0.1, 0.1));
        assert_eq!(cal.pitch, Calibration::new(0.1, 0.2));
        assert_eq!(cal.yaw, Calibration::new(0.1, 0.3));
        assert_eq!(cal.thrust, Calibration::new(0.1, 0.0));
    }
}
