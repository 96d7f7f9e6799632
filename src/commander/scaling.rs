//! Setpoint scaling: normalized stick axes to commander units.

use crate::config::ScalingConfig;
use crate::controller::FlightAxes;
use crate::crtp::protocol::{FlightSetpoint, CRTP_THRUST_SCALE};

impl ScalingConfig {
    /// Scale normalized axes into a wire-ready setpoint
    ///
    /// Roll/pitch/yaw are clamped to -1.0..=1.0 and thrust to 0.0..=1.0
    /// before scaling. Thrust is `round(thrust * max_thrust_percent * 65536)`,
    /// saturated at `u16::MAX`.
    ///
    /// # Examples
    ///
    /// ```
    /// use crtp_commander::config::ScalingConfig;
    /// use crtp_commander::controller::FlightAxes;
    ///
    /// let scaling = ScalingConfig::default();
    /// let setpoint = scaling.apply(&FlightAxes::new(0.5, 0.0, -1.0, 1.0));
    ///
    /// assert_eq!(setpoint.roll, 15.0);
    /// assert_eq!(setpoint.yaw, -200.0);
    /// assert_eq!(setpoint.thrust, 52429);
    /// ```
    #[must_use]
    pub fn apply(&self, axes: &FlightAxes) -> FlightSetpoint {
        FlightSetpoint {
            roll: clamp_unit(axes.roll) * self.max_pitch_roll_rate,
            pitch: clamp_unit(axes.pitch) * self.max_pitch_roll_rate,
            yaw: clamp_unit(axes.yaw) * self.max_yaw_rate,
            thrust: self.scale_thrust(axes.thrust),
        }
    }

    fn scale_thrust(&self, thrust: f32) -> u16 {
        let fraction = if thrust.is_nan() { 0.0 } else { thrust.clamp(0.0, 1.0) };
        let raw = (fraction as f64 * self.max_thrust_percent as f64 * CRTP_THRUST_SCALE).round();
        // `as` saturates, so full thrust at 100% lands on u16::MAX
        raw as u16
    }
}

#[inline]
fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}
