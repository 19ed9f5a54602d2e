// Controller-independent motor interface
//
// Velocity and position setpoints are in feet/sec and feet at the output shaft. Percent voltage
// setpoints are fractions of the 12 V nominal battery in [-1, 1].

use serde::Serialize;
use tracing::warn;

use super::error::{MotorError, Result};
use super::feed_forward::FeedForward;
use super::follower::Follower;
use super::gear::GearSet;
use super::units::UnitConversion;
use crate::config::NOMINAL_BATTERY_VOLTAGE;
use crate::messages::MotorTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Disabled,
    PercentVoltage,
    Velocity,
    Position,
}

/// A motor controller with gear-dependent closed-loop settings
pub trait SmartMotor {
    fn name(&self) -> &str;

    /// CAN id
    fn port(&self) -> u8;

    fn gears(&self) -> &GearSet;

    fn units(&self) -> &UnitConversion;

    fn followers(&self) -> &[Box<dyn Follower>];

    fn control_mode(&self) -> ControlMode;

    /// Last commanded setpoint in the units of the current mode
    fn setpoint(&self) -> f64;

    /// Last commanded setpoint in controller-native units
    fn native_setpoint(&self) -> f64;

    fn disable(&mut self) -> Result<()>;

    /// Clipped to [-1, 1]
    fn set_percent_voltage(&mut self, percent_voltage: f64) -> Result<()>;

    fn set_voltage(&mut self, volts: f64) -> Result<()>;

    /// Closed-loop velocity in feet/sec with the current gear's feed-forward
    fn set_velocity_ups(&mut self, velocity: f64) -> Result<()>;

    /// Closed-loop position in feet with static-friction feed-forward
    fn set_position_setpoint(&mut self, feet: f64) -> Result<()>;

    /// Apply a gear's settings to the controller
    fn set_gear(&mut self, gear: u32) -> Result<()>;

    /// Zero the encoder
    fn reset_position(&mut self) -> Result<()>;

    fn raw_position(&self) -> Result<f64>;

    fn raw_velocity(&self) -> Result<f64>;

    /// Closed-loop error in feet/sec for velocity mode, otherwise feet.
    /// None without an encoder.
    fn error(&self) -> Result<Option<f64>>;

    fn output_voltage(&self) -> Result<f64>;

    fn battery_voltage(&self) -> Result<f64>;

    fn output_current(&self) -> Result<f64>;

    /// False when no forward switch is configured
    fn fwd_limit_switch(&self) -> Result<bool>;

    fn rev_limit_switch(&self) -> Result<bool>;

    fn is_inhibited_forward(&self) -> Result<bool>;

    fn is_inhibited_reverse(&self) -> Result<bool>;

    fn gear(&self) -> u32 {
        self.gears().active_index()
    }

    fn current_gear_feed_forward(&self) -> FeedForward {
        self.gears().active().feed_forward
    }

    /// Velocity as a fraction of the current gear's max speed.
    ///
    /// Without a max speed the value is used as a percent voltage instead.
    fn set_velocity(&mut self, velocity: f64) -> Result<()> {
        match self.gears().active().max_speed {
            Some(max_speed) => self.set_velocity_ups(velocity * max_speed),
            None => self.set_percent_voltage(velocity),
        }
    }

    /// Velocity as a fraction of `gear`'s max speed, without switching to `gear`
    fn set_gear_scaled_velocity(&mut self, velocity: f64, gear: u32) -> Result<()> {
        let max_speed = self.gears().profile(self.name(), gear)?.max_speed;
        match max_speed {
            Some(max_speed) => self.set_velocity_ups(velocity * max_speed),
            None => self.set_percent_voltage(velocity),
        }
    }

    fn encoder_to_unit(&self, native: f64) -> Option<f64> {
        self.units().encoder_to_unit(native)
    }

    fn unit_to_encoder(&self, feet: f64) -> Option<f64> {
        self.units().unit_to_encoder(feet)
    }

    fn encoder_to_ups(&self, native: f64) -> Option<f64> {
        self.units().encoder_to_ups(native)
    }

    fn ups_to_encoder(&self, ups: f64) -> Option<f64> {
        self.units().ups_to_encoder(ups)
    }

    /// Feet/sec, None without an encoder
    fn velocity(&self) -> Result<Option<f64>> {
        Ok(self.encoder_to_ups(self.raw_velocity()?))
    }

    /// Feet, None without an encoder
    fn position_units(&self) -> Result<Option<f64>> {
        Ok(self.encoder_to_unit(self.raw_position()?))
    }

    fn telemetry(&self) -> Result<MotorTelemetry> {
        let followers = self
            .followers()
            .iter()
            .map(|follower| follower.telemetry())
            .collect::<Result<Vec<_>>>()?;
        Ok(MotorTelemetry {
            name: self.name().to_string(),
            port: self.port(),
            gear: self.gear(),
            control_mode: self.control_mode(),
            setpoint: self.setpoint(),
            native_setpoint: self.native_setpoint(),
            error: self.error()?,
            position: self.position_units()?,
            velocity: self.velocity()?,
            output_voltage: self.output_voltage()?,
            battery_voltage: self.battery_voltage()?,
            output_current: self.output_current()?,
            fwd_limit_switch: self.fwd_limit_switch()?,
            rev_limit_switch: self.rev_limit_switch()?,
            inhibited_forward: self.is_inhibited_forward()?,
            inhibited_reverse: self.is_inhibited_reverse()?,
            followers,
        })
    }
}

/// Clip a percent voltage to [-1, 1], warning when out of range
pub(crate) fn clip_percent_voltage(motor: &str, percent_voltage: f64) -> f64 {
    if percent_voltage.abs() > 1.0 {
        warn!(
            "{}: percent voltage {} out of range, clipping",
            motor, percent_voltage
        );
        percent_voltage.signum()
    } else {
        percent_voltage
    }
}

/// `volts` as a fraction of the measured bus, or of the nominal battery if the bus reads dead
pub(crate) fn fraction_of_bus(volts: f64, bus_voltage: f64) -> f64 {
    let bus = if bus_voltage > 0.0 {
        bus_voltage
    } else {
        NOMINAL_BATTERY_VOLTAGE
    };
    volts / bus
}

pub(crate) fn no_encoder(motor: &str, what: &'static str) -> MotorError {
    MotorError::NoEncoder {
        motor: motor.to_string(),
        what,
    }
}
