// SPARK MAX master
//
// Native units: position in rotations, velocity in RPM, arbitrary feed-forward in volts.

use tracing::{debug, info, warn};

use super::error::Result;
use super::follower::{ControllerFamily, Follower, MasterBinding, MasterIdentity};
use super::gear::GearSet;
use super::limits::{LimitConfig, LimitDirection};
use super::phoenix::PidTerm;
use super::power::ResistanceLink;
use super::rev::{IdleMode, SparkDevice, SparkFault, SparkParam, SparkReference, SparkSignal};
use super::smart::{clip_percent_voltage, fraction_of_bus, no_encoder, ControlMode, SmartMotor};
use super::units::UnitConversion;
use crate::config::{
    SparkConfig, DEFAULT_VOLTAGE_COMP_SAMPLES, NOMINAL_BATTERY_VOLTAGE, PID_SLOT,
};

pub struct SparkMotor<D: SparkDevice> {
    device: D,
    name: String,
    gears: GearSet,
    units: UnitConversion,
    default_gearing: f64,
    limits: LimitConfig,
    control_mode: ControlMode,
    setpoint: f64,
    native_setpoint: f64,
    followers: Vec<Box<dyn Follower>>,
}

impl<D: SparkDevice> SparkMotor<D> {
    /// Program the controller, bind `followers`, then burn the configuration to flash
    pub fn new(
        mut device: D,
        config: &SparkConfig,
        mut followers: Vec<Box<dyn Follower>>,
        resistance: Option<ResistanceLink>,
    ) -> Result<Self> {
        let motor = &config.motor;
        let port = device.device_id();
        let name = motor.display_name("spark");
        if motor.port != port {
            warn!(
                "{}: configured for port {} but the device is on {}",
                name, motor.port, port
            );
        }
        info!("Configuring SPARK MAX {} on port {}", name, port);

        device.configure(SparkParam::RestoreFactoryDefaults)?;
        for field in config.unsupported_fields() {
            warn!("{}: {} is not supported on a SPARK MAX, ignoring", name, field);
        }
        device.configure(SparkParam::Inverted(motor.reverse_output))?;
        device.configure(SparkParam::IdleMode(IdleMode::from_brake(
            motor.enable_brake_mode,
        )))?;
        device.configure(SparkParam::EncoderPosition(0.0))?;
        for param in config.frames.params(&name) {
            device.configure(param)?;
        }

        let gears = GearSet::new(
            &name,
            &motor.gears,
            motor.starting_gear,
            motor.starting_gear_num,
        )?;
        let default_gearing = motor.post_encoder_gearing();
        let units = UnitConversion::spark(default_gearing, motor.unit_per_rotation());

        let limits = motor.limits.clone();
        let switch_source = limits.remote_limit_switch_id.unwrap_or(port);
        for direction in LimitDirection::BOTH {
            device.configure(SparkParam::LimitSwitch {
                source: switch_source,
                direction,
                polarity: limits.switch(direction),
            })?;
            let rotations = limits
                .soft_limit(direction)
                .and_then(|feet| units.unit_to_encoder(feet))
                .map(|rotations| rotations as f32);
            device.configure(SparkParam::SoftLimit {
                direction,
                rotations,
            })?;
        }

        // the controller keeps its factory limit without one
        if let Some(amps) = motor.current_limit {
            device.configure(SparkParam::SmartCurrentLimit(amps))?;
        }
        let compensation = motor
            .enable_voltage_comp
            .then_some(NOMINAL_BATTERY_VOLTAGE);
        device.configure(SparkParam::VoltageCompensation(compensation))?;

        let mut spark = Self {
            device,
            name,
            gears,
            units,
            default_gearing,
            limits,
            control_mode: ControlMode::Disabled,
            setpoint: 0.0,
            native_setpoint: 0.0,
            followers: Vec::new(),
        };
        spark.set_gear(spark.gears.active_index())?;

        let binding = MasterBinding {
            master: MasterIdentity {
                id: port,
                family: ControllerFamily::Spark,
            },
            brake_mode: motor.enable_brake_mode,
            current_limit: motor.current_limit,
            voltage_comp_samples: motor
                .enable_voltage_comp
                .then_some(DEFAULT_VOLTAGE_COMP_SAMPLES),
            resistance,
        };
        for follower in followers.iter_mut() {
            follower.bind(&binding)?;
        }
        spark.followers = followers;

        spark.device.configure(SparkParam::BurnFlash)?;
        info!(
            "SPARK MAX {} ready in gear {} with {} follower(s)",
            spark.name,
            spark.gears.active_index(),
            spark.followers.len()
        );
        Ok(spark)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn limit_switch(&self, direction: LimitDirection) -> Result<bool> {
        if self.limits.switch(direction).is_none() {
            return Ok(false);
        }
        let source = self
            .limits
            .remote_limit_switch_id
            .unwrap_or(self.device.device_id());
        Ok(self.device.limit_switch_pressed(source, direction)?)
    }
}

impl<D: SparkDevice> SmartMotor for SparkMotor<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn port(&self) -> u8 {
        self.device.device_id()
    }

    fn gears(&self) -> &GearSet {
        &self.gears
    }

    fn units(&self) -> &UnitConversion {
        &self.units
    }

    fn followers(&self) -> &[Box<dyn Follower>] {
        &self.followers
    }

    fn control_mode(&self) -> ControlMode {
        self.control_mode
    }

    fn setpoint(&self) -> f64 {
        self.setpoint
    }

    fn native_setpoint(&self) -> f64 {
        self.native_setpoint
    }

    fn disable(&mut self) -> Result<()> {
        self.device.set_reference(SparkReference::Disabled)?;
        self.control_mode = ControlMode::Disabled;
        Ok(())
    }

    fn set_percent_voltage(&mut self, percent_voltage: f64) -> Result<()> {
        let percent_voltage = clip_percent_voltage(&self.name, percent_voltage);
        self.device
            .set_reference(SparkReference::DutyCycle(percent_voltage))?;
        self.control_mode = ControlMode::PercentVoltage;
        self.setpoint = percent_voltage;
        self.native_setpoint = percent_voltage;
        Ok(())
    }

    fn set_voltage(&mut self, volts: f64) -> Result<()> {
        let bus = self.device.read(SparkSignal::BusVoltage)?;
        self.device.set_reference(SparkReference::Voltage(volts))?;
        self.control_mode = ControlMode::PercentVoltage;
        self.setpoint = fraction_of_bus(volts, bus);
        self.native_setpoint = volts;
        Ok(())
    }

    fn set_velocity_ups(&mut self, velocity: f64) -> Result<()> {
        let rpm = self
            .units
            .ups_to_encoder(velocity)
            .ok_or_else(|| no_encoder(&self.name, "velocity"))?;
        let arb_ff_volts = self.gears.active().feed_forward.calculate(velocity);

        self.device.configure(SparkParam::Gain {
            slot: PID_SLOT,
            term: PidTerm::F,
            value: 0.0,
        })?;
        self.device
            .set_reference(SparkReference::Velocity { rpm, arb_ff_volts })?;
        self.control_mode = ControlMode::Velocity;
        self.setpoint = velocity;
        self.native_setpoint = rpm;
        Ok(())
    }

    fn set_position_setpoint(&mut self, feet: f64) -> Result<()> {
        let rotations = self
            .units
            .unit_to_encoder(feet)
            .ok_or_else(|| no_encoder(&self.name, "position"))?;
        let arb_ff_volts = self.gears.active().feed_forward.ks;

        self.device.configure(SparkParam::Gain {
            slot: PID_SLOT,
            term: PidTerm::F,
            value: 0.0,
        })?;
        self.device.set_reference(SparkReference::Position {
            rotations,
            arb_ff_volts,
        })?;
        self.control_mode = ControlMode::Position;
        self.setpoint = feet;
        self.native_setpoint = rotations;
        Ok(())
    }

    fn set_gear(&mut self, gear: u32) -> Result<()> {
        let profile = self.gears.switch_to(&self.name, gear)?;
        let ramp = profile.ramp_seconds();
        if profile.fwd_nominal_output_voltage() != 0.0 || profile.rev_nominal_output_voltage() != 0.0
        {
            debug!(
                "{}: nominal output voltage is not supported on a SPARK MAX",
                self.name
            );
        }
        let writes = [
            SparkParam::ClosedLoopRampRate(ramp),
            SparkParam::OpenLoopRampRate(ramp),
            SparkParam::OutputRange {
                slot: PID_SLOT,
                min: profile.rev_peak_output_voltage() / NOMINAL_BATTERY_VOLTAGE,
                max: profile.fwd_peak_output_voltage() / NOMINAL_BATTERY_VOLTAGE,
            },
            SparkParam::Gain {
                slot: PID_SLOT,
                term: PidTerm::P,
                value: profile.k_p,
            },
            SparkParam::Gain {
                slot: PID_SLOT,
                term: PidTerm::I,
                value: profile.k_i,
            },
            SparkParam::Gain {
                slot: PID_SLOT,
                term: PidTerm::D,
                value: profile.k_d,
            },
        ];
        let gearing = profile.post_encoder_gearing.unwrap_or(self.default_gearing);

        for param in writes {
            self.device.configure(param)?;
        }
        self.units.set_post_encoder_gearing(gearing);
        debug!("{}: gear {} applied", self.name, gear);
        Ok(())
    }

    fn reset_position(&mut self) -> Result<()> {
        self.device.configure(SparkParam::EncoderPosition(0.0))?;
        Ok(())
    }

    fn raw_position(&self) -> Result<f64> {
        Ok(self.device.read(SparkSignal::Position)?)
    }

    fn raw_velocity(&self) -> Result<f64> {
        Ok(self.device.read(SparkSignal::Velocity)?)
    }

    fn error(&self) -> Result<Option<f64>> {
        Ok(match self.control_mode {
            ControlMode::Velocity => self.velocity()?.map(|velocity| self.setpoint - velocity),
            _ => self
                .position_units()?
                .map(|position| self.setpoint - position),
        })
    }

    fn output_voltage(&self) -> Result<f64> {
        let applied = self.device.read(SparkSignal::AppliedOutput)?;
        Ok(applied * self.device.read(SparkSignal::BusVoltage)?)
    }

    fn battery_voltage(&self) -> Result<f64> {
        Ok(self.device.read(SparkSignal::BusVoltage)?)
    }

    fn output_current(&self) -> Result<f64> {
        Ok(self.device.read(SparkSignal::OutputCurrent)?)
    }

    fn fwd_limit_switch(&self) -> Result<bool> {
        self.limit_switch(LimitDirection::Forward)
    }

    fn rev_limit_switch(&self) -> Result<bool> {
        self.limit_switch(LimitDirection::Reverse)
    }

    fn is_inhibited_forward(&self) -> Result<bool> {
        Ok(self.device.fault(SparkFault::HardLimitForward)?)
    }

    fn is_inhibited_reverse(&self) -> Result<bool> {
        Ok(self.device.fault(SparkFault::HardLimitReverse)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotorConfig;
    use crate::motor::error::MotorError;
    use crate::motor::feed_forward::FeedForward;
    use crate::motor::follower::SparkFollower;
    use crate::motor::gear::{Gear, GearProfile};
    use crate::motor::limits::LimitSwitchPolarity;
    use crate::motor::recording::RecordingSpark;
    use crate::motor::rev::FollowTarget;

    const EPS: f64 = 1e-9;

    fn config(gears: Vec<GearProfile>) -> SparkConfig {
        let mut motor = MotorConfig::new(20);
        motor.gears = gears;
        SparkConfig::new(motor)
    }

    fn build(config: &SparkConfig) -> (SparkMotor<RecordingSpark>, RecordingSpark) {
        let spark = RecordingSpark::new(config.motor.port);
        let motor = SparkMotor::new(spark.clone(), config, Vec::new(), None).unwrap();
        (motor, spark)
    }

    #[test]
    fn test_construction_order_ends_with_flash() {
        let (_, spark) = build(&config(Vec::new()));
        let params = spark.params();
        assert_eq!(params[0], SparkParam::RestoreFactoryDefaults);
        assert_eq!(params[1], SparkParam::Inverted(false));
        assert_eq!(params[2], SparkParam::IdleMode(IdleMode::Coast));
        assert_eq!(params[3], SparkParam::EncoderPosition(0.0));
        assert_eq!(params.last(), Some(&SparkParam::BurnFlash));
        assert!(params.contains(&SparkParam::VoltageCompensation(None)));
        assert!(!params
            .iter()
            .any(|p| matches!(p, SparkParam::SmartCurrentLimit(_))));
    }

    #[test]
    fn test_limits() {
        let mut config = config(Vec::new());
        config.motor.limits.fwd_limit_switch = Some(LimitSwitchPolarity::NormallyOpen);
        config.motor.limits.remote_limit_switch_id = Some(21);
        config.motor.limits.rev_soft_limit = Some(-3.0);
        config.motor.unit_per_rotation = Some(0.5);
        let (motor, spark) = build(&config);
        let params = spark.params();

        assert!(params.contains(&SparkParam::LimitSwitch {
            source: 21,
            direction: LimitDirection::Forward,
            polarity: Some(LimitSwitchPolarity::NormallyOpen),
        }));
        assert!(params.contains(&SparkParam::LimitSwitch {
            source: 21,
            direction: LimitDirection::Reverse,
            polarity: None,
        }));
        assert!(params.contains(&SparkParam::SoftLimit {
            direction: LimitDirection::Reverse,
            rotations: Some(-6.0),
        }));
        assert!(params.contains(&SparkParam::SoftLimit {
            direction: LimitDirection::Forward,
            rotations: None,
        }));

        spark.set_limit_switch_pressed(21, LimitDirection::Forward, true);
        spark.set_limit_switch_pressed(21, LimitDirection::Reverse, true);
        assert!(motor.fwd_limit_switch().unwrap());
        // reverse switch was never configured
        assert!(!motor.rev_limit_switch().unwrap());
    }

    #[test]
    fn test_velocity_in_rpm_with_volt_feed_forward() {
        let ff = FeedForward::new(0.3, 0.8, 0.0);
        let mut config = config(vec![GearProfile {
            max_speed: Some(10.0),
            feed_forward: ff,
            ..GearProfile::numbered(0)
        }]);
        config.motor.unit_per_rotation = Some(0.5);
        let (mut motor, spark) = build(&config);

        motor.set_velocity(1.0).unwrap();
        // 10 ft/s at 0.5 ft per rotation is 20 rps, 1200 RPM
        match spark.last_reference() {
            Some(SparkReference::Velocity { rpm, arb_ff_volts }) => {
                assert!((rpm - 1200.0).abs() < EPS);
                assert!((arb_ff_volts - ff.calculate(10.0)).abs() < EPS);
            }
            other => panic!("unexpected reference {:?}", other),
        }
        assert!((motor.native_setpoint() - motor.ups_to_encoder(10.0).unwrap()).abs() < EPS);
    }

    #[test]
    fn test_error_by_mode() {
        let (mut motor, spark) = build(&config(vec![GearProfile {
            max_speed: Some(10.0),
            ..GearProfile::numbered(0)
        }]));
        motor.set_position_setpoint(4.0).unwrap();
        spark.set_signal(SparkSignal::Position, 3.0);
        assert!((motor.error().unwrap().unwrap() - 1.0).abs() < EPS);

        motor.set_velocity_ups(2.0).unwrap();
        spark.set_signal(SparkSignal::Velocity, 90.0);
        assert!((motor.error().unwrap().unwrap() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_gear_switch_restores_default_gearing() {
        let mut config = config(vec![
            GearProfile {
                gear: Some(Gear::Low),
                post_encoder_gearing: Some(0.25),
                fwd_peak_output_voltage: Some(6.0),
                ..GearProfile::default()
            },
            GearProfile {
                gear: Some(Gear::High),
                ..GearProfile::default()
            },
        ]);
        config.motor.post_encoder_gearing = Some(0.5);
        config.motor.starting_gear = Some(Gear::Low);
        let (mut motor, spark) = build(&config);
        assert_eq!(motor.units().post_encoder_gearing(), 0.25);
        assert!(spark.params().contains(&SparkParam::OutputRange {
            slot: 0,
            min: -0.5,
            max: 0.5
        }));

        motor.set_gear(Gear::High.into()).unwrap();
        assert_eq!(motor.gear(), 2);
        assert_eq!(motor.units().post_encoder_gearing(), 0.5);
    }

    #[test]
    fn test_set_voltage_is_native() {
        let (mut motor, spark) = build(&config(Vec::new()));
        motor.set_voltage(6.0).unwrap();
        assert_eq!(spark.last_reference(), Some(SparkReference::Voltage(6.0)));
        assert_eq!(motor.control_mode(), ControlMode::PercentVoltage);
        assert_eq!(motor.setpoint(), 0.5);
    }

    #[test]
    fn test_unknown_gear() {
        let (mut motor, _) = build(&config(Vec::new()));
        assert!(matches!(
            motor.set_gear(1),
            Err(MotorError::UnknownGear { gear: 1, .. })
        ));
    }

    #[test]
    fn test_follower_bound_before_flash() {
        let config = config(Vec::new());
        let master = RecordingSpark::new(20);
        let slave = RecordingSpark::new(22);
        let follower = SparkFollower::new(slave.clone(), false).unwrap();
        SparkMotor::new(master.clone(), &config, vec![Box::new(follower)], None).unwrap();

        assert!(slave
            .params()
            .contains(&SparkParam::Follow(FollowTarget::Spark {
                id: 20,
                inverted: false
            })));
        assert_eq!(master.params().last(), Some(&SparkParam::BurnFlash));
    }

    #[test]
    fn test_default_start_is_lowest_gear() {
        let (motor, _) = build(&config(vec![
            GearProfile::numbered(3),
            GearProfile::numbered(1),
        ]));
        assert_eq!(motor.gear(), 1);
        assert_eq!(motor.control_mode(), ControlMode::Disabled);
    }

    #[test]
    fn test_percent_voltage_is_clipped() {
        let (mut motor, spark) = build(&config(Vec::new()));
        motor.set_percent_voltage(2.5).unwrap();
        assert_eq!(motor.setpoint(), 1.0);
        assert_eq!(spark.last_reference(), Some(SparkReference::DutyCycle(1.0)));
        motor.set_percent_voltage(-1.2).unwrap();
        assert_eq!(motor.setpoint(), -1.0);
        motor.set_percent_voltage(-0.3).unwrap();
        assert_eq!(spark.last_reference(), Some(SparkReference::DutyCycle(-0.3)));
        assert_eq!(motor.control_mode(), ControlMode::PercentVoltage);
    }

    #[test]
    fn test_disable_is_idempotent() {
        let (mut motor, spark) = build(&config(Vec::new()));
        motor.set_percent_voltage(0.5).unwrap();
        motor.disable().unwrap();
        motor.disable().unwrap();
        assert_eq!(motor.control_mode(), ControlMode::Disabled);
        assert_eq!(
            spark.references()[1..],
            [SparkReference::Disabled, SparkReference::Disabled]
        );
    }

    #[test]
    fn test_set_gear_is_idempotent() {
        let config = config(vec![
            GearProfile {
                k_p: 0.2,
                k_d: 1.5,
                ramp_rate: Some(24.0),
                post_encoder_gearing: Some(2.0),
                ..GearProfile::numbered(0)
            },
            GearProfile::numbered(1),
        ]);
        let (mut motor, spark) = build(&config);
        motor.set_percent_voltage(0.4).unwrap();

        spark.clear();
        motor.set_gear(0).unwrap();
        let first = spark.params();
        spark.clear();
        motor.set_gear(0).unwrap();
        assert_eq!(spark.params(), first);
        assert!(first.contains(&SparkParam::ClosedLoopRampRate(0.5)));
        assert!(spark.references().is_empty());
        assert_eq!(motor.units().post_encoder_gearing(), 2.0);
        assert_eq!(motor.control_mode(), ControlMode::PercentVoltage);
        assert_eq!(motor.setpoint(), 0.4);
    }

    #[test]
    fn test_position_setpoint_uses_static_term_only() {
        let (mut motor, spark) = build(&config(vec![GearProfile {
            feed_forward: FeedForward::new(0.4, 5.0, 1.0),
            ..GearProfile::numbered(0)
        }]));
        spark.clear();
        motor.set_position_setpoint(0.5).unwrap();

        assert_eq!(
            spark.params(),
            vec![SparkParam::Gain {
                slot: 0,
                term: PidTerm::F,
                value: 0.0
            }]
        );
        match spark.last_reference() {
            Some(SparkReference::Position {
                rotations,
                arb_ff_volts,
            }) => {
                assert!((rotations - 0.5).abs() < EPS);
                assert!((arb_ff_volts - 0.4).abs() < EPS);
            }
            other => panic!("unexpected reference {:?}", other),
        }
        assert_eq!(motor.control_mode(), ControlMode::Position);
        assert_eq!(motor.setpoint(), 0.5);
    }

    #[test]
    fn test_reset_position() {
        let (mut motor, spark) = build(&config(Vec::new()));
        spark.set_signal(SparkSignal::Position, 3.0);
        assert!((motor.position_units().unwrap().unwrap() - 3.0).abs() < EPS);
        motor.reset_position().unwrap();
        assert_eq!(motor.raw_position().unwrap(), 0.0);
        assert_eq!(spark.params().last(), Some(&SparkParam::EncoderPosition(0.0)));
    }

    #[test]
    fn test_inhibit_reads_hard_limit_faults() {
        let (motor, spark) = build(&config(Vec::new()));
        assert!(!motor.is_inhibited_forward().unwrap());
        assert!(!motor.is_inhibited_reverse().unwrap());

        spark.set_fault(SparkFault::HardLimitForward, true);
        assert!(motor.is_inhibited_forward().unwrap());
        assert!(!motor.is_inhibited_reverse().unwrap());

        spark.set_fault(SparkFault::HardLimitForward, false);
        spark.set_fault(SparkFault::HardLimitReverse, true);
        assert!(!motor.is_inhibited_forward().unwrap());
        assert!(motor.is_inhibited_reverse().unwrap());
    }
}
