// Talon SRX master
//
// Native units: position in quadrature edges (4 x encoder CPR per rotation), velocity in edges
// per 100 ms. Arbitrary feed-forward and output bounds are written as fractions of 12 V.

use tracing::{debug, info, warn};

use super::error::{MotorError, Result};
use super::follower::{ControllerFamily, Follower, MasterBinding, MasterIdentity};
use super::gear::GearSet;
use super::limits::{LimitConfig, LimitDirection};
use super::phoenix::{
    configure_current_limit, configure_voltage_compensation, FeedbackDevice, InvertType,
    LimitSwitchNormal, LimitSwitchSource, NeutralMode, PidTerm, TalonDemand, TalonDevice,
    TalonParam, TalonSignal,
};
use super::power::ResistanceLink;
use super::smart::{clip_percent_voltage, fraction_of_bus, no_encoder, ControlMode, SmartMotor};
use super::units::UnitConversion;
use crate::config::{
    TalonConfig, NOMINAL_BATTERY_VOLTAGE, PID_SLOT, VELOCITY_MEASUREMENT_PERIOD_MS,
    VELOCITY_MEASUREMENT_WINDOW,
};

pub struct TalonMotor<D: TalonDevice> {
    device: D,
    name: String,
    gears: GearSet,
    units: UnitConversion,
    /// Gearing restored when a gear has no override
    default_gearing: f64,
    limits: LimitConfig,
    /// Output is scaled against 12 V rather than the live bus
    voltage_comp_enabled: bool,
    control_mode: ControlMode,
    setpoint: f64,
    native_setpoint: f64,
    followers: Vec<Box<dyn Follower>>,
}

impl<D: TalonDevice> TalonMotor<D> {
    /// Program the controller from `config` and bind `followers` to it.
    ///
    /// `resistance` is handed to every follower for wiring resistance estimates.
    pub fn new(
        mut device: D,
        config: &TalonConfig,
        mut followers: Vec<Box<dyn Follower>>,
        resistance: Option<ResistanceLink>,
    ) -> Result<Self> {
        let motor = &config.motor;
        let port = device.device_id();
        let name = motor.display_name("talon");
        if motor.port != port {
            warn!(
                "{}: configured for port {} but the device is on {}",
                name, motor.port, port
            );
        }
        info!("Configuring Talon SRX {} on port {}", name, port);

        device.configure(TalonParam::FactoryDefault)?;
        let invert = if motor.reverse_output {
            InvertType::InvertMotorOutput
        } else {
            InvertType::None
        };
        device.configure(TalonParam::Invert(invert))?;
        device.configure(TalonParam::NeutralMode(NeutralMode::from_brake(
            motor.enable_brake_mode,
        )))?;
        device.configure(TalonParam::SelectedSensorPosition(0.0))?;
        for param in config.frames.params() {
            device.configure(param)?;
        }

        let gears = GearSet::new(
            &name,
            &motor.gears,
            motor.starting_gear,
            motor.starting_gear_num,
        )?;

        let limits = motor.limits.clone();
        for direction in LimitDirection::BOTH {
            let (source, normal) = match limits.switch(direction) {
                Some(polarity) => {
                    let source = match limits.remote_limit_switch_id {
                        Some(id) => LimitSwitchSource::RemoteTalon(id),
                        None => LimitSwitchSource::FeedbackConnector,
                    };
                    (source, LimitSwitchNormal::from(polarity))
                }
                None => (LimitSwitchSource::Deactivated, LimitSwitchNormal::Disabled),
            };
            device.configure(TalonParam::LimitSwitchSource {
                direction,
                source,
                normal,
            })?;
        }

        let encoder_cpr = match config.feedback_device {
            Some(feedback) if feedback != FeedbackDevice::None => {
                let cpr = config
                    .encoder_cpr
                    .ok_or_else(|| MotorError::MissingEncoderCpr {
                        motor: name.clone(),
                    })?;
                device.configure(TalonParam::FeedbackSensor(feedback.selected()))?;
                device.configure(TalonParam::SensorPhase(config.reverse_sensor))?;
                Some(cpr)
            }
            _ => {
                device.configure(TalonParam::FeedbackSensor(FeedbackDevice::None))?;
                None
            }
        };
        let default_gearing = motor.post_encoder_gearing();
        let units = UnitConversion::talon(encoder_cpr, default_gearing, motor.unit_per_rotation());

        for direction in LimitDirection::BOTH {
            let threshold = match limits.soft_limit(direction) {
                Some(feet) => {
                    let ticks = units.unit_to_encoder(feet);
                    if ticks.is_none() {
                        warn!("{}: soft limit {} ft ignored without an encoder", name, feet);
                    }
                    // controller takes whole ticks
                    ticks.map(|ticks| ticks as i32)
                }
                None => None,
            };
            device.configure(TalonParam::SoftLimit {
                direction,
                threshold,
            })?;
        }

        configure_current_limit(&mut device, motor.current_limit)?;
        let voltage_comp_samples = motor
            .enable_voltage_comp
            .then(|| config.voltage_comp_samples());
        configure_voltage_compensation(&mut device, voltage_comp_samples)?;

        let mut talon = Self {
            device,
            name,
            gears,
            units,
            default_gearing,
            limits,
            voltage_comp_enabled: motor.enable_voltage_comp,
            control_mode: ControlMode::Disabled,
            setpoint: 0.0,
            native_setpoint: 0.0,
            followers: Vec::new(),
        };
        talon.set_gear(talon.gears.active_index())?;
        talon.device.configure(TalonParam::ProfileSlot(PID_SLOT))?;

        let binding = MasterBinding {
            master: MasterIdentity {
                id: port,
                family: ControllerFamily::Phoenix,
            },
            brake_mode: motor.enable_brake_mode,
            current_limit: motor.current_limit,
            voltage_comp_samples,
            resistance,
        };
        for follower in followers.iter_mut() {
            follower.bind(&binding)?;
        }
        talon.followers = followers;

        talon.device.configure(TalonParam::VelocityMeasurementPeriodMs(
            VELOCITY_MEASUREMENT_PERIOD_MS,
        ))?;
        talon.device.configure(TalonParam::VelocityMeasurementWindow(
            VELOCITY_MEASUREMENT_WINDOW,
        ))?;

        info!(
            "Talon SRX {} ready in gear {} with {} follower(s)",
            talon.name,
            talon.gears.active_index(),
            talon.followers.len()
        );
        Ok(talon)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    fn limit_switch(&self, direction: LimitDirection) -> Result<bool> {
        match self.limits.switch(direction) {
            Some(polarity) => {
                let closed = self.device.limit_switch_closed(direction)?;
                Ok(polarity.is_triggered(closed))
            }
            None => Ok(false),
        }
    }
}

impl<D: TalonDevice> SmartMotor for TalonMotor<D> {
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
        self.device.set(TalonDemand::Disabled)?;
        self.control_mode = ControlMode::Disabled;
        Ok(())
    }

    fn set_percent_voltage(&mut self, percent_voltage: f64) -> Result<()> {
        let percent_voltage = clip_percent_voltage(&self.name, percent_voltage);
        self.device.set(TalonDemand::PercentOutput(percent_voltage))?;
        self.control_mode = ControlMode::PercentVoltage;
        self.setpoint = percent_voltage;
        self.native_setpoint = percent_voltage;
        Ok(())
    }

    fn set_voltage(&mut self, volts: f64) -> Result<()> {
        if self.voltage_comp_enabled {
            return self.set_percent_voltage(volts / NOMINAL_BATTERY_VOLTAGE);
        }
        let bus = self.device.read(TalonSignal::BusVoltage)?;
        self.set_percent_voltage(fraction_of_bus(volts, bus))
    }

    fn set_velocity_ups(&mut self, velocity: f64) -> Result<()> {
        let native = self
            .units
            .ups_to_encoder(velocity)
            .ok_or_else(|| no_encoder(&self.name, "velocity"))?;
        let arb_ff = self.gears.active().feed_forward.calculate(velocity) / NOMINAL_BATTERY_VOLTAGE;

        self.device.configure(TalonParam::Gain {
            slot: PID_SLOT,
            term: PidTerm::F,
            value: 0.0,
        })?;
        self.device.set(TalonDemand::Velocity { native, arb_ff })?;
        self.control_mode = ControlMode::Velocity;
        self.setpoint = velocity;
        self.native_setpoint = native;
        Ok(())
    }

    fn set_position_setpoint(&mut self, feet: f64) -> Result<()> {
        let native = self
            .units
            .unit_to_encoder(feet)
            .ok_or_else(|| no_encoder(&self.name, "position"))?;
        let arb_ff = self.gears.active().feed_forward.ks / NOMINAL_BATTERY_VOLTAGE;

        self.device.configure(TalonParam::Gain {
            slot: PID_SLOT,
            term: PidTerm::F,
            value: 0.0,
        })?;
        self.device.set(TalonDemand::Position { native, arb_ff })?;
        self.control_mode = ControlMode::Position;
        self.setpoint = feet;
        self.native_setpoint = native;
        Ok(())
    }

    fn set_gear(&mut self, gear: u32) -> Result<()> {
        let profile = self.gears.switch_to(&self.name, gear)?;
        let ramp = profile.ramp_seconds();
        let writes = [
            TalonParam::PeakOutput {
                direction: LimitDirection::Forward,
                percent: profile.fwd_peak_output_voltage() / NOMINAL_BATTERY_VOLTAGE,
            },
            TalonParam::PeakOutput {
                direction: LimitDirection::Reverse,
                percent: profile.rev_peak_output_voltage() / NOMINAL_BATTERY_VOLTAGE,
            },
            TalonParam::NominalOutput {
                direction: LimitDirection::Forward,
                percent: profile.fwd_nominal_output_voltage() / NOMINAL_BATTERY_VOLTAGE,
            },
            TalonParam::NominalOutput {
                direction: LimitDirection::Reverse,
                percent: profile.rev_nominal_output_voltage() / NOMINAL_BATTERY_VOLTAGE,
            },
            TalonParam::ClosedLoopRamp(ramp),
            TalonParam::OpenLoopRamp(ramp),
            TalonParam::Gain {
                slot: PID_SLOT,
                term: PidTerm::P,
                value: profile.k_p,
            },
            TalonParam::Gain {
                slot: PID_SLOT,
                term: PidTerm::I,
                value: profile.k_i,
            },
            TalonParam::Gain {
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
        self.device
            .configure(TalonParam::SelectedSensorPosition(0.0))?;
        Ok(())
    }

    fn raw_position(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::SensorPosition)?)
    }

    fn raw_velocity(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::SensorVelocity)?)
    }

    fn error(&self) -> Result<Option<f64>> {
        let native = self.device.read(TalonSignal::ClosedLoopError)?;
        Ok(match self.control_mode {
            ControlMode::Velocity => self.units.encoder_to_ups(native),
            _ => self.units.encoder_to_unit(native),
        })
    }

    fn output_voltage(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::MotorOutputVoltage)?)
    }

    fn battery_voltage(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::BusVoltage)?)
    }

    fn output_current(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::SupplyCurrent)?)
    }

    fn fwd_limit_switch(&self) -> Result<bool> {
        self.limit_switch(LimitDirection::Forward)
    }

    fn rev_limit_switch(&self) -> Result<bool> {
        self.limit_switch(LimitDirection::Reverse)
    }

    fn is_inhibited_forward(&self) -> Result<bool> {
        Ok(self.device.faults()?.forward_limit_switch)
    }

    fn is_inhibited_reverse(&self) -> Result<bool> {
        Ok(self.device.faults()?.reverse_limit_switch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FollowerSpec, MotorConfig};
    use crate::motor::feed_forward::FeedForward;
    use crate::motor::follower::{PhoenixFollower, PhoenixKind};
    use crate::motor::gear::GearProfile;
    use crate::motor::limits::LimitSwitchPolarity;
    use crate::motor::phoenix::TalonFaults;
    use crate::motor::recording::RecordingTalon;

    const EPS: f64 = 1e-9;

    fn encoder_config(gears: Vec<GearProfile>) -> TalonConfig {
        let mut motor = MotorConfig::new(5);
        motor.gears = gears;
        let mut config = TalonConfig::new(motor);
        config.feedback_device = Some(FeedbackDevice::CtreMagEncoderRelative);
        config.encoder_cpr = Some(256);
        config
    }

    fn gear(num: u32, max_speed: Option<f64>) -> GearProfile {
        GearProfile {
            max_speed,
            ..GearProfile::numbered(num)
        }
    }

    fn build(config: &TalonConfig) -> (TalonMotor<RecordingTalon>, RecordingTalon) {
        let talon = RecordingTalon::new(config.motor.port);
        let motor = TalonMotor::new(talon.clone(), config, Vec::new(), None).unwrap();
        (motor, talon)
    }

    #[test]
    fn test_construction_order() {
        let config = encoder_config(vec![gear(0, Some(5.0))]);
        let (_, talon) = build(&config);
        let params = talon.params();
        let position = |target: &TalonParam| params.iter().position(|p| p == target).unwrap();

        assert_eq!(params[0], TalonParam::FactoryDefault);
        assert_eq!(params[1], TalonParam::Invert(InvertType::None));
        assert_eq!(params[2], TalonParam::NeutralMode(NeutralMode::Coast));
        assert_eq!(params[3], TalonParam::SelectedSensorPosition(0.0));
        assert!(
            position(&TalonParam::FeedbackSensor(FeedbackDevice::QuadEncoder))
                < position(&TalonParam::CurrentLimitEnable(false))
        );
        assert!(
            position(&TalonParam::ProfileSlot(0))
                < position(&TalonParam::VelocityMeasurementPeriodMs(10))
        );
        assert_eq!(params.last(), Some(&TalonParam::VelocityMeasurementWindow(10)));
        assert!(!params.contains(&TalonParam::FeedbackSensor(FeedbackDevice::None)));
        assert_eq!(talon.demands(), Vec::new());
    }

    #[test]
    fn test_absent_limits_stay_disabled() {
        let config = encoder_config(Vec::new());
        let (motor, talon) = build(&config);
        let params = talon.params();
        for direction in LimitDirection::BOTH {
            assert!(params.contains(&TalonParam::LimitSwitchSource {
                direction,
                source: LimitSwitchSource::Deactivated,
                normal: LimitSwitchNormal::Disabled,
            }));
            assert!(params.contains(&TalonParam::SoftLimit {
                direction,
                threshold: None
            }));
        }
        talon.set_limit_switch_closed(LimitDirection::Forward, true);
        assert!(!motor.fwd_limit_switch().unwrap());
        assert!(!motor.rev_limit_switch().unwrap());
    }

    #[test]
    fn test_remote_limit_switch_and_soft_limits() {
        let mut config = encoder_config(Vec::new());
        config.motor.limits.rev_limit_switch = Some(LimitSwitchPolarity::NormallyClosed);
        config.motor.limits.remote_limit_switch_id = Some(12);
        config.motor.limits.fwd_soft_limit = Some(2.5);
        let (motor, talon) = build(&config);
        let params = talon.params();

        assert!(params.contains(&TalonParam::LimitSwitchSource {
            direction: LimitDirection::Reverse,
            source: LimitSwitchSource::RemoteTalon(12),
            normal: LimitSwitchNormal::NormallyClosed,
        }));
        // 2.5 ft * 1024 ticks/ft
        assert!(params.contains(&TalonParam::SoftLimit {
            direction: LimitDirection::Forward,
            threshold: Some(2560)
        }));

        talon.set_limit_switch_closed(LimitDirection::Reverse, false);
        assert!(motor.rev_limit_switch().unwrap());
        talon.set_limit_switch_closed(LimitDirection::Reverse, true);
        assert!(!motor.rev_limit_switch().unwrap());
    }

    #[test]
    fn test_feedback_device_needs_cpr() {
        let mut config = encoder_config(Vec::new());
        config.encoder_cpr = None;
        let result = TalonMotor::new(RecordingTalon::new(5), &config, Vec::new(), None);
        assert!(matches!(result, Err(MotorError::MissingEncoderCpr { .. })));
    }

    #[test]
    fn test_percent_voltage_is_clipped() {
        let (mut motor, talon) = build(&encoder_config(Vec::new()));
        motor.set_percent_voltage(1.7).unwrap();
        assert_eq!(motor.setpoint(), 1.0);
        assert_eq!(motor.control_mode(), ControlMode::PercentVoltage);
        motor.set_percent_voltage(-3.0).unwrap();
        assert_eq!(motor.setpoint(), -1.0);
        motor.set_percent_voltage(0.4).unwrap();
        assert_eq!(talon.last_demand(), Some(TalonDemand::PercentOutput(0.4)));
    }

    #[test]
    fn test_set_voltage_uses_bus() {
        let (mut motor, talon) = build(&encoder_config(Vec::new()));
        talon.set_signal(TalonSignal::BusVoltage, 10.0);
        motor.set_voltage(5.0).unwrap();
        assert_eq!(talon.last_demand(), Some(TalonDemand::PercentOutput(0.5)));
    }

    #[test]
    fn test_set_voltage_with_compensation_uses_nominal() {
        let mut config = encoder_config(Vec::new());
        config.motor.enable_voltage_comp = true;
        let (mut motor, talon) = build(&config);
        talon.set_signal(TalonSignal::BusVoltage, 10.0);
        motor.set_voltage(6.0).unwrap();
        assert_eq!(talon.last_demand(), Some(TalonDemand::PercentOutput(0.5)));
        assert_eq!(motor.setpoint(), 0.5);
    }

    #[test]
    fn test_full_velocity_hits_max_speed() {
        let ff = FeedForward::new(0.6, 1.2, 0.0);
        let config = encoder_config(vec![GearProfile {
            feed_forward: ff,
            ..gear(0, Some(10.0))
        }]);
        let (mut motor, talon) = build(&config);
        motor.set_velocity(1.0).unwrap();

        let expected = motor.ups_to_encoder(10.0).unwrap();
        assert_eq!(motor.control_mode(), ControlMode::Velocity);
        assert!((motor.native_setpoint() - expected).abs() < EPS);
        match talon.last_demand() {
            Some(TalonDemand::Velocity { native, arb_ff }) => {
                assert!((native - expected).abs() < EPS);
                assert!((arb_ff - ff.calculate(10.0) / 12.0).abs() < EPS);
            }
            other => panic!("unexpected demand {:?}", other),
        }
    }

    #[test]
    fn test_velocity_without_max_speed_is_percent_voltage() {
        let config = encoder_config(vec![GearProfile {
            k_p: 0.1,
            ..gear(0, None)
        }]);
        let (mut motor, _) = build(&config);
        motor.set_velocity(0.5).unwrap();
        assert_eq!(motor.control_mode(), ControlMode::PercentVoltage);
        assert_eq!(motor.setpoint(), 0.5);
    }

    #[test]
    fn test_gear_scaled_velocity_uses_named_gear() {
        let config = encoder_config(vec![gear(0, Some(5.0)), gear(1, Some(15.0))]);
        let (mut motor, _) = build(&config);
        motor.set_gear(1).unwrap();
        motor.set_gear_scaled_velocity(0.2, 0).unwrap();
        assert!((motor.setpoint() - 1.0).abs() < EPS);
        assert_eq!(motor.gear(), 1);
        assert!(matches!(
            motor.set_gear_scaled_velocity(0.2, 4),
            Err(MotorError::UnknownGear { gear: 4, .. })
        ));
    }

    #[test]
    fn test_set_gear_is_idempotent() {
        let config = encoder_config(vec![
            GearProfile {
                k_p: 0.3,
                ramp_rate: Some(48.0),
                post_encoder_gearing: Some(0.5),
                ..gear(1, Some(5.0))
            },
            gear(2, Some(15.0)),
        ]);
        let (mut motor, talon) = build(&config);
        motor.set_percent_voltage(0.3).unwrap();

        talon.clear();
        motor.set_gear(1).unwrap();
        let first = talon.params();
        talon.clear();
        motor.set_gear(1).unwrap();
        assert_eq!(talon.params(), first);
        assert!(first.contains(&TalonParam::ClosedLoopRamp(0.25)));
        assert_eq!(motor.units().post_encoder_gearing(), 0.5);
        assert_eq!(motor.control_mode(), ControlMode::PercentVoltage);
        assert_eq!(motor.setpoint(), 0.3);

        // gear 2 has no override, so the motor default comes back
        motor.set_gear(2).unwrap();
        assert_eq!(motor.units().post_encoder_gearing(), 1.0);
    }

    #[test]
    fn test_unknown_gear_fails_fast() {
        let (mut motor, talon) = build(&encoder_config(vec![gear(0, None)]));
        talon.clear();
        assert!(matches!(
            motor.set_gear(3),
            Err(MotorError::UnknownGear { gear: 3, .. })
        ));
        assert!(talon.params().is_empty());
        assert_eq!(motor.gear(), 0);
    }

    #[test]
    fn test_position_setpoint_uses_static_term_only() {
        let config = encoder_config(vec![GearProfile {
            feed_forward: FeedForward::new(0.6, 5.0, 1.0),
            ..gear(0, None)
        }]);
        let (mut motor, talon) = build(&config);
        motor.set_position_setpoint(0.5).unwrap();
        match talon.last_demand() {
            Some(TalonDemand::Position { native, arb_ff }) => {
                assert!((native - 512.0).abs() < EPS);
                assert!((arb_ff - 0.05).abs() < EPS);
            }
            other => panic!("unexpected demand {:?}", other),
        }
        assert_eq!(motor.control_mode(), ControlMode::Position);
    }

    #[test]
    fn test_no_encoder() {
        let mut config = encoder_config(vec![gear(0, Some(3.0))]);
        config.feedback_device = None;
        let (mut motor, talon) = build(&config);
        assert!(talon
            .params()
            .contains(&TalonParam::FeedbackSensor(FeedbackDevice::None)));
        assert_eq!(motor.encoder_to_unit(100.0), None);
        assert!(matches!(
            motor.set_velocity(1.0),
            Err(MotorError::NoEncoder { .. })
        ));
        assert_eq!(motor.control_mode(), ControlMode::Disabled);
        assert_eq!(motor.error().unwrap(), None);
    }

    #[test]
    fn test_error_follows_control_mode() {
        let (mut motor, talon) = build(&encoder_config(vec![gear(0, Some(10.0))]));
        talon.set_signal(TalonSignal::ClosedLoopError, 1024.0);
        assert!((motor.error().unwrap().unwrap() - 1.0).abs() < EPS);
        motor.set_velocity_ups(2.0).unwrap();
        assert!((motor.error().unwrap().unwrap() - 10.0).abs() < EPS);
    }

    #[test]
    fn test_disable_and_inhibit() {
        let (mut motor, talon) = build(&encoder_config(Vec::new()));
        motor.set_percent_voltage(0.5).unwrap();
        motor.disable().unwrap();
        motor.disable().unwrap();
        assert_eq!(motor.control_mode(), ControlMode::Disabled);
        assert_eq!(talon.last_demand(), Some(TalonDemand::Disabled));

        talon.set_faults(TalonFaults {
            reverse_limit_switch: true,
            ..TalonFaults::default()
        });
        assert!(!motor.is_inhibited_forward().unwrap());
        assert!(motor.is_inhibited_reverse().unwrap());
    }

    #[test]
    fn test_followers_bound_last() {
        let mut config = encoder_config(Vec::new());
        config.motor.enable_brake_mode = true;
        config.motor.current_limit = Some(40);
        config.followers = vec![FollowerSpec::Victor {
            port: 6,
            invert: None,
        }];
        let master = RecordingTalon::new(5);
        let victor = RecordingTalon::new(6);
        let follower = PhoenixFollower::new(victor.clone(), PhoenixKind::VictorSpx, None).unwrap();
        let motor = TalonMotor::new(master.clone(), &config, vec![Box::new(follower)], None).unwrap();

        assert_eq!(victor.last_demand(), Some(TalonDemand::Follower(5)));
        assert!(victor
            .params()
            .contains(&TalonParam::NeutralMode(NeutralMode::Brake)));
        assert_eq!(motor.followers()[0].master().map(|m| m.id), Some(5));

        let telemetry = motor.telemetry().unwrap();
        assert_eq!(telemetry.followers.len(), 1);
        assert_eq!(telemetry.name, "talon_5");
    }

    #[test]
    fn test_reset_position() {
        let (mut motor, talon) = build(&encoder_config(Vec::new()));
        talon.set_signal(TalonSignal::SensorPosition, 2048.0);
        assert!((motor.position_units().unwrap().unwrap() - 2.0).abs() < EPS);
        motor.reset_position().unwrap();
        assert_eq!(motor.raw_position().unwrap(), 0.0);
    }
}
