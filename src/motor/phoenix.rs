// CTRE Phoenix device interface (Talon SRX, Victor SPX)
//
// Parameters and demands are typed; the CAN transport behind a `TalonDevice` is supplied by the
// caller. Percent values are fractions of the 12 V nominal battery in [-1, 1].

use super::error::BusResult;
use super::frames::{TalonControlFrame, TalonStatusFrame};
use super::limits::{LimitDirection, LimitSwitchPolarity};
use crate::config::NOMINAL_BATTERY_VOLTAGE;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeutralMode {
    Coast,
    Brake,
}

impl NeutralMode {
    pub fn from_brake(brake: bool) -> Self {
        if brake {
            NeutralMode::Brake
        } else {
            NeutralMode::Coast
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvertType {
    None,
    InvertMotorOutput,
    /// Followers only: match the master's direction
    FollowMaster,
    /// Followers only: run opposite to the master
    OpposeMaster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackDevice {
    None,
    QuadEncoder,
    Analog,
    PulseWidthEncodedPosition,
    CtreMagEncoderRelative,
    CtreMagEncoderAbsolute,
}

impl FeedbackDevice {
    /// The device selected on the controller. Mag encoders are read through their quadrature lines.
    pub fn selected(self) -> Self {
        match self {
            FeedbackDevice::CtreMagEncoderRelative | FeedbackDevice::CtreMagEncoderAbsolute => {
                FeedbackDevice::QuadEncoder
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSwitchSource {
    Deactivated,
    FeedbackConnector,
    RemoteTalon(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitSwitchNormal {
    NormallyOpen,
    NormallyClosed,
    Disabled,
}

impl From<LimitSwitchPolarity> for LimitSwitchNormal {
    fn from(polarity: LimitSwitchPolarity) -> Self {
        match polarity {
            LimitSwitchPolarity::NormallyOpen => LimitSwitchNormal::NormallyOpen,
            LimitSwitchPolarity::NormallyClosed => LimitSwitchNormal::NormallyClosed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidTerm {
    P,
    I,
    D,
    F,
}

/// Configuration writes accepted by a Talon SRX or Victor SPX
#[derive(Debug, Clone, PartialEq)]
pub enum TalonParam {
    FactoryDefault,
    Invert(InvertType),
    NeutralMode(NeutralMode),
    SelectedSensorPosition(f64),
    ControlFramePeriod { frame: TalonControlFrame, period_ms: u16 },
    StatusFramePeriod { frame: TalonStatusFrame, period_ms: u16 },
    LimitSwitchSource {
        direction: LimitDirection,
        source: LimitSwitchSource,
        normal: LimitSwitchNormal,
    },
    /// Threshold in native ticks, None disables
    SoftLimit { direction: LimitDirection, threshold: Option<i32> },
    FeedbackSensor(FeedbackDevice),
    SensorPhase(bool),
    PeakOutput { direction: LimitDirection, percent: f64 },
    NominalOutput { direction: LimitDirection, percent: f64 },
    /// Seconds from neutral to full
    ClosedLoopRamp(f64),
    OpenLoopRamp(f64),
    Gain { slot: u8, term: PidTerm, value: f64 },
    ContinuousCurrentLimit(u32),
    PeakCurrentLimit(u32),
    PeakCurrentDuration(u32),
    CurrentLimitEnable(bool),
    VoltageCompensation(bool),
    VoltageCompSaturation(f64),
    VoltageMeasurementFilter(u32),
    ProfileSlot(u8),
    /// Time between the two position samples a velocity is taken from
    VelocityMeasurementPeriodMs(u8),
    /// Samples in the rolling velocity average
    VelocityMeasurementWindow(u8),
}

/// Output commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TalonDemand {
    Disabled,
    PercentOutput(f64),
    /// Native ticks per 100 ms, arbitrary feed-forward as a percent
    Velocity { native: f64, arb_ff: f64 },
    /// Native ticks, arbitrary feed-forward as a percent
    Position { native: f64, arb_ff: f64 },
    /// Mirror the output of the Phoenix device with this id
    Follower(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TalonSignal {
    SensorPosition,
    SensorVelocity,
    ClosedLoopError,
    MotorOutputVoltage,
    BusVoltage,
    SupplyCurrent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TalonFaults {
    pub forward_limit_switch: bool,
    pub reverse_limit_switch: bool,
}

/// One Phoenix controller on the CAN bus
pub trait TalonDevice {
    fn device_id(&self) -> u8;

    fn configure(&mut self, param: TalonParam) -> BusResult<()>;

    fn set(&mut self, demand: TalonDemand) -> BusResult<()>;

    fn read(&self, signal: TalonSignal) -> BusResult<f64>;

    /// Raw contact state of the switch on the feedback connector, ignoring polarity
    fn limit_switch_closed(&self, direction: LimitDirection) -> BusResult<bool>;

    fn faults(&self) -> BusResult<TalonFaults>;
}

/// Continuous limit at `amps` with no peak allowance, or current limiting off
pub fn configure_current_limit<D: TalonDevice + ?Sized>(
    device: &mut D,
    amps: Option<u32>,
) -> BusResult<()> {
    match amps {
        Some(amps) => {
            debug!("Device {}: current limit {}A", device.device_id(), amps);
            device.configure(TalonParam::ContinuousCurrentLimit(amps))?;
            device.configure(TalonParam::PeakCurrentLimit(0))?;
            device.configure(TalonParam::PeakCurrentDuration(0))?;
            device.configure(TalonParam::CurrentLimitEnable(true))
        }
        None => device.configure(TalonParam::CurrentLimitEnable(false)),
    }
}

/// Compensate to the nominal battery voltage averaged over `samples`, or disable compensation
pub fn configure_voltage_compensation<D: TalonDevice + ?Sized>(
    device: &mut D,
    samples: Option<u32>,
) -> BusResult<()> {
    match samples {
        Some(samples) => {
            device.configure(TalonParam::VoltageCompSaturation(NOMINAL_BATTERY_VOLTAGE))?;
            device.configure(TalonParam::VoltageMeasurementFilter(samples))?;
            device.configure(TalonParam::VoltageCompensation(true))
        }
        None => device.configure(TalonParam::VoltageCompensation(false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::recording::RecordingTalon;

    #[test]
    fn test_mag_encoders_select_quadrature() {
        assert_eq!(
            FeedbackDevice::CtreMagEncoderRelative.selected(),
            FeedbackDevice::QuadEncoder
        );
        assert_eq!(
            FeedbackDevice::CtreMagEncoderAbsolute.selected(),
            FeedbackDevice::QuadEncoder
        );
        assert_eq!(FeedbackDevice::Analog.selected(), FeedbackDevice::Analog);
    }

    #[test]
    fn test_current_limit_has_no_peak() {
        let mut talon = RecordingTalon::new(3);
        configure_current_limit(&mut talon, Some(40)).unwrap();
        assert_eq!(
            talon.params(),
            vec![
                TalonParam::ContinuousCurrentLimit(40),
                TalonParam::PeakCurrentLimit(0),
                TalonParam::PeakCurrentDuration(0),
                TalonParam::CurrentLimitEnable(true),
            ]
        );
    }

    #[test]
    fn test_voltage_compensation_off() {
        let mut talon = RecordingTalon::new(3);
        configure_voltage_compensation(&mut talon, None).unwrap();
        assert_eq!(talon.params(), vec![TalonParam::VoltageCompensation(false)]);
    }
}
