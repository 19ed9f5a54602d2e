// REV SPARK MAX device interface
//
// The integrated encoder reports position in rotations and velocity in RPM. Arbitrary
// feed-forward is given in volts.

use super::error::BusResult;
use super::frames::SparkPeriodicFrame;
use super::limits::{LimitDirection, LimitSwitchPolarity};
use super::phoenix::PidTerm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleMode {
    Coast,
    Brake,
}

impl IdleMode {
    pub fn from_brake(brake: bool) -> Self {
        if brake {
            IdleMode::Brake
        } else {
            IdleMode::Coast
        }
    }
}

/// What a SPARK MAX follower mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowTarget {
    Spark { id: u8, inverted: bool },
    /// External follower mode, mirrors a Phoenix controller
    Phoenix { id: u8 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SparkParam {
    RestoreFactoryDefaults,
    Inverted(bool),
    IdleMode(IdleMode),
    /// Rotations
    EncoderPosition(f64),
    ControlFramePeriod(u16),
    PeriodicFramePeriod { frame: SparkPeriodicFrame, period_ms: u16 },
    /// Seconds from neutral to full
    ClosedLoopRampRate(f64),
    OpenLoopRampRate(f64),
    Gain { slot: u8, term: PidTerm, value: f64 },
    OutputRange { slot: u8, min: f64, max: f64 },
    /// Rotations, None disables
    SoftLimit { direction: LimitDirection, rotations: Option<f32> },
    /// Switch read from the controller `source`; None polarity disables it
    LimitSwitch {
        source: u8,
        direction: LimitDirection,
        polarity: Option<LimitSwitchPolarity>,
    },
    SmartCurrentLimit(u32),
    /// Nominal volts, None disables
    VoltageCompensation(Option<f64>),
    Follow(FollowTarget),
    BurnFlash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SparkReference {
    Disabled,
    DutyCycle(f64),
    Voltage(f64),
    Velocity { rpm: f64, arb_ff_volts: f64 },
    Position { rotations: f64, arb_ff_volts: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SparkSignal {
    /// Rotations
    Position,
    /// RPM
    Velocity,
    /// Fraction of bus voltage
    AppliedOutput,
    BusVoltage,
    OutputCurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SparkFault {
    HardLimitForward,
    HardLimitReverse,
}

/// One SPARK MAX on the CAN bus
pub trait SparkDevice {
    fn device_id(&self) -> u8;

    fn configure(&mut self, param: SparkParam) -> BusResult<()>;

    fn set_reference(&mut self, reference: SparkReference) -> BusResult<()>;

    fn read(&self, signal: SparkSignal) -> BusResult<f64>;

    /// Whether the switch on controller `source` is pressed, with its configured polarity applied
    fn limit_switch_pressed(&self, source: u8, direction: LimitDirection) -> BusResult<bool>;

    fn fault(&self, fault: SparkFault) -> BusResult<bool>;
}
