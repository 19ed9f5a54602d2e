// Follower motors
//
// A follower mirrors its master's output and never runs its own closed loop. The master is
// referenced by CAN id only. Brake mode, current limit and voltage compensation are programmed on
// the follower itself before the follow command, since they do not propagate from the master.

use tracing::{debug, info};

use super::error::{MotorError, Result};
use super::frames::{SparkFramePeriods, TalonFramePeriods, TalonStatusFrame};
use super::limits::LimitDirection;
use super::phoenix::{
    configure_current_limit, configure_voltage_compensation, InvertType, LimitSwitchNormal,
    LimitSwitchSource, NeutralMode, TalonDemand, TalonDevice, TalonParam, TalonSignal,
};
use super::power::ResistanceLink;
use super::rev::{FollowTarget, IdleMode, SparkDevice, SparkParam, SparkSignal};
use crate::config::{DEFAULT_VOLTAGE_COMP_SAMPLES, NOMINAL_BATTERY_VOLTAGE};
use crate::messages::FollowerTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerFamily {
    Phoenix,
    Spark,
}

impl ControllerFamily {
    pub fn label(self) -> &'static str {
        match self {
            ControllerFamily::Phoenix => "Phoenix",
            ControllerFamily::Spark => "SPARK MAX",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterIdentity {
    pub id: u8,
    pub family: ControllerFamily,
}

/// Everything a follower copies from its master
#[derive(Debug, Clone)]
pub struct MasterBinding {
    pub master: MasterIdentity,
    pub brake_mode: bool,
    /// Amps, None for no limit
    pub current_limit: Option<u32>,
    /// Filter window, None when the master does not compensate
    pub voltage_comp_samples: Option<u32>,
    pub resistance: Option<ResistanceLink>,
}

pub trait Follower {
    fn port(&self) -> u8;

    /// The bound master, None until `bind`
    fn master(&self) -> Option<MasterIdentity>;

    /// Program the follower from its master's settings and start following. Write-once.
    fn bind(&mut self, binding: &MasterBinding) -> Result<()>;

    fn output_current(&self) -> Result<f64>;

    fn output_voltage(&self) -> Result<f64>;

    /// Supply voltage measured at the controller
    fn bus_voltage(&self) -> Result<f64>;

    fn resistance_link(&self) -> Option<&ResistanceLink>;

    /// Wiring resistance in ohms, None without a PDP and estimator or a good fit
    fn resistance(&self) -> Option<f64> {
        let link = self.resistance_link()?;
        link.estimator.borrow().slope()
    }

    /// Feed one (current, PDP voltage - bus voltage) point to the estimator
    fn record_resistance_sample(&self) -> Result<()> {
        let Some(link) = self.resistance_link() else {
            return Ok(());
        };
        let current = self.output_current()?;
        let sag = link.pdp.voltage() - self.bus_voltage()?;
        link.estimator.borrow_mut().add_point(current, sag);
        Ok(())
    }

    fn telemetry(&self) -> Result<FollowerTelemetry> {
        Ok(FollowerTelemetry {
            port: self.port(),
            master: self.master().map(|master| master.id),
            output_current: self.output_current()?,
            output_voltage: self.output_voltage()?,
            resistance: self.resistance(),
        })
    }
}

fn check_unbound(port: u8, master: Option<MasterIdentity>) -> Result<()> {
    match master {
        Some(master) => Err(MotorError::FollowerAlreadyBound {
            port,
            master: master.id,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoenixKind {
    TalonSrx,
    /// No current limiting and no feedback connector
    VictorSpx,
}

/// Talon SRX or Victor SPX follower
pub struct PhoenixFollower<D: TalonDevice> {
    device: D,
    kind: PhoenixKind,
    master: Option<MasterIdentity>,
    resistance: Option<ResistanceLink>,
}

impl<D: TalonDevice> PhoenixFollower<D> {
    /// Inversion defaults to following the master's direction
    pub fn new(mut device: D, kind: PhoenixKind, invert: Option<InvertType>) -> Result<Self> {
        let id = device.device_id();
        info!("Configuring {:?} follower on port {}", kind, id);

        device.configure(TalonParam::Invert(invert.unwrap_or(InvertType::FollowMaster)))?;
        if kind == PhoenixKind::TalonSrx {
            for direction in LimitDirection::BOTH {
                device.configure(TalonParam::LimitSwitchSource {
                    direction,
                    source: LimitSwitchSource::Deactivated,
                    normal: LimitSwitchNormal::Disabled,
                })?;
                device.configure(TalonParam::SoftLimit {
                    direction,
                    threshold: None,
                })?;
            }
        }
        device.configure(TalonParam::PeakOutput {
            direction: LimitDirection::Forward,
            percent: 1.0,
        })?;
        if kind == PhoenixKind::VictorSpx {
            device.configure(TalonParam::PeakOutput {
                direction: LimitDirection::Reverse,
                percent: -1.0,
            })?;
        }
        configure_voltage_compensation(&mut device, Some(DEFAULT_VOLTAGE_COMP_SAMPLES))?;

        let throttled = match kind {
            PhoenixKind::TalonSrx => &TalonStatusFrame::TALON_FOLLOWER_THROTTLED[..],
            PhoenixKind::VictorSpx => &TalonStatusFrame::VICTOR_FOLLOWER_THROTTLED[..],
        };
        for param in TalonFramePeriods::follower(throttled).params() {
            device.configure(param)?;
        }

        Ok(Self {
            device,
            kind,
            master: None,
            resistance: None,
        })
    }
}

impl<D: TalonDevice> Follower for PhoenixFollower<D> {
    fn port(&self) -> u8 {
        self.device.device_id()
    }

    fn master(&self) -> Option<MasterIdentity> {
        self.master
    }

    fn bind(&mut self, binding: &MasterBinding) -> Result<()> {
        let port = self.port();
        check_unbound(port, self.master)?;
        if binding.master.family != ControllerFamily::Phoenix {
            return Err(MotorError::IncompatibleFollower {
                port,
                master: binding.master.family.label(),
            });
        }

        self.device
            .configure(TalonParam::NeutralMode(NeutralMode::from_brake(binding.brake_mode)))?;
        match self.kind {
            PhoenixKind::TalonSrx => configure_current_limit(&mut self.device, binding.current_limit)?,
            PhoenixKind::VictorSpx => {
                if binding.current_limit.is_some() {
                    debug!("Victor SPX {} has no current limiting, skipping", port);
                }
            }
        }
        configure_voltage_compensation(&mut self.device, binding.voltage_comp_samples)?;
        self.device.set(TalonDemand::Follower(binding.master.id))?;

        debug!("Port {} following Phoenix master {}", port, binding.master.id);
        self.master = Some(binding.master);
        self.resistance = binding.resistance.clone();
        Ok(())
    }

    fn output_current(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::SupplyCurrent)?)
    }

    fn output_voltage(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::MotorOutputVoltage)?)
    }

    fn bus_voltage(&self) -> Result<f64> {
        Ok(self.device.read(TalonSignal::BusVoltage)?)
    }

    fn resistance_link(&self) -> Option<&ResistanceLink> {
        self.resistance.as_ref()
    }
}

/// SPARK MAX follower of a SPARK MAX or Phoenix master
pub struct SparkFollower<D: SparkDevice> {
    device: D,
    inverted: bool,
    master: Option<MasterIdentity>,
    resistance: Option<ResistanceLink>,
}

impl<D: SparkDevice> SparkFollower<D> {
    pub fn new(mut device: D, inverted: bool) -> Result<Self> {
        let id = device.device_id();
        info!("Configuring SPARK MAX follower on port {}", id);

        for direction in LimitDirection::BOTH {
            device.configure(SparkParam::LimitSwitch {
                source: id,
                direction,
                polarity: None,
            })?;
            device.configure(SparkParam::SoftLimit {
                direction,
                rotations: None,
            })?;
        }
        for param in SparkFramePeriods::follower().params("follower") {
            device.configure(param)?;
        }

        Ok(Self {
            device,
            inverted,
            master: None,
            resistance: None,
        })
    }
}

impl<D: SparkDevice> Follower for SparkFollower<D> {
    fn port(&self) -> u8 {
        self.device.device_id()
    }

    fn master(&self) -> Option<MasterIdentity> {
        self.master
    }

    fn bind(&mut self, binding: &MasterBinding) -> Result<()> {
        let port = self.port();
        check_unbound(port, self.master)?;

        self.device
            .configure(SparkParam::IdleMode(IdleMode::from_brake(binding.brake_mode)))?;
        if let Some(amps) = binding.current_limit {
            self.device.configure(SparkParam::SmartCurrentLimit(amps))?;
        }
        let compensation = binding
            .voltage_comp_samples
            .map(|_| NOMINAL_BATTERY_VOLTAGE);
        self.device
            .configure(SparkParam::VoltageCompensation(compensation))?;

        let id = binding.master.id;
        match binding.master.family {
            ControllerFamily::Spark => {
                self.device.configure(SparkParam::Follow(FollowTarget::Spark {
                    id,
                    inverted: self.inverted,
                }))?;
            }
            ControllerFamily::Phoenix => {
                // External follower mode takes no inversion flag
                self.device
                    .configure(SparkParam::Follow(FollowTarget::Phoenix { id }))?;
                self.device.configure(SparkParam::Inverted(self.inverted))?;
            }
        }

        debug!(
            "Port {} following {} master {}",
            port,
            binding.master.family.label(),
            id
        );
        self.master = Some(binding.master);
        self.resistance = binding.resistance.clone();
        Ok(())
    }

    fn output_current(&self) -> Result<f64> {
        Ok(self.device.read(SparkSignal::OutputCurrent)?)
    }

    fn output_voltage(&self) -> Result<f64> {
        let applied = self.device.read(SparkSignal::AppliedOutput)?;
        Ok(applied * self.device.read(SparkSignal::BusVoltage)?)
    }

    fn bus_voltage(&self) -> Result<f64> {
        Ok(self.device.read(SparkSignal::BusVoltage)?)
    }

    fn resistance_link(&self) -> Option<&ResistanceLink> {
        self.resistance.as_ref()
    }
}
