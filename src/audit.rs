// Offline configuration audit
//
// Builds every configured motor against recording devices and reports what would be written to
// the controllers, plus the unit conversions each gear ends up with. No hardware is touched.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::{ConfigError, ControllerConfig, FollowerSpec, MotorsFile};
use crate::messages::MotorTelemetry;
use crate::motor::follower::{Follower, PhoenixFollower, PhoenixKind, SparkFollower};
use crate::motor::recording::{RecordingSpark, RecordingTalon};
use crate::motor::{MotorError, SmartMotor, SparkMotor, TalonMotor};

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Motor error: {0}")]
    Motor(#[from] MotorError),

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct GearAudit {
    pub gear: u32,
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    pub ramp_seconds: f64,
    pub post_encoder_gearing: f64,
    /// ft/s
    pub max_speed: Option<f64>,
    /// Max speed in controller-native units
    pub native_max_velocity: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FollowerAudit {
    pub kind: &'static str,
    pub port: u8,
    pub registers: Vec<String>,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MotorAudit {
    pub family: &'static str,
    /// Register writes in the order construction issued them
    pub registers: Vec<String>,
    pub gears: Vec<GearAudit>,
    pub followers: Vec<FollowerAudit>,
    pub telemetry: MotorTelemetry,
}

enum FollowerHandle {
    Phoenix(&'static str, RecordingTalon),
    Spark(RecordingSpark),
}

impl FollowerHandle {
    fn audit(&self, port: u8) -> FollowerAudit {
        match self {
            FollowerHandle::Phoenix(kind, device) => FollowerAudit {
                kind: *kind,
                port,
                registers: debug_strings(device.params()),
                commands: debug_strings(device.demands()),
            },
            FollowerHandle::Spark(device) => FollowerAudit {
                kind: "spark",
                port,
                registers: debug_strings(device.params()),
                commands: debug_strings(device.references()),
            },
        }
    }
}

fn debug_strings<T: fmt::Debug>(items: Vec<T>) -> Vec<String> {
    items.iter().map(|item| format!("{:?}", item)).collect()
}

fn build_followers(
    specs: &[FollowerSpec],
) -> Result<(Vec<Box<dyn Follower>>, Vec<(u8, FollowerHandle)>), MotorError> {
    let mut followers: Vec<Box<dyn Follower>> = Vec::with_capacity(specs.len());
    let mut handles = Vec::with_capacity(specs.len());
    for spec in specs {
        match *spec {
            FollowerSpec::Talon { port, invert } => {
                let device = RecordingTalon::new(port);
                followers.push(Box::new(PhoenixFollower::new(
                    device.clone(),
                    PhoenixKind::TalonSrx,
                    invert,
                )?));
                handles.push((port, FollowerHandle::Phoenix("talon", device)));
            }
            FollowerSpec::Victor { port, invert } => {
                let device = RecordingTalon::new(port);
                followers.push(Box::new(PhoenixFollower::new(
                    device.clone(),
                    PhoenixKind::VictorSpx,
                    invert,
                )?));
                handles.push((port, FollowerHandle::Phoenix("victor", device)));
            }
            FollowerSpec::Spark { port, inverted } => {
                let device = RecordingSpark::new(port);
                followers.push(Box::new(SparkFollower::new(device.clone(), inverted)?));
                handles.push((port, FollowerHandle::Spark(device)));
            }
        }
    }
    Ok((followers, handles))
}

/// Visit every gear, then go back to the one the motor started in
fn audit_gears(motor: &mut dyn SmartMotor) -> Result<Vec<GearAudit>, MotorError> {
    let start = motor.gear();
    let indices: Vec<u32> = motor.gears().indices().collect();
    let mut gears = Vec::with_capacity(indices.len());
    for gear in indices {
        motor.set_gear(gear)?;
        let profile = motor.gears().active();
        gears.push(GearAudit {
            gear,
            k_p: profile.k_p,
            k_i: profile.k_i,
            k_d: profile.k_d,
            ramp_seconds: profile.ramp_seconds(),
            post_encoder_gearing: motor.units().post_encoder_gearing(),
            max_speed: profile.max_speed,
            native_max_velocity: profile.max_speed.and_then(|speed| motor.ups_to_encoder(speed)),
        });
    }
    motor.set_gear(start)?;
    Ok(gears)
}

pub fn audit_motor(config: &ControllerConfig) -> Result<MotorAudit, MotorError> {
    match config {
        ControllerConfig::Talon(talon) => {
            let (followers, handles) = build_followers(&talon.followers)?;
            let device = RecordingTalon::new(talon.motor.port);
            let mut motor = TalonMotor::new(device.clone(), talon, followers, None)?;
            let registers = debug_strings(device.params());
            Ok(MotorAudit {
                family: "talon",
                registers,
                gears: audit_gears(&mut motor)?,
                followers: handles.iter().map(|(port, h)| h.audit(*port)).collect(),
                telemetry: motor.telemetry()?,
            })
        }
        ControllerConfig::Spark(spark) => {
            let (followers, handles) = build_followers(&spark.followers)?;
            let device = RecordingSpark::new(spark.motor.port);
            let mut motor = SparkMotor::new(device.clone(), spark, followers, None)?;
            let registers = debug_strings(device.params());
            Ok(MotorAudit {
                family: "spark",
                registers,
                gears: audit_gears(&mut motor)?,
                followers: handles.iter().map(|(port, h)| h.audit(*port)).collect(),
                telemetry: motor.telemetry()?,
            })
        }
    }
}

pub fn audit_file(path: &Path) -> Result<Vec<MotorAudit>, AuditError> {
    info!("Loading motor configuration from {}", path.display());
    let file = MotorsFile::load(path)?;
    let audits = file
        .motors
        .iter()
        .map(audit_motor)
        .collect::<Result<Vec<_>, _>>()?;
    info!("Audited {} motor(s)", audits.len());
    Ok(audits)
}

/// Audit `path` and print the report, as JSON if asked
pub fn run(path: &Path, json: bool) -> Result<(), AuditError> {
    let audits = audit_file(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&audits)?);
    } else {
        for audit in &audits {
            print!("{}", audit);
        }
    }
    Ok(())
}

fn fmt_optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for MotorAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} ({} on port {}), gear {}",
            self.telemetry.name, self.family, self.telemetry.port, self.telemetry.gear
        )?;
        for register in &self.registers {
            writeln!(f, "    {}", register)?;
        }
        for gear in &self.gears {
            writeln!(
                f,
                "  gear {}: kP {} kI {} kD {}, ramp {:.3}s, gearing {}, max {} ft/s = {} native",
                gear.gear,
                gear.k_p,
                gear.k_i,
                gear.k_d,
                gear.ramp_seconds,
                gear.post_encoder_gearing,
                fmt_optional(gear.max_speed),
                fmt_optional(gear.native_max_velocity)
            )?;
        }
        for follower in &self.followers {
            writeln!(f, "  {} follower on port {}", follower.kind, follower.port)?;
            for line in follower.registers.iter().chain(&follower.commands) {
                writeln!(f, "    {}", line)?;
            }
        }
        Ok(())
    }
}
