// Motor control abstraction over CAN motor controllers
//
// Provides:
// - Unit conversion, per-gear settings and feed-forward shared by every controller
// - The SmartMotor trait with Talon SRX and SPARK MAX backends
// - Talon SRX, Victor SPX and SPARK MAX followers
// - Register-level device interfaces and recording devices for offline use

pub mod error;
pub mod feed_forward;
pub mod follower;
pub mod frames;
pub mod gear;
pub mod limits;
pub mod phoenix;
pub mod power;
pub mod recording;
pub mod rev;
pub mod smart;
mod spark;
mod talon;
pub mod units;

pub use error::{BusError, MotorError, Result};
pub use feed_forward::FeedForward;
pub use follower::{Follower, MasterBinding, PhoenixFollower, PhoenixKind, SparkFollower};
pub use gear::{Gear, GearProfile, GearSet};
pub use power::{PowerSource, ResistanceEstimator, ResistanceLink, RunningLinReg};
pub use smart::{ControlMode, SmartMotor};
pub use spark::SparkMotor;
pub use talon::TalonMotor;
pub use units::UnitConversion;
