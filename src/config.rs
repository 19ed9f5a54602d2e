// Electrical constants, CAN frame bounds, motor configuration records

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::motor::frames::{SparkFramePeriods, TalonFramePeriods};
use crate::motor::gear::{Gear, GearProfile};
use crate::motor::limits::LimitConfig;
use crate::motor::phoenix::{FeedbackDevice, InvertType};

// Battery voltage all percent outputs and feed-forward volts are scaled against
pub const NOMINAL_BATTERY_VOLTAGE: f64 = 12.0;

// Voltage compensation filter window (samples)
pub const DEFAULT_VOLTAGE_COMP_SAMPLES: u32 = 32;

// Status frame period for followers, they only report current and voltage
pub const FOLLOWER_STATUS_PERIOD_MS: u16 = 100;

// SPARK MAX control frame bounds
pub const SPARK_CONTROL_FRAME_MIN_MS: u16 = 1;
pub const SPARK_CONTROL_FRAME_MAX_MS: u16 = 100;

// Closed-loop slot used for every gear
pub const PID_SLOT: u8 = 0;

// Talon velocity measurement: 10 ms delta, averaged over 10 samples
pub const VELOCITY_MEASUREMENT_PERIOD_MS: u8 = 10;
pub const VELOCITY_MEASUREMENT_WINDOW: u8 = 10;

/// Settings common to both controller families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorConfig {
    /// CAN id
    pub port: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub reverse_output: bool,
    #[serde(default)]
    pub enable_brake_mode: bool,
    #[serde(flatten)]
    pub limits: LimitConfig,
    /// Output rotations per encoder rotation, default 1
    #[serde(default)]
    pub post_encoder_gearing: Option<f64>,
    /// Feet per output rotation, default 1
    #[serde(default)]
    pub unit_per_rotation: Option<f64>,
    /// Amps; None leaves current limiting off
    #[serde(default)]
    pub current_limit: Option<u32>,
    #[serde(default)]
    pub enable_voltage_comp: bool,
    #[serde(default)]
    pub gears: Vec<GearProfile>,
    #[serde(default)]
    pub starting_gear: Option<Gear>,
    #[serde(default)]
    pub starting_gear_num: Option<u32>,
}

impl MotorConfig {
    pub fn new(port: u8) -> Self {
        Self {
            port,
            name: None,
            reverse_output: false,
            enable_brake_mode: false,
            limits: LimitConfig::default(),
            post_encoder_gearing: None,
            unit_per_rotation: None,
            current_limit: None,
            enable_voltage_comp: false,
            gears: Vec::new(),
            starting_gear: None,
            starting_gear_num: None,
        }
    }

    /// Configured name, or `<family>_<port>`
    pub fn display_name(&self, family: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", family, self.port))
    }

    pub fn post_encoder_gearing(&self) -> f64 {
        self.post_encoder_gearing.unwrap_or(1.0)
    }

    pub fn unit_per_rotation(&self) -> f64 {
        self.unit_per_rotation.unwrap_or(1.0)
    }
}

/// A follower attached to a master, keyed by controller type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FollowerSpec {
    Talon {
        port: u8,
        #[serde(default)]
        invert: Option<InvertType>,
    },
    Victor {
        port: u8,
        #[serde(default)]
        invert: Option<InvertType>,
    },
    Spark {
        port: u8,
        #[serde(default)]
        inverted: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalonConfig {
    #[serde(flatten)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub feedback_device: Option<FeedbackDevice>,
    /// Encoder counts per rotation, required with a feedback device
    #[serde(default)]
    pub encoder_cpr: Option<u32>,
    #[serde(default)]
    pub reverse_sensor: bool,
    /// Defaults to 32
    #[serde(default)]
    pub voltage_comp_samples: Option<u32>,
    #[serde(default)]
    pub frames: TalonFramePeriods,
    #[serde(default)]
    pub followers: Vec<FollowerSpec>,
}

impl TalonConfig {
    pub fn new(motor: MotorConfig) -> Self {
        Self {
            motor,
            feedback_device: None,
            encoder_cpr: None,
            reverse_sensor: false,
            voltage_comp_samples: None,
            frames: TalonFramePeriods::default(),
            followers: Vec::new(),
        }
    }

    pub fn voltage_comp_samples(&self) -> u32 {
        self.voltage_comp_samples
            .unwrap_or(DEFAULT_VOLTAGE_COMP_SAMPLES)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparkConfig {
    #[serde(flatten)]
    pub motor: MotorConfig,
    #[serde(default)]
    pub frames: SparkFramePeriods,
    #[serde(default)]
    pub followers: Vec<FollowerSpec>,

    // Talon-only; accepted so shared configs load, ignored with a warning
    #[serde(default)]
    pub feedback_device: Option<FeedbackDevice>,
    #[serde(default)]
    pub encoder_cpr: Option<u32>,
    #[serde(default)]
    pub reverse_sensor: Option<bool>,
    #[serde(default)]
    pub voltage_comp_samples: Option<u32>,
}

impl SparkConfig {
    pub fn new(motor: MotorConfig) -> Self {
        Self {
            motor,
            frames: SparkFramePeriods::default(),
            followers: Vec::new(),
            feedback_device: None,
            encoder_cpr: None,
            reverse_sensor: None,
            voltage_comp_samples: None,
        }
    }

    /// Names of the Talon-only fields that were set
    pub fn unsupported_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.feedback_device.is_some() {
            fields.push("feedback_device");
        }
        if self.encoder_cpr.is_some() {
            fields.push("encoder_cpr");
        }
        if self.reverse_sensor.is_some() {
            fields.push("reverse_sensor");
        }
        if self.voltage_comp_samples.is_some() {
            fields.push("voltage_comp_samples");
        }
        fields
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControllerConfig {
    Talon(TalonConfig),
    Spark(SparkConfig),
}

/// Top-level motor configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorsFile {
    pub motors: Vec<ControllerConfig>,
}

impl MotorsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid motor configuration: {0}")]
    Json(#[from] serde_json::Error),
}
