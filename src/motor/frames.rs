// CAN frame update intervals
//
// Each status/control frame has its own period in milliseconds. Frames left out of a map keep the
// controller's default rate. Slowing frames down keeps bus utilization bounded as devices are added.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::phoenix::TalonParam;
use super::rev::SparkParam;
use crate::config::{FOLLOWER_STATUS_PERIOD_MS, SPARK_CONTROL_FRAME_MAX_MS, SPARK_CONTROL_FRAME_MIN_MS};

/// Talon SRX / Victor SPX status frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalonStatusFrame {
    Status1General,
    Status2Feedback0,
    Status3Quadrature,
    Status4AinTempVbat,
    Status6Misc,
    Status7CommStatus,
    Status8PulseWidth,
    Status9MotProfBuffer,
    Status10MotionMagic,
    Status11UartGadgeteer,
    Status12Feedback1,
    Status13BasePidf0,
    Status14TurnPidf1,
    Status15FirmwareApiStatus,
}

impl TalonStatusFrame {
    /// Frames a Talon follower slows down; it only needs to report current and voltage
    pub const TALON_FOLLOWER_THROTTLED: [TalonStatusFrame; 12] = [
        TalonStatusFrame::Status1General,
        TalonStatusFrame::Status6Misc,
        TalonStatusFrame::Status7CommStatus,
        TalonStatusFrame::Status9MotProfBuffer,
        TalonStatusFrame::Status10MotionMagic,
        TalonStatusFrame::Status12Feedback1,
        TalonStatusFrame::Status13BasePidf0,
        TalonStatusFrame::Status14TurnPidf1,
        TalonStatusFrame::Status15FirmwareApiStatus,
        TalonStatusFrame::Status3Quadrature,
        TalonStatusFrame::Status8PulseWidth,
        TalonStatusFrame::Status11UartGadgeteer,
    ];

    /// Victor SPX has no quadrature, pulse-width or gadgeteer frames
    pub const VICTOR_FOLLOWER_THROTTLED: [TalonStatusFrame; 9] = [
        TalonStatusFrame::Status1General,
        TalonStatusFrame::Status2Feedback0,
        TalonStatusFrame::Status6Misc,
        TalonStatusFrame::Status7CommStatus,
        TalonStatusFrame::Status9MotProfBuffer,
        TalonStatusFrame::Status10MotionMagic,
        TalonStatusFrame::Status12Feedback1,
        TalonStatusFrame::Status13BasePidf0,
        TalonStatusFrame::Status14TurnPidf1,
    ];
}

/// Talon SRX control frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalonControlFrame {
    Control3General,
    Control4Advanced,
    Control6MotProfAddTrajPoint,
}

/// SPARK MAX periodic status frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SparkPeriodicFrame {
    Status0,
    Status1,
    Status2,
    Status3,
}

impl SparkPeriodicFrame {
    pub const FOLLOWER_THROTTLED: [SparkPeriodicFrame; 3] = [
        SparkPeriodicFrame::Status0,
        SparkPeriodicFrame::Status1,
        SparkPeriodicFrame::Status2,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TalonFramePeriods {
    #[serde(default)]
    pub status_ms: BTreeMap<TalonStatusFrame, u16>,
    #[serde(default)]
    pub control_ms: BTreeMap<TalonControlFrame, u16>,
}

impl TalonFramePeriods {
    /// Register writes for every configured frame, control frames first
    pub fn params(&self) -> Vec<TalonParam> {
        let control = self
            .control_ms
            .iter()
            .map(|(&frame, &period_ms)| TalonParam::ControlFramePeriod { frame, period_ms });
        let status = self
            .status_ms
            .iter()
            .map(|(&frame, &period_ms)| TalonParam::StatusFramePeriod { frame, period_ms });
        control.chain(status).collect()
    }

    /// Throttle the given frames to the follower period
    pub fn follower(frames: &[TalonStatusFrame]) -> Self {
        Self {
            status_ms: frames
                .iter()
                .map(|&frame| (frame, FOLLOWER_STATUS_PERIOD_MS))
                .collect(),
            control_ms: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparkFramePeriods {
    #[serde(default)]
    pub status_ms: BTreeMap<SparkPeriodicFrame, u16>,
    /// The SPARK MAX has a single control frame period, 1-100 ms
    #[serde(default)]
    pub control_ms: Option<u16>,
}

impl SparkFramePeriods {
    pub fn params(&self, motor: &str) -> Vec<SparkParam> {
        let control = self.control_ms.map(|period_ms| {
            let clamped = period_ms.clamp(SPARK_CONTROL_FRAME_MIN_MS, SPARK_CONTROL_FRAME_MAX_MS);
            if clamped != period_ms {
                warn!(
                    "{}: control frame period {}ms out of range, using {}ms",
                    motor, period_ms, clamped
                );
            }
            SparkParam::ControlFramePeriod(clamped)
        });
        let status = self
            .status_ms
            .iter()
            .map(|(&frame, &period_ms)| SparkParam::PeriodicFramePeriod { frame, period_ms });
        control.into_iter().chain(status).collect()
    }

    pub fn follower() -> Self {
        Self {
            status_ms: SparkPeriodicFrame::FOLLOWER_THROTTLED
                .iter()
                .map(|&frame| (frame, FOLLOWER_STATUS_PERIOD_MS))
                .collect(),
            control_ms: None,
        }
    }
}
