// Limit switch and soft limit configuration shared by both controller families

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitDirection {
    Forward,
    Reverse,
}

impl LimitDirection {
    pub const BOTH: [LimitDirection; 2] = [LimitDirection::Forward, LimitDirection::Reverse];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSwitchPolarity {
    NormallyOpen,
    NormallyClosed,
}

impl LimitSwitchPolarity {
    /// Whether a switch with this polarity is triggered given its contact state
    pub fn is_triggered(self, closed: bool) -> bool {
        match self {
            LimitSwitchPolarity::NormallyOpen => closed,
            LimitSwitchPolarity::NormallyClosed => !closed,
        }
    }
}

/// Limits for one motor. Every field left out stays disabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitConfig {
    #[serde(default)]
    pub fwd_limit_switch: Option<LimitSwitchPolarity>,
    #[serde(default)]
    pub rev_limit_switch: Option<LimitSwitchPolarity>,
    /// CAN id of the controller the switches are wired to, if not this one
    #[serde(default)]
    pub remote_limit_switch_id: Option<u8>,
    /// Feet; ignored without an encoder
    #[serde(default)]
    pub fwd_soft_limit: Option<f64>,
    #[serde(default)]
    pub rev_soft_limit: Option<f64>,
}

impl LimitConfig {
    pub fn switch(&self, direction: LimitDirection) -> Option<LimitSwitchPolarity> {
        match direction {
            LimitDirection::Forward => self.fwd_limit_switch,
            LimitDirection::Reverse => self.rev_limit_switch,
        }
    }

    pub fn soft_limit(&self, direction: LimitDirection) -> Option<f64> {
        match direction {
            LimitDirection::Forward => self.fwd_soft_limit,
            LimitDirection::Reverse => self.rev_soft_limit,
        }
    }
}
