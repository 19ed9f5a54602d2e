// Per-gear closed-loop settings and the set of gears a motor can switch between

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{MotorError, Result};
use super::feed_forward::FeedForward;
use crate::config::NOMINAL_BATTERY_VOLTAGE;

/// Named gears for two-speed transmissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gear {
    Low,
    High,
}

impl Gear {
    pub fn number(self) -> u32 {
        match self {
            Gear::Low => 1,
            Gear::High => 2,
        }
    }
}

impl From<Gear> for u32 {
    fn from(gear: Gear) -> Self {
        gear.number()
    }
}

/// Settings that change with the selected gear.
///
/// Voltages are in volts, speeds in feet per second, ramp rate in volts per second.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GearProfile {
    /// Gear number, ignored when `gear` is set
    #[serde(default)]
    pub gear_num: u32,
    #[serde(default)]
    pub gear: Option<Gear>,
    #[serde(default)]
    pub k_p: f64,
    #[serde(default)]
    pub k_i: f64,
    #[serde(default)]
    pub k_d: f64,
    /// None means no ramp
    #[serde(default)]
    pub ramp_rate: Option<f64>,
    #[serde(default)]
    pub fwd_peak_output_voltage: Option<f64>,
    #[serde(default)]
    pub rev_peak_output_voltage: Option<f64>,
    #[serde(default)]
    pub fwd_nominal_output_voltage: Option<f64>,
    #[serde(default)]
    pub rev_nominal_output_voltage: Option<f64>,
    /// Without a max speed the gear has no velocity mode
    #[serde(default)]
    pub max_speed: Option<f64>,
    /// Overrides the motor's post-encoder gearing while this gear is active
    #[serde(default)]
    pub post_encoder_gearing: Option<f64>,
    #[serde(default)]
    pub feed_forward: FeedForward,
}

impl GearProfile {
    /// Default settings for the given gear number
    pub fn numbered(gear_num: u32) -> Self {
        Self {
            gear_num,
            ..Self::default()
        }
    }

    pub fn index(&self) -> u32 {
        self.gear.map(Gear::number).unwrap_or(self.gear_num)
    }

    pub fn fwd_peak_output_voltage(&self) -> f64 {
        self.fwd_peak_output_voltage
            .unwrap_or(NOMINAL_BATTERY_VOLTAGE)
    }

    pub fn rev_peak_output_voltage(&self) -> f64 {
        self.rev_peak_output_voltage
            .unwrap_or(-self.fwd_peak_output_voltage())
    }

    pub fn fwd_nominal_output_voltage(&self) -> f64 {
        self.fwd_nominal_output_voltage.unwrap_or(0.0)
    }

    pub fn rev_nominal_output_voltage(&self) -> f64 {
        self.rev_nominal_output_voltage
            .unwrap_or(-self.fwd_nominal_output_voltage())
    }

    /// Seconds from neutral to full output, 0 for no ramp
    pub fn ramp_seconds(&self) -> f64 {
        match self.ramp_rate {
            Some(rate) if rate > 0.0 => 1.0 / (rate / NOMINAL_BATTERY_VOLTAGE),
            _ => 0.0,
        }
    }
}

/// Immutable gear profiles plus the index of the active one
#[derive(Debug, Clone)]
pub struct GearSet {
    profiles: BTreeMap<u32, GearProfile>,
    active: u32,
}

impl GearSet {
    /// Build the gear map and pick the starting gear.
    ///
    /// The starting gear is `starting_gear` if given, else `starting_gear_num`, else the
    /// lowest configured gear. An empty profile list yields a single default gear 0.
    pub fn new(
        motor: &str,
        profiles: &[GearProfile],
        starting_gear: Option<Gear>,
        starting_gear_num: Option<u32>,
    ) -> Result<Self> {
        let mut map = BTreeMap::new();
        if profiles.is_empty() {
            map.insert(0, GearProfile::numbered(0));
        }
        for profile in profiles {
            let index = profile.index();
            if map.insert(index, profile.clone()).is_some() {
                return Err(MotorError::DuplicateGear {
                    motor: motor.to_string(),
                    gear: index,
                });
            }
        }

        let active = match (starting_gear, starting_gear_num) {
            (Some(gear), _) => gear.number(),
            (None, Some(num)) => num,
            // map is never empty here
            (None, None) => map.keys().next().copied().unwrap_or_default(),
        };
        if !map.contains_key(&active) {
            return Err(MotorError::UnknownGear {
                motor: motor.to_string(),
                gear: active,
            });
        }

        Ok(Self {
            profiles: map,
            active,
        })
    }

    pub fn active_index(&self) -> u32 {
        self.active
    }

    pub fn active(&self) -> &GearProfile {
        &self.profiles[&self.active]
    }

    /// Look up a gear, failing with `UnknownGear` if absent
    pub fn profile(&self, motor: &str, gear: u32) -> Result<&GearProfile> {
        self.profiles.get(&gear).ok_or_else(|| MotorError::UnknownGear {
            motor: motor.to_string(),
            gear,
        })
    }

    /// Make `gear` active and return its profile
    pub fn switch_to(&mut self, motor: &str, gear: u32) -> Result<&GearProfile> {
        self.profile(motor, gear)?;
        self.active = gear;
        Ok(self.active())
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.profiles.keys().copied()
    }
}
