// Arbitrary feed-forward term layered on top of the closed loop

use serde::{Deserialize, Serialize};

/// Simple motor feed-forward: `ks * sign(v) + kv * v + ka * a`, in volts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedForward {
    /// Static gain, volts
    #[serde(default)]
    pub ks: f64,
    /// Velocity gain, volts per (ft/s)
    #[serde(default)]
    pub kv: f64,
    /// Acceleration gain, volts per (ft/s^2)
    #[serde(default)]
    pub ka: f64,
}

impl FeedForward {
    pub fn new(ks: f64, kv: f64, ka: f64) -> Self {
        Self { ks, kv, ka }
    }

    /// Feed-forward for a constant velocity
    pub fn calculate(&self, velocity: f64) -> f64 {
        self.calculate_with_acceleration(velocity, 0.0)
    }

    pub fn calculate_with_acceleration(&self, velocity: f64, acceleration: f64) -> f64 {
        self.ks * signum(velocity) + self.kv * velocity + self.ka * acceleration
    }
}

/// Sign with `signum(0) == 0`, unlike `f64::signum`
fn signum(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
