// Telemetry snapshots pulled from motors once per control cycle

use serde::Serialize;

use crate::motor::smart::ControlMode;

/// Everything a motor reports, in physical units where an encoder allows it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotorTelemetry {
    pub name: String,
    pub port: u8,
    pub gear: u32,
    pub control_mode: ControlMode,
    pub setpoint: f64,
    pub native_setpoint: f64,
    // None without an encoder
    pub error: Option<f64>,
    pub position: Option<f64>,
    pub velocity: Option<f64>,
    pub output_voltage: f64,
    pub battery_voltage: f64,
    pub output_current: f64,
    pub fwd_limit_switch: bool,
    pub rev_limit_switch: bool,
    pub inhibited_forward: bool,
    pub inhibited_reverse: bool,
    pub followers: Vec<FollowerTelemetry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowerTelemetry {
    pub port: u8,
    pub master: Option<u8>,
    pub output_current: f64,
    pub output_voltage: f64,
    /// Ohms
    pub resistance: Option<f64>,
}
