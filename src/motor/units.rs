// Unit conversions between controller-native units and output-shaft units
//
// Position: native ticks -> rotations -> feet
// Velocity: native velocity -> rotations/sec -> feet/sec
//
// Post-encoder gearing is applied between the encoder and the output shaft, and
// unit_per_rotation maps output rotations to feet.

/// How a controller family reports velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeVelocity {
    /// Ticks per 100 ms window (Talon SRX)
    TicksPer100Ms,
    /// Rotations per minute (SPARK MAX)
    Rpm,
}

/// Quadrature encoders report 4 edges per count
pub const QUADRATURE_EDGES_PER_COUNT: f64 = 4.0;

/// Conversion parameters for one motor.
///
/// `ticks_per_rotation` is `None` when no encoder is attached; every conversion then
/// returns `None` instead of a number.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitConversion {
    ticks_per_rotation: Option<f64>,
    native_velocity: NativeVelocity,
    post_encoder_gearing: f64,
    unit_per_rotation: f64,
}

impl UnitConversion {
    pub fn new(
        ticks_per_rotation: Option<f64>,
        native_velocity: NativeVelocity,
        post_encoder_gearing: f64,
        unit_per_rotation: f64,
    ) -> Self {
        Self {
            ticks_per_rotation,
            native_velocity,
            post_encoder_gearing,
            unit_per_rotation,
        }
    }

    /// Talon conversion: native position in quadrature edges, velocity per 100 ms
    pub fn talon(
        encoder_cpr: Option<u32>,
        post_encoder_gearing: f64,
        unit_per_rotation: f64,
    ) -> Self {
        let ticks = encoder_cpr.map(|cpr| f64::from(cpr) * QUADRATURE_EDGES_PER_COUNT);
        Self::new(
            ticks,
            NativeVelocity::TicksPer100Ms,
            post_encoder_gearing,
            unit_per_rotation,
        )
    }

    /// SPARK MAX conversion: integrated encoder reports rotations and RPM
    pub fn spark(post_encoder_gearing: f64, unit_per_rotation: f64) -> Self {
        Self::new(
            Some(1.0),
            NativeVelocity::Rpm,
            post_encoder_gearing,
            unit_per_rotation,
        )
    }

    pub fn has_encoder(&self) -> bool {
        self.ticks_per_rotation.is_some()
    }

    pub fn post_encoder_gearing(&self) -> f64 {
        self.post_encoder_gearing
    }

    pub fn set_post_encoder_gearing(&mut self, gearing: f64) {
        self.post_encoder_gearing = gearing;
    }

    pub fn unit_per_rotation(&self) -> f64 {
        self.unit_per_rotation
    }

    /// Native position to feet, including post-encoder gearing
    pub fn encoder_to_unit(&self, native: f64) -> Option<f64> {
        let ticks = self.ticks_per_rotation?;
        Some(native / ticks * self.post_encoder_gearing * self.unit_per_rotation)
    }

    /// Feet to native position, including post-encoder gearing
    pub fn unit_to_encoder(&self, units: f64) -> Option<f64> {
        let ticks = self.ticks_per_rotation?;
        Some(units / self.unit_per_rotation * ticks / self.post_encoder_gearing)
    }

    /// Native velocity to encoder rotations per second (no gearing applied)
    pub fn native_to_rps(&self, native: f64) -> Option<f64> {
        match self.native_velocity {
            NativeVelocity::TicksPer100Ms => {
                let ticks = self.ticks_per_rotation?;
                // 10 windows of 100 ms per second
                Some(native / ticks * 10.0)
            }
            NativeVelocity::Rpm => Some(native / 60.0),
        }
    }

    /// Encoder rotations per second to native velocity (no gearing applied)
    pub fn rps_to_native(&self, rps: f64) -> Option<f64> {
        match self.native_velocity {
            NativeVelocity::TicksPer100Ms => {
                let ticks = self.ticks_per_rotation?;
                Some(rps / 10.0 * ticks)
            }
            NativeVelocity::Rpm => Some(rps * 60.0),
        }
    }

    /// Native velocity to feet per second at the output shaft
    pub fn encoder_to_ups(&self, native: f64) -> Option<f64> {
        let rps = self.native_to_rps(native)?;
        Some(rps * self.post_encoder_gearing * self.unit_per_rotation)
    }

    /// Feet per second at the output shaft to native velocity
    pub fn ups_to_encoder(&self, ups: f64) -> Option<f64> {
        self.rps_to_native(ups / self.post_encoder_gearing / self.unit_per_rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPS * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_talon_position_scaling() {
        // 256 CPR -> 1024 edges per rotation, 1:2 gearing after the encoder, 0.5 ft per rotation
        let units = UnitConversion::talon(Some(256), 0.5, 0.5);
        assert!(close(units.encoder_to_unit(1024.0).unwrap(), 0.25));
        assert!(close(units.unit_to_encoder(0.25).unwrap(), 1024.0));
    }

    #[test]
    fn test_talon_velocity_scaling() {
        // 1024 edges per 100 ms is 10 rotations per second
        let units = UnitConversion::talon(Some(256), 1.0, 1.0);
        assert!(close(units.native_to_rps(1024.0).unwrap(), 10.0));
        assert!(close(units.rps_to_native(10.0).unwrap(), 1024.0));
        assert!(close(units.encoder_to_ups(1024.0).unwrap(), 10.0));
    }

    #[test]
    fn test_spark_velocity_is_rpm() {
        let units = UnitConversion::spark(1.0, 2.0);
        assert!(close(units.native_to_rps(120.0).unwrap(), 2.0));
        assert!(close(units.encoder_to_ups(120.0).unwrap(), 4.0));
        assert!(close(units.encoder_to_unit(3.0).unwrap(), 6.0));
    }

    #[test]
    fn test_no_encoder_is_unavailable() {
        let units = UnitConversion::talon(None, 1.0, 1.0);
        assert!(!units.has_encoder());
        assert_eq!(units.encoder_to_unit(100.0), None);
        assert_eq!(units.unit_to_encoder(1.0), None);
        assert_eq!(units.encoder_to_ups(100.0), None);
        assert_eq!(units.ups_to_encoder(1.0), None);
    }

    #[test]
    fn test_round_trips_hold_across_parameters() {
        let cases = [
            (Some(1), 1.0, 1.0),
            (Some(128), 1.0 / 70.0, 0.5),
            (Some(4096), 3.5, std::f64::consts::PI / 6.0),
        ];
        let values = [-37.25, -1.0, 0.0, 0.001, 12.5, 1.0e4];

        for &(cpr, gearing, upr) in &cases {
            for units in [
                UnitConversion::talon(cpr, gearing, upr),
                UnitConversion::spark(gearing, upr),
            ] {
                for &x in &values {
                    let pos = units.encoder_to_unit(units.unit_to_encoder(x).unwrap());
                    assert!(close(pos.unwrap(), x), "position round trip {x}");
                    let vel = units.encoder_to_ups(units.ups_to_encoder(x).unwrap());
                    assert!(close(vel.unwrap(), x), "velocity round trip {x}");
                }
            }
        }
    }

    #[test]
    fn test_gearing_change_is_visible() {
        let mut units = UnitConversion::spark(1.0, 1.0);
        assert!(close(units.encoder_to_unit(10.0).unwrap(), 10.0));
        units.set_post_encoder_gearing(0.1);
        assert!(close(units.encoder_to_unit(10.0).unwrap(), 1.0));
    }
}
