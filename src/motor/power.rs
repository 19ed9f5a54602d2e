// Power distribution readings and wire resistance estimation
//
// Followers estimate the resistance of their supply wiring from (current, voltage drop) samples,
// where the drop is the distribution panel voltage minus the controller's bus voltage. The
// resistance is the slope of that line.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Anything that reports the voltage at the power distribution panel
pub trait PowerSource {
    fn voltage(&self) -> f64;

    /// Total current drawn through the panel
    fn current(&self) -> f64;
}

/// Fits a line through (current, voltage) samples
pub trait ResistanceEstimator {
    fn add_point(&mut self, x: f64, y: f64);

    /// Slope of the fit, None if there is not enough data or the fit is poor
    fn slope(&self) -> Option<f64>;

    fn intercept(&self) -> Option<f64>;
}

/// Shared handles a follower needs to sample its wiring resistance
#[derive(Clone)]
pub struct ResistanceLink {
    pub pdp: Rc<dyn PowerSource>,
    pub estimator: Rc<RefCell<dyn ResistanceEstimator>>,
}

impl std::fmt::Debug for ResistanceLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResistanceLink").finish_non_exhaustive()
    }
}

/// Least-squares line over a sliding window of points
#[derive(Debug, Clone)]
pub struct RunningLinReg {
    window: usize,
    r_squared_threshold: f64,
    points: VecDeque<(f64, f64)>,
}

impl RunningLinReg {
    pub fn new(window: usize, r_squared_threshold: f64) -> Self {
        Self {
            window: window.max(2),
            r_squared_threshold,
            points: VecDeque::with_capacity(window.max(2)),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// (var x, var y, cov xy, mean x, mean y)
    fn moments(&self) -> Option<(f64, f64, f64, f64, f64)> {
        if self.points.len() < 2 {
            return None;
        }
        let n = self.points.len() as f64;
        let (sum_x, sum_y) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
        let (mean_x, mean_y) = (sum_x / n, sum_y / n);
        let (var_x, var_y, cov) =
            self.points
                .iter()
                .fold((0.0, 0.0, 0.0), |(vx, vy, c), &(x, y)| {
                    let (dx, dy) = (x - mean_x, y - mean_y);
                    (vx + dx * dx, vy + dy * dy, c + dx * dy)
                });
        Some((var_x / n, var_y / n, cov / n, mean_x, mean_y))
    }

    /// Coefficient of determination, 1 for a horizontal line through the points
    pub fn r_squared(&self) -> Option<f64> {
        let (var_x, var_y, cov, _, _) = self.moments()?;
        if var_x <= 0.0 {
            return None;
        }
        if var_y <= 0.0 {
            return Some(1.0);
        }
        Some(cov * cov / (var_x * var_y))
    }
}

impl ResistanceEstimator for RunningLinReg {
    fn add_point(&mut self, x: f64, y: f64) {
        if self.points.len() == self.window {
            self.points.pop_front();
        }
        self.points.push_back((x, y));
    }

    fn slope(&self) -> Option<f64> {
        let (var_x, _, cov, _, _) = self.moments()?;
        if var_x <= 0.0 || self.r_squared()? < self.r_squared_threshold {
            return None;
        }
        Some(cov / var_x)
    }

    fn intercept(&self) -> Option<f64> {
        let (_, _, _, mean_x, mean_y) = self.moments()?;
        Some(mean_y - self.slope()? * mean_x)
    }
}
