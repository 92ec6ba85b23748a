pub mod special;

pub use special::{
    GaussLegendreRule, bessel_j1, gauss_legendre, ln_gamma, sas_2j1x_x, sas_3j1x_x, sas_sinx_x,
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct NumericTolerance {
    #[serde(rename = "absTol")]
    pub abs_tol: f64,
    #[serde(rename = "relTol")]
    pub rel_tol: f64,
    #[serde(rename = "relativeFloor")]
    pub relative_floor: f64,
}

impl NumericTolerance {
    pub const fn new(abs_tol: f64, rel_tol: f64, relative_floor: f64) -> Self {
        Self {
            abs_tol,
            rel_tol,
            relative_floor,
        }
    }
}

impl Default for NumericTolerance {
    fn default() -> Self {
        Self::new(1.0e-12, 1.0e-6, 1.0e-300)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceComparison {
    pub abs_diff: f64,
    pub rel_diff: f64,
    pub passes: bool,
}

pub fn compare_with_tolerance(
    baseline: f64,
    actual: f64,
    tolerance: NumericTolerance,
) -> ToleranceComparison {
    let abs_diff = (actual - baseline).abs();
    let rel_denominator = baseline.abs().max(tolerance.relative_floor);
    let rel_diff = abs_diff / rel_denominator;
    let passes = abs_diff <= tolerance.abs_tol || abs_diff <= tolerance.rel_tol * rel_denominator;

    ToleranceComparison {
        abs_diff,
        rel_diff,
        passes,
    }
}

/// Inclusive evenly spaced grid; the last point is pinned to `end`.
pub fn linear_grid(start: f64, end: f64, count: usize) -> Option<Vec<f64>> {
    if count < 2 {
        return None;
    }

    let step = (end - start) / ((count - 1) as f64);
    let mut grid = Vec::with_capacity(count);
    for index in 0..count {
        grid.push(start + step * (index as f64));
    }

    if let Some(last) = grid.last_mut() {
        *last = end;
    }

    Some(grid)
}

/// `10^e` for `e` on an inclusive linear grid of exponents.
pub fn log_grid(start_exponent: f64, end_exponent: f64, count: usize) -> Option<Vec<f64>> {
    let exponents = linear_grid(start_exponent, end_exponent, count)?;
    Some(
        exponents
            .into_iter()
            .map(|exponent| 10.0_f64.powf(exponent))
            .collect(),
    )
}

pub fn relative_difference(lhs: f64, rhs: f64, relative_floor: f64) -> f64 {
    let scale = lhs.abs().max(rhs.abs()).max(relative_floor);
    (lhs - rhs).abs() / scale
}

pub fn within_tolerance(
    lhs: f64,
    rhs: f64,
    abs_tol: f64,
    rel_tol: f64,
    relative_floor: f64,
) -> bool {
    let abs_diff = (lhs - rhs).abs();
    abs_diff <= abs_tol || relative_difference(lhs, rhs, relative_floor) <= rel_tol
}
