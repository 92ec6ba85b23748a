//! Ellipsoid of revolution: orientation-averaged amplitude moments and the equivalent
//! hard-sphere radius used to feed the structure factor.

use super::{AmplitudeMoments, Contrast};
use crate::numerics::special::{GaussLegendreRule, gauss_legendre, spherical_3j1x_x};
use std::f64::consts::PI;

pub const ORIENTATION_QUADRATURE_ORDER: usize = 76;

pub fn ellipsoid_volume(radius_polar: f64, radius_equatorial: f64) -> f64 {
    (4.0 / 3.0) * PI * radius_polar * radius_equatorial * radius_equatorial
}

/// Squared eccentricity of the generating ellipse.
///
/// Equal radii return `2·radius_polar`, not the spherical limit 0.
pub fn ellipsoid_eccentricity_squared(radius_polar: f64, radius_equatorial: f64) -> f64 {
    let polar_sq = radius_polar * radius_polar;
    let equatorial_sq = radius_equatorial * radius_equatorial;
    if radius_polar > radius_equatorial {
        (polar_sq - equatorial_sq) / polar_sq
    } else if radius_polar < radius_equatorial {
        (equatorial_sq - polar_sq) / equatorial_sq
    } else {
        2.0 * radius_polar
    }
}

/// Equivalent hard-sphere radius from the mean curvature of the ellipsoid.
///
/// Degenerate ellipsoids (a zero radius) have zero effective radius. For equal radii the
/// eccentricity branch of [`ellipsoid_eccentricity_squared`] generally produces a
/// non-finite value; callers resolving an effective radius must check for that.
pub fn ellipsoid_effective_radius(radius_polar: f64, radius_equatorial: f64) -> f64 {
    if radius_polar * radius_equatorial == 0.0 {
        return 0.0;
    }

    let ee = ellipsoid_eccentricity_squared(radius_polar, radius_equatorial);
    let bd = 1.0 - ee;
    let e1 = ee.sqrt();
    let b1 = 1.0 + e1.asin() / (e1 * bd.sqrt());
    let bl = (1.0 + e1) / (1.0 - e1);
    let b2 = 1.0 + bd / 2.0 / e1 * bl.ln();
    let delta = 0.75 * b1 * b2;
    let ddd = 2.0 * (delta + 1.0) * radius_polar * radius_equatorial * radius_equatorial;

    0.5 * ddd.cbrt()
}

/// Orientation averager holding the fixed Gauss–Legendre rule, so a polydispersity sweep
/// builds the nodes once.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsoidIntegrator {
    rule: GaussLegendreRule,
}

impl Default for EllipsoidIntegrator {
    fn default() -> Self {
        Self::new()
    }
}

impl EllipsoidIntegrator {
    pub fn new() -> Self {
        Self {
            rule: gauss_legendre(ORIENTATION_QUADRATURE_ORDER),
        }
    }

    pub fn rule(&self) -> &GaussLegendreRule {
        &self.rule
    }

    /// `F1(q) = ½ Σ w·A(q·r(u))` and `F2(q) = ½ Σ w·A²` with `u = (z + 1)/2 = cos α`;
    /// the ½ is the Jacobian of mapping `u ∈ [0, 1]` onto the rule's `[-1, 1]`.
    pub fn amplitude_moments(
        &self,
        q: &[f64],
        radius_polar: f64,
        radius_equatorial: f64,
        contrast: Contrast,
    ) -> AmplitudeMoments {
        let scale = contrast.delta() * ellipsoid_volume(radius_polar, radius_equatorial);
        let polar_sq = radius_polar * radius_polar;
        let equatorial_sq = radius_equatorial * radius_equatorial;
        let radii: Vec<f64> = self
            .rule
            .nodes()
            .iter()
            .map(|node| {
                let u = 0.5 * (node + 1.0);
                let u_sq = u * u;
                (equatorial_sq * (1.0 - u_sq) + polar_sq * u_sq).sqrt()
            })
            .collect();

        let mut moments = AmplitudeMoments::zeros(q.len());
        for (index, qk) in q.iter().enumerate() {
            let mut f1 = 0.0;
            let mut f2 = 0.0;
            for (radius, weight) in radii.iter().zip(self.rule.weights()) {
                let amplitude = scale * spherical_3j1x_x(qk * radius);
                f1 += weight * amplitude;
                f2 += weight * amplitude * amplitude;
            }
            moments.f1[index] = 0.5 * f1;
            moments.f2[index] = 0.5 * f2;
        }

        moments
    }
}

pub fn ellipsoid_orientation_average(
    q: &[f64],
    radius_polar: f64,
    radius_equatorial: f64,
    contrast: Contrast,
) -> AmplitudeMoments {
    EllipsoidIntegrator::new().amplitude_moments(q, radius_polar, radius_equatorial, contrast)
}
