//! Percus–Yevick hard-sphere structure factor.

pub const HARD_SPHERE_RADIUS_EPSILON: f64 = 1.0e-12;
pub const HARD_SPHERE_FORWARD_CUTOFF: f64 = 5.0e-6;
pub const HARD_SPHERE_SERIES_CUTOFF: f64 = 0.05;

/// `S(q → 0) = 1/A = (1 − η)⁴ / (1 + 2η)²`.
pub fn hard_sphere_forward_limit(volume_fraction: f64) -> f64 {
    1.0 / compressibility_term(volume_fraction)
}

fn compressibility_term(volume_fraction: f64) -> f64 {
    let inverse = 1.0 / (1.0 - volume_fraction);
    let d = inverse * inverse;
    let a = (1.0 + 2.0 * volume_fraction) * d;
    a * a
}

/// Structure factor at a single `q` for spheres of `radius_effective` packed at
/// `volume_fraction`.
///
/// Small `X = 2qR` switches to the forward limit and then to a polynomial expansion, where
/// the trigonometric closed form loses all precision to cancellation.
pub fn hard_sphere_structure_factor(q: f64, radius_effective: f64, volume_fraction: f64) -> f64 {
    if radius_effective.abs() < HARD_SPHERE_RADIUS_EPSILON {
        return 1.0;
    }

    let eta = volume_fraction;
    let inverse = 1.0 / (1.0 - eta);
    let d = inverse * inverse;
    let a = compressibility_term(eta);
    let x = (2.0 * q * radius_effective).abs();
    if x < HARD_SPHERE_FORWARD_CUTOFF {
        return 1.0 / a;
    }

    let x2 = x * x;
    let mut b = (1.0 + 0.5 * eta) * d;
    b *= b;
    b *= -6.0 * eta;
    let g = 0.5 * eta * a;

    if x < HARD_SPHERE_SERIES_CUTOFF {
        let ff = 8.0 * a + 6.0 * b + 4.0 * g
            + (-0.8 * a - b / 1.5 - 0.5 * g + (a / 35.0 + 0.0125 * b + 0.02 * g) * x2) * x2;
        return 1.0 / (1.0 + eta * ff);
    }

    let x4 = x2 * x2;
    let (s, c) = x.sin_cos();
    let ff = ((g * ((4.0 * x2 - 24.0) * x * s - (x4 - 12.0 * x2 + 24.0) * c + 24.0) / x2
        + b * (2.0 * x * s - (x2 - 2.0) * c - 2.0))
        / x
        + a * (s - x * c))
        / x;
    1.0 / (1.0 + 24.0 * eta * ff / x2)
}

pub fn hard_sphere_structure_factors(
    q: &[f64],
    radius_effective: f64,
    volume_fraction: f64,
) -> Vec<f64> {
    q.iter()
        .map(|qk| hard_sphere_structure_factor(*qk, radius_effective, volume_fraction))
        .collect()
}
