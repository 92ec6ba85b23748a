use super::{AmplitudeMoments, Contrast};
use crate::numerics::special::spherical_3j1x_x;
use std::f64::consts::PI;

pub fn sphere_volume(radius: f64) -> f64 {
    4.0 / 3.0 * PI * radius.powi(3)
}

/// Amplitude moments of a single homogeneous sphere. No orientation average is needed, so
/// `F2 = F1²` exactly.
pub fn sphere_amplitude(q: &[f64], radius: f64, contrast: Contrast) -> AmplitudeMoments {
    let scale = contrast.delta() * sphere_volume(radius);
    let f1: Vec<f64> = q
        .iter()
        .map(|qk| scale * spherical_3j1x_x(qk * radius))
        .collect();
    let f2 = f1.iter().map(|amplitude| amplitude * amplitude).collect();

    AmplitudeMoments { f1, f2 }
}
