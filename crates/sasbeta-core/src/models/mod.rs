pub mod beta;
pub mod distribution;
pub mod ellipsoid;
pub mod hardsphere;
pub mod sphere;

pub use beta::{beta_ratio, effective_structure_factor, scaled_effective_structure_factor};
pub use distribution::{
    DistributionError, DistributionGrid, DistributionKind, Polydispersity, sample_distribution,
};
pub use ellipsoid::{
    EllipsoidIntegrator, ORIENTATION_QUADRATURE_ORDER, ellipsoid_eccentricity_squared,
    ellipsoid_effective_radius, ellipsoid_orientation_average, ellipsoid_volume,
};
pub use hardsphere::{
    hard_sphere_forward_limit, hard_sphere_structure_factor, hard_sphere_structure_factors,
};
pub use sphere::{sphere_amplitude, sphere_volume};

use serde::{Deserialize, Serialize};

/// Scattering length densities of particle and solvent.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Contrast {
    pub sld: f64,
    pub sld_solvent: f64,
}

impl Contrast {
    pub const fn new(sld: f64, sld_solvent: f64) -> Self {
        Self { sld, sld_solvent }
    }

    pub fn delta(&self) -> f64 {
        self.sld - self.sld_solvent
    }
}

/// Per-q first and second moments of the scattering amplitude.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AmplitudeMoments {
    /// `<F>`
    pub f1: Vec<f64>,
    /// `<F²>`
    pub f2: Vec<f64>,
}

impl AmplitudeMoments {
    pub fn zeros(len: usize) -> Self {
        Self {
            f1: vec![0.0; len],
            f2: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.f1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.f1.is_empty()
    }
}
