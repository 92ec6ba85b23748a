//! Polydispersity-weighted aggregation of amplitude moments and assembly of the final
//! record under one of the normalization conventions.

use super::{TheoryField, TheoryRecord};
use crate::domain::{ExecutionMode, Normalization, SasError};
use crate::models::{
    AmplitudeMoments, Contrast, DistributionError, DistributionGrid, EllipsoidIntegrator,
    Polydispersity, ellipsoid_effective_radius, ellipsoid_volume, hard_sphere_structure_factors,
    scaled_effective_structure_factor, sphere_amplitude, sphere_volume,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace_span, warn};

/// Unit conversion applied to volume-normalized intensities (Å⁻¹ / 1e-6 Å⁻² → cm⁻¹).
pub const INTENSITY_UNIT_SCALE: f64 = 1.0e-4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TheoryInputError {
    #[error("q grid must contain at least one point")]
    EmptyQGrid,
    #[error("q grid must contain finite values, index {index} got {value}")]
    NonFiniteQ { index: usize, value: f64 },
    #[error("parameter '{field}' must be finite, got {value}")]
    NonFiniteParameter { field: &'static str, value: f64 },
    #[error("size parameter '{field}' must be positive, got {value}")]
    NonPositiveSize { field: &'static str, value: f64 },
    #[error("volume fraction must lie in [0, 1), got {value}")]
    VolumeFractionOutOfRange { value: f64 },
    #[error("q grid generator '{kind}' needs at least {minimum} points, got {count}")]
    InvalidGridCount {
        kind: &'static str,
        minimum: usize,
        count: usize,
    },
    #[error("polydispersity grid for '{field}' is invalid: {source}")]
    Distribution {
        field: &'static str,
        source: DistributionError,
    },
    #[error("polydispersity grid for '{field}' has no points inside the size bounds")]
    EmptyDistribution { field: &'static str },
    #[error("normalization sum vanished for the {normalization} convention")]
    ZeroNormalization { normalization: Normalization },
}

impl From<TheoryInputError> for SasError {
    fn from(error: TheoryInputError) -> Self {
        match error {
            TheoryInputError::Distribution { source, .. } => SasError::from(source),
            TheoryInputError::ZeroNormalization { .. } => {
                SasError::internal("RUN.ZERO_NORMALIZATION", error.to_string())
            }
            _ => SasError::input_validation("INPUT.THEORY", error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct StructureSpec {
    #[serde(default)]
    pub volume_fraction: f64,
    /// Overrides the radius derived from the geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_effective: Option<f64>,
}

impl StructureSpec {
    pub const fn new(volume_fraction: f64, radius_effective: Option<f64>) -> Self {
        Self {
            volume_fraction,
            radius_effective,
        }
    }

    pub const fn dilute() -> Self {
        Self::new(0.0, None)
    }

    fn validate(&self) -> Result<(), TheoryInputError> {
        let value = self.volume_fraction;
        if !value.is_finite() {
            return Err(TheoryInputError::NonFiniteParameter {
                field: "volume_fraction",
                value,
            });
        }
        if !(0.0..1.0).contains(&value) {
            return Err(TheoryInputError::VolumeFractionOutOfRange { value });
        }
        if let Some(radius) = self.radius_effective {
            require_finite("radius_effective", radius)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SphereGeometry {
    pub radius: f64,
    #[serde(default)]
    pub radius_pd: Polydispersity,
}

impl SphereGeometry {
    pub const fn new(radius: f64, radius_pd: Polydispersity) -> Self {
        Self { radius, radius_pd }
    }

    pub const fn monodisperse(radius: f64) -> Self {
        Self::new(radius, Polydispersity::monodisperse())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EllipsoidGeometry {
    pub radius_polar: f64,
    pub radius_equatorial: f64,
    #[serde(default)]
    pub radius_polar_pd: Polydispersity,
    #[serde(default)]
    pub radius_equatorial_pd: Polydispersity,
}

impl EllipsoidGeometry {
    pub const fn new(
        radius_polar: f64,
        radius_equatorial: f64,
        radius_polar_pd: Polydispersity,
        radius_equatorial_pd: Polydispersity,
    ) -> Self {
        Self {
            radius_polar,
            radius_equatorial,
            radius_polar_pd,
            radius_equatorial_pd,
        }
    }

    pub const fn monodisperse(radius_polar: f64, radius_equatorial: f64) -> Self {
        Self::new(
            radius_polar,
            radius_equatorial,
            Polydispersity::monodisperse(),
            Polydispersity::monodisperse(),
        )
    }
}

/// Per-size output of the form-factor evaluation that feeds the accumulator.
struct SizeContribution {
    moments: AmplitudeMoments,
    volume: f64,
    effective_radius: f64,
}

#[derive(Debug, Clone)]
struct MomentAccumulator {
    f1: Vec<f64>,
    f2: Vec<f64>,
    normalization: f64,
    radius_weight: f64,
    radius_weighted: f64,
}

impl MomentAccumulator {
    fn new(len: usize) -> Self {
        Self {
            f1: vec![0.0; len],
            f2: vec![0.0; len],
            normalization: 0.0,
            radius_weight: 0.0,
            radius_weighted: 0.0,
        }
    }

    fn add(
        mut self,
        weight: f64,
        contribution: SizeContribution,
        normalization: Normalization,
    ) -> Self {
        self.normalization += if normalization.is_volume_weighted() {
            weight * contribution.volume
        } else {
            weight
        };
        // Nodes with equal radii have no finite equivalent radius.
        if contribution.effective_radius.is_finite() {
            self.radius_weight += weight;
            self.radius_weighted += weight * contribution.effective_radius;
        }

        for (sum, value) in self.f1.iter_mut().zip(&contribution.moments.f1) {
            *sum += weight * value;
        }
        for (sum, value) in self.f2.iter_mut().zip(&contribution.moments.f2) {
            *sum += weight * value;
        }
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.normalization += other.normalization;
        self.radius_weight += other.radius_weight;
        self.radius_weighted += other.radius_weighted;
        for (sum, value) in self.f1.iter_mut().zip(other.f1) {
            *sum += value;
        }
        for (sum, value) in self.f2.iter_mut().zip(other.f2) {
            *sum += value;
        }
        self
    }

    fn average_effective_radius(&self) -> Option<f64> {
        (self.radius_weight != 0.0).then(|| self.radius_weighted / self.radius_weight)
    }
}

fn sweep<P, F>(
    points: &[(P, f64)],
    q_len: usize,
    normalization: Normalization,
    execution: ExecutionMode,
    evaluate: F,
) -> MomentAccumulator
where
    P: Sync,
    F: Fn(&P) -> SizeContribution + Sync,
{
    match execution {
        ExecutionMode::Serial => {
            points
                .iter()
                .fold(MomentAccumulator::new(q_len), |accumulator, (size, weight)| {
                    accumulator.add(*weight, evaluate(size), normalization)
                })
        }
        ExecutionMode::Parallel => points
            .par_iter()
            .fold(
                || MomentAccumulator::new(q_len),
                |accumulator, (size, weight)| {
                    accumulator.add(*weight, evaluate(size), normalization)
                },
            )
            .reduce(|| MomentAccumulator::new(q_len), MomentAccumulator::merge),
    }
}

/// Polydisperse sphere profile.
///
/// Without an override the structure factor uses the nominal radius.
pub fn sphere_theory(
    q: &[f64],
    geometry: &SphereGeometry,
    contrast: Contrast,
    structure: &StructureSpec,
    normalization: Normalization,
    execution: ExecutionMode,
) -> Result<TheoryRecord, TheoryInputError> {
    validate_q(q)?;
    require_positive("radius", geometry.radius)?;
    validate_contrast(contrast)?;
    structure.validate()?;

    let grid = size_grid("radius", geometry.radius, geometry.radius_pd)?;
    let points: Vec<(f64, f64)> = grid.points().collect();

    let span = trace_span!("polydisperse_sweep", shape = "sphere", points = points.len());
    let _guard = span.enter();
    debug!(%normalization, %execution, "sweeping sphere radius distribution");

    let accumulator = sweep(&points, q.len(), normalization, execution, |radius| {
        SizeContribution {
            moments: sphere_amplitude(q, *radius, contrast),
            volume: sphere_volume(*radius),
            effective_radius: *radius,
        }
    });

    let radius_effective = structure.radius_effective.unwrap_or(geometry.radius);
    assemble(
        q,
        accumulator,
        radius_effective,
        structure.volume_fraction,
        sphere_volume(geometry.radius),
        normalization,
    )
}

/// Polydisperse ellipsoid profile over the product of the polar and equatorial grids.
pub fn ellipsoid_theory(
    q: &[f64],
    geometry: &EllipsoidGeometry,
    contrast: Contrast,
    structure: &StructureSpec,
    normalization: Normalization,
    execution: ExecutionMode,
) -> Result<TheoryRecord, TheoryInputError> {
    validate_q(q)?;
    require_positive("radius_polar", geometry.radius_polar)?;
    require_positive("radius_equatorial", geometry.radius_equatorial)?;
    validate_contrast(contrast)?;
    structure.validate()?;

    let polar = size_grid("radius_polar", geometry.radius_polar, geometry.radius_polar_pd)?;
    let equatorial = size_grid(
        "radius_equatorial",
        geometry.radius_equatorial,
        geometry.radius_equatorial_pd,
    )?;
    let points: Vec<((f64, f64), f64)> = polar
        .points()
        .flat_map(|(radius_polar, polar_weight)| {
            equatorial
                .points()
                .map(move |(radius_equatorial, equatorial_weight)| {
                    ((radius_polar, radius_equatorial), polar_weight * equatorial_weight)
                })
        })
        .collect();

    let span = trace_span!("polydisperse_sweep", shape = "ellipsoid", points = points.len());
    let _guard = span.enter();
    debug!(
        polar_points = polar.len(),
        equatorial_points = equatorial.len(),
        %normalization,
        %execution,
        "sweeping ellipsoid radius distributions"
    );

    let integrator = EllipsoidIntegrator::new();
    let accumulator = sweep(
        &points,
        q.len(),
        normalization,
        execution,
        |(radius_polar, radius_equatorial)| SizeContribution {
            moments: integrator.amplitude_moments(q, *radius_polar, *radius_equatorial, contrast),
            volume: ellipsoid_volume(*radius_polar, *radius_equatorial),
            effective_radius: ellipsoid_effective_radius(*radius_polar, *radius_equatorial),
        },
    );

    let radius_effective = structure.radius_effective.unwrap_or_else(|| {
        resolve_ellipsoid_radius(
            accumulator.average_effective_radius(),
            geometry.radius_polar,
            geometry.radius_equatorial,
        )
    });
    assemble(
        q,
        accumulator,
        radius_effective,
        structure.volume_fraction,
        ellipsoid_volume(geometry.radius_polar, geometry.radius_equatorial),
        normalization,
    )
}

/// Single-size ellipsoid profile with the monodisperse intensity scaling
/// `P = 1e-4·F2/V`, `I = η·P·S`, `Ibeta = η·P·Seff`.
pub fn ellipsoid_theta(
    q: &[f64],
    radius_polar: f64,
    radius_equatorial: f64,
    contrast: Contrast,
    structure: &StructureSpec,
) -> Result<TheoryRecord, TheoryInputError> {
    validate_q(q)?;
    require_positive("radius_polar", radius_polar)?;
    require_positive("radius_equatorial", radius_equatorial)?;
    validate_contrast(contrast)?;
    structure.validate()?;

    let volume = ellipsoid_volume(radius_polar, radius_equatorial);
    let moments =
        EllipsoidIntegrator::new().amplitude_moments(q, radius_polar, radius_equatorial, contrast);
    let radius_effective = structure.radius_effective.unwrap_or_else(|| {
        resolve_ellipsoid_radius(None, radius_polar, radius_equatorial)
    });

    let eta = structure.volume_fraction;
    let s = hard_sphere_structure_factors(q, radius_effective, eta);
    let seff = scaled_effective_structure_factor(&moments.f1, &moments.f2, &s, 1.0);
    let p: Vec<f64> = moments
        .f2
        .iter()
        .map(|f2| INTENSITY_UNIT_SCALE * f2 / volume)
        .collect();
    let i = scale_by(&p, &s, eta);
    let ibeta = scale_by(&p, &seff, eta);

    Ok(TheoryRecord::new(q.to_vec())
        .with_field(TheoryField::F1, moments.f1)
        .with_field(TheoryField::F2, moments.f2)
        .with_field(TheoryField::P, p)
        .with_field(TheoryField::S, s)
        .with_field(TheoryField::I, i)
        .with_field(TheoryField::Seff, seff)
        .with_field(TheoryField::Ibeta, ibeta))
}

fn assemble(
    q: &[f64],
    accumulator: MomentAccumulator,
    radius_effective: f64,
    volume_fraction: f64,
    nominal_volume: f64,
    normalization: Normalization,
) -> Result<TheoryRecord, TheoryInputError> {
    let norm = accumulator.normalization;
    if norm == 0.0 || !norm.is_finite() {
        return Err(TheoryInputError::ZeroNormalization { normalization });
    }
    debug!(radius_effective, volume_fraction, norm, "assembling theory record");

    let f1: Vec<f64> = accumulator.f1.iter().map(|value| value / norm).collect();
    let mut f2: Vec<f64> = accumulator.f2.iter().map(|value| value / norm).collect();
    let s = hard_sphere_structure_factors(q, radius_effective, volume_fraction);

    let (p, seff) = match normalization {
        Normalization::SasFit => {
            let seff = scaled_effective_structure_factor(&f1, &f2, &s, 1.0);
            (f2.clone(), seff)
        }
        Normalization::SasView => {
            let seff = scaled_effective_structure_factor(&f1, &f2, &s, 1.0);
            let p = f2
                .iter()
                .map(|value| value * INTENSITY_UNIT_SCALE * volume_fraction)
                .collect();
            (p, seff)
        }
        Normalization::Yun => {
            let seff = scaled_effective_structure_factor(&f1, &f2, &s, norm);
            for value in &mut f2 {
                *value /= nominal_volume;
            }
            (f2.clone(), seff)
        }
    };
    let i = scale_by(&p, &s, 1.0);
    let ibeta = scale_by(&p, &seff, 1.0);

    Ok(TheoryRecord::new(q.to_vec())
        .with_field(TheoryField::F1, f1)
        .with_field(TheoryField::F2, f2)
        .with_field(TheoryField::P, p)
        .with_field(TheoryField::S, s)
        .with_field(TheoryField::I, i)
        .with_field(TheoryField::Seff, seff)
        .with_field(TheoryField::Ibeta, ibeta))
}

/// Averaged equivalent radius, else the nominal one, else the equal-volume sphere radius.
fn resolve_ellipsoid_radius(
    averaged: Option<f64>,
    radius_polar: f64,
    radius_equatorial: f64,
) -> f64 {
    if let Some(radius) = averaged.filter(|radius| radius.is_finite()) {
        return radius;
    }

    let nominal = ellipsoid_effective_radius(radius_polar, radius_equatorial);
    if nominal.is_finite() {
        return nominal;
    }

    let equal_volume = (radius_polar * radius_equatorial * radius_equatorial).cbrt();
    warn!(
        radius_polar,
        radius_equatorial,
        radius_effective = equal_volume,
        "equivalent effective radius is not finite, using the equal-volume sphere radius"
    );
    equal_volume
}

fn scale_by(lhs: &[f64], rhs: &[f64], factor: f64) -> Vec<f64> {
    lhs.iter()
        .zip(rhs)
        .map(|(lhs, rhs)| factor * lhs * rhs)
        .collect()
}

fn size_grid(
    field: &'static str,
    nominal: f64,
    polydispersity: Polydispersity,
) -> Result<DistributionGrid, TheoryInputError> {
    let grid = polydispersity
        .grid(nominal)
        .map_err(|source| TheoryInputError::Distribution { field, source })?;
    if grid.is_empty() {
        return Err(TheoryInputError::EmptyDistribution { field });
    }
    Ok(grid)
}

pub(crate) fn validate_q(q: &[f64]) -> Result<(), TheoryInputError> {
    if q.is_empty() {
        return Err(TheoryInputError::EmptyQGrid);
    }
    match q.iter().position(|value| !value.is_finite()) {
        Some(index) => Err(TheoryInputError::NonFiniteQ {
            index,
            value: q[index],
        }),
        None => Ok(()),
    }
}

fn validate_contrast(contrast: Contrast) -> Result<(), TheoryInputError> {
    require_finite("sld", contrast.sld)?;
    require_finite("sld_solvent", contrast.sld_solvent)
}

fn require_finite(field: &'static str, value: f64) -> Result<(), TheoryInputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TheoryInputError::NonFiniteParameter { field, value })
    }
}

fn require_positive(field: &'static str, value: f64) -> Result<(), TheoryInputError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(TheoryInputError::NonPositiveSize { field, value })
    }
}
