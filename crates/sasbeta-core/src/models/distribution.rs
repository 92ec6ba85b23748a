use crate::domain::SasError;
use crate::numerics::{linear_grid, ln_gamma};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub const GAUSSIAN_POINT_COUNT: usize = 35;
pub const GAUSSIAN_SIGMA_EXTENT: f64 = 3.0;
pub const SCHULZ_POINT_COUNT: usize = 80;
pub const SCHULZ_SIGMA_EXTENT: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionKind {
    #[default]
    Gaussian,
    /// Long-tailed; sampled on a wider and denser grid than the Gaussian.
    Schulz,
}

impl DistributionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Schulz => "schulz",
        }
    }

    pub const fn point_count(self) -> usize {
        match self {
            Self::Gaussian => GAUSSIAN_POINT_COUNT,
            Self::Schulz => SCHULZ_POINT_COUNT,
        }
    }

    pub const fn sigma_extent(self) -> f64 {
        match self {
            Self::Gaussian => GAUSSIAN_SIGMA_EXTENT,
            Self::Schulz => SCHULZ_SIGMA_EXTENT,
        }
    }
}

impl Display for DistributionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for DistributionKind {
    type Err = DistributionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gaussian" => Ok(Self::Gaussian),
            "schulz" => Ok(Self::Schulz),
            _ => Err(DistributionError::UnknownKind {
                name: value.trim().to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DistributionError {
    #[error("unknown distribution kind '{name}', expected gaussian or schulz")]
    UnknownKind { name: String },
    #[error("distribution parameter '{field}' must be finite, got {value}")]
    NonFiniteParameter { field: &'static str, value: f64 },
    #[error("distribution sigma must be non-negative, got {sigma}")]
    NegativeSigma { sigma: f64 },
    #[error("distribution bounds are inverted: lower={lower}, upper={upper}")]
    InvertedBounds { lower: f64, upper: f64 },
    #[error("schulz distribution requires a positive center, got {center}")]
    NonPositiveSchulzCenter { center: f64 },
}

impl From<DistributionError> for SasError {
    fn from(error: DistributionError) -> Self {
        match error {
            DistributionError::UnknownKind { .. } => {
                SasError::configuration("CONFIG.UNKNOWN_DISTRIBUTION", error.to_string())
            }
            _ => SasError::input_validation("INPUT.DISTRIBUTION", error.to_string()),
        }
    }
}

/// Discrete `(value, weight)` approximation of a size distribution.
///
/// Weights are left unnormalized; the aggregator decides what they are divided by.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributionGrid {
    values: Vec<f64>,
    weights: Vec<f64>,
}

impl DistributionGrid {
    pub fn degenerate(center: f64) -> Self {
        Self {
            values: vec![center],
            weights: vec![1.0],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.values.iter().copied().zip(self.weights.iter().copied())
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}

/// Relative polydispersity of one size parameter.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct Polydispersity {
    /// Relative width: `sigma = fraction * nominal`.
    #[serde(default)]
    pub fraction: f64,
    #[serde(default)]
    pub kind: DistributionKind,
}

impl Polydispersity {
    pub const fn new(fraction: f64, kind: DistributionKind) -> Self {
        Self { fraction, kind }
    }

    pub const fn monodisperse() -> Self {
        Self::new(0.0, DistributionKind::Gaussian)
    }

    pub fn gaussian(fraction: f64) -> Self {
        Self::new(fraction, DistributionKind::Gaussian)
    }

    pub fn schulz(fraction: f64) -> Self {
        Self::new(fraction, DistributionKind::Schulz)
    }

    /// Grid around `nominal` restricted to non-negative sizes.
    pub fn grid(&self, nominal: f64) -> Result<DistributionGrid, DistributionError> {
        sample_distribution(
            nominal,
            self.fraction * nominal,
            0.0,
            f64::INFINITY,
            self.kind,
        )
    }
}

pub fn sample_distribution(
    center: f64,
    sigma: f64,
    lower_bound: f64,
    upper_bound: f64,
    kind: DistributionKind,
) -> Result<DistributionGrid, DistributionError> {
    validate_parameters(center, sigma, lower_bound, upper_bound)?;

    if sigma == 0.0 {
        return Ok(DistributionGrid::degenerate(center));
    }

    if kind == DistributionKind::Schulz && center <= 0.0 {
        return Err(DistributionError::NonPositiveSchulzCenter { center });
    }

    let extent = kind.sigma_extent() * sigma;
    let nodes = linear_grid(center - extent, center + extent, kind.point_count())
        .unwrap_or_else(|| vec![center]);
    let values: Vec<f64> = nodes
        .into_iter()
        .filter(|value| *value >= lower_bound && *value <= upper_bound)
        .collect();

    let weights = match kind {
        DistributionKind::Gaussian => values
            .iter()
            .map(|value| gaussian_weight(*value, center, sigma))
            .collect(),
        DistributionKind::Schulz => {
            let shape = (center / sigma).powi(2);
            let log_normalization = shape * shape.ln() - center.ln() - ln_gamma(shape);
            values
                .iter()
                .map(|value| schulz_weight(*value, center, shape, log_normalization))
                .collect()
        }
    };

    Ok(DistributionGrid { values, weights })
}

fn validate_parameters(
    center: f64,
    sigma: f64,
    lower_bound: f64,
    upper_bound: f64,
) -> Result<(), DistributionError> {
    if !center.is_finite() {
        return Err(DistributionError::NonFiniteParameter {
            field: "center",
            value: center,
        });
    }
    if !sigma.is_finite() {
        return Err(DistributionError::NonFiniteParameter {
            field: "sigma",
            value: sigma,
        });
    }
    if sigma < 0.0 {
        return Err(DistributionError::NegativeSigma { sigma });
    }
    if lower_bound.is_nan() || upper_bound.is_nan() || lower_bound > upper_bound {
        return Err(DistributionError::InvertedBounds {
            lower: lower_bound,
            upper: upper_bound,
        });
    }

    Ok(())
}

fn gaussian_weight(value: f64, center: f64, sigma: f64) -> f64 {
    let offset = value - center;
    (offset * offset / (-2.0 * sigma * sigma)).exp()
}

// Evaluated in log space so large shape parameters do not overflow. The density vanishes
// at the origin, so non-positive sizes carry no weight.
fn schulz_weight(value: f64, center: f64, shape: f64, log_normalization: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }

    let ratio = value / center;
    (log_normalization + (shape - 1.0) * ratio.ln() - ratio * shape).exp()
}
