pub mod errors;

pub use errors::{SasError, SasErrorCategory, SasResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How the polydispersity sweep is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Serial,
    /// Grid combinations are folded on the rayon pool and reduced pairwise.
    Parallel,
}

impl ExecutionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Parallel => "parallel",
        }
    }
}

impl Display for ExecutionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = SasError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "serial" => Ok(Self::Serial),
            "parallel" => Ok(Self::Parallel),
            other => Err(SasError::configuration(
                "CONFIG.UNKNOWN_EXECUTION_MODE",
                format!("unknown execution mode '{other}', expected serial or parallel"),
            )),
        }
    }
}

/// Intensity normalization convention of the polydisperse aggregate.
///
/// The three conventions reproduce the reference tools they are named after and are not
/// related by a constant factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    /// Moments divided by `Σ w·V`; intensities in absolute units, `P = 1e-4·η·F2`.
    #[default]
    #[serde(alias = "sas_view")]
    SasView,
    /// Moments divided by `Σ w`; `P = F2`.
    #[serde(alias = "sas_fit")]
    SasFit,
    /// Moments divided by `Σ w·V`, `F2` rescaled by the nominal volume, and the beta
    /// ratio multiplied by the unnormalized `Σ w·V`.
    Yun,
}

impl Normalization {
    pub const ALL: [Self; 3] = [Self::SasView, Self::SasFit, Self::Yun];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SasView => "sasview",
            Self::SasFit => "sasfit",
            Self::Yun => "yun",
        }
    }

    /// Whether each grid point's weight is multiplied by its particle volume when
    /// accumulating the normalization sum.
    pub const fn is_volume_weighted(self) -> bool {
        matches!(self, Self::SasView | Self::Yun)
    }
}

impl Display for Normalization {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for Normalization {
    type Err = SasError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "sasview" | "sas_view" => Ok(Self::SasView),
            "sasfit" | "sas_fit" => Ok(Self::SasFit),
            "yun" => Ok(Self::Yun),
            _ => Err(SasError::configuration(
                "CONFIG.UNKNOWN_NORMALIZATION",
                format!(
                    "unknown normalization '{}', expected sasview, sasfit or yun",
                    value.trim()
                ),
            )),
        }
    }
}
