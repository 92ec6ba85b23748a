use super::aggregate::{
    EllipsoidGeometry, SphereGeometry, StructureSpec, TheoryInputError, ellipsoid_theory,
    sphere_theory,
};
use super::TheoryRecord;
use crate::domain::{ExecutionMode, Normalization, SasError, SasResult};
use crate::models::Contrast;
use crate::numerics::{linear_grid, log_grid};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Particle shape together with the polydispersity of each of its size parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Geometry {
    Sphere(SphereGeometry),
    Ellipsoid(EllipsoidGeometry),
}

impl Geometry {
    pub const fn shape_name(&self) -> &'static str {
        match self {
            Self::Sphere(_) => "sphere",
            Self::Ellipsoid(_) => "ellipsoid",
        }
    }

    pub fn theory(
        &self,
        q: &[f64],
        contrast: Contrast,
        structure: &StructureSpec,
        normalization: Normalization,
        execution: ExecutionMode,
    ) -> Result<TheoryRecord, TheoryInputError> {
        match self {
            Self::Sphere(sphere) => {
                sphere_theory(q, sphere, contrast, structure, normalization, execution)
            }
            Self::Ellipsoid(ellipsoid) => {
                ellipsoid_theory(q, ellipsoid, contrast, structure, normalization, execution)
            }
        }
    }
}

/// Scattering-vector grid, either listed or generated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QGrid {
    Explicit {
        values: Vec<f64>,
    },
    /// `10^e` for `count` exponents evenly spaced from `start_exponent` to `end_exponent`.
    Logspace {
        start_exponent: f64,
        end_exponent: f64,
        count: usize,
    },
    Linspace {
        start: f64,
        end: f64,
        count: usize,
    },
}

impl QGrid {
    pub fn values(&self) -> Result<Vec<f64>, TheoryInputError> {
        match self {
            Self::Explicit { values } => Ok(values.clone()),
            Self::Logspace {
                start_exponent,
                end_exponent,
                count,
            } => log_grid(*start_exponent, *end_exponent, *count).ok_or(
                TheoryInputError::InvalidGridCount {
                    kind: "logspace",
                    minimum: 2,
                    count: *count,
                },
            ),
            Self::Linspace { start, end, count } => linear_grid(*start, *end, *count).ok_or(
                TheoryInputError::InvalidGridCount {
                    kind: "linspace",
                    minimum: 2,
                    count: *count,
                },
            ),
        }
    }
}

/// Self-contained description of one computation, as read from a JSON document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TheoryRequest {
    pub q: QGrid,
    pub geometry: Geometry,
    pub contrast: Contrast,
    #[serde(default)]
    pub structure: StructureSpec,
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub execution: ExecutionMode,
}

impl TheoryRequest {
    pub fn from_json_str(source: &str) -> SasResult<Self> {
        serde_json::from_str(source).map_err(|error| {
            SasError::configuration(
                "CONFIG.REQUEST_PARSE",
                format!("failed to parse theory request: {error}"),
            )
        })
    }

    pub fn from_path(path: &Path) -> SasResult<Self> {
        let source = fs::read_to_string(path).map_err(|error| {
            SasError::io_system(
                "IO.REQUEST_READ",
                format!("failed to read theory request '{}': {error}", path.display()),
            )
        })?;
        Self::from_json_str(&source)
    }

    pub fn compute(&self) -> SasResult<TheoryRecord> {
        let q = self.q.values()?;
        let record = self.geometry.theory(
            &q,
            self.contrast,
            &self.structure,
            self.normalization,
            self.execution,
        )?;
        Ok(record)
    }
}

/// Serial evaluation of `geometry` on `q`.
pub fn compute_theory(
    q: &[f64],
    geometry: &Geometry,
    contrast: Contrast,
    structure: &StructureSpec,
    normalization: Normalization,
) -> Result<TheoryRecord, TheoryInputError> {
    geometry.theory(q, contrast, structure, normalization, ExecutionMode::Serial)
}

#[cfg(test)]
mod tests {
    use super::{Geometry, QGrid, TheoryRequest, compute_theory};
    use crate::domain::{ExecutionMode, Normalization, SasErrorCategory};
    use crate::models::{Contrast, DistributionKind, Polydispersity};
    use crate::theory::{SphereGeometry, StructureSpec, TheoryField, TheoryInputError};

    const SPHERE_REQUEST: &str = r#"{
        "q": { "kind": "logspace", "start_exponent": -3, "end_exponent": -1, "count": 5 },
        "geometry": {
            "shape": "sphere",
            "radius": 20,
            "radius_pd": { "fraction": 0.1, "kind": "schulz" }
        },
        "contrast": { "sld": 4, "sld_solvent": 1 },
        "structure": { "volume_fraction": 0.3 },
        "normalization": "sasfit"
    }"#;

    #[test]
    fn request_document_parses_with_defaults() {
        let request = TheoryRequest::from_json_str(SPHERE_REQUEST).expect("request");
        assert_eq!(request.normalization, Normalization::SasFit);
        assert_eq!(request.execution, ExecutionMode::Serial);
        assert_eq!(request.structure.radius_effective, None);
        let Geometry::Sphere(sphere) = request.geometry else {
            panic!("expected sphere geometry");
        };
        assert_eq!(sphere.radius_pd.kind, DistributionKind::Schulz);

        let record = request.compute().expect("record");
        assert_eq!(record.len(), 5);
        assert_eq!(record.available_fields(), TheoryField::ALL.to_vec());
    }

    #[test]
    fn request_matches_direct_call() {
        let request = TheoryRequest::from_json_str(SPHERE_REQUEST).expect("request");
        let q = request.q.values().expect("grid");
        let direct = compute_theory(
            &q,
            &Geometry::Sphere(SphereGeometry::new(20.0, Polydispersity::schulz(0.1))),
            Contrast::new(4.0, 1.0),
            &StructureSpec::new(0.3, None),
            Normalization::SasFit,
        )
        .expect("record");
        assert_eq!(request.compute().expect("record"), direct);
    }

    #[test]
    fn unknown_normalization_is_a_configuration_error() {
        let source = SPHERE_REQUEST.replace("\"sasfit\"", "\"guinier\"");
        let error = TheoryRequest::from_json_str(&source).expect_err("must fail");
        assert_eq!(error.category(), SasErrorCategory::ConfigurationError);
        assert_eq!(error.placeholder(), "CONFIG.REQUEST_PARSE");
    }

    #[test]
    fn request_accepts_underscored_convention_names() {
        let source = SPHERE_REQUEST.replace("\"sasfit\"", "\"sas_fit\"");
        let request = TheoryRequest::from_json_str(&source).expect("request");
        assert_eq!(request.normalization, Normalization::SasFit);
    }

    #[test]
    fn generated_grids_require_two_points() {
        let grid = QGrid::Linspace {
            start: 0.01,
            end: 0.5,
            count: 1,
        };
        assert_eq!(
            grid.values(),
            Err(TheoryInputError::InvalidGridCount {
                kind: "linspace",
                minimum: 2,
                count: 1
            })
        );

        let explicit = QGrid::Explicit {
            values: vec![0.1, 0.2],
        };
        assert_eq!(explicit.values(), Ok(vec![0.1, 0.2]));
    }
}
