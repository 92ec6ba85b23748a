pub mod aggregate;
pub mod request;

pub use aggregate::{
    EllipsoidGeometry, INTENSITY_UNIT_SCALE, SphereGeometry, StructureSpec, TheoryInputError,
    ellipsoid_theory, ellipsoid_theta, sphere_theory,
};
pub use request::{Geometry, QGrid, TheoryRequest, compute_theory};

use crate::domain::SasError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Optional columns of a [`TheoryRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum TheoryField {
    F1,
    F2,
    P,
    S,
    I,
    Seff,
    Ibeta,
}

impl TheoryField {
    pub const ALL: [Self; 7] = [
        Self::F1,
        Self::F2,
        Self::P,
        Self::S,
        Self::I,
        Self::Seff,
        Self::Ibeta,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::P => "P",
            Self::S => "S",
            Self::I => "I",
            Self::Seff => "Seff",
            Self::Ibeta => "Ibeta",
        }
    }
}

impl Display for TheoryField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for TheoryField {
    type Err = SasError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                SasError::configuration(
                    "CONFIG.UNKNOWN_FIELD",
                    format!(
                        "unknown theory field '{trimmed}', expected one of F1 F2 P S I Seff Ibeta"
                    ),
                )
            })
    }
}

/// Scattering profile aligned index-for-index with `q`.
///
/// Any column other than `Q` may be absent, e.g. when the record holds a reference curve
/// that only provides some of them.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct TheoryRecord {
    #[serde(rename = "Q")]
    pub q: Vec<f64>,
    #[serde(rename = "F1", default, skip_serializing_if = "Option::is_none")]
    pub f1: Option<Vec<f64>>,
    #[serde(rename = "F2", default, skip_serializing_if = "Option::is_none")]
    pub f2: Option<Vec<f64>>,
    #[serde(rename = "P", default, skip_serializing_if = "Option::is_none")]
    pub p: Option<Vec<f64>>,
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub s: Option<Vec<f64>>,
    #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
    pub i: Option<Vec<f64>>,
    #[serde(rename = "Seff", default, skip_serializing_if = "Option::is_none")]
    pub seff: Option<Vec<f64>>,
    #[serde(rename = "Ibeta", default, skip_serializing_if = "Option::is_none")]
    pub ibeta: Option<Vec<f64>>,
}

impl TheoryRecord {
    pub fn new(q: Vec<f64>) -> Self {
        Self {
            q,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn field(&self, field: TheoryField) -> Option<&[f64]> {
        self.slot(field).as_deref()
    }

    pub fn set_field(&mut self, field: TheoryField, values: Vec<f64>) {
        *self.slot_mut(field) = Some(values);
    }

    pub fn with_field(mut self, field: TheoryField, values: Vec<f64>) -> Self {
        self.set_field(field, values);
        self
    }

    pub fn available_fields(&self) -> Vec<TheoryField> {
        TheoryField::ALL
            .iter()
            .copied()
            .filter(|field| self.field(*field).is_some())
            .collect()
    }

    /// Fields whose length differs from `Q`.
    pub fn misaligned_fields(&self) -> Vec<TheoryField> {
        TheoryField::ALL
            .iter()
            .copied()
            .filter(|field| {
                self.field(*field)
                    .is_some_and(|values| values.len() != self.q.len())
            })
            .collect()
    }

    fn slot(&self, field: TheoryField) -> &Option<Vec<f64>> {
        match field {
            TheoryField::F1 => &self.f1,
            TheoryField::F2 => &self.f2,
            TheoryField::P => &self.p,
            TheoryField::S => &self.s,
            TheoryField::I => &self.i,
            TheoryField::Seff => &self.seff,
            TheoryField::Ibeta => &self.ibeta,
        }
    }

    fn slot_mut(&mut self, field: TheoryField) -> &mut Option<Vec<f64>> {
        match field {
            TheoryField::F1 => &mut self.f1,
            TheoryField::F2 => &mut self.f2,
            TheoryField::P => &mut self.p,
            TheoryField::S => &mut self.s,
            TheoryField::I => &mut self.i,
            TheoryField::Seff => &mut self.seff,
            TheoryField::Ibeta => &mut self.ibeta,
        }
    }
}
