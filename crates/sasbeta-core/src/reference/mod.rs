//! Reference curves exported by other scattering tools, and pointwise comparison of records.

use crate::domain::SasError;
use crate::numerics::{NumericTolerance, compare_with_tolerance};
use crate::theory::{TheoryField, TheoryRecord};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to open reference file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read reference table '{origin}': {source}")]
    Csv { origin: String, source: csv::Error },
    #[error("'{origin}' line {line} column {column}: '{value}' is not a number")]
    Parse {
        origin: String,
        line: u64,
        column: usize,
        value: String,
    },
    #[error("'{origin}' line {line} has {found} columns, expected {expected}")]
    RaggedRow {
        origin: String,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("'{origin}' contains no data rows")]
    Empty { origin: String },
    #[error("column {index} requested but the table only has {available}")]
    MissingColumn { index: usize, available: usize },
    #[error("unknown column format '{name}', expected semicolon or whitespace")]
    UnknownFormat { name: String },
    #[error("field {field} has {found} points but Q has {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
}

impl From<ReferenceError> for SasError {
    fn from(error: ReferenceError) -> Self {
        match &error {
            ReferenceError::Io { .. } => SasError::io_system("IO.REFERENCE", error.to_string()),
            ReferenceError::Csv { source, .. } if source.is_io_error() => {
                SasError::io_system("IO.REFERENCE", error.to_string())
            }
            ReferenceError::UnknownFormat { .. } => {
                SasError::configuration("CONFIG.UNKNOWN_COLUMN_FORMAT", error.to_string())
            }
            _ => SasError::input_validation("INPUT.REFERENCE", error.to_string()),
        }
    }
}

/// Field separator of a reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnFormat {
    /// `q;value` rows as written by SASfit exports.
    #[default]
    Semicolon,
    /// Runs of spaces or tabs.
    Whitespace,
}

impl ColumnFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Semicolon => "semicolon",
            Self::Whitespace => "whitespace",
        }
    }

    const fn delimiter(self) -> u8 {
        match self {
            Self::Semicolon => b';',
            Self::Whitespace => b' ',
        }
    }
}

impl Display for ColumnFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for ColumnFormat {
    type Err = ReferenceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "semicolon" | "sasfit" => Ok(Self::Semicolon),
            "whitespace" | "space" => Ok(Self::Whitespace),
            other => Err(ReferenceError::UnknownFormat {
                name: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct TableLayout {
    #[serde(default)]
    pub format: ColumnFormat,
    /// Leading rows dropped before parsing, e.g. a title and a column header.
    #[serde(default)]
    pub skip_rows: usize,
}

impl TableLayout {
    pub const fn new(format: ColumnFormat, skip_rows: usize) -> Self {
        Self { format, skip_rows }
    }

    pub const fn sasfit() -> Self {
        Self::new(ColumnFormat::Semicolon, 0)
    }
}

/// Column-major numeric table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceTable {
    columns: Vec<Vec<f64>>,
}

impl ReferenceTable {
    pub fn from_path(path: &Path, layout: TableLayout) -> Result<Self, ReferenceError> {
        let file = File::open(path).map_err(|source| ReferenceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file, layout, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(
        reader: R,
        layout: TableLayout,
        origin: &str,
    ) -> Result<Self, ReferenceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .delimiter(layout.format.delimiter())
            .from_reader(reader);

        let mut columns: Vec<Vec<f64>> = Vec::new();
        for record in reader.records().skip(layout.skip_rows) {
            let record = record.map_err(|source| ReferenceError::Csv {
                origin: origin.to_string(),
                source,
            })?;
            let line = record.position().map_or(0, |position| position.line());
            let fields: Vec<&str> = record
                .iter()
                .flat_map(str::split_whitespace)
                .collect();
            if fields.is_empty() {
                continue;
            }

            if columns.is_empty() {
                columns = vec![Vec::new(); fields.len()];
            } else if fields.len() != columns.len() {
                return Err(ReferenceError::RaggedRow {
                    origin: origin.to_string(),
                    line,
                    expected: columns.len(),
                    found: fields.len(),
                });
            }

            for (column, (values, field)) in columns.iter_mut().zip(&fields).enumerate() {
                let value = field.parse::<f64>().map_err(|_| ReferenceError::Parse {
                    origin: origin.to_string(),
                    line,
                    column,
                    value: field.to_string(),
                })?;
                values.push(value);
            }
        }

        if columns.is_empty() {
            return Err(ReferenceError::Empty {
                origin: origin.to_string(),
            });
        }
        debug!(
            origin,
            rows = columns[0].len(),
            columns = columns.len(),
            "loaded reference table"
        );
        Ok(Self { columns })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, index: usize) -> Result<&[f64], ReferenceError> {
        self.columns
            .get(index)
            .map(Vec::as_slice)
            .ok_or(ReferenceError::MissingColumn {
                index,
                available: self.columns.len(),
            })
    }

    /// Builds a partial record from column 0 as `Q` and the given column per field.
    pub fn to_record(
        &self,
        fields: &[(TheoryField, usize)],
    ) -> Result<TheoryRecord, ReferenceError> {
        let mut record = TheoryRecord::new(self.column(0)?.to_vec());
        for (field, index) in fields {
            record.set_field(*field, self.column(*index)?.to_vec());
        }
        Ok(record)
    }
}

/// `(Q, value)` from the first two columns of a SASfit export.
pub fn load_sasfit_curve(path: &Path) -> Result<(Vec<f64>, Vec<f64>), ReferenceError> {
    let table = ReferenceTable::from_path(path, TableLayout::sasfit())?;
    Ok((table.column(0)?.to_vec(), table.column(1)?.to_vec()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldComparison {
    pub field: TheoryField,
    /// `target/actual − 1` at every q.
    pub relative_error: Vec<f64>,
    pub max_abs_relative_error: f64,
    pub passes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordComparison {
    pub fields: Vec<FieldComparison>,
}

impl RecordComparison {
    pub fn passes(&self) -> bool {
        self.fields.iter().all(|field| field.passes)
    }

    pub fn field(&self, field: TheoryField) -> Option<&FieldComparison> {
        self.fields.iter().find(|comparison| comparison.field == field)
    }

    pub fn worst(&self) -> Option<&FieldComparison> {
        self.fields
            .iter()
            .max_by(|lhs, rhs| lhs.max_abs_relative_error.total_cmp(&rhs.max_abs_relative_error))
    }
}

/// Compares every field present in both records, point by point.
///
/// The two records must share the same q sampling; the values of `Q` themselves are not
/// compared.
pub fn compare_records(
    target: &TheoryRecord,
    actual: &TheoryRecord,
    tolerance: NumericTolerance,
) -> Result<RecordComparison, ReferenceError> {
    if target.len() != actual.len() {
        return Err(ReferenceError::LengthMismatch {
            field: "Q",
            expected: actual.len(),
            found: target.len(),
        });
    }

    let mut fields = Vec::new();
    for field in TheoryField::ALL {
        let (Some(expected), Some(computed)) = (target.field(field), actual.field(field)) else {
            continue;
        };
        for values in [expected, computed] {
            if values.len() != target.len() {
                return Err(ReferenceError::LengthMismatch {
                    field: field.as_str(),
                    expected: target.len(),
                    found: values.len(),
                });
            }
        }

        let relative_error: Vec<f64> = expected
            .iter()
            .zip(computed)
            .map(|(expected, computed)| pointwise_relative_error(*expected, *computed))
            .collect();
        let max_abs_relative_error = relative_error
            .iter()
            .fold(0.0_f64, |worst, value| worst.max(value.abs()));
        let passes = expected
            .iter()
            .zip(computed)
            .all(|(expected, computed)| {
                compare_with_tolerance(*expected, *computed, tolerance).passes
            });

        debug!(%field, max_abs_relative_error, passes, "compared field");
        fields.push(FieldComparison {
            field,
            relative_error,
            max_abs_relative_error,
            passes,
        });
    }

    Ok(RecordComparison { fields })
}

fn pointwise_relative_error(target: f64, actual: f64) -> f64 {
    if target == actual {
        0.0
    } else {
        target / actual - 1.0
    }
}
