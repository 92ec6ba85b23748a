use super::CliError;
use anyhow::Context;
use sasbeta_core::domain::{ExecutionMode, Normalization, SasError};
use sasbeta_core::models::{Contrast, DistributionKind, Polydispersity};
use sasbeta_core::reference::RecordComparison;
use sasbeta_core::theory::{QGrid, StructureSpec, TheoryField, TheoryRecord};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub(super) const DEFAULT_LOG_FILTER: &str = "warn";

/// Installs the stderr subscriber; later calls in the same process are ignored.
pub(super) fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub(super) enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(clap::Args, Debug, Clone)]
pub(super) struct QGridFlags {
    /// Explicit comma-separated q values (1/Å); overrides the generated grid
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    q: Vec<f64>,

    /// Generate q evenly spaced instead of log-spaced
    #[arg(long)]
    q_linear: bool,

    /// First q: a base-10 exponent for log spacing, a value for linear spacing
    #[arg(long, default_value_t = -5.0, allow_negative_numbers = true)]
    q_start: f64,

    /// Last q: a base-10 exponent for log spacing, a value for linear spacing
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    q_end: f64,

    /// Number of generated q points
    #[arg(long, default_value_t = 250)]
    q_count: usize,
}

impl QGridFlags {
    pub(super) fn to_grid(&self) -> QGrid {
        if !self.q.is_empty() {
            return QGrid::Explicit {
                values: self.q.clone(),
            };
        }
        if self.q_linear {
            QGrid::Linspace {
                start: self.q_start,
                end: self.q_end,
                count: self.q_count,
            }
        } else {
            QGrid::Logspace {
                start_exponent: self.q_start,
                end_exponent: self.q_end,
                count: self.q_count,
            }
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
pub(super) struct ModelFlags {
    /// Particle scattering length density (1e-6/Å²)
    #[arg(long, default_value_t = 4.0, allow_negative_numbers = true)]
    sld: f64,

    /// Solvent scattering length density (1e-6/Å²)
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    sld_solvent: f64,

    /// Hard-sphere volume fraction
    #[arg(long, default_value_t = 0.0)]
    volfraction: f64,

    /// Effective hard-sphere radius (Å); derived from the geometry when omitted
    #[arg(long)]
    radius_effective: Option<f64>,

    /// Normalization convention: sasview, sasfit or yun
    #[arg(long, default_value = "sasview")]
    norm: String,

    /// Sweep the size distribution on the rayon thread pool
    #[arg(long)]
    parallel: bool,
}

impl ModelFlags {
    pub(super) fn contrast(&self) -> Contrast {
        Contrast::new(self.sld, self.sld_solvent)
    }

    pub(super) fn structure(&self) -> StructureSpec {
        StructureSpec::new(self.volfraction, self.radius_effective)
    }

    pub(super) fn normalization(&self) -> Result<Normalization, CliError> {
        Ok(self.norm.parse::<Normalization>()?)
    }

    pub(super) fn execution(&self) -> ExecutionMode {
        if self.parallel {
            ExecutionMode::Parallel
        } else {
            ExecutionMode::Serial
        }
    }
}

pub(super) fn polydispersity(fraction: f64, kind: &str) -> Result<Polydispersity, CliError> {
    let kind = kind
        .parse::<DistributionKind>()
        .map_err(|error| CliError::Compute(SasError::from(error)))?;
    Ok(Polydispersity::new(fraction, kind))
}

/// Parses `FIELD=PATH`.
pub(super) fn parse_reference_spec(spec: &str) -> Result<(TheoryField, PathBuf), CliError> {
    let Some((field, path)) = spec.split_once('=') else {
        return Err(CliError::Usage(format!(
            "reference '{spec}' must have the form FIELD=PATH, e.g. S=sq.txt"
        )));
    };
    let field = field.parse::<TheoryField>()?;
    if path.trim().is_empty() {
        return Err(CliError::Usage(format!("reference '{spec}' has an empty path")));
    }
    Ok((field, PathBuf::from(path.trim())))
}

pub(super) fn render_record(
    record: &TheoryRecord,
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let mut rendered = serde_json::to_string_pretty(record)
                .context("failed to serialize theory record")?;
            rendered.push('\n');
            Ok(rendered)
        }
        OutputFormat::Table => Ok(render_record_table(record)),
    }
}

fn render_record_table(record: &TheoryRecord) -> String {
    let fields = record.available_fields();
    let mut table = String::from("Q");
    for field in &fields {
        let _ = write!(table, " {field}");
    }
    table.push('\n');

    for (row, q) in record.q.iter().enumerate() {
        let _ = write!(table, "{q:.10e}");
        for field in &fields {
            let value = record.field(*field).and_then(|values| values.get(row));
            match value {
                Some(value) => {
                    let _ = write!(table, " {value:.10e}");
                }
                None => table.push_str(" nan"),
            }
        }
        table.push('\n');
    }
    table
}

pub(super) fn render_comparison(
    comparison: &RecordComparison,
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => {
            let mut rendered = serde_json::to_string_pretty(comparison)
                .context("failed to serialize comparison")?;
            rendered.push('\n');
            Ok(rendered)
        }
        OutputFormat::Table => {
            let mut summary = String::new();
            for field in &comparison.fields {
                let _ = writeln!(
                    summary,
                    "{:<6} max |target/actual - 1| = {:.3e}  {}",
                    field.field.as_str(),
                    field.max_abs_relative_error,
                    if field.passes { "PASS" } else { "FAIL" }
                );
            }
            let status = if comparison.passes() { "PASS" } else { "FAIL" };
            let _ = writeln!(summary, "Comparison status: {status}");
            Ok(summary)
        }
    }
}

pub(super) fn emit(rendered: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| {
                    SasError::io_system(
                        "IO.CLI_OUTPUT",
                        format!("failed to create '{}': {source}", parent.display()),
                    )
                })?;
            }
            fs::write(path, rendered).map_err(|source| {
                SasError::io_system(
                    "IO.CLI_OUTPUT",
                    format!("failed to write '{}': {source}", path.display()),
                )
            })?;
            Ok(())
        }
        None => {
            print!("{rendered}");
            Ok(())
        }
    }
}
