use super::CliError;
use super::helpers::*;
use sasbeta_core::domain::SasError;
use sasbeta_core::numerics::NumericTolerance;
use sasbeta_core::reference::{ColumnFormat, ReferenceTable, TableLayout, compare_records};
use sasbeta_core::theory::{
    EllipsoidGeometry, Geometry, SphereGeometry, TheoryRecord, TheoryRequest, ellipsoid_theta,
};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(clap::Args)]
pub(super) struct OutputFlags {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct SphereArgs {
    /// Sphere radius (Å)
    #[arg(long)]
    radius: f64,

    /// Relative width of the radius distribution
    #[arg(long, default_value_t = 0.0)]
    radius_pd: f64,

    /// Radius distribution: gaussian or schulz
    #[arg(long, default_value = "gaussian")]
    radius_pd_type: String,

    #[command(flatten)]
    model: ModelFlags,

    #[command(flatten)]
    grid: QGridFlags,

    #[command(flatten)]
    output: OutputFlags,
}

#[derive(clap::Args)]
pub(super) struct EllipsoidArgs {
    /// Polar semi-axis (Å)
    #[arg(long)]
    radius_polar: f64,

    /// Equatorial semi-axis (Å)
    #[arg(long)]
    radius_equatorial: f64,

    /// Relative width of the polar radius distribution
    #[arg(long, default_value_t = 0.0)]
    radius_polar_pd: f64,

    /// Polar radius distribution: gaussian or schulz
    #[arg(long, default_value = "gaussian")]
    radius_polar_pd_type: String,

    /// Relative width of the equatorial radius distribution
    #[arg(long, default_value_t = 0.0)]
    radius_equatorial_pd: f64,

    /// Equatorial radius distribution: gaussian or schulz
    #[arg(long, default_value = "gaussian")]
    radius_equatorial_pd_type: String,

    /// Single-size orientation average with the monodisperse intensity scaling;
    /// polydispersity and --norm are ignored
    #[arg(long)]
    single: bool,

    #[command(flatten)]
    model: ModelFlags,

    #[command(flatten)]
    grid: QGridFlags,

    #[command(flatten)]
    output: OutputFlags,
}

#[derive(clap::Args)]
pub(super) struct RequestArgs {
    /// JSON request document
    #[arg(value_name = "REQUEST")]
    request: PathBuf,

    #[command(flatten)]
    output: OutputFlags,
}

#[derive(clap::Args)]
pub(super) struct CompareArgs {
    /// JSON request describing the model; its q grid is replaced by the reference q
    #[arg(long)]
    request: PathBuf,

    /// Reference curve as FIELD=PATH (repeatable), e.g. --reference Seff=sqeff.txt
    #[arg(long = "reference", value_name = "FIELD=PATH", required = true)]
    references: Vec<String>,

    /// Column separator of the reference files
    #[arg(long, default_value = "semicolon")]
    column_format: String,

    /// Leading rows to skip in each reference file
    #[arg(long, default_value_t = 0)]
    skip_rows: usize,

    /// Zero-based column holding the reference values (column 0 is q)
    #[arg(long, default_value_t = 1)]
    value_column: usize,

    /// Absolute tolerance
    #[arg(long)]
    abs_tol: Option<f64>,

    /// Relative tolerance
    #[arg(long)]
    rel_tol: Option<f64>,

    #[command(flatten)]
    output: OutputFlags,
}

pub(super) fn run_sphere_command(args: SphereArgs) -> Result<i32, CliError> {
    let geometry = Geometry::Sphere(SphereGeometry::new(
        args.radius,
        polydispersity(args.radius_pd, &args.radius_pd_type)?,
    ));
    run_geometry(geometry, &args.model, &args.grid, &args.output)
}

pub(super) fn run_ellipsoid_command(args: EllipsoidArgs) -> Result<i32, CliError> {
    if args.single {
        let q = args.grid.to_grid().values()?;
        let record = ellipsoid_theta(
            &q,
            args.radius_polar,
            args.radius_equatorial,
            args.model.contrast(),
            &args.model.structure(),
        )?;
        return write_record(&record, &args.output);
    }

    let geometry = Geometry::Ellipsoid(EllipsoidGeometry::new(
        args.radius_polar,
        args.radius_equatorial,
        polydispersity(args.radius_polar_pd, &args.radius_polar_pd_type)?,
        polydispersity(args.radius_equatorial_pd, &args.radius_equatorial_pd_type)?,
    ));
    run_geometry(geometry, &args.model, &args.grid, &args.output)
}

pub(super) fn run_request_command(args: RequestArgs) -> Result<i32, CliError> {
    let request = TheoryRequest::from_path(&args.request)?;
    debug!(shape = request.geometry.shape_name(), "loaded theory request");
    let record = request.compute()?;
    write_record(&record, &args.output)
}

pub(super) fn run_compare_command(args: CompareArgs) -> Result<i32, CliError> {
    let request = TheoryRequest::from_path(&args.request)?;
    let format = args.column_format.parse::<ColumnFormat>()?;
    let layout = TableLayout::new(format, args.skip_rows);

    let mut target: Option<TheoryRecord> = None;
    for spec in &args.references {
        let (field, path) = parse_reference_spec(spec)?;
        let table = ReferenceTable::from_path(&path, layout)?;
        let q = table.column(0)?;
        let values = table.column(args.value_column)?.to_vec();

        let record = target.get_or_insert_with(|| TheoryRecord::new(q.to_vec()));
        if record.q != q {
            return Err(CliError::Compute(SasError::input_validation(
                "INPUT.REFERENCE_Q",
                format!(
                    "reference '{}' is sampled on a different q grid than the first reference",
                    path.display()
                ),
            )));
        }
        record.set_field(field, values);
    }
    let Some(target) = target else {
        return Err(CliError::Usage("at least one --reference is required".to_string()));
    };

    let actual = request.geometry.theory(
        &target.q,
        request.contrast,
        &request.structure,
        request.normalization,
        request.execution,
    )?;

    let defaults = NumericTolerance::default();
    let tolerance = NumericTolerance::new(
        args.abs_tol.unwrap_or(defaults.abs_tol),
        args.rel_tol.unwrap_or(defaults.rel_tol),
        defaults.relative_floor,
    );
    let comparison = compare_records(&target, &actual, tolerance)?;
    info!(
        fields = comparison.fields.len(),
        passed = comparison.passes(),
        "reference comparison finished"
    );

    let rendered = render_comparison(&comparison, args.output.format)?;
    emit(&rendered, args.output.output.as_deref())?;

    if comparison.passes() { Ok(0) } else { Ok(1) }
}

fn run_geometry(
    geometry: Geometry,
    model: &ModelFlags,
    grid: &QGridFlags,
    output: &OutputFlags,
) -> Result<i32, CliError> {
    let q = grid.to_grid().values()?;
    let record = geometry.theory(
        &q,
        model.contrast(),
        &model.structure(),
        model.normalization()?,
        model.execution(),
    )?;
    write_record(&record, output)
}

fn write_record(record: &TheoryRecord, output: &OutputFlags) -> Result<i32, CliError> {
    let rendered = render_record(record, output.format)?;
    emit(&rendered, output.output.as_deref())?;
    Ok(0)
}
