mod commands;
mod helpers;

use clap::Parser;
use sasbeta_core::domain::SasError;
use sasbeta_core::reference::ReferenceError;
use sasbeta_core::theory::TheoryInputError;

pub fn run_from_env() -> i32 {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match run(args) {
        Ok(code) => code,
        Err(error) => {
            let diagnostic = error.as_sas_error();
            eprintln!("{}", diagnostic.diagnostic_line());
            if let Some(summary_line) = diagnostic.fatal_exit_line() {
                eprintln!("{}", summary_line);
            }
            diagnostic.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("sasbeta".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();
    parse_and_dispatch(full_args)
}

fn parse_and_dispatch(args: Vec<String>) -> Result<i32, CliError> {
    match Cli::try_parse_from(&args) {
        Ok(cli) => {
            helpers::init_tracing(cli.verbose);
            dispatch_parsed(cli.command)
        }
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "sasbeta",
    version,
    about = "Polydisperse small-angle scattering with the decoupling approximation"
)]
struct Cli {
    /// Log debug diagnostics to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Compute a polydisperse sphere profile
    Sphere(commands::SphereArgs),
    /// Compute a polydisperse ellipsoid of revolution profile
    Ellipsoid(commands::EllipsoidArgs),
    /// Compute the profile described by a JSON request document
    Request(commands::RequestArgs),
    /// Compare a computed profile against reference curves
    Compare(commands::CompareArgs),
}

fn dispatch_parsed(command: CliCommand) -> Result<i32, CliError> {
    match command {
        CliCommand::Sphere(args) => commands::run_sphere_command(args),
        CliCommand::Ellipsoid(args) => commands::run_ellipsoid_command(args),
        CliCommand::Request(args) => commands::run_request_command(args),
        CliCommand::Compare(args) => commands::run_compare_command(args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Compute(SasError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CliError {
    pub fn as_sas_error(&self) -> SasError {
        match self {
            Self::Usage(message) => SasError::input_validation("INPUT.CLI_USAGE", message.clone()),
            Self::Compute(error) => error.clone(),
            Self::Internal(error) => SasError::io_system("IO.CLI", format!("{error:#}")),
        }
    }
}

impl From<SasError> for CliError {
    fn from(error: SasError) -> Self {
        Self::Compute(error)
    }
}

impl From<TheoryInputError> for CliError {
    fn from(error: TheoryInputError) -> Self {
        Self::Compute(error.into())
    }
}

impl From<ReferenceError> for CliError {
    fn from(error: ReferenceError) -> Self {
        Self::Compute(error.into())
    }
}
