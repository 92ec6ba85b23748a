pub mod cli;

pub use cli::{CliError, run, run_from_env};
