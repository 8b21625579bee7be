//! Command-line interface for the rentals cleaning step.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod clean;
mod error;
mod logging;

pub use error::CliError;

use clean::{CleanArgs, run_clean};

pub(crate) const ARG_INPUT_ARTIFACT: &str = "input-artifact";
pub(crate) const ARG_OUTPUT_ARTIFACT: &str = "output-artifact";
pub(crate) const ARG_OUTPUT_TYPE: &str = "output-type";
pub(crate) const ARG_OUTPUT_DESCRIPTION: &str = "output-description";
pub(crate) const ARG_MIN_PRICE: &str = "min-price";
pub(crate) const ARG_MAX_PRICE: &str = "max-price";
pub(crate) const ARG_STORE_DIR: &str = "store-dir";
pub(crate) const ARG_WORK_DIR: &str = "work-dir";
pub(crate) const ARG_MIN_LONGITUDE: &str = "min-longitude";
pub(crate) const ARG_MAX_LONGITUDE: &str = "max-longitude";
pub(crate) const ARG_MIN_LATITUDE: &str = "min-latitude";
pub(crate) const ARG_MAX_LATITUDE: &str = "max-latitude";

pub(crate) const ENV_INPUT_ARTIFACT: &str = "RENTALS_CMDS_CLEAN_INPUT_ARTIFACT";
pub(crate) const ENV_OUTPUT_ARTIFACT: &str = "RENTALS_CMDS_CLEAN_OUTPUT_ARTIFACT";
pub(crate) const ENV_OUTPUT_TYPE: &str = "RENTALS_CMDS_CLEAN_OUTPUT_TYPE";
pub(crate) const ENV_OUTPUT_DESCRIPTION: &str = "RENTALS_CMDS_CLEAN_OUTPUT_DESCRIPTION";
pub(crate) const ENV_MIN_PRICE: &str = "RENTALS_CMDS_CLEAN_MIN_PRICE";
pub(crate) const ENV_MAX_PRICE: &str = "RENTALS_CMDS_CLEAN_MAX_PRICE";

/// Run the rentals CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration or the
/// selected command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    logging::init_logging();
    match cli.command {
        Command::Clean(args) => run_clean(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "rentals",
    about = "Pipeline steps for the short-term rental listings dataset",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Remove price and location outliers and publish the cleaned sample.
    Clean(CleanArgs),
}

#[cfg(test)]
mod tests;
