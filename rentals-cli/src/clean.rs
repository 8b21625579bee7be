//! Clean command implementation for the rentals CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use rentals_core::ArtifactStore;
use rentals_data::{LocalArtifactStore, RunContext, RunParameters, RunReport, run_cleaning};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_INPUT_ARTIFACT, ARG_MAX_LATITUDE, ARG_MAX_LONGITUDE, ARG_MAX_PRICE, ARG_MIN_LATITUDE,
    ARG_MIN_LONGITUDE, ARG_MIN_PRICE, ARG_OUTPUT_ARTIFACT, ARG_OUTPUT_DESCRIPTION,
    ARG_OUTPUT_TYPE, ARG_STORE_DIR, ARG_WORK_DIR, CliError, ENV_INPUT_ARTIFACT, ENV_MAX_PRICE,
    ENV_MIN_PRICE, ENV_OUTPUT_ARTIFACT, ENV_OUTPUT_DESCRIPTION, ENV_OUTPUT_TYPE,
};

/// Store root used when `--store-dir` is not given.
pub(crate) const DEFAULT_STORE_DIR: &str = "artifacts";

/// CLI arguments for the `clean` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch the raw listings artifact, drop rows outside the \
                 price range and the New York City bounding box, convert \
                 last_review to dates and publish the result as a new \
                 artifact version. Values can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Clean a raw listings sample and publish it"
)]
#[ortho_config(prefix = "RENTALS")]
pub(crate) struct CleanArgs {
    /// Input artifact reference (`name`, `name:latest` or `name:v<N>`).
    #[arg(long = ARG_INPUT_ARTIFACT, value_name = "ref")]
    #[serde(default)]
    pub(crate) input_artifact: Option<String>,
    /// Name of the cleaned artifact.
    #[arg(long = ARG_OUTPUT_ARTIFACT, value_name = "name")]
    #[serde(default)]
    pub(crate) output_artifact: Option<String>,
    /// Type tag of the cleaned artifact.
    #[arg(long = ARG_OUTPUT_TYPE, value_name = "type")]
    #[serde(default)]
    pub(crate) output_type: Option<String>,
    /// Description of the cleaned artifact.
    #[arg(long = ARG_OUTPUT_DESCRIPTION, value_name = "text")]
    #[serde(default)]
    pub(crate) output_description: Option<String>,
    /// Lowest price to keep.
    #[arg(long = ARG_MIN_PRICE, value_name = "price", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_price: Option<f64>,
    /// Highest price to keep.
    #[arg(long = ARG_MAX_PRICE, value_name = "price", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_price: Option<f64>,
    /// Root directory of the artifact store.
    #[arg(long = ARG_STORE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) store_dir: Option<Utf8PathBuf>,
    /// Scratch directory for the output file; defaults to the system temp dir.
    #[arg(long = ARG_WORK_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) work_dir: Option<Utf8PathBuf>,
    /// Override the west edge of the bounding box.
    #[arg(long = ARG_MIN_LONGITUDE, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_longitude: Option<f64>,
    /// Override the east edge of the bounding box.
    #[arg(long = ARG_MAX_LONGITUDE, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_longitude: Option<f64>,
    /// Override the south edge of the bounding box.
    #[arg(long = ARG_MIN_LATITUDE, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) min_latitude: Option<f64>,
    /// Override the north edge of the bounding box.
    #[arg(long = ARG_MAX_LATITUDE, value_name = "deg", allow_negative_numbers = true)]
    #[serde(default)]
    pub(crate) max_latitude: Option<f64>,
}

impl CleanArgs {
    pub(crate) fn into_config(self) -> Result<CleanConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CleanConfig::try_from(merged)
    }
}

/// Resolved `clean` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CleanConfig {
    /// Run parameters handed to the pipeline.
    pub(crate) params: RunParameters,
    /// Root directory of the artifact store.
    pub(crate) store_dir: Utf8PathBuf,
    /// Directory for the run-scoped output file.
    pub(crate) work_dir: Utf8PathBuf,
}

impl CleanConfig {
    /// Validate the run parameters without touching the filesystem.
    pub(crate) fn context(&self) -> Result<RunContext, CliError> {
        RunContext::try_from(self.params.clone()).map_err(CliError::InvalidConfig)
    }

    pub(crate) fn validate_work_dir(&self) -> Result<(), CliError> {
        match rentals_fs::is_dir(&self.work_dir) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CliError::WorkDirNotDirectory {
                path: self.work_dir.clone(),
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                Err(CliError::MissingWorkDir {
                    path: self.work_dir.clone(),
                })
            }
            Err(source) => Err(CliError::InspectWorkDir {
                path: self.work_dir.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<CleanArgs> for CleanConfig {
    type Error = CliError;

    fn try_from(args: CleanArgs) -> Result<Self, Self::Error> {
        let input_artifact = args.input_artifact.ok_or(CliError::MissingArgument {
            field: ARG_INPUT_ARTIFACT,
            env: ENV_INPUT_ARTIFACT,
        })?;
        let output_artifact = args.output_artifact.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_ARTIFACT,
            env: ENV_OUTPUT_ARTIFACT,
        })?;
        let output_type = args.output_type.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_TYPE,
            env: ENV_OUTPUT_TYPE,
        })?;
        let output_description = args.output_description.ok_or(CliError::MissingArgument {
            field: ARG_OUTPUT_DESCRIPTION,
            env: ENV_OUTPUT_DESCRIPTION,
        })?;
        let min_price = args.min_price.ok_or(CliError::MissingArgument {
            field: ARG_MIN_PRICE,
            env: ENV_MIN_PRICE,
        })?;
        let max_price = args.max_price.ok_or(CliError::MissingArgument {
            field: ARG_MAX_PRICE,
            env: ENV_MAX_PRICE,
        })?;

        let store_dir = args
            .store_dir
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STORE_DIR));
        let work_dir = match args.work_dir {
            Some(dir) => dir,
            None => Utf8PathBuf::from_path_buf(std::env::temp_dir()).map_err(|path| {
                CliError::NonUtf8Path {
                    field: ARG_WORK_DIR,
                    path,
                }
            })?,
        };

        Ok(Self {
            params: RunParameters {
                input_artifact,
                output_artifact,
                output_type,
                output_description,
                min_price,
                max_price,
                min_longitude: args.min_longitude,
                max_longitude: args.max_longitude,
                min_latitude: args.min_latitude,
                max_latitude: args.max_latitude,
            },
            store_dir,
            work_dir,
        })
    }
}

/// Builds the artifact store for the current clean invocation.
pub(crate) trait StoreBuilder {
    fn build<'a>(
        &'a self,
        config: &CleanConfig,
    ) -> Result<Box<dyn ArtifactStore + 'a>, CliError>;
}

pub(crate) struct LocalStoreBuilder;

impl StoreBuilder for LocalStoreBuilder {
    fn build<'a>(
        &'a self,
        config: &CleanConfig,
    ) -> Result<Box<dyn ArtifactStore + 'a>, CliError> {
        let store = LocalArtifactStore::open(config.store_dir.clone()).map_err(|source| {
            CliError::OpenStore {
                path: config.store_dir.clone(),
                source,
            }
        })?;
        Ok(Box::new(store))
    }
}

pub(crate) fn run_clean(args: CleanArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_clean_with(args, &LocalStoreBuilder, &mut stdout).map(|_| ())
}

pub(crate) fn run_clean_with(
    args: CleanArgs,
    builder: &dyn StoreBuilder,
    writer: &mut dyn Write,
) -> Result<RunReport, CliError> {
    let config = args.into_config()?;
    execute_clean(&config, builder, writer)
}

/// Validate `config`, run the pipeline and print the new artifact id.
///
/// Parameters are checked before the work directory is inspected, and both
/// before the store is opened.
pub(crate) fn execute_clean(
    config: &CleanConfig,
    builder: &dyn StoreBuilder,
    writer: &mut dyn Write,
) -> Result<RunReport, CliError> {
    let context = config.context()?;
    config.validate_work_dir()?;
    let store = builder.build(config)?;
    let report = run_cleaning(&*store, &context, &config.work_dir)?;
    info!(
        "Cleaned {} into {}: kept {} of {} rows",
        report.input, report.output, report.cleaning.output_rows, report.cleaning.input_rows
    );
    writeln!(writer, "{}", report.output).map_err(CliError::WriteOutput)?;
    Ok(report)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<CleanConfig, CliError> {
    let merged = CleanArgs::merge_from_layers(layers).map_err(CliError::from)?;
    CleanConfig::try_from(merged)
}
