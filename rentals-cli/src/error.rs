//! Error types emitted by the rentals CLI.
//!
//! Keep this error type reasonably small, as every CLI helper returns
//! `Result<_, CliError>`.

use std::{path::PathBuf, sync::Arc};

use camino::Utf8PathBuf;
use rentals_data::{ConfigError, LocalStoreError, PipelineError};
use thiserror::Error;

/// Errors emitted by the rentals CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A path could not be represented as UTF-8.
    #[error("{field} path {path:?} is not valid UTF-8")]
    NonUtf8Path { field: &'static str, path: PathBuf },
    /// The merged values do not form a valid run.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    /// The working directory does not exist.
    #[error("work directory {path:?} does not exist")]
    MissingWorkDir { path: Utf8PathBuf },
    /// The working directory exists but is not a directory.
    #[error("work directory {path:?} is not a directory")]
    WorkDirNotDirectory { path: Utf8PathBuf },
    /// The working directory could not be inspected.
    #[error("failed to inspect work directory {path:?}: {source}")]
    InspectWorkDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the artifact store failed.
    #[error("failed to open artifact store at {path:?}: {source}")]
    OpenStore {
        path: Utf8PathBuf,
        #[source]
        source: LocalStoreError,
    },
    /// The cleaning run failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Writing the published artifact id failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
