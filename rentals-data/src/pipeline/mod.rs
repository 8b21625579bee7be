//! The basic-cleaning run: fetch, clean, publish.
//!
//! A run is linear and single-attempt. The output file is written to a
//! run-scoped temporary file and only handed to the store once it is
//! complete and synced; the temporary file is removed when the run ends.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use geo::Coord;
use log::{info, warn};
use rentals_core::{
    ArtifactId, ArtifactRef, ArtifactRefError, ArtifactSpec, ArtifactStore, BoundsError,
    BoxedStoreSource, CleaningOutcome, CleaningReport, CleaningRules, GeoBounds,
    NYC_MAX_LATITUDE, NYC_MAX_LONGITUDE, NYC_MIN_LATITUDE, NYC_MIN_LONGITUDE, PriceBounds,
    StoreError, clean_table,
};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{ReadTableError, WriteTableError, read_listings, write_table};

/// Job type recorded in the metadata of every published artifact.
pub const JOB_TYPE: &str = "basic_cleaning";

/// Raw parameters for one run, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParameters {
    /// Input artifact reference (`name`, `name:latest` or `name:v<N>`).
    pub input_artifact: String,
    /// Name of the artifact to publish.
    pub output_artifact: String,
    /// Type tag of the published artifact.
    pub output_type: String,
    /// Description of the published artifact.
    pub output_description: String,
    /// Lowest accepted price.
    pub min_price: f64,
    /// Highest accepted price.
    pub max_price: f64,
    /// West edge override for the geographic box.
    pub min_longitude: Option<f64>,
    /// East edge override for the geographic box.
    pub max_longitude: Option<f64>,
    /// South edge override for the geographic box.
    pub min_latitude: Option<f64>,
    /// North edge override for the geographic box.
    pub max_latitude: Option<f64>,
}

/// Errors raised while validating [`RunParameters`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The input reference could not be parsed.
    #[error("invalid input artifact: {0}")]
    InputReference(#[source] ArtifactRefError),
    /// The output name is not a valid artifact name.
    #[error("invalid output artifact: {0}")]
    OutputName(#[source] ArtifactRefError),
    /// Price or geographic bounds are not well-formed.
    #[error(transparent)]
    Bounds(#[from] BoundsError),
}

/// Validated, immutable configuration of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    input: ArtifactRef,
    output: ArtifactSpec,
    rules: CleaningRules,
}

impl RunContext {
    /// Assemble a context from already validated parts.
    #[must_use]
    pub const fn new(input: ArtifactRef, output: ArtifactSpec, rules: CleaningRules) -> Self {
        Self {
            input,
            output,
            rules,
        }
    }

    /// Artifact to clean.
    #[must_use]
    pub const fn input(&self) -> &ArtifactRef {
        &self.input
    }

    /// Name, type and description of the artifact to publish.
    #[must_use]
    pub const fn output(&self) -> &ArtifactSpec {
        &self.output
    }

    /// Bounds applied to the input.
    #[must_use]
    pub const fn rules(&self) -> &CleaningRules {
        &self.rules
    }
}

impl TryFrom<RunParameters> for RunContext {
    type Error = ConfigError;

    fn try_from(params: RunParameters) -> Result<Self, Self::Error> {
        let price = PriceBounds::new(params.min_price, params.max_price)?;
        let geo = GeoBounds::new(
            Coord {
                x: params.min_longitude.unwrap_or(NYC_MIN_LONGITUDE),
                y: params.min_latitude.unwrap_or(NYC_MIN_LATITUDE),
            },
            Coord {
                x: params.max_longitude.unwrap_or(NYC_MAX_LONGITUDE),
                y: params.max_latitude.unwrap_or(NYC_MAX_LATITUDE),
            },
        )?;
        let input = params
            .input_artifact
            .parse::<ArtifactRef>()
            .map_err(ConfigError::InputReference)?;
        let output = ArtifactSpec::new(
            params.output_artifact,
            params.output_type,
            params.output_description,
        )
        .map_err(ConfigError::OutputName)?;
        Ok(Self::new(input, output, CleaningRules::new(price, geo)))
    }
}

/// Errors raised while writing and registering the output artifact.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The run-scoped output file could not be created or synced.
    #[error("failed to prepare output file in {dir}: {source}")]
    Scratch {
        /// Working directory.
        dir: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The cleaned table could not be serialized.
    #[error(transparent)]
    Serialize(#[from] WriteTableError),
    /// The store refused the new artifact.
    #[error(transparent)]
    Register(#[from] StoreError),
}

/// Errors that end a cleaning run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run parameters are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The input artifact does not exist.
    #[error("input artifact {reference} was not found")]
    ArtifactNotFound {
        /// Reference that failed to resolve.
        reference: ArtifactRef,
    },
    /// The input artifact exists but could not be read locally.
    #[error("input artifact {reference} is unavailable: {source}")]
    ArtifactUnavailable {
        /// Reference being fetched.
        reference: ArtifactRef,
        /// Underlying cause.
        #[source]
        source: BoxedStoreSource,
    },
    /// The input artifact is not a valid listing table.
    #[error("input artifact {artifact} is malformed: {source}")]
    MalformedInput {
        /// Artifact that was read.
        artifact: ArtifactId,
        /// Parse failure.
        #[source]
        source: ReadTableError,
    },
    /// The output artifact could not be published.
    #[error("failed to publish {name:?}: {source}")]
    Publish {
        /// Output artifact name.
        name: String,
        /// Underlying cause.
        #[source]
        source: PublishError,
    },
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Version of the input that was cleaned.
    pub input: ArtifactId,
    /// Newly published artifact.
    pub output: ArtifactId,
    /// Row counts gathered while cleaning.
    pub cleaning: CleaningReport,
}

/// Run the cleaning step against `store`.
///
/// The output file is created in `work_dir`. Nothing is published unless
/// fetching, parsing, cleaning and serialization all succeed.
///
/// # Errors
///
/// Returns [`PipelineError::ArtifactNotFound`] or
/// [`PipelineError::ArtifactUnavailable`] when the input cannot be fetched,
/// [`PipelineError::MalformedInput`] when it is not a listing table, and
/// [`PipelineError::Publish`] when the output cannot be written or
/// registered.
pub fn run_cleaning<S>(
    store: &S,
    context: &RunContext,
    work_dir: &Utf8Path,
) -> Result<RunReport, PipelineError>
where
    S: ArtifactStore + ?Sized,
{
    let reference = context.input();
    info!("Fetching input artifact {reference}");
    let fetched = store.fetch(reference).map_err(|err| fetch_error(reference, err))?;

    let malformed = |source| PipelineError::MalformedInput {
        artifact: fetched.id.clone(),
        source,
    };
    let table = read_listings(&fetched.path).map_err(malformed)?;
    info!("Read {} rows from {}", table.len(), fetched.id);

    let outcome = clean_table(&table, context.rules())
        .map_err(|err| malformed(ReadTableError::Schema(err)))?;

    let spec = output_spec(context, &fetched.id, &outcome.report);
    let output = publish(store, &outcome, &spec, work_dir).map_err(|source| {
        PipelineError::Publish {
            name: spec.name().to_owned(),
            source,
        }
    })?;
    info!("Published {output} ({} rows)", outcome.report.output_rows);

    Ok(RunReport {
        input: fetched.id,
        output,
        cleaning: outcome.report,
    })
}

fn fetch_error(reference: &ArtifactRef, err: StoreError) -> PipelineError {
    match err {
        StoreError::NotFound { reference } => PipelineError::ArtifactNotFound { reference },
        StoreError::Unavailable { reference, source } => {
            PipelineError::ArtifactUnavailable { reference, source }
        }
        StoreError::Rejected { source, .. } => PipelineError::ArtifactUnavailable {
            reference: reference.clone(),
            source,
        },
    }
}

fn output_spec(context: &RunContext, input: &ArtifactId, report: &CleaningReport) -> ArtifactSpec {
    let rules = context.rules();
    let rect = rules.geo().rect();
    context
        .output()
        .clone()
        .with_metadata("job_type", JOB_TYPE)
        .with_metadata("input_artifact", input.to_string())
        .with_metadata("min_price", rules.price().min())
        .with_metadata("max_price", rules.price().max())
        .with_metadata("min_longitude", rect.min().x)
        .with_metadata("max_longitude", rect.max().x)
        .with_metadata("min_latitude", rect.min().y)
        .with_metadata("max_latitude", rect.max().y)
        .with_metadata("input_rows", report.input_rows)
        .with_metadata("output_rows", report.output_rows)
        .with_metadata("unparsed_dates", report.unparsed_dates)
}

fn publish<S>(
    store: &S,
    outcome: &CleaningOutcome,
    spec: &ArtifactSpec,
    work_dir: &Utf8Path,
) -> Result<ArtifactId, PublishError>
where
    S: ArtifactStore + ?Sized,
{
    let scratch = |source| PublishError::Scratch {
        dir: work_dir.to_path_buf(),
        source,
    };
    let mut file = tempfile::Builder::new()
        .prefix("clean-")
        .suffix(".csv")
        .tempfile_in(work_dir)
        .map_err(scratch)?;
    write_table(file.as_file_mut(), &outcome.table)?;
    file.as_file().sync_all().map_err(scratch)?;

    let path = Utf8Path::from_path(file.path())
        .ok_or_else(|| scratch(io::Error::other("output file path is not UTF-8")))?;
    let id = store.create(path, spec)?;
    discard(file);
    Ok(id)
}

fn discard(file: NamedTempFile) {
    let path = file.path().display().to_string();
    if let Err(err) = file.close() {
        warn!("Failed to remove output file {path}: {err}");
    }
}
