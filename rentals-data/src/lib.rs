//! Adapters and the run loop for the rentals cleaning step.
//!
//! Responsibilities:
//! - Read and write listing tables as comma-separated text.
//! - Persist artifacts in a versioned directory tree.
//! - Drive one fetch, clean and publish run against any [`ArtifactStore`].
//!
//! Boundaries:
//! - Cleaning rules live in `rentals-core`; nothing here filters rows.
//! - Argument parsing and logging setup belong to the CLI.
//!
//! [`ArtifactStore`]: rentals_core::ArtifactStore
#![forbid(unsafe_code)]

mod delimited;
mod pipeline;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use delimited::{ReadTableError, WriteTableError, read_listings, read_table, write_table};
pub use pipeline::{
    ConfigError, JOB_TYPE, PipelineError, PublishError, RunContext, RunParameters, RunReport,
    run_cleaning,
};
pub use store::{
    ArtifactManifest, LocalArtifactStore, LocalStoreError, MANIFEST_FILE, PAYLOAD_DIR,
};
