//! Facade crate for the rentals cleaning pipeline.
//!
//! This crate re-exports the core table model and cleaning transform, and
//! exposes the filesystem artifact store and pipeline runner behind the
//! `store-fs` feature.

#![forbid(unsafe_code)]

pub use rentals_core::{
    ArtifactId, ArtifactRef, ArtifactRefError, ArtifactSpec, ArtifactStore, BoundsError,
    CleaningOutcome, CleaningReport, CleaningRules, FetchedArtifact, GeoBounds, PriceBounds,
    StoreError, Table, TableError, Value, clean_table,
};

#[cfg(feature = "store-fs")]
pub use rentals_data::{
    LocalArtifactStore, LocalStoreError, PipelineError, RunContext, RunParameters, RunReport,
    read_listings, run_cleaning, write_table,
};

#[cfg(feature = "test-support")]
pub use rentals_data::test_support;
