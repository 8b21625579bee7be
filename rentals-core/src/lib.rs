//! Core domain types for the rentals cleaning pipeline.
//!
//! The crate holds the in-memory [`Table`] model, the inclusive bounds used
//! to filter listings, the pure [`clean_table`] transform and the
//! [`ArtifactStore`] interface through which datasets are fetched and
//! published. Nothing here performs I/O; adapters live in `rentals-data`.
#![forbid(unsafe_code)]

mod artifact;
mod bounds;
mod clean;
mod table;
mod value;

pub use artifact::{
    ArtifactId, ArtifactRef, ArtifactRefError, ArtifactSpec, ArtifactStore, BoxedStoreSource,
    FetchedArtifact, LATEST_ALIAS, Metadata, StoreError, VersionSelector, validate_artifact_name,
};
pub use bounds::{
    BoundsError, GeoBounds, NYC_MAX_LATITUDE, NYC_MAX_LONGITUDE, NYC_MIN_LATITUDE,
    NYC_MIN_LONGITUDE, PriceBounds,
};
pub use clean::{
    CleaningOutcome, CleaningReport, CleaningRules, LAST_REVIEW_COLUMN, LATITUDE_COLUMN,
    LONGITUDE_COLUMN, NUMERIC_COLUMNS, PRICE_COLUMN, REQUIRED_COLUMNS, clean_table,
    parse_review_date,
};
pub use table::{ColumnSummary, Table, TableError};
pub use value::{Value, ValueKind};
