//! Artifact identifiers and the store interface consumed by the pipeline.
//!
//! An artifact is an immutable, named, versioned file with a type tag, a
//! description and free-form metadata. Versions are assigned by the store;
//! this crate only describes how artifacts are referenced and requested.

use std::{collections::BTreeMap, error::Error as StdError, fmt, str::FromStr};

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Alias resolving to the highest published version of an artifact.
pub const LATEST_ALIAS: &str = "latest";

/// Free-form metadata attached to a published artifact.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Errors raised when parsing artifact names or references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactRefError {
    /// The name was empty.
    #[error("artifact name must not be empty")]
    EmptyName,
    /// The name contained characters outside `[A-Za-z0-9._-]` or began with `.`.
    #[error("artifact name {name:?} may only contain ASCII letters, digits, '.', '_' and '-' and must not start with '.'")]
    InvalidName {
        /// Offending name.
        name: String,
    },
    /// The version selector was neither `latest` nor `v<N>`.
    #[error("artifact reference {reference:?} has an invalid version {selector:?} (expected `latest` or `v<N>`)")]
    InvalidVersion {
        /// Full reference as supplied.
        reference: String,
        /// The text after the `:` separator.
        selector: String,
    },
}

/// Validate an artifact name.
///
/// # Examples
///
/// ```
/// use rentals_core::validate_artifact_name;
///
/// assert!(validate_artifact_name("clean_sample.csv").is_ok());
/// assert!(validate_artifact_name("../escape").is_err());
/// ```
///
/// # Errors
///
/// Returns [`ArtifactRefError::EmptyName`] or
/// [`ArtifactRefError::InvalidName`].
pub fn validate_artifact_name(name: &str) -> Result<(), ArtifactRefError> {
    if name.is_empty() {
        return Err(ArtifactRefError::EmptyName);
    }
    let allowed = name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));
    if !allowed || name.starts_with('.') {
        return Err(ArtifactRefError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}

/// Which version of a named artifact a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionSelector {
    /// The highest published version.
    Latest,
    /// A specific version number.
    Exact(u32),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str(LATEST_ALIAS),
            Self::Exact(version) => write!(f, "v{version}"),
        }
    }
}

/// A request for an artifact: `name`, `name:latest` or `name:v<N>`.
///
/// # Examples
///
/// ```
/// use rentals_core::{ArtifactRef, VersionSelector};
///
/// # fn main() -> Result<(), rentals_core::ArtifactRefError> {
/// let latest: ArtifactRef = "sample.csv".parse()?;
/// assert_eq!(latest.version(), VersionSelector::Latest);
/// assert_eq!(latest.to_string(), "sample.csv:latest");
///
/// let pinned: ArtifactRef = "sample.csv:v3".parse()?;
/// assert_eq!(pinned.version(), VersionSelector::Exact(3));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    name: String,
    version: VersionSelector,
}

impl ArtifactRef {
    /// Reference the latest version of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactRefError`] when `name` is not a valid artifact name.
    pub fn latest(name: impl Into<String>) -> Result<Self, ArtifactRefError> {
        Self::with_version(name, VersionSelector::Latest)
    }

    /// Reference `name` at the given version.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactRefError`] when `name` is not a valid artifact name.
    pub fn with_version(
        name: impl Into<String>,
        version: VersionSelector,
    ) -> Result<Self, ArtifactRefError> {
        let owned = name.into();
        validate_artifact_name(&owned)?;
        Ok(Self {
            name: owned,
            version,
        })
    }

    /// Artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested version.
    #[must_use]
    pub const fn version(&self) -> VersionSelector {
        self.version
    }
}

impl FromStr for ArtifactRef {
    type Err = ArtifactRefError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let Some((name, selector)) = reference.split_once(':') else {
            return Self::latest(reference);
        };
        let version = parse_selector(selector).ok_or_else(|| ArtifactRefError::InvalidVersion {
            reference: reference.to_owned(),
            selector: selector.to_owned(),
        })?;
        Self::with_version(name, version)
    }
}

fn parse_selector(selector: &str) -> Option<VersionSelector> {
    if selector == LATEST_ALIAS {
        return Some(VersionSelector::Latest);
    }
    let digits = selector.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(VersionSelector::Exact)
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// Identity of a published artifact, rendered as `name:v<N>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactId {
    /// Artifact name.
    pub name: String,
    /// Version assigned by the store.
    pub version: u32,
}

impl ArtifactId {
    /// Build an identifier.
    #[must_use]
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Reference pinned to exactly this artifact.
    #[must_use]
    pub fn to_reference(&self) -> ArtifactRef {
        ArtifactRef {
            name: self.name.clone(),
            version: VersionSelector::Exact(self.version),
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:v{}", self.name, self.version)
    }
}

/// Everything the store needs to register a new artifact besides its file.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSpec {
    name: String,
    kind: String,
    description: String,
    metadata: Metadata,
}

impl ArtifactSpec {
    /// Validate the name and build a spec with empty metadata.
    ///
    /// `kind` is a free-form category tag and is not validated.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactRefError`] when `name` is not a valid artifact name.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, ArtifactRefError> {
        let owned = name.into();
        validate_artifact_name(&owned)?;
        Ok(Self {
            name: owned,
            kind: kind.into(),
            description: description.into(),
            metadata: Metadata::new(),
        })
    }

    /// Attach a metadata entry, replacing any previous value for `key`.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Artifact name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Artifact type tag.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Attached metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }
}

/// A fetched artifact available on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedArtifact {
    /// The version the reference resolved to.
    pub id: ArtifactId,
    /// Readable local copy of the artifact's file.
    pub path: Utf8PathBuf,
}

/// Boxed error carried by store failures.
pub type BoxedStoreSource = Box<dyn StdError + Send + Sync + 'static>;

/// Errors reported by an [`ArtifactStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// No artifact matches the reference.
    #[error("artifact {reference} was not found")]
    NotFound {
        /// The unresolved reference.
        reference: ArtifactRef,
    },
    /// The artifact exists but its content could not be made available locally.
    #[error("artifact {reference} could not be materialised: {source}")]
    Unavailable {
        /// The reference being fetched.
        reference: ArtifactRef,
        /// Underlying cause.
        #[source]
        source: BoxedStoreSource,
    },
    /// The store refused or failed to register a new artifact.
    #[error("store rejected artifact {name:?}: {source}")]
    Rejected {
        /// Name of the artifact being created.
        name: String,
        /// Underlying cause.
        #[source]
        source: BoxedStoreSource,
    },
}

/// The two store operations the cleaning step depends on.
///
/// Implementations decide how artifacts are persisted and how versions are
/// ordered; callers only ever fetch by reference and create from a finished
/// local file.
pub trait ArtifactStore {
    /// Resolve `reference` and return a readable local path to its file.
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError>;

    /// Register the file at `file` as a new version of `spec.name()`.
    ///
    /// The file must be complete; the store copies it and never alters
    /// previously published versions.
    fn create(&self, file: &Utf8Path, spec: &ArtifactSpec) -> Result<ArtifactId, StoreError>;
}

impl<S: ArtifactStore + ?Sized> ArtifactStore for &S {
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError> {
        (**self).fetch(reference)
    }

    fn create(&self, file: &Utf8Path, spec: &ArtifactSpec) -> Result<ArtifactId, StoreError> {
        (**self).create(file, spec)
    }
}
