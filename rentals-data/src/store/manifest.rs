//! On-disk description of a published artifact version.

use chrono::{DateTime, Utc};
use rentals_core::{ArtifactId, ArtifactSpec, Metadata};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// File name of the manifest inside each version directory.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Directory holding the payload inside each version directory.
pub const PAYLOAD_DIR: &str = "files";

/// Manifest written next to every stored artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    /// Artifact name.
    pub name: String,
    /// Version assigned when the artifact was created.
    pub version: u32,
    /// Artifact type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable description.
    pub description: String,
    /// Payload file name below the version's `files/` directory.
    pub file_name: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Lower-case hex SHA-256 digest of the payload.
    pub sha256: String,
    /// Creation time in UTC.
    pub created_at: DateTime<Utc>,
    /// Metadata supplied by the producer.
    #[serde(default)]
    pub metadata: Metadata,
}

impl ArtifactManifest {
    pub(crate) fn describe(spec: &ArtifactSpec, version: u32, payload: &[u8]) -> Self {
        Self {
            name: spec.name().to_owned(),
            version,
            kind: spec.kind().to_owned(),
            description: spec.description().to_owned(),
            file_name: spec.name().to_owned(),
            size_bytes: u64::try_from(payload.len()).unwrap_or(u64::MAX),
            sha256: digest_hex(payload),
            created_at: Utc::now(),
            metadata: spec.metadata().clone(),
        }
    }

    /// Identifier of the version this manifest describes.
    #[must_use]
    pub fn id(&self) -> ArtifactId {
        ArtifactId::new(self.name.clone(), self.version)
    }
}

pub(crate) fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
