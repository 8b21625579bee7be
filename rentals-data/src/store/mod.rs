//! Filesystem-backed artifact store.
//!
//! Layout below the store root:
//!
//! ```text
//! <root>/<name>/v<N>/manifest.json
//! <root>/<name>/v<N>/files/<name>
//! ```
//!
//! A new version is assembled in a hidden staging directory next to the
//! version directories and renamed into place once complete, so readers
//! never observe a partially written version. Published versions are never
//! modified.

mod manifest;

use std::{
    io::{self, Read, Write},
    sync::atomic::{AtomicU64, Ordering},
};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::fs_utf8::Dir;
use chrono::Utc;
use log::{debug, info, warn};
use rentals_core::{
    ArtifactId, ArtifactRef, ArtifactRefError, ArtifactSpec, ArtifactStore, FetchedArtifact,
    StoreError, VersionSelector, validate_artifact_name,
};
use thiserror::Error;

pub use manifest::{ArtifactManifest, MANIFEST_FILE, PAYLOAD_DIR};
use manifest::digest_hex;

const STAGING_PREFIX: &str = ".staging-";
const MAX_PUBLISH_ATTEMPTS: usize = 16;

static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Errors raised by [`LocalArtifactStore`].
#[derive(Debug, Error)]
pub enum LocalStoreError {
    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A manifest could not be encoded or decoded.
    #[error("invalid manifest at {path}: {source}")]
    Manifest {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A manifest describes a different artifact than its location implies.
    #[error("manifest at {path} describes {found}, expected {expected}")]
    ManifestMismatch {
        /// Manifest path.
        path: Utf8PathBuf,
        /// Identity implied by the directory layout.
        expected: ArtifactId,
        /// Identity recorded in the manifest.
        found: ArtifactId,
    },
    /// The payload does not match the size or digest recorded in its manifest.
    #[error("payload at {path} is corrupt: expected sha256 {expected}, found {found}")]
    Corrupt {
        /// Payload path.
        path: Utf8PathBuf,
        /// Digest recorded in the manifest.
        expected: String,
        /// Digest of the bytes on disk.
        found: String,
    },
    /// The artifact name is not valid.
    #[error(transparent)]
    InvalidName(#[from] ArtifactRefError),
    /// Every version number tried was taken by a concurrent writer.
    #[error("could not claim a new version of {name:?} after {attempts} attempts")]
    Contended {
        /// Artifact name.
        name: String,
        /// Number of rename attempts made.
        attempts: usize,
    },
    /// The next version number would overflow.
    #[error("artifact {name:?} has no version numbers left")]
    VersionsExhausted {
        /// Artifact name.
        name: String,
    },
}

impl LocalStoreError {
    fn io(path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Artifact store rooted at a local directory.
///
/// # Examples
///
/// ```no_run
/// use rentals_core::{ArtifactRef, ArtifactStore};
/// use rentals_data::LocalArtifactStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalArtifactStore::open("artifacts")?;
/// let fetched = store.fetch(&"sample.csv:latest".parse::<ArtifactRef>()?)?;
/// println!("{} is at {}", fetched.id, fetched.path);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LocalArtifactStore {
    root: Utf8PathBuf,
    dir: Dir,
}

impl LocalArtifactStore {
    /// Open the store at `root`, creating the directory when missing.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError::Io`] when the root cannot be created or opened.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, LocalStoreError> {
        let root = root.into();
        let dir =
            rentals_fs::create_dir_all(&root).map_err(|source| LocalStoreError::io(&root, source))?;
        debug!("Opened artifact store at {root}");
        Ok(Self { root, dir })
    }

    /// Store root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Published versions of `name` in ascending order.
    ///
    /// An artifact that was never published has no versions.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError`] for an invalid name or an unreadable artifact
    /// directory.
    pub fn versions(&self, name: &str) -> Result<Vec<u32>, LocalStoreError> {
        validate_artifact_name(name)?;
        match self.dir.open_dir(name) {
            Ok(artifact_dir) => self.versions_in(&artifact_dir, name),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(LocalStoreError::io(self.root.join(name), err)),
        }
    }

    /// Read the manifest of a published version.
    ///
    /// # Errors
    ///
    /// Returns [`LocalStoreError`] when the manifest is missing, unparseable or
    /// describes a different artifact.
    pub fn manifest(&self, id: &ArtifactId) -> Result<ArtifactManifest, LocalStoreError> {
        validate_artifact_name(&id.name)?;
        let relative = version_path(&id.name, id.version).join(MANIFEST_FILE);
        let path = self.root.join(&relative);
        let raw = self
            .dir
            .read_to_string(&relative)
            .map_err(|source| LocalStoreError::io(&path, source))?;
        let manifest: ArtifactManifest = serde_json::from_str(&raw)
            .map_err(|source| LocalStoreError::Manifest {
                path: path.clone(),
                source,
            })?;
        if manifest.id() != *id {
            return Err(LocalStoreError::ManifestMismatch {
                path,
                expected: id.clone(),
                found: manifest.id(),
            });
        }
        Ok(manifest)
    }

    fn versions_in(&self, artifact_dir: &Dir, name: &str) -> Result<Vec<u32>, LocalStoreError> {
        let artifact_path = self.root.join(name);
        let entries = artifact_dir
            .entries()
            .map_err(|source| LocalStoreError::io(&artifact_path, source))?;
        let mut versions = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| LocalStoreError::io(&artifact_path, source))?;
            let Ok(file_name) = entry.file_name() else {
                continue;
            };
            let is_dir = entry
                .file_type()
                .map_err(|source| LocalStoreError::io(artifact_path.join(&file_name), source))?
                .is_dir();
            if let Some(version) = parse_version_dir(&file_name).filter(|_| is_dir) {
                versions.push(version);
            }
        }
        versions.sort_unstable();
        Ok(versions)
    }

    fn resolve(&self, reference: &ArtifactRef) -> Result<Option<ArtifactId>, LocalStoreError> {
        let versions = self.versions(reference.name())?;
        let found = match reference.version() {
            VersionSelector::Latest => versions.last().copied(),
            VersionSelector::Exact(wanted) => versions.binary_search(&wanted).ok().map(|_| wanted),
        };
        Ok(found.map(|version| ArtifactId::new(reference.name(), version)))
    }

    fn materialise(&self, id: &ArtifactId) -> Result<Utf8PathBuf, LocalStoreError> {
        let manifest = self.manifest(id)?;
        validate_artifact_name(&manifest.file_name)?;
        let relative = version_path(&id.name, id.version)
            .join(PAYLOAD_DIR)
            .join(&manifest.file_name);
        let path = self.root.join(&relative);
        let payload = self
            .dir
            .read(&relative)
            .map_err(|source| LocalStoreError::io(&path, source))?;
        let found = digest_hex(&payload);
        let size_matches = u64::try_from(payload.len()).is_ok_and(|len| len == manifest.size_bytes);
        if !size_matches || found != manifest.sha256 {
            return Err(LocalStoreError::Corrupt {
                path,
                expected: manifest.sha256,
                found,
            });
        }
        Ok(path)
    }

    fn publish(&self, file: &Utf8Path, spec: &ArtifactSpec) -> Result<ArtifactId, LocalStoreError> {
        validate_artifact_name(spec.name())?;
        let payload = read_source(file)?;
        let name = spec.name();
        let artifact_path = self.root.join(name);
        self.dir
            .create_dir_all(name)
            .map_err(|source| LocalStoreError::io(&artifact_path, source))?;
        let artifact_dir = self
            .dir
            .open_dir(name)
            .map_err(|source| LocalStoreError::io(&artifact_path, source))?;

        let staging = staging_dir_name();
        let result = self.stage_and_commit(&artifact_dir, &staging, &payload, spec);
        if result.is_err() {
            if let Err(err) = artifact_dir.remove_dir_all(&staging) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove staging directory {artifact_path}/{staging}: {err}");
                }
            }
        }
        result
    }

    fn stage_and_commit(
        &self,
        artifact_dir: &Dir,
        staging: &str,
        payload: &[u8],
        spec: &ArtifactSpec,
    ) -> Result<ArtifactId, LocalStoreError> {
        let name = spec.name();
        let staging_path = self.root.join(name).join(staging);
        let payload_dir = Utf8Path::new(staging).join(PAYLOAD_DIR);
        artifact_dir
            .create_dir_all(&payload_dir)
            .map_err(|source| LocalStoreError::io(staging_path.join(PAYLOAD_DIR), source))?;
        let payload_path = payload_dir.join(name);
        write_synced(artifact_dir, &payload_path, payload)
            .map_err(|source| LocalStoreError::io(self.root.join(name).join(&payload_path), source))?;

        for _ in 0..MAX_PUBLISH_ATTEMPTS {
            let version = self.next_version(artifact_dir, name)?;
            let manifest = ArtifactManifest::describe(spec, version, payload);
            let manifest_path = Utf8Path::new(staging).join(MANIFEST_FILE);
            let encoded = serde_json::to_vec_pretty(&manifest).map_err(|source| {
                LocalStoreError::Manifest {
                    path: staging_path.join(MANIFEST_FILE),
                    source,
                }
            })?;
            write_synced(artifact_dir, &manifest_path, &encoded)
                .map_err(|source| LocalStoreError::io(staging_path.join(MANIFEST_FILE), source))?;

            let target = format!("v{version}");
            match artifact_dir.rename(staging, artifact_dir, &target) {
                Ok(()) => {
                    let id = manifest.id();
                    info!(
                        "Stored artifact {id} ({} bytes, sha256 {})",
                        manifest.size_bytes, manifest.sha256
                    );
                    return Ok(id);
                }
                Err(err) if version_taken(&err) => {
                    debug!("Version {target} of {name} was claimed concurrently; retrying");
                }
                Err(err) => {
                    return Err(LocalStoreError::io(self.root.join(name).join(target), err));
                }
            }
        }
        Err(LocalStoreError::Contended {
            name: name.to_owned(),
            attempts: MAX_PUBLISH_ATTEMPTS,
        })
    }

    fn next_version(&self, artifact_dir: &Dir, name: &str) -> Result<u32, LocalStoreError> {
        match self.versions_in(artifact_dir, name)?.last() {
            None => Ok(0),
            Some(latest) => latest
                .checked_add(1)
                .ok_or_else(|| LocalStoreError::VersionsExhausted {
                    name: name.to_owned(),
                }),
        }
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError> {
        let unavailable = |err: LocalStoreError| StoreError::Unavailable {
            reference: reference.clone(),
            source: Box::new(err),
        };
        let Some(id) = self.resolve(reference).map_err(unavailable)? else {
            return Err(StoreError::NotFound {
                reference: reference.clone(),
            });
        };
        match self.materialise(&id) {
            Ok(path) => {
                debug!("Resolved {reference} to {id} at {path}");
                Ok(FetchedArtifact { id, path })
            }
            Err(err) => Err(unavailable(err)),
        }
    }

    fn create(&self, file: &Utf8Path, spec: &ArtifactSpec) -> Result<ArtifactId, StoreError> {
        self.publish(file, spec)
            .map_err(|err| StoreError::Rejected {
                name: spec.name().to_owned(),
                source: Box::new(err),
            })
    }
}

fn version_path(name: &str, version: u32) -> Utf8PathBuf {
    Utf8Path::new(name).join(format!("v{version}"))
}

fn parse_version_dir(file_name: &str) -> Option<u32> {
    let digits = file_name.strip_prefix('v')?;
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn staging_dir_name() -> String {
    let sequence = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
    let stamp = Utc::now().timestamp_micros();
    format!("{STAGING_PREFIX}{}-{stamp}-{sequence}", std::process::id())
}

fn version_taken(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::AlreadyExists | io::ErrorKind::DirectoryNotEmpty
    )
}

fn read_source(file: &Utf8Path) -> Result<Vec<u8>, LocalStoreError> {
    let mut payload = Vec::new();
    rentals_fs::open_utf8_file(file)
        .and_then(|mut handle| handle.read_to_end(&mut payload))
        .map_err(|source| LocalStoreError::io(file, source))?;
    Ok(payload)
}

fn write_synced(dir: &Dir, path: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = dir.create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
