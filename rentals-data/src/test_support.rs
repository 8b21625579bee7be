//! In-memory [`ArtifactStore`] used by unit and behaviour tests.

use std::{
    collections::BTreeMap,
    io::{self, Read},
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use camino::{Utf8Path, Utf8PathBuf};
use rentals_core::{
    ArtifactId, ArtifactRef, ArtifactSpec, ArtifactStore, FetchedArtifact, Metadata, StoreError,
    VersionSelector,
};
use tempfile::TempDir;

/// A version held by [`MemoryArtifactStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArtifact {
    /// Identity assigned on creation.
    pub id: ArtifactId,
    /// Type tag.
    pub kind: String,
    /// Description.
    pub description: String,
    /// Attached metadata.
    pub metadata: Metadata,
    /// File contents.
    pub contents: Vec<u8>,
}

/// Artifact store keeping every version in memory.
///
/// Fetched artifacts are written to a private scratch directory removed on
/// drop. Fetching and creating can be switched to fail for error-path tests.
#[derive(Debug)]
pub struct MemoryArtifactStore {
    scratch: TempDir,
    artifacts: Mutex<BTreeMap<String, Vec<StoredArtifact>>>,
    fetch_unavailable: AtomicBool,
    reject_create: AtomicBool,
}

impl MemoryArtifactStore {
    /// Create an empty store.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating the scratch directory.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            scratch: TempDir::new()?,
            artifacts: Mutex::new(BTreeMap::new()),
            fetch_unavailable: AtomicBool::new(false),
            reject_create: AtomicBool::new(false),
        })
    }

    /// Add `contents` as the next version of `spec.name()`.
    #[must_use]
    pub fn seed(&self, spec: &ArtifactSpec, contents: impl Into<Vec<u8>>) -> ArtifactId {
        let mut artifacts = self.lock();
        let versions = artifacts.entry(spec.name().to_owned()).or_default();
        let version = u32::try_from(versions.len()).unwrap_or(u32::MAX);
        let id = ArtifactId::new(spec.name(), version);
        versions.push(StoredArtifact {
            id: id.clone(),
            kind: spec.kind().to_owned(),
            description: spec.description().to_owned(),
            metadata: spec.metadata().clone(),
            contents: contents.into(),
        });
        id
    }

    /// Make every subsequent fetch of an existing artifact fail.
    pub fn set_fetch_unavailable(&self, unavailable: bool) {
        self.fetch_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every subsequent create fail.
    pub fn set_reject_create(&self, reject: bool) {
        self.reject_create.store(reject, Ordering::SeqCst);
    }

    /// All versions of `name` in creation order.
    #[must_use]
    pub fn versions(&self, name: &str) -> Vec<StoredArtifact> {
        self.lock().get(name).cloned().unwrap_or_default()
    }

    /// Highest version of `name`, if any.
    #[must_use]
    pub fn latest(&self, name: &str) -> Option<StoredArtifact> {
        self.lock().get(name).and_then(|versions| versions.last().cloned())
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<StoredArtifact>>> {
        self.artifacts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, reference: &ArtifactRef) -> Option<StoredArtifact> {
        let artifacts = self.lock();
        let versions = artifacts.get(reference.name())?;
        match reference.version() {
            VersionSelector::Latest => versions.last().cloned(),
            VersionSelector::Exact(version) => usize::try_from(version)
                .ok()
                .and_then(|index| versions.get(index).cloned()),
        }
    }

    fn materialise(&self, artifact: &StoredArtifact) -> io::Result<Utf8PathBuf> {
        let scratch = Utf8Path::from_path(self.scratch.path())
            .ok_or_else(|| io::Error::other("scratch directory is not UTF-8"))?;
        let dir_path = scratch
            .join(&artifact.id.name)
            .join(format!("v{}", artifact.id.version));
        let dir = rentals_fs::create_dir_all(&dir_path)?;
        dir.write(&artifact.id.name, &artifact.contents)?;
        Ok(dir_path.join(&artifact.id.name))
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn fetch(&self, reference: &ArtifactRef) -> Result<FetchedArtifact, StoreError> {
        let Some(artifact) = self.lookup(reference) else {
            return Err(StoreError::NotFound {
                reference: reference.clone(),
            });
        };
        let unavailable = |source: io::Error| StoreError::Unavailable {
            reference: reference.clone(),
            source: Box::new(source),
        };
        if self.fetch_unavailable.load(Ordering::SeqCst) {
            return Err(unavailable(io::Error::other("fetching is switched off")));
        }
        let path = self.materialise(&artifact).map_err(unavailable)?;
        Ok(FetchedArtifact {
            id: artifact.id,
            path,
        })
    }

    fn create(&self, file: &Utf8Path, spec: &ArtifactSpec) -> Result<ArtifactId, StoreError> {
        let rejected = |source: io::Error| StoreError::Rejected {
            name: spec.name().to_owned(),
            source: Box::new(source),
        };
        if self.reject_create.load(Ordering::SeqCst) {
            return Err(rejected(io::Error::other("creating is switched off")));
        }
        let mut contents = Vec::new();
        rentals_fs::open_utf8_file(file)
            .and_then(|mut handle| handle.read_to_end(&mut contents))
            .map_err(rejected)?;
        Ok(self.seed(spec, contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::fs;

    #[fixture]
    fn store() -> MemoryArtifactStore {
        MemoryArtifactStore::new().expect("scratch dir")
    }

    fn spec() -> ArtifactSpec {
        ArtifactSpec::new("sample.csv", "raw_data", "Raw listings").expect("valid name")
    }

    #[rstest]
    fn seeded_versions_are_fetchable(store: MemoryArtifactStore) {
        let _ = store.seed(&spec(), "price\n1\n");
        let second = store.seed(&spec(), "price\n2\n");
        assert_eq!(second, ArtifactId::new("sample.csv", 1));

        let reference = ArtifactRef::latest("sample.csv").expect("valid name");
        let fetched = store.fetch(&reference).expect("fetch latest");
        assert_eq!(fetched.id, second);
        assert_eq!(fs::read_to_string(&fetched.path).expect("read"), "price\n2\n");
    }

    #[rstest]
    fn switches_force_failures(store: MemoryArtifactStore) {
        let _ = store.seed(&spec(), "price\n1\n");
        store.set_fetch_unavailable(true);
        let reference = ArtifactRef::latest("sample.csv").expect("valid name");
        assert!(matches!(
            store.fetch(&reference),
            Err(StoreError::Unavailable { .. })
        ));

        store.set_reject_create(true);
        let err = store
            .create(Utf8Path::new("unused.csv"), &spec())
            .expect_err("rejected");
        assert!(matches!(err, StoreError::Rejected { .. }));
        assert_eq!(store.versions("sample.csv").len(), 1);
    }

    #[rstest]
    fn unknown_names_are_not_found(store: MemoryArtifactStore) {
        let reference = ArtifactRef::latest("absent.csv").expect("valid name");
        assert!(matches!(
            store.fetch(&reference),
            Err(StoreError::NotFound { .. })
        ));
    }
}
