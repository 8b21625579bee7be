//! Test helpers for staging artifact stores and complete clean arguments.

use super::*;
use crate::clean::{CleanArgs, CleanConfig, StoreBuilder};
use camino::{Utf8Path, Utf8PathBuf};
use rentals_core::{ArtifactSpec, ArtifactStore};
use rentals_data::{LocalArtifactStore, test_support::MemoryArtifactStore};
use std::fs;
use tempfile::TempDir;

pub(super) const RAW_SAMPLE: &str = "\
id,price,longitude,latitude,last_review
1,50,-73.9,40.8,2019-01-01
2,9999,-73.9,40.8,2019-01-01
3,60,-70.0,40.8,bad-date
";

pub(super) fn raw_spec() -> ArtifactSpec {
    ArtifactSpec::new("sample.csv", "raw_data", "Raw listings").expect("valid name")
}

/// Scratch layout for one CLI invocation: a store root and a work directory.
pub(super) struct Workspace {
    _dir: TempDir,
    store_dir: Utf8PathBuf,
    work_dir: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let store_dir = root.join("store");
        let work_dir = root.join("work");
        fs::create_dir(&work_dir).expect("create work dir");
        Self {
            _dir: dir,
            store_dir,
            work_dir,
        }
    }

    pub(super) fn store_dir(&self) -> &Utf8Path {
        &self.store_dir
    }

    pub(super) fn work_dir(&self) -> &Utf8Path {
        &self.work_dir
    }

    /// Publish the raw sample into the filesystem store.
    pub(super) fn seed_local_store(&self) -> LocalArtifactStore {
        let store = LocalArtifactStore::open(self.store_dir.clone()).expect("open store");
        let upload = self.work_dir.join("upload.csv");
        fs::write(&upload, RAW_SAMPLE).expect("write upload");
        store.create(&upload, &raw_spec()).expect("seed store");
        fs::remove_file(&upload).expect("remove upload");
        store
    }

    /// Arguments naming every required value plus this workspace's dirs.
    pub(super) fn complete_args(&self) -> CleanArgs {
        CleanArgs {
            input_artifact: Some("sample.csv:latest".into()),
            output_artifact: Some("clean_sample.csv".into()),
            output_type: Some("clean_sample".into()),
            output_description: Some("Data with outliers removed".into()),
            min_price: Some(10.0),
            max_price: Some(500.0),
            store_dir: Some(self.store_dir.clone()),
            work_dir: Some(self.work_dir.clone()),
            ..CleanArgs::default()
        }
    }

    /// Flags equivalent to [`Self::complete_args`].
    pub(super) fn complete_flags(&self) -> Vec<String> {
        [
            (ARG_INPUT_ARTIFACT, "sample.csv:latest"),
            (ARG_OUTPUT_ARTIFACT, "clean_sample.csv"),
            (ARG_OUTPUT_TYPE, "clean_sample"),
            (ARG_OUTPUT_DESCRIPTION, "Data with outliers removed"),
            (ARG_MIN_PRICE, "10"),
            (ARG_MAX_PRICE, "500"),
            (ARG_STORE_DIR, self.store_dir.as_str()),
            (ARG_WORK_DIR, self.work_dir.as_str()),
        ]
        .into_iter()
        .flat_map(|(flag, value)| [format!("--{flag}"), value.to_owned()])
        .collect()
    }
}

/// Store builder handing out a shared in-memory store.
pub(super) struct MemoryStoreBuilder {
    pub(super) store: MemoryArtifactStore,
}

impl MemoryStoreBuilder {
    pub(super) fn seeded() -> Self {
        let store = MemoryArtifactStore::new().expect("memory store");
        let _ = store.seed(&raw_spec(), RAW_SAMPLE);
        Self { store }
    }
}

impl StoreBuilder for MemoryStoreBuilder {
    fn build<'a>(
        &'a self,
        _config: &CleanConfig,
    ) -> Result<Box<dyn ArtifactStore + 'a>, CliError> {
        Ok(Box::new(&self.store))
    }
}
