//! In-memory archive backend.

use std::collections::BTreeMap;

use arrow::array::ArrayRef;

use super::error::DatasetNotFoundSnafu;
use super::{ArchiveStore, Dataset, StorageResult};

/// An archive whose datasets are Arrow arrays held in memory.
///
/// Useful for embedding archives that were decoded elsewhere and for tests.
/// Reads are zero-copy slices of the stored arrays.
#[derive(Clone, Debug, Default)]
pub struct MemoryArchive {
    datasets: BTreeMap<String, ArrayRef>,
}

impl MemoryArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`MemoryArchive::insert`].
    pub fn with_dataset(mut self, name: impl Into<String>, values: ArrayRef) -> Self {
        self.insert(name, values);
        self
    }

    /// Add or replace the dataset `name`.
    pub fn insert(&mut self, name: impl Into<String>, values: ArrayRef) {
        self.datasets.insert(name.into(), values);
    }

    fn values(&self, name: &str) -> StorageResult<&ArrayRef> {
        self.datasets
            .get(name)
            .ok_or_else(|| DatasetNotFoundSnafu { name }.build())
    }
}

impl ArchiveStore for MemoryArchive {
    fn dataset_names(&self) -> StorageResult<Vec<String>> {
        Ok(self.datasets.keys().cloned().collect())
    }

    fn row_count(&self, name: &str) -> StorageResult<usize> {
        Ok(self.values(name)?.len())
    }

    fn open_dataset(&self, name: &str) -> StorageResult<Dataset> {
        Ok(Dataset::new(name, self.values(name)?.clone()))
    }
}
