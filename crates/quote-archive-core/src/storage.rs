//! Archive storage contract and backends.
//!
//! An archive is a container of named, row-indexed datasets. This module
//! defines the read contract the rest of the crate depends on
//! ([`ArchiveStore`]) and the in-memory row representation ([`Dataset`]),
//! plus two backends:
//!
//! - [`MemoryArchive`]: named Arrow arrays held in memory.
//! - [`ParquetArchive`]: a directory holding one Parquet file per dataset
//!   (for example `<root>/DateQuotes.parquet`), each with a single `value`
//!   column whose Arrow type encodes the row layout.
//!
//! Datasets are never written through this module. Archives are treated as
//! immutable for the lifetime of any read.

mod error;
mod memory;
mod parquet_store;

use std::ops::Range;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef};
use arrow::datatypes::DataType;
use snafu::prelude::*;

use error::RowOutOfBoundsSnafu;
pub use error::{BackendError, StorageError};
pub use memory::MemoryArchive;
pub use parquet_store::{ParquetArchive, VALUE_COLUMN};

use crate::naming::ArchiveName;

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Represents the location of an archive.
///
/// This enum abstracts over storage backends; only local directories are
/// supported today.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveLocation {
    /// An archive stored as a directory on the local filesystem.
    Local(PathBuf),
}

impl ArchiveLocation {
    /// Creates a new `ArchiveLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        ArchiveLocation::Local(root.into())
    }

    /// Root path of a local archive.
    pub fn root(&self) -> &Path {
        match self {
            ArchiveLocation::Local(root) => root,
        }
    }

    /// Parse the archive name from the last path component, if it follows
    /// the producer naming convention.
    pub fn archive_name(&self) -> Option<ArchiveName> {
        let file_name = self.root().file_name()?.to_str()?;
        file_name.parse().ok()
    }
}

/// Read contract of an archive store.
///
/// Implementations must treat datasets as immutable and must tolerate
/// concurrent readers when shared across threads.
pub trait ArchiveStore {
    /// Names of all datasets in the archive, sorted.
    fn dataset_names(&self) -> StorageResult<Vec<String>>;

    /// Number of rows in the named dataset.
    fn row_count(&self, name: &str) -> StorageResult<usize>;

    /// Random-access handle over every row of the named dataset.
    fn open_dataset(&self, name: &str) -> StorageResult<Dataset>;

    /// Read the half-open row window `rows` of the named dataset.
    ///
    /// `rows.start <= rows.end <= row_count` must hold; an empty window
    /// yields an empty dataset.
    fn read_range(&self, name: &str, rows: Range<usize>) -> StorageResult<Dataset> {
        self.open_dataset(name)?.read_range(rows)
    }

    /// Read the single row at `index` of the named dataset.
    fn read_row(&self, name: &str, index: usize) -> StorageResult<Dataset> {
        self.read_range(name, index..index.saturating_add(1))
    }

    /// Single-row access to the named dataset for the length of one search.
    ///
    /// The default goes through [`ArchiveStore::read_row`]. Backends with a
    /// per-dataset open cost override it to pay that cost once.
    fn row_probe(&self, name: &str) -> StorageResult<Box<dyn RowProbe + '_>> {
        Ok(Box::new(StoreRows {
            store: self,
            name: name.to_string(),
            row_count: self.row_count(name)?,
        }))
    }
}

/// Reads one row at a time from a single dataset.
pub trait RowProbe {
    /// Number of rows in the dataset.
    fn row_count(&self) -> usize;

    /// The row at `index` as a one-row dataset.
    fn read_row(&self, index: usize) -> StorageResult<Dataset>;
}

struct StoreRows<'a, S: ?Sized> {
    store: &'a S,
    name: String,
    row_count: usize,
}

impl<S: ArchiveStore + ?Sized> RowProbe for StoreRows<'_, S> {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn read_row(&self, index: usize) -> StorageResult<Dataset> {
        self.store.read_row(&self.name, index)
    }
}

/// A named run of rows read from an archive.
///
/// Rows are held as one Arrow array: flat datasets use a primitive array
/// (one value per row), nested datasets use (possibly nested)
/// `FixedSizeList` arrays, one list entry per row.
#[derive(Clone, Debug)]
pub struct Dataset {
    name: String,
    values: ArrayRef,
}

impl Dataset {
    /// Wrap an Arrow array as the rows of dataset `name`.
    pub fn new(name: impl Into<String>, values: ArrayRef) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Dataset name inside its archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying Arrow array, one entry per row.
    pub fn values(&self) -> &ArrayRef {
        &self.values
    }

    /// Arrow type of a single row.
    pub fn data_type(&self) -> &DataType {
        self.values.data_type()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    /// True when the dataset holds no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Full shape: the row count followed by the fixed arity of each
    /// nesting level (for example `[N, 2, 10]` for a depth-5 quotes dataset).
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![self.row_count()];
        let mut data_type = self.data_type();
        while let DataType::FixedSizeList(field, size) = data_type {
            shape.push(usize::try_from(*size).unwrap_or(0));
            data_type = field.data_type();
        }
        shape
    }

    /// Zero-copy view of the half-open row window `rows`.
    pub fn read_range(&self, rows: Range<usize>) -> StorageResult<Dataset> {
        let row_count = self.row_count();
        ensure!(
            rows.start <= rows.end && rows.end <= row_count,
            RowOutOfBoundsSnafu {
                name: self.name.clone(),
                start: rows.start,
                end: rows.end,
                row_count,
            }
        );

        Ok(Dataset {
            name: self.name.clone(),
            values: self.values.slice(rows.start, rows.end - rows.start),
        })
    }

    /// Zero-copy view of the single row at `index`.
    pub fn read_row(&self, index: usize) -> StorageResult<Dataset> {
        self.read_range(index..index.saturating_add(1))
    }
}
