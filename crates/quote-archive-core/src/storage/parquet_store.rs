//! Parquet directory backend.
//!
//! An archive is a directory with one Parquet file per dataset, named
//! `<dataset>.parquet`. Each file carries the rows in a single column named
//! [`VALUE_COLUMN`]; its Arrow type encodes the row layout (a primitive type
//! for flat rows, `FixedSizeList` for fixed-arity rows).
//!
//! Range reads push the row window into the Parquet reader as a
//! [`RowSelection`], so only the pages covering the window are decoded.
//! Row probes keep the file and its parsed footer for the length of a
//! search, so each probe costs one single-row selection.

use std::fs::{self, File};
use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use arrow::array::{Array, ArrayRef, new_empty_array};
use arrow::compute::concat;
use arrow::datatypes::DataType;
use log::debug;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{
    ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReader,
    ParquetRecordBatchReaderBuilder, RowSelection,
};
use snafu::prelude::*;

use super::error::{
    ArrowSnafu, BackendError, DatasetNotFoundSnafu, MissingValueColumnSnafu, NotFoundSnafu,
    OtherIoSnafu, ParquetSnafu, RowOutOfBoundsSnafu,
};
use super::{ArchiveLocation, ArchiveStore, Dataset, RowProbe, StorageResult};

/// Name of the column holding the row values in every dataset file.
pub const VALUE_COLUMN: &str = "value";

const DATASET_EXTENSION: &str = "parquet";

/// An archive stored as a directory of per-dataset Parquet files.
///
/// Holding a `ParquetArchive` keeps no file open; every read opens the
/// dataset file and closes it before returning. A [`RowProbe`] holds its
/// file until dropped.
#[derive(Clone, Debug)]
pub struct ParquetArchive {
    root: PathBuf,
}

impl ParquetArchive {
    /// Open the archive at `location`, checking that its directory exists.
    pub fn open(location: &ArchiveLocation) -> StorageResult<Self> {
        let root = location.root();
        let meta = fs::metadata(root)
            .map_err(BackendError::Local)
            .context(NotFoundSnafu {
                path: root.display().to_string(),
            })?;

        if !meta.is_dir() {
            let source = io::Error::new(io::ErrorKind::NotADirectory, "archive is not a directory");
            return Err(BackendError::Local(source)).context(NotFoundSnafu {
                path: root.display().to_string(),
            });
        }

        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Root directory of the archive.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dataset_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{DATASET_EXTENSION}"))
    }

    /// Open the dataset file, parse its footer and project to the value column.
    fn dataset_file(&self, name: &str) -> StorageResult<DatasetFile> {
        let path = self.dataset_path(name);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return DatasetNotFoundSnafu { name }.fail();
            }
            Err(e) => {
                return Err(BackendError::Local(e)).context(OtherIoSnafu {
                    path: path.display().to_string(),
                });
            }
        };

        // The offset index lets single-row selections skip unrelated pages.
        let options = ArrowReaderOptions::new().with_page_index(true);
        let metadata = ArrowReaderMetadata::load(&file, options).context(ParquetSnafu {
            path: path.display().to_string(),
        })?;

        let value_idx = metadata.schema().index_of(VALUE_COLUMN).map_err(|_| {
            MissingValueColumnSnafu {
                path: path.display().to_string(),
                column: VALUE_COLUMN,
            }
            .build()
        })?;
        let value_type = metadata.schema().field(value_idx).data_type().clone();
        let mask = ProjectionMask::roots(metadata.parquet_schema(), [value_idx]);

        Ok(DatasetFile {
            name: name.to_string(),
            path,
            file,
            metadata,
            mask,
            value_type,
        })
    }
}

/// One opened dataset file with its footer already parsed.
struct DatasetFile {
    name: String,
    path: PathBuf,
    file: File,
    metadata: ArrowReaderMetadata,
    mask: ProjectionMask,
    value_type: DataType,
}

impl DatasetFile {
    fn num_rows(&self) -> usize {
        usize::try_from(self.metadata.metadata().file_metadata().num_rows()).unwrap_or(0)
    }

    fn reader(
        &self,
        selection: Option<RowSelection>,
    ) -> StorageResult<ParquetRecordBatchReader> {
        let path = || self.path.display().to_string();
        let file = self
            .file
            .try_clone()
            .map_err(BackendError::Local)
            .context(OtherIoSnafu { path: path() })?;

        let mut builder =
            ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone())
                .with_projection(self.mask.clone());
        if let Some(selection) = selection {
            builder = builder.with_row_selection(selection);
        }
        builder.build().context(ParquetSnafu { path: path() })
    }

    /// Drain a reader into one contiguous value array.
    fn collect(&self, selection: Option<RowSelection>) -> StorageResult<Dataset> {
        let name = self.name.as_str();
        let mut chunks: Vec<ArrayRef> = Vec::new();
        for batch in self.reader(selection)? {
            let batch = batch.context(ArrowSnafu { name })?;
            // After projection, the value column is at 0.
            chunks.push(batch.column(0).clone());
        }

        let values = match chunks.len() {
            0 => new_empty_array(&self.value_type),
            1 => chunks.remove(0),
            _ => {
                let parts: Vec<&dyn Array> = chunks.iter().map(|c| c.as_ref()).collect();
                concat(&parts).context(ArrowSnafu { name })?
            }
        };

        Ok(Dataset::new(name, values))
    }

    fn read_all(&self) -> StorageResult<Dataset> {
        debug!(
            "loading dataset {} ({} rows) from {}",
            self.name,
            self.num_rows(),
            self.path.display()
        );
        self.collect(None)
    }

    fn read_rows(&self, rows: Range<usize>) -> StorageResult<Dataset> {
        let row_count = self.num_rows();
        ensure!(
            rows.start <= rows.end && rows.end <= row_count,
            RowOutOfBoundsSnafu {
                name: self.name.as_str(),
                start: rows.start,
                end: rows.end,
                row_count,
            }
        );

        if rows.is_empty() {
            return Ok(Dataset::new(
                self.name.as_str(),
                new_empty_array(&self.value_type),
            ));
        }

        let selection = RowSelection::from_consecutive_ranges(std::iter::once(rows), row_count);
        self.collect(Some(selection))
    }
}

impl RowProbe for DatasetFile {
    fn row_count(&self) -> usize {
        self.num_rows()
    }

    fn read_row(&self, index: usize) -> StorageResult<Dataset> {
        self.read_rows(index..index.saturating_add(1))
    }
}

impl ArchiveStore for ParquetArchive {
    fn dataset_names(&self) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: self.root.display().to_string(),
            })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(BackendError::Local).context(OtherIoSnafu {
                path: self.root.display().to_string(),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn row_count(&self, name: &str) -> StorageResult<usize> {
        Ok(self.dataset_file(name)?.num_rows())
    }

    fn open_dataset(&self, name: &str) -> StorageResult<Dataset> {
        self.dataset_file(name)?.read_all()
    }

    fn read_range(&self, name: &str, rows: Range<usize>) -> StorageResult<Dataset> {
        self.dataset_file(name)?.read_rows(rows)
    }

    fn row_probe(&self, name: &str) -> StorageResult<Box<dyn RowProbe + '_>> {
        Ok(Box::new(self.dataset_file(name)?))
    }
}
