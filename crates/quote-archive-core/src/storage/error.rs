use std::{error::Error, fmt, io};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use snafu::{Backtrace, prelude::*};

/// Errors produced by the storage backend implementation.
///
/// Only the local filesystem backend exists today; backend-specific I/O errors
/// are wrapped in this enum so higher layers can map them into
/// [`StorageError`] variants with additional context.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
        }
    }
}

/// Errors that can occur while reading datasets from an archive store.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The archive itself (its root directory) was not found.
    #[snafu(display("Archive not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The archive exists but holds no dataset with the requested name.
    #[snafu(display("Dataset {name} not found in archive"))]
    DatasetNotFound {
        /// Name of the dataset that was requested.
        name: String,
    },

    /// An I/O error occurred on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying backend I/O error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The dataset file could not be decoded as Parquet.
    #[snafu(display("Parquet read error at {path}: {source}"))]
    Parquet {
        /// Path of the dataset file.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Arrow failed while materializing the dataset rows.
    #[snafu(display("Arrow error while reading dataset {name}: {source}"))]
    Arrow {
        /// Name of the dataset being read.
        name: String,
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// The dataset file has no column holding the row values.
    #[snafu(display("Dataset file {path} has no '{column}' column"))]
    MissingValueColumn {
        /// Path of the dataset file.
        path: String,
        /// Column name that was expected.
        column: String,
    },

    /// A row read fell outside `0..=row_count` or had `start > end`.
    #[snafu(display(
        "Rows {start}..{end} are out of bounds for dataset {name} with {row_count} rows"
    ))]
    RowOutOfBounds {
        /// Name of the dataset being read.
        name: String,
        /// Requested first row.
        start: usize,
        /// Requested end row (exclusive).
        end: usize,
        /// Number of rows in the dataset.
        row_count: usize,
    },
}
