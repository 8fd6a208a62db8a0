//! Error types and SNAFU context selectors for archive reads.
//!
//! `ArchiveError` is the error surfaced by the public read API (range
//! location, decoding, the `Archive` reader). Context selectors are
//! `pub(crate)` so sibling modules can attach context without re-exporting
//! everything at the crate root. An empty row range is never an error.

use arrow::{datatypes::DataType, error::ArrowError};
use snafu::prelude::*;

use crate::storage::StorageError;

/// Result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors from range location and record decoding.
///
/// All errors are deterministic: retrying the same read against the same
/// archive fails the same way.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ArchiveError {
    /// The archive has no dataset with the requested name.
    #[snafu(display("Dataset {name} is missing from the archive"))]
    MissingDataset {
        /// Name of the dataset that was requested.
        name: String,
    },

    /// Two datasets that must be row-aligned have different row counts.
    #[snafu(display(
        "Row count mismatch: {left} has {left_rows} rows but {right} has {right_rows}"
    ))]
    LengthMismatch {
        /// Name of the first dataset.
        left: String,
        /// Rows read from the first dataset.
        left_rows: usize,
        /// Name of the second dataset.
        right: String,
        /// Rows read from the second dataset.
        right_rows: usize,
    },

    /// A row does not have the shape its dataset promises (for example an
    /// odd-length quote vector, or a null inside a numeric row).
    #[snafu(display("Malformed row in {dataset}: {reason}"))]
    MalformedRow {
        /// Name of the dataset holding the row.
        dataset: String,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// The dataset's element type cannot be read with the requested layout.
    #[snafu(display("Dataset {dataset} has unsupported layout {datatype:?} (expected {expected})"))]
    UnsupportedLayout {
        /// Name of the dataset.
        dataset: String,
        /// Arrow type actually found.
        datatype: DataType,
        /// Short description of the layout that was expected.
        expected: String,
    },

    /// A millisecond timestamp cannot be represented as a UTC instant.
    #[snafu(display("Timestamp {millis} ms is outside the representable range"))]
    TimestampOutOfRange {
        /// The offending value in milliseconds since the Unix epoch.
        millis: i64,
    },

    /// Storage error while accessing archive data.
    #[snafu(display("Storage error while reading archive: {source}"))]
    Storage {
        /// Underlying storage error.
        source: StorageError,
    },

    /// Arrow error while flattening decoded records into a record batch.
    #[snafu(display("Arrow error while exporting records: {source}"))]
    Export {
        /// Underlying Arrow error.
        source: ArrowError,
    },
}

impl ArchiveError {
    /// Map a storage error, reporting an absent dataset as
    /// [`ArchiveError::MissingDataset`].
    pub(crate) fn from_storage(source: StorageError) -> Self {
        match source {
            StorageError::DatasetNotFound { name } => ArchiveError::MissingDataset { name },
            source => ArchiveError::Storage { source },
        }
    }
}
