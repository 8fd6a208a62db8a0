//! # quote-archive
//!
//! Read access to append-only market-data archives: price bars and
//! multi-level order-book quotes, restricted to a time window by binary
//! search instead of a scan.
//!
//! This crate is the supported public entry point and provides a small, stable surface.
//!
//! ## Example
//!
//! ```no_run
//! use quote_archive::prelude::*;
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> Result<(), ArchiveError> {
//! let archive = Archive::open(&ArchiveLocation::local("EURUSD Bid M1 20180601 20180630"))?;
//! let from = Utc.with_ymd_and_hms(2018, 6, 8, 0, 0, 0).unwrap();
//! let to = Utc.with_ymd_and_hms(2018, 6, 8, 23, 59, 59).unwrap();
//! let bars = archive.bars_between(from, to)?;
//! # let _ = bars;
//! # Ok(())
//! # }
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// Storage backends and the store contract.
pub mod storage {
    pub use quote_archive_core::storage::{
        ArchiveLocation, ArchiveStore, BackendError, Dataset, MemoryArchive, ParquetArchive,
        RowProbe, StorageError, StorageResult, VALUE_COLUMN,
    };
}

/// Record-batch export for CSV / JSON tooling.
pub mod export {
    pub use quote_archive_core::export::{bars_to_record_batch, quotes_to_record_batch};
}

pub use quote_archive_core::{
    Archive, ArchiveContent, ArchiveError, ArchiveInfo, ArchiveKind, ArchiveLocation, ArchiveName,
    ArchiveResult, ArchiveSchema, ArchiveStore, Bar, BarPeriod, BarRows, DatasetInfo,
    ParseArchiveNameError, ParseBarPeriodError, PriceType, Quote, QuoteEntry, QuoteRows,
    SchemaError, SearchBound, TimestampColumn, TimestampKey, decode_bars, decode_quotes,
    locate_range, read_bars, read_quotes, search_sorted,
};
