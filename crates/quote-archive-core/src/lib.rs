//! Core engine for reading append-only market-data archives.
//!
//! An archive holds one instrument's price bars or order-book quotes as
//! row-aligned, fixed-layout numeric datasets, ordered by a non-decreasing
//! millisecond timestamp. This crate provides:
//!
//! - A storage contract with in-memory and Parquet-directory backends
//!   (`storage` module).
//! - A binary-search range locator that turns a time window into row bounds
//!   without scanning (`locate` module).
//! - Decoders that turn raw rows into [`Bar`] and [`Quote`] values
//!   (`decode` module).
//! - An [`Archive`] reader tying the three together, plus scoped one-shot
//!   helpers ([`locate_range`], [`read_bars`], [`read_quotes`]).
//! - Archive name parsing and record-batch export for tooling.
//!
//! Archives are read-only; nothing in this crate writes them.
#![deny(missing_docs)]

pub mod archive;
pub mod decode;
pub mod error;
pub mod export;
pub mod locate;
pub mod naming;
pub mod records;
pub mod schema;
pub mod storage;
pub mod time;

mod layout;

#[cfg(test)]
pub(crate) mod test_util;

pub use archive::{
    Archive, ArchiveInfo, BarRows, DatasetInfo, QuoteRows, locate_range, read_bars, read_quotes,
};
pub use decode::{decode_bars, decode_quotes};
pub use error::{ArchiveError, ArchiveResult};
pub use export::{bars_to_record_batch, quotes_to_record_batch};
pub use locate::{SearchBound, TimestampColumn, TimestampKey, search_sorted, try_search_sorted};
pub use naming::{
    ArchiveContent, ArchiveName, BarPeriod, ParseArchiveNameError, ParseBarPeriodError,
};
pub use records::{Bar, PriceType, Quote, QuoteEntry};
pub use schema::{ArchiveKind, ArchiveSchema, SchemaError};
pub use storage::{
    ArchiveLocation, ArchiveStore, Dataset, MemoryArchive, ParquetArchive, RowProbe,
    StorageError, StorageResult,
};
