//! Wrapper prelude.
//!
//! The `quote-archive` crate is the supported public entry point.
//! Downstream code should prefer importing from this prelude instead of
//! depending on internal core module paths.

pub use crate::storage;
pub use crate::{
    Archive, ArchiveError, ArchiveKind, ArchiveLocation, ArchiveName, ArchiveResult,
    ArchiveSchema, ArchiveStore, Bar, BarPeriod, PriceType, Quote, QuoteEntry, locate_range,
    read_bars, read_quotes,
};
