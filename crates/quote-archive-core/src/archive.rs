//! Archive reader: range location plus decoded reads over one store.
//!
//! [`Archive`] pairs an [`ArchiveStore`] with the [`ArchiveSchema`] naming
//! its datasets. Typical use:
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use quote_archive_core::{Archive, ArchiveLocation};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = Archive::open(&ArchiveLocation::local("EURUSD level2 20180615 20180616"))?;
//! let from = Utc.with_ymd_and_hms(2018, 6, 15, 8, 0, 0).unwrap();
//! let to = Utc.with_ymd_and_hms(2018, 6, 15, 9, 0, 0).unwrap();
//! for quote in archive.quotes_between(from, to)? {
//!     println!("{} {:?}", quote.date, quote.spread());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Row ranges accept any `RangeBounds<usize>`. Bounds past the end are
//! clamped to the row count and inverted bounds read nothing.

use std::ops::{Bound, Range, RangeBounds};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use snafu::ensure;

use crate::decode::{decode_bars, decode_quotes};
use crate::error::{ArchiveError, ArchiveResult, LengthMismatchSnafu};
use crate::locate::{TimestampColumn, infer_key, locate_rows};
use crate::records::{Bar, Quote};
use crate::schema::{ArchiveKind, ArchiveSchema};
use crate::storage::{ArchiveLocation, ArchiveStore, Dataset, ParquetArchive};
use crate::time::{millis_ceil, millis_floor, millis_to_datetime};

/// Aligned Bars and DataBars rows, not yet decoded.
#[derive(Debug, Clone)]
pub struct BarRows {
    /// Bars rows, `[volume, open, close, high, low]`.
    pub values: Dataset,
    /// DataBars rows, `[price_type, timestamp_ms]`.
    pub meta: Dataset,
}

impl BarRows {
    /// Decode into bars.
    pub fn decode(&self) -> ArchiveResult<Vec<Bar>> {
        decode_bars(&self.values, &self.meta)
    }
}

/// Aligned Quotes and DateQuotes rows, not yet decoded.
#[derive(Debug, Clone)]
pub struct QuoteRows {
    /// Quotes rows, `[ask_vector, bid_vector]`.
    pub quotes: Dataset,
    /// DateQuotes rows, one timestamp per quote.
    pub dates: Dataset,
}

impl QuoteRows {
    /// Decode into quotes.
    pub fn decode(&self) -> ArchiveResult<Vec<Quote>> {
        decode_quotes(&self.quotes, &self.dates)
    }
}

/// Summary of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    /// Dataset name.
    pub name: String,
    /// Full shape, row count first.
    pub shape: Vec<usize>,
}

impl DatasetInfo {
    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }
}

/// Summary of an archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveInfo {
    /// Kind detected from the datasets present.
    pub kind: Option<ArchiveKind>,
    /// Every dataset, sorted by name.
    pub datasets: Vec<DatasetInfo>,
    /// Timestamp of the first row, when the kind is known and rows exist.
    pub first: Option<DateTime<Utc>>,
    /// Timestamp of the last row.
    pub last: Option<DateTime<Utc>>,
}

/// Read handle over one archive.
#[derive(Debug, Clone)]
pub struct Archive<S = ParquetArchive> {
    store: S,
    schema: ArchiveSchema,
}

impl Archive<ParquetArchive> {
    /// Open the Parquet archive at `location` with the default schema.
    pub fn open(location: &ArchiveLocation) -> ArchiveResult<Self> {
        Self::open_with_schema(location, ArchiveSchema::default())
    }

    /// Open the Parquet archive at `location` with a custom schema.
    pub fn open_with_schema(
        location: &ArchiveLocation,
        schema: ArchiveSchema,
    ) -> ArchiveResult<Self> {
        let store = ParquetArchive::open(location).map_err(ArchiveError::from_storage)?;
        debug!("opened archive {}", location.root().display());
        Ok(Self::new(store, schema))
    }
}

impl<S: ArchiveStore> Archive<S> {
    /// Wrap `store`, naming its datasets with `schema`.
    pub fn new(store: S, schema: ArchiveSchema) -> Self {
        Self { store, schema }
    }

    /// Wrap `store` with the default schema.
    pub fn from_store(store: S) -> Self {
        Self::new(store, ArchiveSchema::default())
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Dataset naming in use.
    pub fn schema(&self) -> &ArchiveSchema {
        &self.schema
    }

    /// Names of every dataset, sorted.
    pub fn dataset_names(&self) -> ArchiveResult<Vec<String>> {
        self.store
            .dataset_names()
            .map_err(ArchiveError::from_storage)
    }

    /// Kind detected from the datasets present.
    pub fn kind(&self) -> ArchiveResult<Option<ArchiveKind>> {
        Ok(self.schema.detect_kind(&self.dataset_names()?))
    }

    /// Rows in `dataset`.
    pub fn row_count(&self, dataset: &str) -> ArchiveResult<usize> {
        self.store
            .row_count(dataset)
            .map_err(ArchiveError::from_storage)
    }

    fn read_range(&self, dataset: &str, rows: Range<usize>) -> ArchiveResult<Dataset> {
        self.store
            .read_range(dataset, rows)
            .map_err(ArchiveError::from_storage)
    }

    /// Rows of `dataset` stamped within `[from, to]`, as `index_from..index_to`.
    ///
    /// `from` rounds up and `to` rounds down to whole milliseconds. The
    /// timestamp key comes from the schema for the timestamp datasets it
    /// names and from the layout otherwise. When `from > to` the range may be
    /// inverted, which reads as empty.
    ///
    /// Each bound costs O(log N) single-row reads; the dataset is never
    /// loaded whole.
    pub fn locate_range(
        &self,
        dataset: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ArchiveResult<Range<usize>> {
        let key = match self.schema.timestamp_key(dataset) {
            Some(key) => key,
            // An empty read still carries the row type.
            None => infer_key(&self.read_range(dataset, 0..0)?)?,
        };
        let probe = self
            .store
            .row_probe(dataset)
            .map_err(ArchiveError::from_storage)?;
        locate_rows(probe.as_ref(), key, millis_ceil(from), millis_floor(to))
    }

    /// Shared row count of a row-aligned dataset pair.
    fn aligned_row_count(&self, left: &str, right: &str) -> ArchiveResult<usize> {
        let left_rows = self.row_count(left)?;
        let right_rows = self.row_count(right)?;
        ensure!(
            left_rows == right_rows,
            LengthMismatchSnafu {
                left,
                left_rows,
                right,
                right_rows,
            }
        );
        Ok(left_rows)
    }

    fn read_pair(
        &self,
        kind: ArchiveKind,
        rows: impl RangeBounds<usize>,
    ) -> ArchiveResult<(Dataset, Dataset)> {
        let (values, timestamps) = self.schema.datasets(kind);
        let row_count = self.aligned_row_count(values, timestamps)?;
        let rows = clamp_rows(&rows, row_count, values);
        debug!("reading {kind:?} rows {}..{} of {row_count}", rows.start, rows.end);
        Ok((
            self.read_range(values, rows.clone())?,
            self.read_range(timestamps, rows)?,
        ))
    }

    /// Aligned Bars and DataBars rows in `rows`, undecoded.
    pub fn read_bars_raw(&self, rows: impl RangeBounds<usize>) -> ArchiveResult<BarRows> {
        let (values, meta) = self.read_pair(ArchiveKind::Bars, rows)?;
        Ok(BarRows { values, meta })
    }

    /// Bars in `rows`.
    pub fn read_bars(&self, rows: impl RangeBounds<usize>) -> ArchiveResult<Vec<Bar>> {
        self.read_bars_raw(rows)?.decode()
    }

    /// Aligned Quotes and DateQuotes rows in `rows`, undecoded.
    pub fn read_quotes_raw(&self, rows: impl RangeBounds<usize>) -> ArchiveResult<QuoteRows> {
        let (quotes, dates) = self.read_pair(ArchiveKind::Quotes, rows)?;
        Ok(QuoteRows { quotes, dates })
    }

    /// Quotes in `rows`.
    pub fn read_quotes(&self, rows: impl RangeBounds<usize>) -> ArchiveResult<Vec<Quote>> {
        self.read_quotes_raw(rows)?.decode()
    }

    /// Bars stamped within `[from, to]`.
    pub fn bars_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> ArchiveResult<Vec<Bar>> {
        let timestamps = self.schema.timestamp_dataset(ArchiveKind::Bars);
        let rows = self.locate_range(timestamps, from, to)?;
        self.read_bars(rows)
    }

    /// Quotes stamped within `[from, to]`.
    pub fn quotes_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ArchiveResult<Vec<Quote>> {
        let timestamps = self.schema.timestamp_dataset(ArchiveKind::Quotes);
        let rows = self.locate_range(timestamps, from, to)?;
        self.read_quotes(rows)
    }

    fn dataset_info(&self, name: &str) -> ArchiveResult<DatasetInfo> {
        let row_count = self.row_count(name)?;
        let mut shape = self.read_range(name, 0..row_count.min(1))?.shape();
        shape[0] = row_count;
        Ok(DatasetInfo {
            name: name.to_string(),
            shape,
        })
    }

    fn edge_timestamp(&self, dataset: &str, index: usize) -> ArchiveResult<DateTime<Utc>> {
        let row = self.read_range(dataset, index..index + 1)?;
        let key = match self.schema.timestamp_key(dataset) {
            Some(key) => key,
            None => infer_key(&row)?,
        };
        let column = TimestampColumn::resolve(&row, key)?;
        millis_to_datetime(column.timestamp_at(0))
    }

    /// Kind, dataset shapes and time span of the archive.
    pub fn info(&self) -> ArchiveResult<ArchiveInfo> {
        let names = self.dataset_names()?;
        let kind = self.schema.detect_kind(&names);
        let datasets = names
            .iter()
            .map(|name| self.dataset_info(name))
            .collect::<ArchiveResult<Vec<_>>>()?;

        let (mut first, mut last) = (None, None);
        if let Some(kind) = kind {
            let timestamps = self.schema.timestamp_dataset(kind);
            let row_count = self.row_count(timestamps)?;
            if let Some(last_index) = row_count.checked_sub(1) {
                first = Some(self.edge_timestamp(timestamps, 0)?);
                last = Some(self.edge_timestamp(timestamps, last_index)?);
            }
        }

        Ok(ArchiveInfo {
            kind,
            datasets,
            first,
            last,
        })
    }
}

/// Turn caller bounds into a readable window of `0..row_count`.
fn clamp_rows(rows: &impl RangeBounds<usize>, row_count: usize, dataset: &str) -> Range<usize> {
    let start = match rows.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let mut end = match rows.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => row_count,
    };

    if end > row_count {
        warn!("row bound {end} is past the end of {dataset} ({row_count} rows); clamping");
        end = row_count;
    }
    // Inverted windows read nothing.
    start.min(end)..end
}

/// Open the archive at `location`, locate `[from, to]` in `dataset`, and
/// release the archive.
pub fn locate_range(
    location: &ArchiveLocation,
    dataset: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> ArchiveResult<Range<usize>> {
    Archive::open(location)?.locate_range(dataset, from, to)
}

/// Open the archive at `location`, read the bars in `rows`, and release the
/// archive.
pub fn read_bars(
    location: &ArchiveLocation,
    rows: impl RangeBounds<usize>,
) -> ArchiveResult<Vec<Bar>> {
    Archive::open(location)?.read_bars(rows)
}

/// Open the archive at `location`, read the quotes in `rows`, and release
/// the archive.
pub fn read_quotes(
    location: &ArchiveLocation,
    rows: impl RangeBounds<usize>,
) -> ArchiveResult<Vec<Quote>> {
    Archive::open(location)?.read_quotes(rows)
}
