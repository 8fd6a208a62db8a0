//! Time-window to row-range resolution.
//!
//! Archives are append-ordered: the timestamp column of every dataset is
//! non-decreasing. That precondition is documented, not checked; on an
//! unsorted column the result is unspecified.
//!
//! A window `[from, to]` resolves to the half-open row range
//! `[index_from, index_to)` with two binary searches:
//!
//! - `index_from`: first row with `ts >= from` ([`SearchBound::Inclusive`])
//! - `index_to`: first row with `ts > to` ([`SearchBound::Exclusive`])
//!
//! Each search reads O(log N) scalar timestamps. When `from > to` the range
//! may come back inverted (`start > end`), which `Range` already reports as
//! empty.

use std::convert::Infallible;
use std::ops::Range;

use arrow::array::Array;
use log::debug;

use crate::error::{ArchiveError, ArchiveResult, MalformedRowSnafu, UnsupportedLayoutSnafu};
use crate::layout::{fixed_list, timestamp_values};
use crate::storage::{Dataset, RowProbe};

/// Comparison used by [`search_sorted`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBound {
    /// Stop at the first row whose timestamp is `>= value` (lower bound).
    Inclusive,
    /// Stop at the first row whose timestamp is `> value` (upper bound).
    Exclusive,
}

/// Binary search over `len` non-decreasing timestamps produced by `ts_at`.
///
/// Returns the smallest index `i` whose timestamp satisfies `bound` against
/// `value`, or `len` when no row does.
pub fn search_sorted<F>(len: usize, value: i64, bound: SearchBound, mut ts_at: F) -> usize
where
    F: FnMut(usize) -> i64,
{
    match try_search_sorted(len, value, bound, |i| Ok::<_, Infallible>(ts_at(i))) {
        Ok(index) => index,
        Err(never) => match never {},
    }
}

/// [`search_sorted`] over timestamps that are read fallibly.
///
/// Stops at the first failed read. Only the rows the search visits are
/// read, so at most `ceil(log2(len + 1))` calls are made.
pub fn try_search_sorted<F, E>(
    len: usize,
    value: i64,
    bound: SearchBound,
    mut ts_at: F,
) -> Result<usize, E>
where
    F: FnMut(usize) -> Result<i64, E>,
{
    let mut lower = 0;
    let mut upper = len;
    while lower != upper {
        let mid = lower + (upper - lower) / 2;
        let ts = ts_at(mid)?;
        let hit = match bound {
            SearchBound::Inclusive => value <= ts,
            SearchBound::Exclusive => value < ts,
        };
        if hit {
            upper = mid;
        } else {
            lower = mid + 1;
        }
    }
    Ok(lower)
}

/// Where the timestamp lives inside a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKey {
    /// The row is the timestamp (a 1-D column such as `DateQuotes`).
    Flat,
    /// The timestamp is element `k` of a fixed-arity row (for example
    /// field 1 of a `DataBars` row `[price_type, timestamp_ms]`).
    Field(usize),
}

impl TimestampKey {
    /// Key implied by a dataset shape: flat for 1-D, field 1 for 2-D.
    pub fn infer(shape: &[usize]) -> Option<Self> {
        match shape.len() {
            1 => Some(TimestampKey::Flat),
            2 => Some(TimestampKey::Field(1)),
            _ => None,
        }
    }
}

/// A strided `i64` view of the timestamps of one dataset.
///
/// Built once per lookup by [`TimestampColumn::resolve`]; after that the
/// search loop only does slice indexing.
#[derive(Debug, Clone, Copy)]
pub struct TimestampColumn<'a> {
    values: &'a [i64],
    stride: usize,
    offset: usize,
    len: usize,
}

impl<'a> TimestampColumn<'a> {
    /// View over a plain slice of millisecond timestamps.
    pub fn flat(values: &'a [i64]) -> Self {
        Self {
            values,
            stride: 1,
            offset: 0,
            len: values.len(),
        }
    }

    /// Resolve `key` against the layout of `dataset`.
    ///
    /// `Flat` needs an `Int64` or `Timestamp(Millisecond)` column.
    /// `Field(k)` needs a `FixedSizeList` of those with arity greater than `k`.
    pub fn resolve(dataset: &'a Dataset, key: TimestampKey) -> ArchiveResult<Self> {
        match key {
            TimestampKey::Flat => {
                let values = timestamp_values(dataset, dataset.values())?;
                Ok(Self::flat(values))
            }
            TimestampKey::Field(field) => {
                let (list, width) = fixed_list(dataset, "fixed-size timestamp rows")?;
                if field >= width {
                    return MalformedRowSnafu {
                        dataset: dataset.name(),
                        reason: format!("timestamp field {field} is outside rows of width {width}"),
                    }
                    .fail();
                }
                let values = timestamp_values(dataset, list.values())?;
                Ok(Self {
                    values,
                    stride: width,
                    offset: field,
                    len: list.len(),
                })
            }
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Timestamp of row `index`; panics when `index >= len()`.
    pub fn timestamp_at(&self, index: usize) -> i64 {
        self.values[index * self.stride + self.offset]
    }

    /// Timestamp of the first row.
    pub fn first(&self) -> Option<i64> {
        (!self.is_empty()).then(|| self.timestamp_at(0))
    }

    /// Timestamp of the last row.
    pub fn last(&self) -> Option<i64> {
        self.len.checked_sub(1).map(|i| self.timestamp_at(i))
    }

    /// [`search_sorted`] over this column.
    pub fn search(&self, value: i64, bound: SearchBound) -> usize {
        search_sorted(self.len, value, bound, |i| self.timestamp_at(i))
    }

    /// Row range holding the timestamps in `[from_ms, to_ms]`.
    ///
    /// The end bound is exclusive in row space: rows stamped exactly `to_ms`
    /// are included.
    pub fn locate(&self, from_ms: i64, to_ms: i64) -> Range<usize> {
        let start = self.search(from_ms, SearchBound::Inclusive);
        let end = self.search(to_ms, SearchBound::Exclusive);
        debug!("located rows {start}..{end} for [{from_ms}, {to_ms}] over {} rows", self.len);
        start..end
    }
}

/// Row range of `[from_ms, to_ms]` in the dataset behind `probe`.
///
/// Reads one row per search step and nothing else, so rows the two
/// searches never visit are not decoded.
pub(crate) fn locate_rows(
    probe: &dyn RowProbe,
    key: TimestampKey,
    from_ms: i64,
    to_ms: i64,
) -> ArchiveResult<Range<usize>> {
    let len = probe.row_count();
    let mut reads = 0usize;
    let mut ts_at = |index: usize| -> ArchiveResult<i64> {
        reads += 1;
        let row = probe.read_row(index).map_err(ArchiveError::from_storage)?;
        Ok(TimestampColumn::resolve(&row, key)?.timestamp_at(0))
    };

    let start = try_search_sorted(len, from_ms, SearchBound::Inclusive, &mut ts_at)?;
    let end = try_search_sorted(len, to_ms, SearchBound::Exclusive, &mut ts_at)?;
    debug!("located rows {start}..{end} for [{from_ms}, {to_ms}] over {len} rows in {reads} reads");
    Ok(start..end)
}

/// Look up the key for a dataset whose name the schema does not cover.
pub(crate) fn infer_key(dataset: &Dataset) -> ArchiveResult<TimestampKey> {
    let shape = dataset.shape();
    TimestampKey::infer(&shape).ok_or_else(|| {
        UnsupportedLayoutSnafu {
            dataset: dataset.name(),
            datatype: dataset.data_type().clone(),
            expected: "a 1-D or 2-D timestamp dataset",
        }
        .build()
    })
}
