//! Row decoders: raw dataset slices into [`Bar`] and [`Quote`] values.
//!
//! Both decoders take row-aligned slices of two datasets (row `i` of one
//! pairs with row `i` of the other) and produce one record per row pair, in
//! row order. An empty slice decodes to an empty `Vec`.

use arrow::datatypes::{Float64Type, Int64Type};
use log::trace;
use snafu::ensure;

use crate::error::{ArchiveResult, LengthMismatchSnafu, MalformedRowSnafu};
use crate::layout::{FixedRows, fixed_rows, nested_f64_rows};
use crate::locate::{TimestampColumn, TimestampKey};
use crate::records::{Bar, Quote, QuoteEntry};
use crate::storage::Dataset;
use crate::time::millis_to_datetime;

/// Values per Bars row: `volume, open, close, high, low`.
pub const BAR_WIDTH: usize = 5;

/// Values per DataBars row: `price_type, timestamp_ms`.
pub const BAR_META_WIDTH: usize = 2;

/// Offset of the timestamp inside a DataBars row.
pub const BAR_META_TIMESTAMP_FIELD: usize = 1;

/// Sides per Quotes row: ask vector then bid vector.
pub const QUOTE_SIDES: usize = 2;

fn ensure_aligned(left: &Dataset, right: &Dataset) -> ArchiveResult<()> {
    ensure!(
        left.row_count() == right.row_count(),
        LengthMismatchSnafu {
            left: left.name(),
            left_rows: left.row_count(),
            right: right.name(),
            right_rows: right.row_count(),
        }
    );
    Ok(())
}

/// Zip Bars rows with DataBars rows into bars.
///
/// Fails with `LengthMismatch` when the slices differ in length and with
/// `MalformedRow` when a row does not have the expected arity.
pub fn decode_bars(values: &Dataset, meta: &Dataset) -> ArchiveResult<Vec<Bar>> {
    ensure_aligned(values, meta)?;

    let values_rows: FixedRows<'_, f64> = fixed_rows::<Float64Type>(
        values,
        BAR_WIDTH,
        "FixedSizeList<Float64, 5> bar rows",
    )?;
    let meta_rows: FixedRows<'_, i64> = fixed_rows::<Int64Type>(
        meta,
        BAR_META_WIDTH,
        "FixedSizeList<Int64, 2> bar metadata rows",
    )?;

    values_rows
        .iter()
        .zip(meta_rows.iter())
        .map(|(v, m)| {
            Ok(Bar {
                date_from: millis_to_datetime(m[BAR_META_TIMESTAMP_FIELD])?,
                price_type: m[0],
                volume: v[0],
                open: v[1],
                close: v[2],
                high: v[3],
                low: v[4],
            })
        })
        .collect()
}

/// Split one side vector into `(volume, price)` levels.
fn ladder(side: &[f64]) -> Vec<QuoteEntry> {
    side.chunks_exact(2)
        .map(|pair| QuoteEntry {
            volume: pair[0],
            price: pair[1],
        })
        .collect()
}

/// Pair Quotes rows with DateQuotes timestamps into quotes.
///
/// Each Quotes row holds an ask vector and a bid vector of equal length,
/// each interleaving `(volume, price)` pairs. Ladder depth is half the
/// vector length; an odd length fails with `MalformedRow` rather than
/// dropping the trailing value.
pub fn decode_quotes(quotes: &Dataset, dates: &Dataset) -> ArchiveResult<Vec<Quote>> {
    ensure_aligned(quotes, dates)?;

    let (rows, side_width) = nested_f64_rows(
        quotes,
        QUOTE_SIDES,
        "FixedSizeList<FixedSizeList<Float64, 2d>, 2> quote rows",
    )?;
    if side_width % 2 != 0 {
        return MalformedRowSnafu {
            dataset: quotes.name(),
            reason: format!("side vector of length {side_width} does not split into (volume, price) pairs"),
        }
        .fail();
    }
    trace!("decoding {} quotes at depth {}", rows.len(), side_width / 2);

    let dates = TimestampColumn::resolve(dates, TimestampKey::Flat)?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let (asks, bids) = row.split_at(side_width);
            Ok(Quote {
                date: millis_to_datetime(dates.timestamp_at(i))?,
                asks: ladder(asks),
                bids: ladder(bids),
            })
        })
        .collect()
}
