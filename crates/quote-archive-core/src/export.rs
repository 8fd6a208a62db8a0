//! Flatten decoded records into Arrow record batches.
//!
//! Bars map one field per column. Quotes expand each ladder level into its
//! own columns (`ask_price_0`, `ask_volume_0`, ..., `bid_volume_{d-1}`), so
//! the batch can go straight to a CSV or JSON-lines writer.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use snafu::prelude::*;

use crate::error::{ArchiveResult, ExportSnafu, MalformedRowSnafu};
use crate::records::{Bar, Quote, QuoteEntry};

/// Offset form: named zones only format with arrow's `chrono-tz` feature.
const UTC_OFFSET: &str = "+00:00";

fn timestamp_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Timestamp(TimeUnit::Millisecond, Some(UTC_OFFSET.into())),
        false,
    )
}

fn timestamp_column(millis: Vec<i64>) -> ArrayRef {
    Arc::new(TimestampMillisecondArray::from(millis).with_timezone(UTC_OFFSET))
}

fn f64_column(values: impl IntoIterator<Item = f64>) -> ArrayRef {
    Arc::new(values.into_iter().collect::<Float64Array>())
}

/// Columns: `date_from`, `price_type`, `volume`, `open`, `close`, `high`,
/// `low`.
pub fn bars_to_record_batch(bars: &[Bar]) -> ArchiveResult<RecordBatch> {
    let mut fields = vec![
        timestamp_field("date_from"),
        Field::new("price_type", DataType::Int64, false),
    ];
    fields.extend(
        ["volume", "open", "close", "high", "low"]
            .into_iter()
            .map(|name| Field::new(name, DataType::Float64, false)),
    );

    let columns: Vec<ArrayRef> = vec![
        timestamp_column(bars.iter().map(|b| b.date_from.timestamp_millis()).collect()),
        Arc::new(bars.iter().map(|b| b.price_type).collect::<Int64Array>()),
        f64_column(bars.iter().map(|b| b.volume)),
        f64_column(bars.iter().map(|b| b.open)),
        f64_column(bars.iter().map(|b| b.close)),
        f64_column(bars.iter().map(|b| b.high)),
        f64_column(bars.iter().map(|b| b.low)),
    ];

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context(ExportSnafu)
}

fn push_ladder_columns(
    side: &str,
    depth: usize,
    quotes: &[Quote],
    ladder: impl Fn(&Quote) -> &[QuoteEntry],
    fields: &mut Vec<Field>,
    columns: &mut Vec<ArrayRef>,
) {
    for level in 0..depth {
        fields.push(Field::new(
            format!("{side}_price_{level}"),
            DataType::Float64,
            false,
        ));
        columns.push(f64_column(quotes.iter().map(|q| ladder(q)[level].price)));

        fields.push(Field::new(
            format!("{side}_volume_{level}"),
            DataType::Float64,
            false,
        ));
        columns.push(f64_column(quotes.iter().map(|q| ladder(q)[level].volume)));
    }
}

/// Columns: `date`, then `ask_price_{i}` / `ask_volume_{i}` per ask level,
/// then `bid_price_{i}` / `bid_volume_{i}` per bid level.
///
/// Ladder depth comes from the first quote; a quote with a different depth
/// fails with `MalformedRow`.
pub fn quotes_to_record_batch(quotes: &[Quote]) -> ArchiveResult<RecordBatch> {
    let ask_depth = quotes.first().map_or(0, |q| q.asks.len());
    let bid_depth = quotes.first().map_or(0, |q| q.bids.len());

    if let Some((row, quote)) = quotes
        .iter()
        .enumerate()
        .find(|(_, q)| q.asks.len() != ask_depth || q.bids.len() != bid_depth)
    {
        return MalformedRowSnafu {
            dataset: "Quotes",
            reason: format!(
                "quote {row} has depth {}/{}, expected {ask_depth}/{bid_depth}",
                quote.asks.len(),
                quote.bids.len()
            ),
        }
        .fail();
    }

    let mut fields = vec![timestamp_field("date")];
    let mut columns = vec![timestamp_column(
        quotes.iter().map(|q| q.date.timestamp_millis()).collect(),
    )];

    push_ladder_columns(
        "ask",
        ask_depth,
        quotes,
        |q| q.asks.as_slice(),
        &mut fields,
        &mut columns,
    );
    push_ladder_columns(
        "bid",
        bid_depth,
        quotes,
        |q| q.bids.as_slice(),
        &mut fields,
        &mut columns,
    );

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).context(ExportSnafu)
}
