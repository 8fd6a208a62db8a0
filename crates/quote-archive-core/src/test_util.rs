use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    ArrayRef, FixedSizeListArray, Float64Array, Int64Array, TimestampMillisecondArray,
};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::storage::VALUE_COLUMN;

pub(crate) type TestResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn dates_array(millis: &[i64]) -> ArrayRef {
    Arc::new(Int64Array::from(millis.to_vec()))
}

pub(crate) fn millisecond_timestamps_array(millis: &[i64]) -> ArrayRef {
    Arc::new(TimestampMillisecondArray::from(millis.to_vec()).with_timezone("+00:00"))
}

fn fixed_size_list(values: ArrayRef, width: usize) -> ArrayRef {
    let field = Arc::new(Field::new_list_field(values.data_type().clone(), false));
    let width = i32::try_from(width).expect("row width fits in i32");
    let list = FixedSizeListArray::try_new(field, width, values, None).expect("valid fixed-size list");
    Arc::new(list)
}

pub(crate) fn bars_array(rows: &[[f64; 5]]) -> ArrayRef {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    fixed_size_list(Arc::new(Float64Array::from(flat)), 5)
}

pub(crate) fn data_bars_array(rows: &[[i64; 2]]) -> ArrayRef {
    let flat: Vec<i64> = rows.iter().flatten().copied().collect();
    fixed_size_list(Arc::new(Int64Array::from(flat)), 2)
}

/// Quotes rows of `width` values per side; each row is `(asks, bids)`.
pub(crate) fn quotes_array(width: usize, rows: &[(Vec<f64>, Vec<f64>)]) -> ArrayRef {
    let mut flat = Vec::with_capacity(rows.len() * 2 * width);
    for (asks, bids) in rows {
        assert_eq!(asks.len(), width, "ask side width");
        assert_eq!(bids.len(), width, "bid side width");
        flat.extend_from_slice(asks);
        flat.extend_from_slice(bids);
    }
    let sides = fixed_size_list(Arc::new(Float64Array::from(flat)), width);
    fixed_size_list(sides, 2)
}

/// Write `values` as `<dir>/<name>.parquet` in the single-column layout.
pub(crate) fn write_dataset(dir: &Path, name: &str, values: ArrayRef) -> TestResult {
    write_parquet_column(dir, name, VALUE_COLUMN, values)
}

pub(crate) fn write_parquet_column(
    dir: &Path,
    name: &str,
    column: &str,
    values: ArrayRef,
) -> TestResult {
    let schema = Arc::new(Schema::new(vec![Field::new(
        column,
        values.data_type().clone(),
        values.null_count() > 0,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![values])?;

    let file = File::create(dir.join(format!("{name}.parquet")))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
