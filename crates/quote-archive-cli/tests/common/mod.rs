use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use arrow::array::{ArrayRef, FixedSizeListArray, Float64Array, Int64Array};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// 2018-06-08T00:00:00Z
pub const T0: i64 = 1_528_416_000_000;
pub const STEP_MS: i64 = 10_000;

fn fixed_size_list(values: ArrayRef, width: i32) -> TestResult<ArrayRef> {
    let field = Arc::new(Field::new_list_field(values.data_type().clone(), false));
    Ok(Arc::new(FixedSizeListArray::try_new(
        field, width, values, None,
    )?))
}

/// Write `values` as `<dir>/<name>.parquet` under a single `value` column.
pub fn write_dataset(dir: &Path, name: &str, values: ArrayRef) -> TestResult {
    std::fs::create_dir_all(dir)?;

    let schema = Arc::new(Schema::new(vec![Field::new(
        "value",
        values.data_type().clone(),
        false,
    )]));
    let batch = RecordBatch::try_new(schema.clone(), vec![values])?;

    let file = std::fs::File::create(dir.join(format!("{name}.parquet")))?;
    let props = parquet::file::properties::WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

/// `rows` ten-second bid bars from `T0`, stored under the given dataset names.
pub fn write_bars_named(dir: &Path, rows: usize, bars: &str, data_bars: &str) -> TestResult {
    let mut values = Vec::with_capacity(rows * 5);
    let mut meta = Vec::with_capacity(rows * 2);
    for i in 0..rows {
        let open = 1.1 + i as f64 * 0.001;
        values.extend_from_slice(&[100.0 + i as f64, open, open + 0.0005, open + 0.001, open - 0.001]);
        meta.extend_from_slice(&[0, T0 + i as i64 * STEP_MS]);
    }

    write_dataset(dir, bars, fixed_size_list(Arc::new(Float64Array::from(values)), 5)?)?;
    write_dataset(dir, data_bars, fixed_size_list(Arc::new(Int64Array::from(meta)), 2)?)
}

pub fn write_bar_archive(dir: &Path, rows: usize) -> TestResult {
    write_bars_named(dir, rows, "Bars", "DataBars")
}

/// `rows` quotes of `depth` levels per side, one every ten seconds from `T0`.
pub fn write_quote_archive(dir: &Path, rows: usize, depth: usize) -> TestResult {
    let width = 2 * depth;
    let mut flat = Vec::with_capacity(rows * 2 * width);
    let mut dates = Vec::with_capacity(rows);
    for i in 0..rows {
        let mid = 1.2 + i as f64 * 0.001;
        for level in 1..=depth {
            flat.extend_from_slice(&[level as f64, mid + 0.0001 * level as f64]);
        }
        for level in 1..=depth {
            flat.extend_from_slice(&[10.0 * level as f64, mid - 0.0001 * level as f64]);
        }
        dates.push(T0 + i as i64 * STEP_MS);
    }

    let sides = fixed_size_list(Arc::new(Float64Array::from(flat)), i32::try_from(width)?)?;
    write_dataset(dir, "Quotes", fixed_size_list(sides, 2)?)?;
    write_dataset(dir, "DateQuotes", Arc::new(Int64Array::from(dates)))
}

pub fn archive_root(tmp: &tempfile::TempDir, name: &str) -> PathBuf {
    tmp.path().join(name)
}
