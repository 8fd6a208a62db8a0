//! Typed views over dataset row layouts.
//!
//! Datasets arrive as Arrow arrays whose type encodes the row layout. The
//! helpers here validate a layout once and hand out plain slices, so the hot
//! loops in the locator and the decoders index into `&[T]` without touching
//! Arrow again.

use arrow::array::{Array, ArrayRef, AsArray, FixedSizeListArray};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float64Type, Int64Type, TimeUnit, TimestampMillisecondType,
};

use crate::error::{ArchiveError, ArchiveResult, MalformedRowSnafu, UnsupportedLayoutSnafu};
use crate::storage::Dataset;

/// Fixed-arity rows laid out back to back in one slice.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixedRows<'a, T> {
    values: &'a [T],
    width: usize,
    rows: usize,
}

impl<'a, T> FixedRows<'a, T> {
    pub(crate) fn len(&self) -> usize {
        self.rows
    }

    pub(crate) fn row(&self, index: usize) -> &'a [T] {
        let start = index * self.width;
        &self.values[start..start + self.width]
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.rows).map(move |i| self.row(i))
    }
}

/// Downcast `dataset` to a `FixedSizeList` and return it with its arity.
pub(crate) fn fixed_list<'a>(
    dataset: &'a Dataset,
    expected: &str,
) -> ArchiveResult<(&'a FixedSizeListArray, usize)> {
    let list = dataset
        .values()
        .as_fixed_size_list_opt()
        .ok_or_else(|| unsupported(dataset, expected))?;

    ensure_no_nulls(dataset, list)?;
    let width = usize::try_from(list.value_length()).unwrap_or(0);
    Ok((list, width))
}

/// Rows of a `FixedSizeList<T, width>` dataset.
///
/// Fails with `MalformedRow` when the arity differs from `width`.
pub(crate) fn fixed_rows<'a, T: ArrowPrimitiveType>(
    dataset: &'a Dataset,
    width: usize,
    expected: &str,
) -> ArchiveResult<FixedRows<'a, T::Native>> {
    let (list, actual) = fixed_list(dataset, expected)?;
    if actual != width {
        return MalformedRowSnafu {
            dataset: dataset.name(),
            reason: format!("row has {actual} values, expected {width}"),
        }
        .fail();
    }

    let values = primitive_values::<T>(dataset, list.values(), expected)?;
    Ok(FixedRows {
        values,
        width,
        rows: list.len(),
    })
}

/// Rows of a `FixedSizeList<FixedSizeList<Float64, w>, sides>` dataset,
/// flattened so each row is `sides * w` consecutive values.
///
/// Returns the rows and the per-side width `w`.
pub(crate) fn nested_f64_rows<'a>(
    dataset: &'a Dataset,
    sides: usize,
    expected: &str,
) -> ArchiveResult<(FixedRows<'a, f64>, usize)> {
    let (outer, actual_sides) = fixed_list(dataset, expected)?;
    if actual_sides != sides {
        return MalformedRowSnafu {
            dataset: dataset.name(),
            reason: format!("row has {actual_sides} sides, expected {sides}"),
        }
        .fail();
    }

    let inner = outer
        .values()
        .as_fixed_size_list_opt()
        .ok_or_else(|| unsupported(dataset, expected))?;
    ensure_no_nulls(dataset, inner)?;

    let side_width = usize::try_from(inner.value_length()).unwrap_or(0);
    let values = primitive_values::<Float64Type>(dataset, inner.values(), expected)?;

    Ok((
        FixedRows {
            values,
            width: sides * side_width,
            rows: outer.len(),
        },
        side_width,
    ))
}

/// Millisecond timestamps held by `array`, which may be `Int64` or
/// `Timestamp(Millisecond, _)`.
pub(crate) fn timestamp_values<'a>(
    dataset: &Dataset,
    array: &'a ArrayRef,
) -> ArchiveResult<&'a [i64]> {
    const EXPECTED: &str = "Int64 or Timestamp(Millisecond) timestamps";
    match array.data_type() {
        DataType::Int64 => primitive_values::<Int64Type>(dataset, array, EXPECTED),
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            primitive_values::<TimestampMillisecondType>(dataset, array, EXPECTED)
        }
        _ => Err(unsupported_type(dataset, array.data_type(), EXPECTED)),
    }
}

fn primitive_values<'a, T: ArrowPrimitiveType>(
    dataset: &Dataset,
    array: &'a ArrayRef,
    expected: &str,
) -> ArchiveResult<&'a [T::Native]> {
    let primitive = array
        .as_primitive_opt::<T>()
        .ok_or_else(|| unsupported_type(dataset, array.data_type(), expected))?;
    ensure_no_nulls(dataset, primitive)?;
    Ok(&primitive.values()[..])
}

fn ensure_no_nulls(dataset: &Dataset, array: &dyn Array) -> ArchiveResult<()> {
    let nulls = array.null_count();
    if nulls > 0 {
        return MalformedRowSnafu {
            dataset: dataset.name(),
            reason: format!("{nulls} null values in a numeric row set"),
        }
        .fail();
    }
    Ok(())
}

fn unsupported(dataset: &Dataset, expected: &str) -> ArchiveError {
    unsupported_type(dataset, dataset.data_type(), expected)
}

fn unsupported_type(
    dataset: &Dataset,
    datatype: &DataType,
    expected: &str,
) -> ArchiveError {
    UnsupportedLayoutSnafu {
        dataset: dataset.name(),
        datatype: datatype.clone(),
        expected,
    }
    .build()
}
