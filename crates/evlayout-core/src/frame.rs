//! Conversion between compiled arrays and polars DataFrames.

use polars::prelude::*;
use tracing::debug;

use evlayout_model::{
    DEFAULT_TEXT_CAPACITY, Field as LayoutField, FieldType, LayoutError, Result as LayoutResult,
    Schema,
};

use crate::array::{ColumnData, CompiledArray};
use crate::text::truncate_chars;

fn frame_error(error: PolarsError) -> LayoutError {
    LayoutError::frame(error.to_string())
}

/// Scalar fields of `array` as a DataFrame, skipping `exclude`.
///
/// Sub-record and fixed-array fields have no flat column representation and
/// are always dropped.
pub fn to_dataframe(array: &CompiledArray, exclude: &[&str]) -> LayoutResult<DataFrame> {
    let mut columns: Vec<Column> = Vec::with_capacity(array.schema().len());
    for (field, data) in array.schema().fields().iter().zip(array.columns()) {
        let name = field.name.as_str();
        if exclude.contains(&name) {
            continue;
        }
        let column = match data {
            ColumnData::Int64(values) => Column::new(name.into(), values.as_slice()),
            ColumnData::Float64(values) => Column::new(name.into(), values.as_slice()),
            ColumnData::Bool(values) => Column::new(name.into(), values.as_slice()),
            ColumnData::Text(values) => Column::new(name.into(), values.as_slice()),
            ColumnData::Struct(_) | ColumnData::Array(_) => {
                debug!(field = name, field_type = %field.field_type, "dropping non-scalar field");
                continue;
            }
        };
        columns.push(column);
    }
    DataFrame::new(columns).map_err(frame_error)
}

/// Build a compiled array whose schema follows the frame's columns.
///
/// Integer columns become `Int64`, floating columns `Float64`, boolean
/// columns `Bool` and string columns fixed text. Nulls become the zero value,
/// except in floating columns where they become NaN so the sanitizer can
/// replace them.
pub fn from_dataframe(df: &DataFrame) -> LayoutResult<CompiledArray> {
    let rows = df.height();
    let mut schema = Schema::new();
    let mut columns = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let name = column.name().as_str();
        let (field_type, data) = match column.dtype() {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => {
                let cast = column.cast(&DataType::Int64).map_err(frame_error)?;
                let values = cast
                    .i64()
                    .map_err(frame_error)?
                    .into_iter()
                    .map(|value| value.unwrap_or(0))
                    .collect();
                (FieldType::Int64, ColumnData::Int64(values))
            }
            DataType::Float32 | DataType::Float64 => {
                let cast = column.cast(&DataType::Float64).map_err(frame_error)?;
                let values = cast
                    .f64()
                    .map_err(frame_error)?
                    .into_iter()
                    .map(|value| value.unwrap_or(f64::NAN))
                    .collect();
                (FieldType::Float64, ColumnData::Float64(values))
            }
            DataType::Boolean => {
                let values = column
                    .bool()
                    .map_err(frame_error)?
                    .into_iter()
                    .map(|value| value.unwrap_or(false))
                    .collect();
                (FieldType::Bool, ColumnData::Bool(values))
            }
            DataType::String => {
                let values = column
                    .str()
                    .map_err(frame_error)?
                    .into_iter()
                    .map(|value| {
                        truncate_chars(value.unwrap_or_default().to_string(), DEFAULT_TEXT_CAPACITY)
                    })
                    .collect();
                (FieldType::text(), ColumnData::Text(values))
            }
            _ => return Err(LayoutError::unsupported(name, "frame column")),
        };
        if !schema.push(LayoutField::new(name, field_type)) {
            return Err(LayoutError::frame(format!("duplicate column '{name}'")));
        }
        columns.push(data);
    }

    CompiledArray::from_columns(schema, rows, columns)
}
