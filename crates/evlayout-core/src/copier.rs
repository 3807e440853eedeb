//! Copying raw records into a zero-initialized compiled array.
//!
//! The traversal mirrors the schema tree. Scalar fields are assigned per
//! record; nested sub-record fields are gathered into one column and copied
//! with a single recursive call; fixed-array fields copy each record's
//! sequence into that slot's block, recursing for record elements. Positions
//! past the end of a sequence keep their zero value.

use evlayout_model::{FieldType, LayoutError, RawRecord, RawValue, Result, Schema};

use crate::array::{ColumnData, CompiledArray};
use crate::capacity::sequence_at;
use crate::classify::accepts;
use crate::text::{normalize_text, truncate_chars};

/// Populate `array` from `records`, one slot per record.
///
/// Absent fields and null values keep their zero value. A value whose kind
/// disagrees with the compiled schema fails the whole copy.
pub fn copy_records(records: &[&RawRecord], array: &mut CompiledArray) -> Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    if records.len() != array.len() {
        return Err(LayoutError::ShapeMismatch {
            field: "<slots>".to_string(),
            expected: array.len(),
            actual: records.len(),
        });
    }
    let (schema, columns) = array.parts_mut();
    copy_into(records, schema, columns, 0)
}

/// Copy `records` into rows `base..base + records.len()` of `columns`.
fn copy_into(
    records: &[&RawRecord],
    schema: &Schema,
    columns: &mut [ColumnData],
    base: usize,
) -> Result<()> {
    for (field, column) in schema.fields().iter().zip(columns.iter_mut()) {
        let name = field.name.as_str();
        match &field.field_type {
            FieldType::SubSchema(sub) => {
                let ColumnData::Struct(children) = column else {
                    return Err(LayoutError::mismatch(name, &field.field_type, "non-struct column"));
                };
                let empty = RawRecord::new();
                let nested = gather_nested(records, name, &empty)?;
                copy_into(&nested, sub, children, base)?;
            }
            FieldType::FixedArray { element, capacity } => {
                let ColumnData::Array(inner) = column else {
                    return Err(LayoutError::mismatch(name, &field.field_type, "non-array column"));
                };
                for (row, record) in records.iter().enumerate() {
                    let values = sequence_at(record, name)?;
                    if values.len() > *capacity {
                        return Err(LayoutError::CapacityExceeded {
                            field: name.to_string(),
                            capacity: *capacity,
                            len: values.len(),
                        });
                    }
                    let start = (base + row) * capacity;
                    copy_sequence(name, element, values, inner, start)?;
                }
            }
            scalar => {
                for (row, record) in records.iter().enumerate() {
                    if let Some(value) = record.get(name) {
                        write_scalar(name, scalar, column, base + row, value)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn copy_sequence(
    name: &str,
    element: &FieldType,
    values: &[RawValue],
    storage: &mut ColumnData,
    start: usize,
) -> Result<()> {
    if values.is_empty() {
        return Ok(());
    }
    match element {
        FieldType::SubSchema(sub) => {
            let ColumnData::Struct(children) = storage else {
                return Err(LayoutError::mismatch(name, element, "non-struct column"));
            };
            let elements = values
                .iter()
                .map(|value| {
                    value
                        .as_record()
                        .ok_or_else(|| LayoutError::mismatch(name, element, value.kind()))
                })
                .collect::<Result<Vec<_>>>()?;
            copy_into(&elements, sub, children, start)
        }
        scalar => {
            for (offset, value) in values.iter().enumerate() {
                write_scalar(name, scalar, storage, start + offset, value)?;
            }
            Ok(())
        }
    }
}

/// Sub-record of every record under `name`, `empty` standing in where absent.
fn gather_nested<'a>(
    records: &[&'a RawRecord],
    name: &str,
    empty: &'a RawRecord,
) -> Result<Vec<&'a RawRecord>> {
    records
        .iter()
        .map(|record| match record.get(name) {
            Some(RawValue::Record(nested)) => Ok(nested),
            None | Some(RawValue::Null) => Ok(empty),
            Some(other) => Err(LayoutError::mismatch(name, "record", other.kind())),
        })
        .collect()
}

fn write_scalar(
    name: &str,
    field_type: &FieldType,
    column: &mut ColumnData,
    index: usize,
    value: &RawValue,
) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    if !accepts(field_type, value) {
        return Err(LayoutError::mismatch(name, field_type, value.kind()));
    }
    match (column, value) {
        (ColumnData::Int64(values), RawValue::Int(v)) => set(values, index, *v, name),
        (ColumnData::Float64(values), RawValue::Float(v)) => set(values, index, *v, name),
        (ColumnData::Float64(values), RawValue::Int(v)) => set(values, index, *v as f64, name),
        (ColumnData::Bool(values), RawValue::Bool(v)) => set(values, index, *v, name),
        (ColumnData::Text(values), text) => {
            let width = match field_type {
                FieldType::FixedText(width) => *width,
                _ => 0,
            };
            let normalized = normalize_text(text).unwrap_or_default();
            set(values, index, truncate_chars(normalized, width), name)
        }
        (_, other) => Err(LayoutError::mismatch(name, field_type, other.kind())),
    }
}

fn set<T>(values: &mut [T], index: usize, value: T, name: &str) -> Result<()> {
    let len = values.len();
    let slot = values.get_mut(index).ok_or_else(|| LayoutError::ShapeMismatch {
        field: name.to_string(),
        expected: index + 1,
        actual: len,
    })?;
    *slot = value;
    Ok(())
}
