//! Scalar type classification.

use evlayout_model::{FieldType, LayoutError, RawValue, Result};

use crate::compile::compile_schema;

/// Map one value to its storage type.
///
/// Rules are applied in order: bool, integer, float, text (character or raw
/// byte strings, stored as `FixedText(256)`), nested record (compiled as a
/// sub-schema), sequence (classified by its first element; the rest of the
/// sequence is assumed to match). Null and empty sequences have no mapping.
pub fn classify_value(field: &str, value: &RawValue) -> Result<FieldType> {
    match value {
        // Bool must stay ahead of Int.
        RawValue::Bool(_) => Ok(FieldType::Bool),
        RawValue::Int(_) => Ok(FieldType::Int64),
        RawValue::Float(_) => Ok(FieldType::Float64),
        RawValue::Text(_) | RawValue::Bytes(_) => Ok(FieldType::text()),
        RawValue::Record(record) => Ok(FieldType::SubSchema(compile_schema(record)?)),
        RawValue::Sequence(values) => match values.first() {
            Some(RawValue::Sequence(_)) => Err(LayoutError::unsupported(field, "nested sequence")),
            Some(first) => classify_value(field, first),
            None => Err(LayoutError::unsupported(field, "empty sequence")),
        },
        RawValue::Null => Err(LayoutError::unsupported(field, value.kind())),
    }
}

/// Whether `value` can be stored in a scalar slot of `field_type`.
///
/// Integers widen into `Float64`; every other pairing must match exactly.
pub(crate) fn accepts(field_type: &FieldType, value: &RawValue) -> bool {
    matches!(
        (field_type, value),
        (FieldType::Int64, RawValue::Int(_))
            | (FieldType::Float64, RawValue::Float(_) | RawValue::Int(_))
            | (FieldType::Bool, RawValue::Bool(_))
            | (FieldType::FixedText(_), RawValue::Text(_) | RawValue::Bytes(_))
    )
}
