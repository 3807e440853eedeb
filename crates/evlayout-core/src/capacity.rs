//! Batch-wide capacity resolution for sequence fields.
//!
//! Every slot of a compiled array has the same shape, so a sequence field is
//! stored at one capacity: the longest sequence seen anywhere in the batch.
//! Shorter sequences are zero-padded by the copier, never truncated.

use evlayout_model::{CapacityMap, FieldType, LayoutError, RawRecord, RawValue, Result};

use crate::classify::classify_value;
use crate::compile::compile_layout;

/// Scan the batch for every field that holds a sequence in the first record.
///
/// For each such field the map records the maximum observed length and the
/// element type of the first non-empty occurrence. Record elements are
/// compiled over every element of that field across the batch.
pub fn resolve_capacities(records: &[&RawRecord]) -> Result<CapacityMap> {
    let mut capacities = CapacityMap::new();
    let Some(template) = records.first() else {
        return Ok(capacities);
    };

    let sequence_fields: Vec<&str> = template
        .iter()
        .filter(|(_, value)| matches!(value, RawValue::Sequence(_)))
        .map(|(name, _)| name.as_str())
        .collect();
    for name in &sequence_fields {
        capacities.initialize(*name);
    }

    for record in records {
        for name in &sequence_fields {
            let values = sequence_at(record, name)?;
            capacities.observe_len(name, values.len());
            if capacities.is_resolved(name) {
                continue;
            }
            if let Some(first) = values.first() {
                let element = resolve_element_type(records, name, first)?;
                capacities.resolve_element(name, element);
            }
        }
    }

    Ok(capacities)
}

/// The sequence stored under `name`; an absent field reads as empty.
pub(crate) fn sequence_at<'a>(record: &'a RawRecord, name: &str) -> Result<&'a [RawValue]> {
    match record.get(name) {
        Some(RawValue::Sequence(values)) => Ok(values),
        None | Some(RawValue::Null) => Ok(&[]),
        Some(other) => Err(LayoutError::mismatch(name, "sequence", other.kind())),
    }
}

fn resolve_element_type(
    records: &[&RawRecord],
    name: &str,
    first: &RawValue,
) -> Result<FieldType> {
    match first {
        RawValue::Record(_) => {
            let elements = gather_elements(records, name)?;
            Ok(FieldType::SubSchema(compile_layout(&elements)?.schema))
        }
        RawValue::Sequence(_) => Err(LayoutError::unsupported(name, "nested sequence")),
        scalar => classify_value(name, scalar),
    }
}

/// Every record element of the `name` sequences, in batch order.
fn gather_elements<'a>(records: &[&'a RawRecord], name: &str) -> Result<Vec<&'a RawRecord>> {
    let mut elements = Vec::new();
    for record in records {
        for value in sequence_at(record, name)? {
            let element = value
                .as_record()
                .ok_or_else(|| LayoutError::mismatch(name, "record element", value.kind()))?;
            elements.push(element);
        }
    }
    Ok(elements)
}
