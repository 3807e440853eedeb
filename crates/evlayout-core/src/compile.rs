//! Schema compilation.
//!
//! The first record of a batch is the template: field order and field types
//! come from it, and later records are assumed to be type-compatible. The
//! copier enforces that assumption and reports disagreements as
//! [`LayoutError::FieldTypeMismatch`].

use evlayout_model::{CapacityMap, Field, FieldType, LayoutError, RawRecord, RawValue, Result, Schema};

use crate::capacity::resolve_capacities;
use crate::classify::classify_value;

/// A compiled schema together with the capacity map it was built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledLayout {
    pub schema: Schema,
    pub capacities: CapacityMap,
}

/// Compile the schema of a single representative record.
pub fn compile_schema(template: &RawRecord) -> Result<Schema> {
    Ok(compile_layout(&[template])?.schema)
}

/// Compile from a record, or from a sequence whose first element is a record.
///
/// The sequence form is how sub-record lists present their element template.
pub fn compile_template(field: &str, template: &RawValue) -> Result<Schema> {
    match template {
        RawValue::Record(record) => compile_schema(record),
        RawValue::Sequence(values) => match values.first() {
            Some(RawValue::Record(record)) => compile_schema(record),
            Some(other) => Err(LayoutError::mismatch(field, "record element", other.kind())),
            None => Err(LayoutError::unsupported(field, "empty sequence")),
        },
        other => Err(LayoutError::mismatch(field, "record", other.kind())),
    }
}

/// Compile the layout of a whole batch.
///
/// Sequence fields become `FixedArray` at their batch-wide capacity. Nested
/// record fields are compiled over the full column of sub-records, so their
/// own sequence fields get batch-wide capacities too. An empty batch yields
/// an empty schema.
pub fn compile_layout(records: &[&RawRecord]) -> Result<CompiledLayout> {
    let Some(template) = records.first() else {
        return Ok(CompiledLayout::default());
    };

    let capacities = resolve_capacities(records)?;
    let mut schema = Schema::new();
    for (name, value) in template.iter() {
        let field_type = match (capacities.get(name), value) {
            (Some(capacity), _) => capacity.field_type(),
            (None, RawValue::Record(_)) => {
                let column = gather_column(records, name)?;
                FieldType::SubSchema(compile_layout(&column)?.schema)
            }
            (None, scalar) => classify_value(name, scalar)?,
        };
        schema.push(Field::new(name.as_str(), field_type));
    }

    Ok(CompiledLayout { schema, capacities })
}

/// The `name` sub-record of every record that has one.
fn gather_column<'a>(records: &[&'a RawRecord], name: &str) -> Result<Vec<&'a RawRecord>> {
    let mut column = Vec::with_capacity(records.len());
    for record in records {
        match record.get(name) {
            Some(RawValue::Record(nested)) => column.push(nested),
            None | Some(RawValue::Null) => {}
            Some(other) => return Err(LayoutError::mismatch(name, "record", other.kind())),
        }
    }
    Ok(column)
}
