//! Fixed-layout compiled event arrays.
//!
//! Storage is columnar: one [`ColumnData`] per schema field, mirroring the
//! schema tree. Nested sub-records hold one child column per nested field and
//! fixed arrays hold a flattened `rows * capacity` element column, so every
//! slot has the same shape and the same packed byte layout.

use indexmap::IndexMap;
use serde::Serialize;

use evlayout_model::{Field, FieldType, LayoutError, Result, Schema};

/// Column storage for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    Text(Vec<String>),
    /// One child column per sub-schema field.
    Struct(Vec<ColumnData>),
    /// Flattened element storage; slot `i` owns `[i * capacity, (i + 1) * capacity)`.
    Array(Box<ColumnData>),
}

impl ColumnData {
    /// Zero-valued storage for `rows` slots of `field_type`.
    pub fn zeroed(field_type: &FieldType, rows: usize) -> Self {
        match field_type {
            FieldType::Int64 => Self::Int64(vec![0; rows]),
            FieldType::Float64 => Self::Float64(vec![0.0; rows]),
            FieldType::Bool => Self::Bool(vec![false; rows]),
            FieldType::FixedText(_) => Self::Text(vec![String::new(); rows]),
            FieldType::SubSchema(schema) => Self::Struct(
                schema
                    .fields()
                    .iter()
                    .map(|field| Self::zeroed(&field.field_type, rows))
                    .collect(),
            ),
            FieldType::FixedArray { element, capacity } => {
                Self::Array(Box::new(Self::zeroed(element, rows * capacity)))
            }
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match self {
            Self::Int64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Self::Float64(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match self {
            Self::Bool(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Self::Text(values) => Some(values),
            _ => None,
        }
    }

    /// Check that this column has the variant and row count `field_type` needs.
    fn check_shape(&self, name: &str, field_type: &FieldType, rows: usize) -> Result<()> {
        let actual = match (self, field_type) {
            (Self::Int64(values), FieldType::Int64) => values.len(),
            (Self::Float64(values), FieldType::Float64) => values.len(),
            (Self::Bool(values), FieldType::Bool) => values.len(),
            (Self::Text(values), FieldType::FixedText(_)) => values.len(),
            (Self::Struct(children), FieldType::SubSchema(schema)) => {
                if children.len() != schema.len() {
                    return Err(LayoutError::ShapeMismatch {
                        field: name.to_string(),
                        expected: schema.len(),
                        actual: children.len(),
                    });
                }
                for (child, field) in children.iter().zip(schema.fields()) {
                    child.check_shape(&field.name, &field.field_type, rows)?;
                }
                return Ok(());
            }
            (Self::Array(inner), FieldType::FixedArray { element, capacity }) => {
                return inner.check_shape(name, element, rows * capacity);
            }
            (other, _) => {
                return Err(LayoutError::mismatch(name, field_type, other.variant_name()));
            }
        };
        if actual != rows {
            return Err(LayoutError::ShapeMismatch {
                field: name.to_string(),
                expected: rows,
                actual,
            });
        }
        Ok(())
    }

    fn variant_name(&self) -> &'static str {
        match self {
            Self::Int64(_) => "int64 column",
            Self::Float64(_) => "float64 column",
            Self::Bool(_) => "bool column",
            Self::Text(_) => "text column",
            Self::Struct(_) => "struct column",
            Self::Array(_) => "array column",
        }
    }

    /// Copy out the given slots, in order.
    fn take(&self, field_type: &FieldType, rows: &[usize]) -> Self {
        match (self, field_type) {
            (Self::Int64(values), _) => Self::Int64(take_values(values, rows)),
            (Self::Float64(values), _) => Self::Float64(take_values(values, rows)),
            (Self::Bool(values), _) => Self::Bool(take_values(values, rows)),
            (Self::Text(values), _) => Self::Text(take_values(values, rows)),
            (Self::Struct(children), FieldType::SubSchema(schema)) => Self::Struct(
                children
                    .iter()
                    .zip(schema.fields())
                    .map(|(child, field)| child.take(&field.field_type, rows))
                    .collect(),
            ),
            (Self::Array(inner), FieldType::FixedArray { element, capacity }) => {
                let expanded: Vec<usize> = rows
                    .iter()
                    .flat_map(|row| row * capacity..(row + 1) * capacity)
                    .collect();
                Self::Array(Box::new(inner.take(element, &expanded)))
            }
            (other, _) => other.clone(),
        }
    }

    fn value(&self, field_type: &FieldType, row: usize) -> Option<SlotValue> {
        match (self, field_type) {
            (Self::Int64(values), _) => values.get(row).copied().map(SlotValue::Int64),
            (Self::Float64(values), _) => values.get(row).copied().map(SlotValue::Float64),
            (Self::Bool(values), _) => values.get(row).copied().map(SlotValue::Bool),
            (Self::Text(values), _) => values.get(row).cloned().map(SlotValue::Text),
            (Self::Struct(children), FieldType::SubSchema(schema)) => {
                let mut record = IndexMap::with_capacity(schema.len());
                for (child, field) in children.iter().zip(schema.fields()) {
                    record.insert(field.name.clone(), child.value(&field.field_type, row)?);
                }
                Some(SlotValue::Record(record))
            }
            (Self::Array(inner), FieldType::FixedArray { element, capacity }) => {
                let start = row * capacity;
                (start..start + capacity)
                    .map(|idx| inner.value(element, idx))
                    .collect::<Option<Vec<_>>>()
                    .map(SlotValue::Array)
            }
            _ => None,
        }
    }

    fn write_slot(&self, field_type: &FieldType, row: usize, out: &mut Vec<u8>) {
        match (self, field_type) {
            (Self::Int64(values), _) => {
                out.extend_from_slice(&values.get(row).copied().unwrap_or(0).to_le_bytes());
            }
            (Self::Float64(values), _) => {
                out.extend_from_slice(&values.get(row).copied().unwrap_or(0.0).to_le_bytes());
            }
            (Self::Bool(values), _) => {
                out.push(u8::from(values.get(row).copied().unwrap_or(false)));
            }
            (Self::Text(values), FieldType::FixedText(width)) => {
                let text = values.get(row).map(String::as_str).unwrap_or("");
                let mut written = 0;
                for ch in text.chars().take(*width) {
                    out.extend_from_slice(&u32::from(ch).to_le_bytes());
                    written += 1;
                }
                out.resize(out.len() + (width - written) * 4, 0);
            }
            (Self::Struct(children), FieldType::SubSchema(schema)) => {
                for (child, field) in children.iter().zip(schema.fields()) {
                    child.write_slot(&field.field_type, row, out);
                }
            }
            (Self::Array(inner), FieldType::FixedArray { element, capacity }) => {
                let start = row * capacity;
                for idx in start..start + capacity {
                    inner.write_slot(element, idx, out);
                }
            }
            (_, other) => out.resize(out.len() + other.byte_width(), 0),
        }
    }
}

fn take_values<T: Clone>(values: &[T], rows: &[usize]) -> Vec<T> {
    rows.iter().filter_map(|&row| values.get(row).cloned()).collect()
}

/// Owned view of one slot value, for row-wise access and serialization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SlotValue {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Text(String),
    Record(IndexMap<String, SlotValue>),
    Array(Vec<SlotValue>),
}

/// N identically shaped slots laid out per a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArray {
    schema: Schema,
    len: usize,
    columns: Vec<ColumnData>,
}

impl CompiledArray {
    /// Allocate `len` zero-valued slots.
    pub fn zeroed(schema: Schema, len: usize) -> Self {
        let columns = schema
            .fields()
            .iter()
            .map(|field| ColumnData::zeroed(&field.field_type, len))
            .collect();
        Self {
            schema,
            len,
            columns,
        }
    }

    /// Build from existing columns, validating them against the schema.
    pub fn from_columns(schema: Schema, len: usize, columns: Vec<ColumnData>) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(LayoutError::ShapeMismatch {
                field: "<columns>".to_string(),
                expected: schema.len(),
                actual: columns.len(),
            });
        }
        for (column, field) in columns.iter().zip(schema.fields()) {
            column.check_shape(&field.name, &field.field_type, len)?;
        }
        Ok(Self {
            schema,
            len,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn columns(&self) -> &[ColumnData] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.schema.index_of(name).map(|idx| &self.columns[idx])
    }

    /// Field definition and mutable storage for `name`.
    pub fn field_mut(&mut self, name: &str) -> Option<(&Field, &mut ColumnData)> {
        let idx = self.schema.index_of(name)?;
        Some((&self.schema.fields()[idx], &mut self.columns[idx]))
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = (&Field, &mut ColumnData)> {
        self.schema.fields().iter().zip(self.columns.iter_mut())
    }

    pub(crate) fn parts_mut(&mut self) -> (&Schema, &mut [ColumnData]) {
        (&self.schema, &mut self.columns)
    }

    /// Text stored in `field` at `row`.
    pub fn text(&self, row: usize, field: &str) -> Option<&str> {
        self.column(field)?
            .as_text()?
            .get(row)
            .map(String::as_str)
    }

    /// Value of `field` at `row`.
    pub fn value(&self, row: usize, field: &str) -> Option<SlotValue> {
        let idx = self.schema.index_of(field)?;
        if row >= self.len {
            return None;
        }
        self.columns[idx].value(&self.schema.fields()[idx].field_type, row)
    }

    /// All fields of one slot, in schema order.
    pub fn row(&self, row: usize) -> Option<IndexMap<String, SlotValue>> {
        if row >= self.len {
            return None;
        }
        let mut values = IndexMap::with_capacity(self.schema.len());
        for (column, field) in self.columns.iter().zip(self.schema.fields()) {
            values.insert(field.name.clone(), column.value(&field.field_type, row)?);
        }
        Some(values)
    }

    pub fn rows(&self) -> impl Iterator<Item = IndexMap<String, SlotValue>> + '_ {
        (0..self.len).filter_map(|row| self.row(row))
    }

    /// Packed little-endian bytes of one slot; always `schema.slot_size()` long.
    pub fn slot_bytes(&self, row: usize) -> Option<Vec<u8>> {
        if row >= self.len {
            return None;
        }
        let mut out = Vec::with_capacity(self.schema.slot_size());
        for (column, field) in self.columns.iter().zip(self.schema.fields()) {
            column.write_slot(&field.field_type, row, &mut out);
        }
        Some(out)
    }

    /// Packed bytes of every slot, back to back.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.schema.slot_size() * self.len);
        for row in 0..self.len {
            for (column, field) in self.columns.iter().zip(self.schema.fields()) {
                column.write_slot(&field.field_type, row, &mut out);
            }
        }
        out
    }

    /// Keep the slots whose mask entry is true. Returns the number removed.
    pub fn retain_rows(&mut self, keep: &[bool]) -> Result<usize> {
        if keep.len() != self.len {
            return Err(LayoutError::ShapeMismatch {
                field: "<mask>".to_string(),
                expected: self.len,
                actual: keep.len(),
            });
        }
        let rows: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(row, &kept)| kept.then_some(row))
            .collect();
        let removed = self.len - rows.len();
        if removed == 0 {
            return Ok(0);
        }
        self.columns = self
            .columns
            .iter()
            .zip(self.schema.fields())
            .map(|(column, field)| column.take(&field.field_type, &rows))
            .collect();
        self.len = rows.len();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stim_schema() -> Schema {
        Schema::new()
            .with_field("amplitude", FieldType::Float64)
            .with_field("burst", FieldType::Bool)
    }

    fn event_schema() -> Schema {
        Schema::new()
            .with_field("subject", FieldType::FixedText(4))
            .with_field("mstime", FieldType::Int64)
            .with_field("vals", FieldType::array(FieldType::Int64, 3))
            .with_field("stim", FieldType::SubSchema(stim_schema()))
    }

    #[test]
    fn test_zeroed_shapes() {
        let array = CompiledArray::zeroed(event_schema(), 2);
        assert_eq!(array.len(), 2);
        assert_eq!(array.column("mstime").unwrap().as_i64(), Some(&[0, 0][..]));
        assert_eq!(
            array.value(1, "vals"),
            Some(SlotValue::Array(vec![SlotValue::Int64(0); 3]))
        );
        assert!(array.value(2, "vals").is_none());
    }

    #[test]
    fn test_slot_bytes_match_slot_size() {
        let schema = event_schema();
        let slot_size = schema.slot_size();
        assert_eq!(slot_size, 16 + 8 + 24 + 9);

        let array = CompiledArray::zeroed(schema, 3);
        for row in 0..3 {
            assert_eq!(array.slot_bytes(row).unwrap().len(), slot_size);
        }
        assert_eq!(array.to_bytes().len(), slot_size * 3);
    }

    #[test]
    fn test_text_is_utf32_padded() {
        let schema = Schema::new().with_field("subject", FieldType::FixedText(3));
        let array = CompiledArray::from_columns(
            schema,
            1,
            vec![ColumnData::Text(vec!["R1".to_string()])],
        )
        .unwrap();
        assert_eq!(
            array.slot_bytes(0).unwrap(),
            vec![b'R', 0, 0, 0, b'1', 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_from_columns_rejects_short_column() {
        let schema = Schema::new().with_field("mstime", FieldType::Int64);
        let err = CompiledArray::from_columns(schema, 2, vec![ColumnData::Int64(vec![1])])
            .unwrap_err();
        assert!(matches!(
            err,
            LayoutError::ShapeMismatch { expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_from_columns_rejects_wrong_variant() {
        let schema = Schema::new().with_field("mstime", FieldType::Int64);
        let err = CompiledArray::from_columns(schema, 1, vec![ColumnData::Float64(vec![1.0])])
            .unwrap_err();
        assert!(matches!(err, LayoutError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn test_retain_rows_keeps_array_blocks() {
        let schema = Schema::new()
            .with_field("mstime", FieldType::Int64)
            .with_field("vals", FieldType::array(FieldType::Int64, 2));
        let mut array = CompiledArray::from_columns(
            schema,
            3,
            vec![
                ColumnData::Int64(vec![10, 20, 30]),
                ColumnData::Array(Box::new(ColumnData::Int64(vec![1, 2, 3, 4, 5, 6]))),
            ],
        )
        .unwrap();

        let removed = array.retain_rows(&[true, false, true]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(array.len(), 2);
        assert_eq!(array.column("mstime").unwrap().as_i64(), Some(&[10, 30][..]));
        assert_eq!(
            array.value(1, "vals"),
            Some(SlotValue::Array(vec![SlotValue::Int64(5), SlotValue::Int64(6)]))
        );
    }

    #[test]
    fn test_row_serializes_in_schema_order() {
        let array = CompiledArray::zeroed(event_schema(), 1);
        let row = array.row(0).unwrap();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"subject":"","mstime":0,"vals":[0,0,0],"stim":{"amplitude":0.0,"burst":false}}"#
        );
    }
}
