//! Resolved field types and the fixed slot layout they describe.

use std::fmt;

use indexmap::IndexMap;

/// Fixed character capacity assigned to every text field.
///
/// Longer text is truncated silently when copied.
pub const DEFAULT_TEXT_CAPACITY: usize = 256;

/// Resolved storage type of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Int64,
    Float64,
    Bool,
    /// Text holding at most this many characters.
    FixedText(usize),
    /// Nested sub-record.
    SubSchema(Schema),
    /// Variable-length sequence stored at a single batch-wide capacity.
    ///
    /// The element is a scalar leaf or a [`FieldType::SubSchema`] branch.
    FixedArray {
        element: Box<FieldType>,
        capacity: usize,
    },
}

impl FieldType {
    pub fn text() -> Self {
        Self::FixedText(DEFAULT_TEXT_CAPACITY)
    }

    pub fn array(element: FieldType, capacity: usize) -> Self {
        Self::FixedArray {
            element: Box::new(element),
            capacity,
        }
    }

    /// True for `Int64`, `Float64`, `Bool` and `FixedText`.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::Int64 | Self::Float64 | Self::Bool | Self::FixedText(_)
        )
    }

    /// Width in bytes of one value of this type in the packed slot layout.
    ///
    /// Text is stored as UTF-32 code units.
    pub fn byte_width(&self) -> usize {
        match self {
            Self::Int64 | Self::Float64 => 8,
            Self::Bool => 1,
            Self::FixedText(chars) => chars * 4,
            Self::SubSchema(schema) => schema.slot_size(),
            Self::FixedArray { element, capacity } => element.byte_width() * capacity,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int64 => f.write_str("int64"),
            Self::Float64 => f.write_str("float64"),
            Self::Bool => f.write_str("bool"),
            Self::FixedText(chars) => write!(f, "text[{chars}]"),
            Self::SubSchema(schema) => write!(f, "struct{{{schema}}}"),
            Self::FixedArray { element, capacity } => write!(f, "{element}[{capacity}]"),
        }
    }
}

/// One named field of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Ordered field list describing one slot of a compiled array.
///
/// Field order follows the key order of the record the schema was compiled
/// from, and each name appears once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. A name that is already present is left untouched and
    /// `false` is returned.
    pub fn push(&mut self, field: Field) -> bool {
        if self.index_of(&field.name).is_some() {
            return false;
        }
        self.fields.push(field);
        true
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.push(Field::new(name, field_type));
        self
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Packed byte size of one slot.
    pub fn slot_size(&self) -> usize {
        self.fields
            .iter()
            .map(|field| field.field_type.byte_width())
            .sum()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, field) in self.fields.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", field.name, field.field_type)?;
        }
        Ok(())
    }
}

/// Batch-wide capacity tracking for one sequence field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Capacity {
    /// Element type, resolved from the first non-empty occurrence.
    pub element: Option<FieldType>,
    /// Longest sequence observed across the batch.
    pub max_len: usize,
}

impl Capacity {
    /// Resolved element type. Fields whose sequences are empty in every record
    /// fall back to `Float64`.
    pub fn element_type(&self) -> FieldType {
        self.element.clone().unwrap_or(FieldType::Float64)
    }

    pub fn field_type(&self) -> FieldType {
        FieldType::array(self.element_type(), self.max_len)
    }
}

/// Sequence field name to [`Capacity`], in first-record key order.
///
/// Entries must be created with [`initialize`](Self::initialize) before they
/// can be updated; updating an unknown field is a no-op that returns `false`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityMap {
    entries: IndexMap<String, Capacity>,
}

impl CapacityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `name` with no element type and zero length.
    pub fn initialize(&mut self, name: impl Into<String>) {
        self.entries.entry(name.into()).or_default();
    }

    /// Record one observed sequence length.
    pub fn observe_len(&mut self, name: &str, len: usize) -> bool {
        match self.entries.get_mut(name) {
            Some(capacity) => {
                capacity.max_len = capacity.max_len.max(len);
                true
            }
            None => false,
        }
    }

    /// Set the element type if it is not resolved yet.
    pub fn resolve_element(&mut self, name: &str, element: FieldType) -> bool {
        match self.entries.get_mut(name) {
            Some(capacity) => {
                if capacity.element.is_none() {
                    capacity.element = Some(element);
                }
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|capacity| capacity.element.is_some())
    }

    pub fn get(&self, name: &str) -> Option<&Capacity> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Capacity)> {
        self.entries
            .iter()
            .map(|(name, capacity)| (name.as_str(), capacity))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
