//! Raw event records as delivered by ingestion adapters.
//!
//! A [`RawRecord`] is untyped: every value carries its own runtime kind and
//! nothing guarantees that two records in the same batch agree on shape.
//! Schema inference happens later, in `evlayout-core`.

use indexmap::IndexMap;
use indexmap::map::Iter;

/// One field value inside a [`RawRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Character string.
    Text(String),
    /// Raw byte string, not necessarily UTF-8.
    Bytes(Vec<u8>),
    /// Nested sub-record.
    Record(RawRecord),
    /// Ordered sequence of scalars or of nested records.
    Sequence(Vec<RawValue>),
    /// Absent value.
    Null,
}

impl RawValue {
    /// Short name of the value kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Record(_) => "record",
            Self::Sequence(_) => "sequence",
            Self::Null => "null",
        }
    }

    pub fn as_record(&self) -> Option<&RawRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[RawValue]> {
        match self {
            Self::Sequence(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Length of the value as the legacy readers measured it: character count
    /// for text, byte count for raw strings, rendered length otherwise.
    pub fn display_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Bytes(bytes) => bytes.len(),
            Self::Int(value) => value.to_string().len(),
            Self::Float(value) => value.to_string().len(),
            Self::Bool(value) => if *value { 4 } else { 5 },
            Self::Null => 0,
            // `[a, b]` and `{'k': v}`
            Self::Sequence(values) => {
                2 + values.iter().map(Self::quoted_len).sum::<usize>()
                    + 2 * values.len().saturating_sub(1)
            }
            Self::Record(record) => {
                2 + record
                    .iter()
                    .map(|(key, value)| key.chars().count() + 4 + value.quoted_len())
                    .sum::<usize>()
                    + 2 * record.len().saturating_sub(1)
            }
        }
    }

    /// Rendered length inside a container, where strings carry quotes.
    fn quoted_len(&self) -> usize {
        match self {
            Self::Text(_) => self.display_len() + 2,
            Self::Bytes(_) => self.display_len() + 3,
            _ => self.display_len(),
        }
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<RawRecord> for RawValue {
    fn from(value: RawRecord) -> Self {
        Self::Record(value)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(values: Vec<T>) -> Self {
        Self::Sequence(values.into_iter().map(Into::into).collect())
    }
}

/// Insertion-ordered mapping from field name to [`RawValue`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: IndexMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, keeping the position of an existing key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut RawValue> {
        self.fields.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> Iter<'_, String, RawValue> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<'a> IntoIterator for &'a RawRecord {
    type Item = (&'a String, &'a RawValue);
    type IntoIter = Iter<'a, String, RawValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let record = RawRecord::new()
            .with("subject", "R1001P")
            .with("mstime", 1_234_i64)
            .with("eegoffset", 10_i64)
            .with("amplitude", 0.5);
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["subject", "mstime", "eegoffset", "amplitude"]);
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut record = RawRecord::new().with("a", 1_i64).with("b", 2_i64);
        record.insert("a", 3_i64);
        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&RawValue::Int(3)));
    }

    #[test]
    fn display_len_matches_rendered_width() {
        assert_eq!(RawValue::from("café").display_len(), 4);
        assert_eq!(RawValue::Bytes(b"abc".to_vec()).display_len(), 3);
        assert_eq!(RawValue::Int(-12).display_len(), 3);
        assert_eq!(RawValue::Null.display_len(), 0);
    }

    #[test]
    fn container_len_is_rendered_len() {
        assert_eq!(RawValue::Sequence(vec![]).display_len(), 2);
        // [1, 22]
        assert_eq!(RawValue::from(vec![1_i64, 22]).display_len(), 7);
        // ['ab']
        assert_eq!(RawValue::from(vec!["ab"]).display_len(), 6);
        // {'k': 1}
        assert_eq!(RawValue::Record(RawRecord::new().with("k", 1_i64)).display_len(), 8);
        assert_eq!(RawValue::Record(RawRecord::new()).display_len(), 2);
    }

    #[test]
    fn vec_converts_to_sequence() {
        let value = RawValue::from(vec![1_i64, 2, 3]);
        assert_eq!(value.as_sequence().map(<[RawValue]>::len), Some(3));
        assert_eq!(value.kind(), "sequence");
    }
}
