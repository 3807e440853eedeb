//! Nested-record JSON event files.
//!
//! A document is either one event object or an array of event objects. Key
//! order is preserved, so the first event fixes the field order of the
//! compiled schema.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use evlayout_core::has_eeg;
use evlayout_model::{RawRecord, RawValue};

use crate::error::{IngestError, Result};
use crate::source::EventSource;

/// Location of the processed waveform files relative to the events directory.
const NOREREF_DIR: [&str; 5] = ["..", "..", "ephys", "current_processed", "noreref"];

/// Convert one JSON value. Integral numbers that fit `i64` become
/// [`RawValue::Int`], every other number [`RawValue::Float`].
pub fn raw_value(value: Value) -> RawValue {
    match value {
        Value::Null => RawValue::Null,
        Value::Bool(flag) => RawValue::Bool(flag),
        Value::Number(number) => match number.as_i64() {
            Some(int) => RawValue::Int(int),
            None => RawValue::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => RawValue::Text(text),
        Value::Array(values) => RawValue::Sequence(values.into_iter().map(raw_value).collect()),
        Value::Object(map) => RawValue::Record(
            map.into_iter()
                .map(|(key, value)| (key, raw_value(value)))
                .collect(),
        ),
    }
}

/// Records of an already parsed document, or the reason it is not an event
/// document.
pub fn records_from_value(document: Value) -> std::result::Result<Vec<RawRecord>, String> {
    let values = match document {
        Value::Array(values) => values,
        object @ Value::Object(_) => vec![object],
        other => return Err(format!("expected an object or array, found {}", json_kind(&other))),
    };
    values
        .into_iter()
        .enumerate()
        .map(|(idx, value)| match raw_value(value) {
            RawValue::Record(record) => Ok(record),
            other => Err(format!("event {idx} is a {}, not an object", other.kind())),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Event source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonEventSource {
    path: PathBuf,
    path_field: String,
    rebase_eeg_paths: bool,
}

impl JsonEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            path_field: "eegfile".to_string(),
            rebase_eeg_paths: false,
        }
    }

    /// Field rewritten by the path rebase.
    #[must_use]
    pub fn with_path_field(mut self, field: impl Into<String>) -> Self {
        self.path_field = field.into();
        self
    }

    /// Rewrite relative waveform paths onto the processed data directory,
    /// `<events dir>/../../ephys/current_processed/noreref`.
    #[must_use]
    pub fn with_eeg_rebase(mut self, enable: bool) -> Self {
        self.rebase_eeg_paths = enable;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory waveform paths are rebased onto.
    pub fn eeg_dir(&self) -> Result<PathBuf> {
        let events_dir = self.path.parent().unwrap_or_else(|| Path::new(""));
        let relative = NOREREF_DIR
            .iter()
            .fold(events_dir.to_path_buf(), |dir, part| dir.join(part));
        let absolute = std::path::absolute(&relative).map_err(|source| IngestError::FileRead {
            path: relative.clone(),
            source,
        })?;
        Ok(normalize_lexically(&absolute))
    }

    fn rebase(&self, records: &mut [RawRecord]) -> Result<()> {
        let eeg_dir = self.eeg_dir()?;
        debug!(eeg_dir = %eeg_dir.display(), "rebasing waveform paths");
        for record in records.iter_mut() {
            // Paths that will be filtered out stay as they are.
            if !has_eeg(record, &self.path_field) {
                continue;
            }
            if let Some(RawValue::Text(path)) = record.get_mut(&self.path_field) {
                *path = eeg_dir.join(path.as_str()).to_string_lossy().into_owned();
            }
        }
        Ok(())
    }
}

impl EventSource for JsonEventSource {
    fn kind(&self) -> &'static str {
        "json"
    }

    fn read_records(&self) -> Result<Vec<RawRecord>> {
        let text = fs::read_to_string(&self.path).map_err(|source| IngestError::FileRead {
            path: self.path.clone(),
            source,
        })?;
        let document: Value = serde_json::from_str(&text).map_err(|source| IngestError::Json {
            path: self.path.clone(),
            source,
        })?;
        let mut records =
            records_from_value(document).map_err(|reason| IngestError::InvalidDocument {
                path: self.path.clone(),
                reason,
            })?;
        debug!(path = %self.path.display(), records = records.len(), "read JSON events");

        if self.rebase_eeg_paths && records.first().is_some_and(|first| first.contains(&self.path_field)) {
            self.rebase(&mut records)?;
        }
        Ok(records)
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn supports_reref(&self) -> bool {
        false
    }

    /// Paths are relative to the session and rebased onto its processed
    /// data directory instead.
    fn normalizes_paths(&self) -> bool {
        false
    }
}
