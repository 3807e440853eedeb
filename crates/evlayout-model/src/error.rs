use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while compiling a batch of event records into a fixed layout.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A value has no storage type mapping (e.g. null).
    #[error("unsupported value of kind '{kind}' in field '{field}'")]
    UnsupportedFieldType { field: String, kind: &'static str },

    /// A later record disagrees with the type inferred from the template record.
    #[error("field '{field}' expected {expected}, found {found}")]
    FieldTypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },

    /// A sequence is longer than the capacity compiled for its field.
    #[error("field '{field}' holds {len} elements, capacity is {capacity}")]
    CapacityExceeded {
        field: String,
        capacity: usize,
        len: usize,
    },

    /// A field required by a post-pass is not in the schema.
    #[error("field '{field}' is not present in the compiled schema")]
    MissingField { field: String },

    /// Prefix discovery could not locate the common root in a path.
    #[error("could not determine prefix from {path} using common root {common_root}")]
    PrefixNotFound { path: PathBuf, common_root: String },

    /// Text could not be decoded for accent stripping.
    #[error("text normalization failed: {message}")]
    NormalizationFailure { message: String },

    /// The non-finite check was applied to a field that is not floating point.
    #[error("field '{field}' of type {field_type} cannot hold NaN")]
    SanitizationTypeMismatch { field: String, field_type: String },

    /// Column storage does not match the schema.
    #[error("column '{field}' has {actual} values, expected {expected}")]
    ShapeMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    /// A path rewrite pattern failed to compile.
    #[error("invalid path pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Conversion to or from a polars DataFrame failed.
    #[error("frame conversion failed: {message}")]
    Frame { message: String },
}

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;

impl LayoutError {
    pub fn unsupported(field: impl Into<String>, kind: &'static str) -> Self {
        Self::UnsupportedFieldType {
            field: field.into(),
            kind,
        }
    }

    pub fn mismatch(field: impl Into<String>, expected: impl ToString, found: &'static str) -> Self {
        Self::FieldTypeMismatch {
            field: field.into(),
            expected: expected.to_string(),
            found,
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn frame(message: impl Into<String>) -> Self {
        Self::Frame {
            message: message.into(),
        }
    }

    /// True for the kinds that post-passes recover from locally.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NormalizationFailure { .. } | Self::SanitizationTypeMismatch { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LayoutError::unsupported("eegoffset", "null");
        assert_eq!(
            format!("{err}"),
            "unsupported value of kind 'null' in field 'eegoffset'"
        );

        let err = LayoutError::PrefixNotFound {
            path: PathBuf::from("/scratch/R1060M_events.mat"),
            common_root: "data/events".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "could not determine prefix from /scratch/R1060M_events.mat using common root data/events"
        );
    }

    #[test]
    fn test_recoverable_kinds() {
        assert!(
            LayoutError::SanitizationTypeMismatch {
                field: "subject".to_string(),
                field_type: "text[256]".to_string(),
            }
            .is_recoverable()
        );
        assert!(!LayoutError::missing_field("eegfile").is_recoverable());
    }
}
