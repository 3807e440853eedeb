//! Tabular event matrices.
//!
//! A matrix arrives with its column types already fixed, so it is handed to
//! the reader as a compiled array and skips schema inference.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use evlayout_core::from_dataframe;
use evlayout_model::{RawRecord, RawValue};

use crate::error::{IngestError, Result};
use crate::source::{EventSource, SourceBatch};

/// Convert one cell. Nulls in floating columns read as NaN.
pub fn any_to_raw(value: AnyValue<'_>, dtype: &DataType) -> RawValue {
    match value {
        AnyValue::Null if matches!(dtype, DataType::Float32 | DataType::Float64) => {
            RawValue::Float(f64::NAN)
        }
        AnyValue::Null => RawValue::Null,
        AnyValue::Boolean(flag) => RawValue::Bool(flag),
        AnyValue::Int8(v) => RawValue::Int(i64::from(v)),
        AnyValue::Int16(v) => RawValue::Int(i64::from(v)),
        AnyValue::Int32(v) => RawValue::Int(i64::from(v)),
        AnyValue::Int64(v) => RawValue::Int(v),
        AnyValue::UInt8(v) => RawValue::Int(i64::from(v)),
        AnyValue::UInt16(v) => RawValue::Int(i64::from(v)),
        AnyValue::UInt32(v) => RawValue::Int(i64::from(v)),
        AnyValue::UInt64(v) => i64::try_from(v).map_or(RawValue::Float(v as f64), RawValue::Int),
        AnyValue::Float32(v) => RawValue::Float(f64::from(v)),
        AnyValue::Float64(v) => RawValue::Float(v),
        AnyValue::String(s) => RawValue::Text(s.to_string()),
        AnyValue::StringOwned(s) => RawValue::Text(s.to_string()),
        other => RawValue::Text(other.to_string()),
    }
}

/// Event source backed by a polars DataFrame.
#[derive(Debug, Clone)]
pub struct MatrixEventSource {
    frame: DataFrame,
    path: Option<PathBuf>,
}

impl MatrixEventSource {
    pub fn from_dataframe(frame: DataFrame) -> Self {
        Self { frame, path: None }
    }

    /// Load a headered CSV file.
    pub fn from_csv(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| IngestError::MatrixRead {
                path: path.clone(),
                message: e.to_string(),
            })?
            .finish()
            .map_err(|e| IngestError::MatrixRead {
                path: path.clone(),
                message: e.to_string(),
            })?;
        debug!(path = %path.display(), rows = frame.height(), columns = frame.width(), "read CSV matrix");
        Ok(Self {
            frame,
            path: Some(path),
        })
    }

    /// Record the location the frame was loaded from.
    #[must_use]
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    fn read_error(&self, message: String) -> IngestError {
        IngestError::MatrixRead {
            path: self.path.clone().unwrap_or_default(),
            message,
        }
    }
}

impl EventSource for MatrixEventSource {
    fn kind(&self) -> &'static str {
        "matrix"
    }

    fn read_records(&self) -> Result<Vec<RawRecord>> {
        let columns = self.frame.get_columns();
        let mut records = Vec::with_capacity(self.frame.height());
        for row in 0..self.frame.height() {
            let mut record = RawRecord::new();
            for column in columns {
                let value = column
                    .get(row)
                    .map_err(|e| self.read_error(e.to_string()))?;
                record.insert(column.name().as_str(), any_to_raw(value, column.dtype()));
            }
            records.push(record);
        }
        Ok(records)
    }

    fn read_batch(&self) -> Result<SourceBatch> {
        Ok(SourceBatch::Compiled(from_dataframe(&self.frame)?))
    }

    fn location(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new("subject".into(), ["R1", "R1"]),
            Column::new("mstime".into(), [10_i64, 20]),
            Column::new("rt".into(), [Some(0.5_f64), None]),
        ])
        .unwrap()
    }

    #[test]
    fn test_read_records_one_per_row() {
        let source = MatrixEventSource::from_dataframe(frame());
        let records = source.read_records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("mstime"), Some(&RawValue::Int(20)));
        assert!(matches!(records[1].get("rt"), Some(RawValue::Float(v)) if v.is_nan()));
        assert_eq!(records[0].get("subject"), Some(&RawValue::from("R1")));
    }

    #[test]
    fn test_read_batch_is_precompiled() {
        let source = MatrixEventSource::from_dataframe(frame());
        let SourceBatch::Compiled(array) = source.read_batch().unwrap() else {
            panic!("matrix sources emit compiled arrays");
        };
        assert_eq!(array.len(), 2);
        assert_eq!(array.schema().to_string(), "subject: text[256], mstime: int64, rt: float64");
    }

    #[test]
    fn test_any_to_raw_unsigned_overflow() {
        assert_eq!(
            any_to_raw(AnyValue::UInt64(u64::MAX), &DataType::UInt64),
            RawValue::Float(u64::MAX as f64)
        );
        assert_eq!(any_to_raw(AnyValue::Null, &DataType::Int64), RawValue::Null);
    }
}
