//! NaN replacement over compiled arrays.

use tracing::debug;

use evlayout_model::{FieldType, LayoutError};

use crate::array::{ColumnData, CompiledArray};

/// Outcome of one sanitizer pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SanitizeReport {
    /// Number of NaN values overwritten with the sentinel.
    pub replaced: usize,
    /// Top-level fields the check did not apply to.
    pub skipped: Vec<String>,
}

/// Replace every NaN in the floating fields of `array` with `sentinel`.
///
/// `Float64` fields and fixed arrays of `Float64` are checked. Every other
/// top-level field raises [`LayoutError::SanitizationTypeMismatch`], which is
/// logged and skipped. Infinities are left alone.
pub fn replace_nans(array: &mut CompiledArray, sentinel: f64) -> SanitizeReport {
    let mut report = SanitizeReport::default();
    for (field, column) in array.fields_mut() {
        match sanitize_column(&field.field_type, column, sentinel) {
            Some(replaced) => report.replaced += replaced,
            None => {
                let error = LayoutError::SanitizationTypeMismatch {
                    field: field.name.clone(),
                    field_type: field.field_type.to_string(),
                };
                debug!(%error, "skipping field");
                report.skipped.push(field.name.clone());
            }
        }
    }
    report
}

fn sanitize_column(field_type: &FieldType, column: &mut ColumnData, sentinel: f64) -> Option<usize> {
    match (field_type, column) {
        (FieldType::Float64, ColumnData::Float64(values)) => Some(replace_in(values, sentinel)),
        (FieldType::FixedArray { element, .. }, ColumnData::Array(inner))
            if **element == FieldType::Float64 =>
        {
            match inner.as_mut() {
                ColumnData::Float64(values) => Some(replace_in(values, sentinel)),
                _ => None,
            }
        }
        _ => None,
    }
}

fn replace_in(values: &mut [f64], sentinel: f64) -> usize {
    let mut replaced = 0;
    for value in values.iter_mut().filter(|value| value.is_nan()) {
        *value = sentinel;
        replaced += 1;
    }
    replaced
}
