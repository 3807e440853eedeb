//! End-to-end batch processing: filter, compile, copy, post-passes.

use std::path::Path;

use tracing::{debug, info, info_span};

use evlayout_model::{CapacityMap, RawRecord, RawValue, ReaderOptions, Result};

use crate::array::CompiledArray;
use crate::compile::compile_layout;
use crate::copier::copy_records;
use crate::paths::normalize_paths;
use crate::sanitize::{SanitizeReport, replace_nans};

/// Paths this short or shorter mean the event has no recording attached.
const MIN_PATH_LEN: usize = 3;

/// Counters collected while processing one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub input_records: usize,
    pub dropped_without_eeg: usize,
    pub paths_rewritten: usize,
    /// Present when the sanitizer ran.
    pub sanitize: Option<SanitizeReport>,
}

impl BatchReport {
    pub fn output_records(&self) -> usize {
        self.input_records - self.dropped_without_eeg
    }
}

/// The terminal artifact of a batch.
#[derive(Debug, Clone)]
pub struct CompiledBatch {
    pub array: CompiledArray,
    /// Capacities of the sequence fields; empty for precompiled input.
    pub capacities: CapacityMap,
    pub report: BatchReport,
}

/// Whether the path field of `record` is longer than three characters.
pub fn has_eeg(record: &RawRecord, path_field: &str) -> bool {
    record.get(path_field).map_or(0, RawValue::display_len) > MIN_PATH_LEN
}

/// Records whose path field is longer than three characters.
///
/// The filter only applies when the first record carries the path field; a
/// later record without it is dropped.
pub fn retain_events_with_eeg<'a>(records: &'a [RawRecord], path_field: &str) -> Vec<&'a RawRecord> {
    match records.first() {
        Some(template) if template.contains(path_field) => records
            .iter()
            .filter(|record| has_eeg(record, path_field))
            .collect(),
        _ => records.iter().collect(),
    }
}

/// Compile a batch of raw records into a finished array.
///
/// `prefix_source` is the location the batch was read from, used for mount
/// prefix discovery. Any failure discards the whole batch.
pub fn compile_batch(
    records: &[RawRecord],
    options: &ReaderOptions,
    prefix_source: Option<&Path>,
) -> Result<CompiledBatch> {
    let span = info_span!("compile_batch", records = records.len());
    let _guard = span.enter();

    let kept = if options.eliminate_events_with_no_eeg {
        retain_events_with_eeg(records, &options.path_field)
    } else {
        records.iter().collect()
    };
    let mut report = BatchReport {
        input_records: records.len(),
        dropped_without_eeg: records.len() - kept.len(),
        ..BatchReport::default()
    };

    let layout = compile_layout(&kept)?;
    debug!(
        fields = layout.schema.len(),
        capacities = layout.capacities.len(),
        slot_size = layout.schema.slot_size(),
        "compiled schema"
    );
    let mut array = CompiledArray::zeroed(layout.schema, kept.len());
    copy_records(&kept, &mut array)?;
    apply_post_passes(&mut array, options, prefix_source, &mut report)?;

    info!(
        input = report.input_records,
        output = array.len(),
        dropped = report.dropped_without_eeg,
        "batch compiled"
    );
    Ok(CompiledBatch {
        array,
        capacities: layout.capacities,
        report,
    })
}

/// Filter and post-process an array that arrived already laid out.
pub fn finish_compiled(
    mut array: CompiledArray,
    options: &ReaderOptions,
    prefix_source: Option<&Path>,
) -> Result<CompiledBatch> {
    let span = info_span!("finish_compiled", records = array.len());
    let _guard = span.enter();

    let mut report = BatchReport {
        input_records: array.len(),
        ..BatchReport::default()
    };
    if options.eliminate_events_with_no_eeg && array.schema().field(&options.path_field).is_some() {
        let keep: Vec<bool> = (0..array.len())
            .map(|row| {
                array
                    .text(row, &options.path_field)
                    .is_some_and(|path| path.chars().count() > MIN_PATH_LEN)
            })
            .collect();
        report.dropped_without_eeg = array.retain_rows(&keep)?;
    }
    apply_post_passes(&mut array, options, prefix_source, &mut report)?;

    info!(
        input = report.input_records,
        output = array.len(),
        dropped = report.dropped_without_eeg,
        "batch finished"
    );
    Ok(CompiledBatch {
        array,
        capacities: CapacityMap::new(),
        report,
    })
}

/// Path normalization, then NaN replacement, as enabled by `options`.
pub fn apply_post_passes(
    array: &mut CompiledArray,
    options: &ReaderOptions,
    prefix_source: Option<&Path>,
    report: &mut BatchReport,
) -> Result<()> {
    report.paths_rewritten = normalize_paths(array, options, prefix_source)?;
    if options.eliminate_nans {
        let sanitize = replace_nans(array, options.nan_sentinel);
        debug!(
            replaced = sanitize.replaced,
            skipped = sanitize.skipped.len(),
            "replaced NaN values"
        );
        report.sanitize = Some(sanitize);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use evlayout_model::LayoutError;

    use super::*;
    use crate::array::ColumnData;
    use crate::frame::from_dataframe;

    fn event(eegfile: &str, rt: f64) -> RawRecord {
        RawRecord::new()
            .with("subject", "R1060M")
            .with("eegfile", eegfile)
            .with("rt", rt)
    }

    #[test]
    fn test_short_paths_are_dropped() {
        let records = [
            event("/data/eeg/R1060M/eeg.reref/a", 1.0),
            event("", 1.0),
            event("/data/eeg/R1060M/eeg.reref/b", 1.0),
            event("abc", 1.0),
            event("/data/eeg/R1060M/eeg.reref/c", 1.0),
        ];
        let options = ReaderOptions::default().with_normalize_eeg_path(false);
        let batch = compile_batch(&records, &options, None).unwrap();
        assert_eq!(batch.array.len(), 3);
        assert_eq!(batch.report.dropped_without_eeg, 2);
        assert_eq!(batch.report.output_records(), 3);
        assert_eq!(batch.report.paths_rewritten, 3);
        assert_eq!(
            batch.array.text(2, "eegfile"),
            Some("/data/eeg/R1060M/eeg.noreref/c")
        );
    }

    #[test]
    fn test_empty_list_path_is_dropped() {
        let records = [
            event("/data/eeg/R1060M/eeg.reref/a", 1.0),
            RawRecord::new()
                .with("subject", "R1060M")
                .with("eegfile", Vec::<RawValue>::new()),
        ];
        let kept = retain_events_with_eeg(&records, "eegfile");
        assert_eq!(kept.len(), 1);
        assert!(!has_eeg(&records[1], "eegfile"));
    }

    #[test]
    fn test_filter_ignored_without_path_field() {
        let records = [RawRecord::new().with("mstime", 1_i64)];
        let kept = retain_events_with_eeg(&records, "eegfile");
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_nan_replaced_with_sentinel() {
        let records = [
            event("/data/eeg/R1060M/eeg.noreref/a", f64::NAN),
            event("/data/eeg/R1060M/eeg.noreref/b", 0.25),
        ];
        let options = ReaderOptions::default()
            .with_normalize_eeg_path(false)
            .with_nan_sentinel(-1.0);
        let batch = compile_batch(&records, &options, None).unwrap();
        assert_eq!(batch.array.column("rt").unwrap().as_f64(), Some(&[-1.0, 0.25][..]));
        let sanitize = batch.report.sanitize.unwrap();
        assert_eq!(sanitize.replaced, 1);
        assert_eq!(sanitize.skipped, vec!["subject".to_string(), "eegfile".to_string()]);
    }

    #[test]
    fn test_passthrough_leaves_batch_alone() {
        let records = [event("", f64::NAN)];
        let batch = compile_batch(&records, &ReaderOptions::passthrough(), None).unwrap();
        assert_eq!(batch.array.len(), 1);
        assert!(batch.array.column("rt").unwrap().as_f64().unwrap()[0].is_nan());
        assert_eq!(batch.report.sanitize, None);
    }

    #[test]
    fn test_empty_batch_is_not_an_error() {
        let batch = compile_batch(&[], &ReaderOptions::default(), None).unwrap();
        assert!(batch.array.is_empty());
        assert!(batch.array.schema().is_empty());
    }

    #[test]
    fn test_failure_discards_batch() {
        let records = [
            event("/data/eeg/R1060M/eeg.noreref/a", 1.0),
            RawRecord::new()
                .with("subject", "R1060M")
                .with("eegfile", "/data/eeg/R1060M/eeg.noreref/b")
                .with("rt", RawValue::from("slow")),
        ];
        let options = ReaderOptions::default().with_normalize_eeg_path(false);
        let err = compile_batch(&records, &options, None).unwrap_err();
        assert!(matches!(err, LayoutError::FieldTypeMismatch { .. }));
    }

    #[test]
    fn test_finish_compiled_masks_rows() {
        use polars::prelude::{Column, DataFrame};

        let df = DataFrame::new(vec![
            Column::new("subject".into(), ["R1", "R1", "R1"]),
            Column::new(
                "eegfile".into(),
                ["/data/eeg/R1/eeg.reref/a", "[]", "/data1/R1/eeg.reref/b"],
            ),
            Column::new("rt".into(), [Some(0.5), None, None]),
        ])
        .unwrap();
        let array = from_dataframe(&df).unwrap();
        let batch = finish_compiled(
            array,
            &ReaderOptions::default(),
            Some(Path::new("/Users/m/data/events/R1_events.mat")),
        )
        .unwrap();

        assert_eq!(batch.array.len(), 2);
        assert_eq!(batch.report.dropped_without_eeg, 1);
        assert_eq!(
            batch.array.text(1, "eegfile"),
            Some("/Users/m/data/eeg/R1/eeg.noreref/b")
        );
        assert_eq!(
            batch.array.column("rt"),
            Some(&ColumnData::Float64(vec![0.5, -999.0]))
        );
    }
}
