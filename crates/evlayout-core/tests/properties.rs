//! Batch-wide layout properties.

use evlayout_core::{SlotValue, compile_batch, replace_nans};
use evlayout_model::{RawRecord, RawValue, ReaderOptions};
use proptest::prelude::*;

fn batch_strategy() -> impl Strategy<Value = Vec<(i64, Vec<i64>, Option<f64>)>> {
    prop::collection::vec(
        (
            any::<i64>(),
            prop::collection::vec(-1000_i64..1000, 0..6),
            prop::option::of(-1.0e6_f64..1.0e6),
        ),
        1..24,
    )
}

fn records(rows: &[(i64, Vec<i64>, Option<f64>)]) -> Vec<RawRecord> {
    rows.iter()
        .map(|(mstime, vals, rt)| {
            RawRecord::new()
                .with("mstime", *mstime)
                .with("vals", vals.clone())
                .with("rt", rt.unwrap_or(f64::NAN))
                .with("eegfile", "/data/eeg/R1/eeg.noreref/R1_01")
        })
        .collect()
}

proptest! {
    #[test]
    fn output_length_matches_input(rows in batch_strategy()) {
        let input = records(&rows);
        let batch = compile_batch(&input, &ReaderOptions::passthrough(), None).unwrap();
        prop_assert_eq!(batch.array.len(), input.len());
    }

    #[test]
    fn capacity_is_longest_sequence(rows in batch_strategy()) {
        let input = records(&rows);
        let batch = compile_batch(&input, &ReaderOptions::passthrough(), None).unwrap();
        let longest = rows.iter().map(|(_, vals, _)| vals.len()).max().unwrap_or(0);
        prop_assert_eq!(batch.capacities.get("vals").unwrap().max_len, longest);
    }

    #[test]
    fn short_sequences_are_zero_padded(rows in batch_strategy()) {
        let input = records(&rows);
        let batch = compile_batch(&input, &ReaderOptions::passthrough(), None).unwrap();
        let capacity = batch.capacities.get("vals").unwrap().max_len;
        for (row, (mstime, vals, _)) in rows.iter().enumerate() {
            prop_assert_eq!(batch.array.value(row, "mstime"), Some(SlotValue::Int64(*mstime)));
            let Some(SlotValue::Array(stored)) = batch.array.value(row, "vals") else {
                return Err(TestCaseError::fail("vals is not an array"));
            };
            prop_assert_eq!(stored.len(), capacity);
            for (idx, value) in stored.iter().enumerate() {
                let expected = vals.get(idx).copied().unwrap_or(0);
                prop_assert_eq!(value, &SlotValue::Int64(expected));
            }
        }
    }

    #[test]
    fn every_slot_has_the_same_width(rows in batch_strategy()) {
        let input = records(&rows);
        let batch = compile_batch(&input, &ReaderOptions::passthrough(), None).unwrap();
        let slot_size = batch.array.schema().slot_size();
        prop_assert_eq!(batch.array.to_bytes().len(), slot_size * input.len());
    }

    #[test]
    fn sanitizer_is_idempotent(rows in batch_strategy()) {
        let input = records(&rows);
        let options = ReaderOptions::passthrough().with_eliminate_nans(true);
        let mut batch = compile_batch(&input, &options, None).unwrap();
        let missing = rows.iter().filter(|(_, _, rt)| rt.is_none()).count();
        prop_assert_eq!(batch.report.sanitize.as_ref().map(|report| report.replaced), Some(missing));

        let once = batch.array.clone();
        let second = replace_nans(&mut batch.array, options.nan_sentinel);
        prop_assert_eq!(second.replaced, 0);
        prop_assert_eq!(&batch.array, &once);
    }

    #[test]
    fn later_records_without_a_field_keep_zero(rows in batch_strategy()) {
        let mut input = records(&rows);
        for record in input.iter_mut().skip(1) {
            *record = RawRecord::new()
                .with("mstime", RawValue::Null)
                .with("eegfile", "/data/eeg/R1/eeg.noreref/R1_01");
        }
        let batch = compile_batch(&input, &ReaderOptions::passthrough(), None).unwrap();
        for row in 1..input.len() {
            prop_assert_eq!(batch.array.value(row, "mstime"), Some(SlotValue::Int64(0)));
        }
    }
}
