//! Whole-batch behavior of the compile pipeline.

use std::path::Path;

use evlayout_core::{SlotValue, compile_batch, compile_layout, discover_prefix, strip_accents};
use evlayout_model::{FieldType, RawRecord, ReaderOptions};

fn fr1_event(mstime: i64, eegfile: &str, stim: Vec<RawRecord>) -> RawRecord {
    RawRecord::new()
        .with("subject", "R1060M")
        .with("experiment", "FR1")
        .with("type", "WORD")
        .with("mstime", mstime)
        .with("eegoffset", mstime * 2)
        .with("recalled", mstime % 2 == 0)
        .with("eegfile", eegfile)
        .with("stim_params", stim)
}

fn stim(amplitude: f64, anode: &str) -> RawRecord {
    RawRecord::new()
        .with("amplitude", amplitude)
        .with("anode_label", anode)
        .with("pulse_freq", 50_i64)
}

#[test]
fn capacity_example() {
    let records = vec![
        RawRecord::new()
            .with("subject", "R001")
            .with("eegfile", "/mnt/x/data/events/R001.mat")
            .with("vals", vec![1_i64, 2]),
        RawRecord::new()
            .with("subject", "R001")
            .with("eegfile", "/mnt/x/data/events/R001b.mat")
            .with("vals", vec![1_i64, 2, 3]),
    ];
    let batch = compile_batch(&records, &ReaderOptions::default(), None).unwrap();

    assert_eq!(batch.array.text(0, "eegfile"), Some("/mnt/x/data/events/R001.mat"));
    assert_eq!(batch.array.text(1, "eegfile"), Some("/mnt/x/data/events/R001b.mat"));
    assert_eq!(batch.report.paths_rewritten, 0);
    assert_eq!(batch.capacities.get("vals").unwrap().max_len, 3);
    assert_eq!(
        batch.array.value(0, "vals"),
        Some(SlotValue::Array(vec![
            SlotValue::Int64(1),
            SlotValue::Int64(2),
            SlotValue::Int64(0),
        ]))
    );
}

#[test]
fn default_options_rebase_onto_source_mount() {
    let records = vec![
        fr1_event(0, "/data3/R1060M/eeg.reref/R1060M_01", Vec::new()),
        fr1_event(1, "", Vec::new()),
        fr1_event(2, "/Users/m/data/eeg/R1060M/eeg.noreref/R1060M_02", Vec::new()),
    ];
    let source = Path::new("/Users/m/data/events/RAM_FR1/R1060M_events.mat");
    let batch = compile_batch(&records, &ReaderOptions::default(), Some(source)).unwrap();

    assert_eq!(batch.array.len(), 2);
    assert_eq!(
        batch.array.text(0, "eegfile"),
        Some("/Users/m/data/eeg/R1060M/eeg.noreref/R1060M_01")
    );
    assert_eq!(
        batch.array.text(1, "eegfile"),
        Some("/Users/m/data/eeg/R1060M/eeg.noreref/R1060M_02")
    );
    assert_eq!(batch.report.paths_rewritten, 1);
}

#[test]
fn prefix_discovery_example() {
    let prefix = discover_prefix(
        Path::new("/Users/m/data/events/R1060M_events.mat"),
        "data/events",
    )
    .unwrap();
    assert_eq!(prefix, Path::new("/Users/m"));
}

#[test]
fn accent_stripping_example() {
    assert_eq!(strip_accents("café"), "cafe");
}

#[test]
fn filtering_example() {
    let records: Vec<RawRecord> = ["/data/eeg/R1060M/eeg.reref/R1060M_01", "", "/data/eeg/R1060M/eeg.reref/R1060M_02", "[]", "/data/eeg/R1060M/eeg.reref/R1060M_03"]
        .iter()
        .enumerate()
        .map(|(idx, path)| fr1_event(idx as i64, path, Vec::new()))
        .collect();
    let options = ReaderOptions::default().with_normalize_eeg_path(false);
    let batch = compile_batch(&records, &options, None).unwrap();
    assert_eq!(batch.array.len(), 3);
    assert_eq!(batch.report.dropped_without_eeg, 2);
}

#[test]
fn stim_params_share_one_capacity() {
    let records = vec![
        fr1_event(0, "/data3/R1060M/eeg.reref/R1060M_01", vec![stim(0.5, "LA1")]),
        fr1_event(1, "/data3/R1060M/eeg.reref/R1060M_01", Vec::new()),
        fr1_event(
            2,
            "/data3/R1060M/eeg.reref/R1060M_01",
            vec![stim(0.5, "LA1"), stim(1.0, "LA3"), stim(1.5, "LA5")],
        ),
    ];
    let layout = compile_layout(&records.iter().collect::<Vec<_>>()).unwrap();
    insta::assert_snapshot!(
        layout.schema.to_string(),
        @"subject: text[256], experiment: text[256], type: text[256], mstime: int64, eegoffset: int64, recalled: bool, eegfile: text[256], stim_params: struct{amplitude: float64, anode_label: text[256], pulse_freq: int64}[3]"
    );

    let slot_size = layout.schema.slot_size();
    let batch = compile_batch(
        &records,
        &ReaderOptions::default(),
        Some(Path::new("/Users/m/data/events/RAM_FR1/R1060M_events.json")),
    )
    .unwrap();
    assert_eq!(batch.array.len(), 3);
    for row in 0..3 {
        assert_eq!(batch.array.slot_bytes(row).unwrap().len(), slot_size);
    }
    assert_eq!(
        batch.array.text(0, "eegfile"),
        Some("/Users/m/data/eeg/R1060M/eeg.noreref/R1060M_01")
    );

    let Some(SlotValue::Array(params)) = batch.array.value(1, "stim_params") else {
        panic!("stim_params is an array");
    };
    assert_eq!(params.len(), 3);
    let Some(SlotValue::Record(first)) = params.first() else {
        panic!("stim_params elements are records");
    };
    assert_eq!(first.get("pulse_freq"), Some(&SlotValue::Int64(0)));
    assert_eq!(first.get("anode_label"), Some(&SlotValue::Text(String::new())));
}

#[test]
fn all_empty_sequences_compile_to_zero_capacity() {
    let records = vec![
        fr1_event(0, "/data/eeg/R1/eeg.noreref/a", Vec::new()),
        fr1_event(1, "/data/eeg/R1/eeg.noreref/b", Vec::new()),
    ];
    let batch = compile_batch(&records, &ReaderOptions::passthrough(), None).unwrap();
    assert_eq!(
        batch.array.schema().field("stim_params").unwrap().field_type,
        FieldType::array(FieldType::Float64, 0)
    );
    assert_eq!(batch.array.value(0, "stim_params"), Some(SlotValue::Array(Vec::new())));
}

#[test]
fn nested_sequence_is_unsupported() {
    let records = vec![RawRecord::new().with("grid", vec![vec![1_i64, 2], vec![3]])];
    let err = compile_batch(&records, &ReaderOptions::passthrough(), None).unwrap_err();
    assert!(err.to_string().contains("nested sequence"));
}
