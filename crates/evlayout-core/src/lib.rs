//! Fixed-layout compilation of heterogeneous event records.
//!
//! A batch of nested, irregularly shaped records is compiled once into a
//! [`Schema`](evlayout_model::Schema) and a capacity map, copied into a
//! uniformly shaped [`CompiledArray`], and then finished by the NaN sanitizer
//! and the path normalizer.
//!
//! ```text
//! records -> compile_layout -> CompiledArray::zeroed -> copy_records
//!         -> normalize_paths -> replace_nans
//! ```

pub mod array;
pub mod capacity;
pub mod classify;
pub mod compile;
pub mod copier;
pub mod frame;
pub mod paths;
pub mod pipeline;
pub mod sanitize;
pub mod text;

pub use array::{ColumnData, CompiledArray, SlotValue};
pub use capacity::resolve_capacities;
pub use classify::classify_value;
pub use compile::{CompiledLayout, compile_layout, compile_schema, compile_template};
pub use copier::copy_records;
pub use frame::{from_dataframe, to_dataframe};
pub use paths::{PathNormalizer, discover_prefix, normalize_paths, reapply_prefix};
pub use pipeline::{
    BatchReport, CompiledBatch, apply_post_passes, compile_batch, finish_compiled, has_eeg,
    retain_events_with_eeg,
};
pub use sanitize::{SanitizeReport, replace_nans};
pub use text::{filter_safe_chars, normalize_text, strip_accents};
