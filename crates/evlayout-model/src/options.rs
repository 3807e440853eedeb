//! Configuration options for reading event batches.

use serde::{Deserialize, Serialize};

/// Value substituted for NaN floating data.
pub const DEFAULT_NAN_SENTINEL: f64 = -999.0;

/// Default relative root of the events directory tree.
pub const DEFAULT_COMMON_ROOT: &str = "data/events";

/// Options controlling filtering and the post-passes of an event read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Drop records whose path field is 3 characters or shorter.
    pub eliminate_events_with_no_eeg: bool,

    /// Replace NaN floating values with [`nan_sentinel`](Self::nan_sentinel).
    pub eliminate_nans: bool,

    /// Keep re-referenced waveform paths. When false, `eeg.reref` is
    /// rewritten to `eeg.noreref`.
    pub use_reref_eeg: bool,

    /// Rebase paths onto the discovered mount prefix and rewrite
    /// `/data*/<subject>/eeg` roots to `/data/eeg/<subject>/eeg`.
    pub normalize_eeg_path: bool,

    /// Relative path to the events root, without a leading `/`
    /// (e.g. `data/events` or `data/scalp_events`).
    pub common_root: String,

    /// Name of the path-bearing text field.
    pub path_field: String,

    /// Name of the subject identifier field read from the first record.
    pub subject_field: String,

    /// Sentinel written in place of NaN.
    pub nan_sentinel: f64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            eliminate_events_with_no_eeg: true,
            eliminate_nans: true,
            use_reref_eeg: false,
            normalize_eeg_path: true,
            common_root: DEFAULT_COMMON_ROOT.to_string(),
            path_field: "eegfile".to_string(),
            subject_field: "subject".to_string(),
            nan_sentinel: DEFAULT_NAN_SENTINEL,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options with every filter and post-pass disabled.
    pub fn passthrough() -> Self {
        Self {
            eliminate_events_with_no_eeg: false,
            eliminate_nans: false,
            use_reref_eeg: true,
            normalize_eeg_path: false,
            ..Self::default()
        }
    }

    /// Whether the `eeg.reref` → `eeg.noreref` rewrite runs.
    pub fn alter_eeg_path(&self) -> bool {
        !self.use_reref_eeg
    }

    #[must_use]
    pub fn with_eliminate_events_with_no_eeg(mut self, enable: bool) -> Self {
        self.eliminate_events_with_no_eeg = enable;
        self
    }

    #[must_use]
    pub fn with_eliminate_nans(mut self, enable: bool) -> Self {
        self.eliminate_nans = enable;
        self
    }

    #[must_use]
    pub fn with_use_reref_eeg(mut self, enable: bool) -> Self {
        self.use_reref_eeg = enable;
        self
    }

    #[must_use]
    pub fn with_normalize_eeg_path(mut self, enable: bool) -> Self {
        self.normalize_eeg_path = enable;
        self
    }

    #[must_use]
    pub fn with_common_root(mut self, root: impl Into<String>) -> Self {
        self.common_root = root.into();
        self
    }

    #[must_use]
    pub fn with_path_field(mut self, field: impl Into<String>) -> Self {
        self.path_field = field.into();
        self
    }

    #[must_use]
    pub fn with_subject_field(mut self, field: impl Into<String>) -> Self {
        self.subject_field = field.into();
        self
    }

    #[must_use]
    pub fn with_nan_sentinel(mut self, sentinel: f64) -> Self {
        self.nan_sentinel = sentinel;
        self
    }
}
