//! Reader option loading.
//!
//! Options come from an optional TOML file whose keys match
//! [`ReaderOptions`]; missing keys keep their defaults. Command-line flags
//! are applied on top.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use evlayout_model::ReaderOptions;

/// Load reader options from `path`, or the defaults when no file is given.
pub fn load_options(path: Option<&Path>) -> Result<ReaderOptions> {
    let Some(path) = path else {
        return Ok(ReaderOptions::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    let options: ReaderOptions = toml::from_str(&contents)
        .with_context(|| format!("parse config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded reader options");
    Ok(options)
}

/// Command-line overrides layered over the loaded options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReaderOverrides {
    pub keep_events_without_eeg: bool,
    pub keep_nans: bool,
    pub use_reref_eeg: bool,
    pub no_normalize_eeg_path: bool,
    pub common_root: Option<String>,
    pub path_field: Option<String>,
    pub subject_field: Option<String>,
    pub nan_sentinel: Option<f64>,
}

impl ReaderOverrides {
    /// Flags only ever disable a pass or replace a value; an unset flag
    /// leaves the loaded option alone.
    pub fn apply(&self, mut options: ReaderOptions) -> ReaderOptions {
        if self.keep_events_without_eeg {
            options.eliminate_events_with_no_eeg = false;
        }
        if self.keep_nans {
            options.eliminate_nans = false;
        }
        if self.use_reref_eeg {
            options.use_reref_eeg = true;
        }
        if self.no_normalize_eeg_path {
            options.normalize_eeg_path = false;
        }
        if let Some(root) = &self.common_root {
            options.common_root = root.trim_start_matches('/').to_string();
        }
        if let Some(field) = &self.path_field {
            options.path_field.clone_from(field);
        }
        if let Some(field) = &self.subject_field {
            options.subject_field.clone_from(field);
        }
        if let Some(sentinel) = self.nan_sentinel {
            options.nan_sentinel = sentinel;
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_gives_defaults() {
        assert_eq!(load_options(None).unwrap(), ReaderOptions::default());
    }

    #[test]
    fn test_empty_overrides_are_identity() {
        let options = ReaderOptions::default().with_nan_sentinel(0.0);
        assert_eq!(ReaderOverrides::default().apply(options.clone()), options);
    }

    #[test]
    fn test_overrides_apply() {
        let overrides = ReaderOverrides {
            keep_nans: true,
            use_reref_eeg: true,
            common_root: Some("/data/scalp_events".to_string()),
            nan_sentinel: Some(-1.0),
            ..ReaderOverrides::default()
        };
        let options = overrides.apply(ReaderOptions::default());
        assert!(!options.eliminate_nans);
        assert!(options.use_reref_eeg);
        assert!(options.eliminate_events_with_no_eeg);
        assert!(options.normalize_eeg_path);
        assert_eq!(options.common_root, "data/scalp_events");
        assert_eq!(options.nan_sentinel, -1.0);
    }
}
