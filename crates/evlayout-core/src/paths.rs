//! Canonicalization of the path-bearing text field.
//!
//! Recordings may be copied from the `/data` tree of the acquisition host to
//! another mount point, e.g. `/Users/m/data/events/...`. Prefix discovery
//! finds that mount point from a known path, and every stored path is rebased
//! onto it. The data-root rewrite then collapses numbered roots such as
//! `/data7/R1060M/eeg` to `/data/eeg/R1060M/eeg`.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use regex::{NoExpand, Regex};
use tracing::debug;

use evlayout_model::{FieldType, LayoutError, ReaderOptions, Result};

use crate::array::{ColumnData, CompiledArray};
use crate::text::truncate_chars;

const REREF_VARIANT: &str = "eeg.reref";
const NOREREF_VARIANT: &str = "eeg.noreref";

/// Mount prefix of `path`: every component before the first occurrence of
/// `common_root`.
///
/// `/Users/m/data/events/R1060M_events.mat` with root `data/events` yields
/// `/Users/m`. A path that starts with the root yields `/`.
pub fn discover_prefix(path: &Path, common_root: &str) -> Result<PathBuf> {
    let not_found = || LayoutError::PrefixNotFound {
        path: path.to_path_buf(),
        common_root: common_root.to_string(),
    };

    let root: Vec<Component<'_>> = Path::new(common_root)
        .components()
        .filter(|component| matches!(component, Component::Normal(_)))
        .collect();
    if root.is_empty() {
        return Err(not_found());
    }

    let components: Vec<Component<'_>> = path.components().collect();
    let start = components
        .windows(root.len())
        .position(|window| window == root.as_slice())
        .ok_or_else(not_found)?;

    let prefix: PathBuf = components[..start].iter().collect();
    if prefix.as_os_str().is_empty() {
        return Err(not_found());
    }
    Ok(prefix)
}

/// Join `prefix` with `path` minus its first component.
///
/// For absolute paths the dropped component is the root, so
/// `/data/eeg/R1/x` under `/Users/m` becomes `/Users/m/data/eeg/R1/x`.
/// Paths already under `prefix` are returned unchanged.
pub fn reapply_prefix(prefix: &Path, path: &str) -> String {
    if path.is_empty() || Path::new(path).starts_with(prefix) {
        return path.to_string();
    }
    let mut rebased = prefix.to_path_buf();
    for component in Path::new(path).components().skip(1) {
        rebased.push(component);
    }
    rebased.to_string_lossy().into_owned()
}

/// Per-subject path rewrites.
#[derive(Debug, Clone)]
pub struct PathNormalizer {
    data_root: Regex,
    canonical_root: String,
}

impl PathNormalizer {
    /// Build the data-root rewrite for `subject`.
    pub fn new(subject: &str) -> Result<Self> {
        let pattern = format!("/data.*/{}/eeg", regex::escape(subject));
        let data_root = Regex::new(&pattern).map_err(|error| LayoutError::InvalidPattern {
            pattern: pattern.clone(),
            message: error.to_string(),
        })?;
        Ok(Self {
            data_root,
            canonical_root: format!("/data/eeg/{subject}/eeg"),
        })
    }

    /// Replace `/data<anything>/<subject>/eeg` with `/data/eeg/<subject>/eeg`.
    pub fn rewrite_data_root<'a>(&self, path: &'a str) -> Cow<'a, str> {
        self.data_root
            .replace_all(path, NoExpand(&self.canonical_root))
    }

    /// Point re-referenced waveform paths at the non-re-referenced variant.
    pub fn rewrite_variant(path: &str) -> Cow<'_, str> {
        if path.contains(REREF_VARIANT) {
            Cow::Owned(path.replace(REREF_VARIANT, NOREREF_VARIANT))
        } else {
            Cow::Borrowed(path)
        }
    }
}

/// Run the enabled path transforms over the path field of `array`.
///
/// With `normalize_eeg_path`, the mount prefix is discovered from
/// `prefix_source` (falling back to the first stored path), reapplied to
/// every path, and the data-root rewrite runs. With
/// [`alter_eeg_path`](ReaderOptions::alter_eeg_path), the variant rewrite
/// runs. Arrays without the path field are left untouched. Returns the number
/// of paths that changed.
pub fn normalize_paths(
    array: &mut CompiledArray,
    options: &ReaderOptions,
    prefix_source: Option<&Path>,
) -> Result<usize> {
    if array.is_empty() || !(options.normalize_eeg_path || options.alter_eeg_path()) {
        return Ok(0);
    }
    if array.schema().field(&options.path_field).is_none() {
        debug!(field = %options.path_field, "no path field, skipping path normalization");
        return Ok(0);
    }

    let rebase = if options.normalize_eeg_path {
        let subject = array
            .text(0, &options.subject_field)
            .ok_or_else(|| LayoutError::missing_field(options.subject_field.as_str()))?
            .to_string();
        let source = match prefix_source {
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(array.text(0, &options.path_field).unwrap_or_default()),
        };
        let prefix = discover_prefix(&source, &options.common_root)?;
        debug!(prefix = %prefix.display(), %subject, "discovered data prefix");
        Some((prefix, PathNormalizer::new(&subject)?))
    } else {
        None
    };

    let Some((field, column)) = array.field_mut(&options.path_field) else {
        return Err(LayoutError::missing_field(options.path_field.as_str()));
    };
    let (FieldType::FixedText(width), ColumnData::Text(paths)) = (&field.field_type, column) else {
        return Err(LayoutError::mismatch(
            field.name.as_str(),
            "text",
            "non-text field",
        ));
    };

    let mut rewritten = 0;
    for path in paths.iter_mut() {
        let mut updated = path.clone();
        if let Some((prefix, normalizer)) = &rebase {
            updated = reapply_prefix(prefix, &updated);
            updated = normalizer.rewrite_data_root(&updated).into_owned();
        }
        if options.alter_eeg_path() {
            updated = PathNormalizer::rewrite_variant(&updated).into_owned();
        }
        let updated = truncate_chars(updated, *width);
        if updated != *path {
            *path = updated;
            rewritten += 1;
        }
    }
    Ok(rewritten)
}
