//! The event reader facade.

use std::borrow::Cow;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{debug, info_span};

use evlayout_core::{CompiledArray, CompiledBatch, compile_batch, finish_compiled, to_dataframe};
use evlayout_model::ReaderOptions;

use crate::error::{IngestError, Result};
use crate::json::JsonEventSource;
use crate::matrix::MatrixEventSource;
use crate::source::{EventSource, SourceBatch};

/// Source format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.json`: nested event records.
    Json,
    /// `.csv`: a headered event matrix.
    Matrix,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Matrix),
            _ => None,
        }
    }
}

/// Open the source for `path` according to its extension.
///
/// JSON sources rebase waveform paths onto the processed data directory.
pub fn open_source(path: &Path, options: &ReaderOptions) -> Result<Box<dyn EventSource>> {
    match SourceKind::from_path(path) {
        Some(SourceKind::Json) => Ok(Box::new(
            JsonEventSource::new(path)
                .with_path_field(options.path_field.as_str())
                .with_eeg_rebase(true),
        )),
        Some(SourceKind::Matrix) => Ok(Box::new(MatrixEventSource::from_csv(path)?)),
        None => Err(IngestError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads one event source into a finished compiled array.
#[derive(Debug, Clone)]
pub struct EventReader<S> {
    source: S,
    options: ReaderOptions,
}

impl<S: EventSource> EventReader<S> {
    pub fn new(source: S, options: ReaderOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Read, filter, compile and post-process the whole source.
    pub fn read(&self) -> Result<CompiledArray> {
        Ok(self.read_with_report()?.array)
    }

    /// Like [`read`](Self::read), keeping the capacities and batch counters.
    pub fn read_with_report(&self) -> Result<CompiledBatch> {
        let span = info_span!("read_events", source = self.source.kind());
        let _guard = span.enter();

        if self.options.use_reref_eeg && !self.source.supports_reref() {
            return Err(IngestError::RerefUnsupported {
                source_kind: self.source.kind(),
            });
        }

        let options = if self.options.normalize_eeg_path && !self.source.normalizes_paths() {
            debug!(source = self.source.kind(), "source paths are not mount-normalized");
            Cow::Owned(self.options.clone().with_normalize_eeg_path(false))
        } else {
            Cow::Borrowed(&self.options)
        };

        let location = self.source.location();
        let batch = match self.source.read_batch()? {
            SourceBatch::Records(records) => compile_batch(&records, &options, location)?,
            SourceBatch::Compiled(array) => finish_compiled(array, &options, location)?,
        };
        Ok(batch)
    }

    /// The scalar fields of [`read`](Self::read) as a DataFrame.
    ///
    /// Sub-record and list fields such as `stim_params` are dropped.
    pub fn as_dataframe(&self) -> Result<DataFrame> {
        let array = self.read()?;
        Ok(to_dataframe(&array, &[])?)
    }
}
