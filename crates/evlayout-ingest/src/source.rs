//! The producer contract shared by every event source.

use std::path::Path;

use evlayout_core::CompiledArray;
use evlayout_model::RawRecord;

use crate::error::Result;

/// What a source hands to the reader.
#[derive(Debug, Clone)]
pub enum SourceBatch {
    /// Untyped nested records that still need a compiled layout.
    Records(Vec<RawRecord>),
    /// Data that arrived already in a fixed layout.
    Compiled(CompiledArray),
}

impl SourceBatch {
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Compiled(array) => array.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A producer of event records.
pub trait EventSource {
    /// Short name used in diagnostics, e.g. `"json"`.
    fn kind(&self) -> &'static str;

    /// Every event as an untyped record, in source order.
    fn read_records(&self) -> Result<Vec<RawRecord>>;

    /// The batch in the most direct form the source can produce.
    fn read_batch(&self) -> Result<SourceBatch> {
        Ok(SourceBatch::Records(self.read_records()?))
    }

    /// Where the events were read from, used for mount prefix discovery.
    fn location(&self) -> Option<&Path> {
        None
    }

    /// Whether the source carries re-referenced waveform paths.
    fn supports_reref(&self) -> bool {
        true
    }

    /// Whether stored paths go through mount prefix discovery and the
    /// data-root rewrite. Sources that emit already resolved paths opt out.
    fn normalizes_paths(&self) -> bool {
        true
    }
}

impl EventSource for Vec<RawRecord> {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn read_records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.clone())
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn read_records(&self) -> Result<Vec<RawRecord>> {
        (**self).read_records()
    }

    fn read_batch(&self) -> Result<SourceBatch> {
        (**self).read_batch()
    }

    fn location(&self) -> Option<&Path> {
        (**self).location()
    }

    fn supports_reref(&self) -> bool {
        (**self).supports_reref()
    }

    fn normalizes_paths(&self) -> bool {
        (**self).normalizes_paths()
    }
}
