//! Event sources and the reader that turns them into compiled arrays.
//!
//! - **json**: nested event records, one JSON object per event
//! - **matrix**: tabular events from a polars DataFrame or CSV file
//! - **reader**: [`EventReader`], which runs a source through the compile
//!   pipeline with the configured [`ReaderOptions`](evlayout_model::ReaderOptions)

pub mod error;
pub mod json;
pub mod matrix;
pub mod reader;
pub mod source;

pub use error::{IngestError, Result};
pub use json::{JsonEventSource, raw_value, records_from_value};
pub use matrix::{MatrixEventSource, any_to_raw};
pub use reader::{EventReader, SourceKind, open_source};
pub use source::{EventSource, SourceBatch};
