//! Error types for event ingestion.

use std::path::PathBuf;

use evlayout_model::LayoutError;
use thiserror::Error;

/// Errors that can occur while reading and compiling an event source.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not name a known source format.
    #[error("unrecognized event file format: {path}")]
    UnknownFormat { path: PathBuf },

    // === Parsing Errors ===
    /// The document is not valid JSON.
    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The document parsed but is not an object or an array of objects.
    #[error("invalid event document {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// Failed to load a matrix source with Polars.
    #[error("failed to read matrix {path}: {message}")]
    MatrixRead { path: PathBuf, message: String },

    // === Option Errors ===
    /// Re-referenced waveform paths were requested from a source without them.
    #[error("re-referenced EEG paths are not supported by {source_kind} sources")]
    RerefUnsupported { source_kind: &'static str },

    // === Layout Errors ===
    /// Schema compilation, copying or a post-pass failed.
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
