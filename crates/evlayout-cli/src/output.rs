//! Writing compiled arrays to disk.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use polars::prelude::{CsvWriter, SerWriter};
use tracing::info;

use evlayout_core::{CompiledArray, to_dataframe};

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per slot, nested fields included.
    #[default]
    Json,
    /// Scalar fields only, one row per slot.
    Csv,
}

impl OutputFormat {
    /// Guess the format from a file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// Write `array` to `path` in `format`.
pub fn write_output(array: &CompiledArray, path: &Path, format: OutputFormat) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = array.rows().collect();
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &rows)
                .with_context(|| format!("write {}", path.display()))?;
            writer.flush()?;
        }
        OutputFormat::Csv => {
            let mut frame = to_dataframe(array, &[])?;
            let mut writer = BufWriter::new(file);
            CsvWriter::new(&mut writer)
                .include_header(true)
                .finish(&mut frame)
                .with_context(|| format!("write {}", path.display()))?;
            writer.flush()?;
        }
    }
    info!(path = %path.display(), rows = array.len(), ?format, "wrote output");
    Ok(())
}
