use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info_span;

use evlayout_cli::config::load_options;
use evlayout_cli::output::{OutputFormat, write_output};
use evlayout_core::CompiledBatch;
use evlayout_ingest::{EventReader, open_source};
use evlayout_model::ReaderOptions;

use crate::cli::{CompileArgs, ReaderArgs, SchemaArgs};

/// Result of one `compile` run.
pub struct CompileResult {
    pub input: PathBuf,
    pub options: ReaderOptions,
    pub batch: CompiledBatch,
    pub output: Option<PathBuf>,
}

pub fn run_compile(args: &CompileArgs) -> Result<CompileResult> {
    let span = info_span!("compile", input = %args.input.display());
    let _guard = span.enter();

    let (options, batch) = read_events(&args.input, &args.reader)?;
    if let Some(path) = &args.output {
        let format = args.format.unwrap_or_else(|| OutputFormat::from_path(path));
        write_output(&batch.array, path, format)
            .with_context(|| format!("write compiled events to {}", path.display()))?;
    }
    Ok(CompileResult {
        input: args.input.clone(),
        options,
        batch,
        output: args.output.clone(),
    })
}

pub fn run_schema(args: &SchemaArgs) -> Result<CompiledBatch> {
    let (_, batch) = read_events(&args.input, &args.reader)?;
    Ok(batch)
}

fn read_events(input: &Path, reader: &ReaderArgs) -> Result<(ReaderOptions, CompiledBatch)> {
    let options = reader
        .overrides()
        .apply(load_options(reader.config.as_deref())?);
    let source = open_source(input, &options)
        .with_context(|| format!("open event file {}", input.display()))?;
    let batch = EventReader::new(source, options.clone())
        .read_with_report()
        .with_context(|| format!("compile events from {}", input.display()))?;
    Ok((options, batch))
}
