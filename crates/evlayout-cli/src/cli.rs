//! CLI argument definitions for the event layout compiler.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use evlayout_cli::config::ReaderOverrides;
use evlayout_cli::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "evlayout",
    version,
    about = "Compile heterogeneous event records into fixed-layout arrays",
    long_about = "Compile behavioral event records into uniform fixed-layout arrays.\n\n\
                  Reads JSON event lists or CSV event matrices, drops events without\n\
                  waveform data, rewrites waveform paths and replaces NaN values."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read an event file, compile it and print a summary.
    Compile(CompileArgs),

    /// Print the compiled slot schema of an event file.
    Schema(SchemaArgs),
}

#[derive(Parser)]
pub struct CompileArgs {
    /// Event file (.json or .csv).
    #[arg(value_name = "EVENTS")]
    pub input: PathBuf,

    #[command(flatten)]
    pub reader: ReaderArgs,

    /// Write the compiled slots to this file.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (default: from the output file extension).
    #[arg(long = "output-format", value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Parser)]
pub struct SchemaArgs {
    /// Event file (.json or .csv).
    #[arg(value_name = "EVENTS")]
    pub input: PathBuf,

    #[command(flatten)]
    pub reader: ReaderArgs,
}

/// Reader options shared by every subcommand.
#[derive(Args)]
pub struct ReaderArgs {
    /// TOML file with reader options.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep events whose waveform path is empty or a placeholder.
    #[arg(long = "keep-events-without-eeg")]
    pub keep_events_without_eeg: bool,

    /// Leave NaN values in floating fields.
    #[arg(long = "keep-nans")]
    pub keep_nans: bool,

    /// Keep re-referenced waveform paths (JSON sources reject this).
    #[arg(long = "use-reref-eeg")]
    pub use_reref_eeg: bool,

    /// Skip mount prefix discovery and data root rewriting.
    #[arg(long = "no-normalize-eeg-path")]
    pub no_normalize_eeg_path: bool,

    /// Relative events root used to discover the mount prefix.
    #[arg(long = "common-root", value_name = "DIR")]
    pub common_root: Option<String>,

    /// Name of the waveform path field.
    #[arg(long = "path-field", value_name = "NAME")]
    pub path_field: Option<String>,

    /// Name of the subject identifier field.
    #[arg(long = "subject-field", value_name = "NAME")]
    pub subject_field: Option<String>,

    /// Value written in place of NaN.
    #[arg(long = "nan-sentinel", value_name = "VALUE", allow_negative_numbers = true)]
    pub nan_sentinel: Option<f64>,
}

impl ReaderArgs {
    pub fn overrides(&self) -> ReaderOverrides {
        ReaderOverrides {
            keep_events_without_eeg: self.keep_events_without_eeg,
            keep_nans: self.keep_nans,
            use_reref_eeg: self.use_reref_eeg,
            no_normalize_eeg_path: self.no_normalize_eeg_path,
            common_root: self.common_root.clone(),
            path_field: self.path_field.clone(),
            subject_field: self.subject_field.clone(),
            nan_sentinel: self.nan_sentinel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
