//! CLI argument definitions for `cts`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cts",
    version,
    about = "Clinical-trial registry statistics per disease term",
    long_about = "Query the ClinicalTrials.gov registry for a list of disease terms and\n\
                  report per-disease and overall trial statistics: status and phase\n\
                  distributions, completion rate, trial durations and results rate."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
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

    /// Settings file (default: ./cts.toml when present).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Query the registry and print statistics per disease term.
    Query(QueryArgs),

    /// Print the effective settings as TOML.
    Config,
}

#[derive(Parser)]
pub struct QueryArgs {
    /// Disease terms to query.
    #[arg(value_name = "TERMS")]
    pub terms: Vec<String>,

    /// Read terms from a file, one per line (`#` starts a comment).
    #[arg(long = "terms-file", value_name = "PATH")]
    pub terms_file: Option<PathBuf>,

    /// Maximum records fetched per term.
    #[arg(long = "max-records", value_name = "N")]
    pub max_records: Option<usize>,

    /// Terms queried concurrently.
    #[arg(long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Minimum delay between registry requests, in milliseconds.
    #[arg(long = "delay-ms", value_name = "N")]
    pub delay_ms: Option<u64>,

    /// Query without study type, sponsor class or completion date filters.
    #[arg(long = "no-filters")]
    pub no_filters: bool,

    /// Write the full run report as JSON.
    #[arg(long = "json", value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Include raw registry payloads in the JSON report.
    #[arg(long = "retain-raw")]
    pub retain_raw: bool,

    /// Hide the progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
