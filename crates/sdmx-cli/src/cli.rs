//! CLI argument definitions for the census SDMX toolkit.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sdmx-census",
    version,
    about = "Census SDMX toolkit - expand coded census tables into readable CSV",
    long_about = "Work with census publications in the SDMX exchange format.\n\n\
                  Extracts coded CSV data from Generic SDMX data documents, rewrites\n\
                  coded values into readable text using the paired Structure file,\n\
                  and reshapes tall output into a wide layout."
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
    /// Rewrite a coded CSV file into readable text.
    Humanize(HumanizeArgs),

    /// Extract a Generic SDMX data document into a coded CSV.
    Extract(ExtractArgs),

    /// Reshape a tall (tidy) CSV file into a wide one.
    Reshape(ReshapeArgs),

    /// List the concepts and codelists a structure file defines.
    Concepts(ConceptsArgs),
}

#[derive(Parser)]
pub struct HumanizeArgs {
    /// Coded data file, named Generic_CATALOG-NUM.csv.
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// Structure file (default: Structure_CATALOG-NUM.xml next to the data file).
    #[arg(long = "structure", value_name = "PATH")]
    pub structure: Option<PathBuf>,

    /// Output file (default: Generic_CATALOG-NUM.humanized.csv).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Strip presentation indentation from descriptions.
    ///
    /// Some census descriptions are indented with spaces to reflect their
    /// position in a hierarchy (e.g. '    75 years and over').
    #[arg(long = "trim")]
    pub trim: bool,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// Generic SDMX data document.
    #[arg(value_name = "DATA_FILE")]
    pub data_file: PathBuf,

    /// Output file (default: the data file with a .csv extension).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ReshapeArgs {
    /// Tall CSV file: two index columns, pivot columns, value column last.
    #[arg(value_name = "CSV_FILE")]
    pub csv_file: PathBuf,

    /// Output file (default: the input with a .pivoted.csv extension).
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ConceptsArgs {
    /// Structure file to inspect.
    #[arg(value_name = "STRUCTURE_FILE")]
    pub structure_file: PathBuf,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: ConceptsFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ConceptsFormatArg {
    Table,
    Json,
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
