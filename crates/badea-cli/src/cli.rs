//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "badea",
    version,
    about = "Extract BADEA regional statistics into SDMX-ready tables",
    long_about = "Download BADEA queries and their hierarchies, reshape them into long \
                  observation tables and write the per-activity artifacts (configuration, \
                  merged group tables, code lists) used for SDMX publication."
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
}

#[derive(Subcommand)]
pub enum Command {
    /// Run activities from a pipeline configuration.
    Run(RunArgs),

    /// Expand a saved hierarchy response into a flat table.
    Expand(ExpandArgs),

    /// Print the identifiers generated from descriptions.
    DefaultId(DefaultIdArgs),

    /// List the activities of a pipeline configuration.
    Activities(ConfigArgs),
}

#[derive(Parser)]
pub struct ConfigArgs {
    /// Pipeline configuration file (TOML).
    #[arg(long = "config", short = 'c', value_name = "PATH", default_value = "badea.toml")]
    pub config: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Activities to run (default: every configured activity).
    #[arg(value_name = "ACTIVITY")]
    pub activities: Vec<String>,

    /// Write the publication plans as JSON to this file.
    #[arg(long = "plan", value_name = "PATH")]
    pub plan: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ExpandArgs {
    /// Hierarchy response as returned by the API (JSON).
    #[arg(value_name = "HIERARCHY_JSON")]
    pub input: PathBuf,

    /// Write the table to this file instead of printing it.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct DefaultIdArgs {
    /// Descriptions to turn into identifiers.
    #[arg(value_name = "DESCRIPTION", required = true)]
    pub descriptions: Vec<String>,

    /// Words dropped from long descriptions (default: A, DE, POR, PARA, EN).
    #[arg(long = "stopword", value_name = "WORD")]
    pub stopwords: Vec<String>,
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
