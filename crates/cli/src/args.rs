//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// feedbrief: incremental feed aggregator that annotates new items with LLM summaries
#[derive(Parser, Debug)]
#[command(name = "feedbrief")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, summarize and persist every configured channel once
    Run(RunArgs),

    /// One-shot summary of text
    Summarize(SummarizeArgs),

    /// Inspect configured channels
    Channels(ChannelsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Only run the named channel (repeatable)
    #[arg(long = "channel")]
    pub channels: Vec<String>,

    /// Fetch and report against the stored collections without summarizing or writing
    #[arg(long)]
    pub dry_run: bool,

    /// Output per-channel results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// Text to summarize
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing text to summarize (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChannelsArgs {
    #[command(subcommand)]
    pub command: ChannelsCommands,
}

#[derive(Subcommand, Debug)]
pub enum ChannelsCommands {
    /// List configured channels
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate channel definitions and filter rules
    Validate,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Also call the summarizer endpoint to test connectivity
    #[arg(long)]
    pub ping: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
