//! CLI argument parsing for salience
//!
//! Global flags: --store, --format, --quiet, --verbose, --log-level, --log-json

pub mod args;
pub mod format;
pub mod output;
pub mod parse;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

pub use args::{AddArgs, ConsolidateArgs, ListArgs, MaintainArgs, SelectArgs, SynthesizeArgs};
pub use output::OutputFormat;

/// Salience - a personal note store whose notes fade unless reinforced
#[derive(Parser, Debug)]
#[command(name = "salience")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Store root path (defaults to $SALIENCE_STORE, then the platform data dir)
    #[arg(long, global = true, env = "SALIENCE_STORE")]
    pub store: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directive (e.g. `debug`, `salience_core=trace`)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Evaluate as if the current time were this instant
    #[arg(long, global = true, hide = true, value_parser = parse::parse_instant)]
    pub now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The reference time for this invocation
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }
}

/// Top-level salience commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store layout and a default config
    Init,

    /// Add a note and reinforce the notes it overlaps
    Add(AddArgs),

    /// List active notes ranked by effective score
    List(ListArgs),

    /// Pick the notes to surface within a budget and record the surfacing
    Select(SelectArgs),

    /// Record that a surfaced note was referenced
    Reference {
        /// Note key
        key: String,
    },

    /// Move faded, old notes to the archive
    Archive,

    /// Merge clusters of fading related notes through the summarizer
    Consolidate(ConsolidateArgs),

    /// Write weekly and/or monthly roll-ups for closed periods
    Synthesize(SynthesizeArgs),

    /// Run one maintenance cycle if it is due
    Maintain(MaintainArgs),

    /// Run maintenance cycles until interrupted
    Watch,

    /// Show store counts and the last maintenance cycle
    Status,
}
