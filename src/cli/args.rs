//! Command argument structures

use clap::{Args, ValueEnum};

use crate::cli::parse::{parse_instant, parse_unit_interval};
use chrono::{DateTime, Utc};

/// Arguments for the add command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Note body (read from stdin when omitted)
    #[arg(long, short = 'm')]
    pub text: Option<String>,

    /// Read a complete JSON note record from stdin
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Originating session id
    #[arg(long, short)]
    pub session: Option<String>,

    /// Source tag (selects the notes/<source>.jsonl file)
    #[arg(long)]
    pub machine: Option<String>,

    /// Topic tag (repeatable)
    #[arg(long = "tag", short)]
    pub tags: Vec<String>,

    /// Action item (repeatable)
    #[arg(long = "action")]
    pub action_items: Vec<String>,

    /// Initial salience
    #[arg(long)]
    pub salience: Option<f64>,

    /// Decay resistance in [0, 1]
    #[arg(long, value_parser = parse_unit_interval)]
    pub emotional_weight: Option<f64>,

    /// Novelty in [0, 1] (computed from tag overlap when omitted)
    #[arg(long, value_parser = parse_unit_interval)]
    pub novelty: Option<f64>,

    /// Pin the note
    #[arg(long)]
    pub pinned: bool,

    /// Event time (defaults to now)
    #[arg(long, value_parser = parse_instant)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only notes carrying this tag
    #[arg(long, short)]
    pub tag: Option<String>,

    /// Maximum number of notes to show
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show the score breakdown for each note
    #[arg(long)]
    pub explain: bool,

    /// Source the caller runs on, for context affinity
    #[arg(long)]
    pub machine: Option<String>,
}

/// Arguments for the select command.
#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Notes to surface (defaults to selection.capacity)
    #[arg(long, short)]
    pub capacity: Option<usize>,

    /// Most recent notes always included (defaults to selection.recency_floor)
    #[arg(long)]
    pub recency_floor: Option<usize>,

    /// Source the caller runs on, for context affinity
    #[arg(long)]
    pub machine: Option<String>,

    /// Print full note text instead of summary lines
    #[arg(long)]
    pub full: bool,
}

/// Arguments for the consolidate command.
#[derive(Args, Debug)]
pub struct ConsolidateArgs {
    /// Show the clusters that would be merged without calling the summarizer
    #[arg(long)]
    pub dry_run: bool,
}

/// Roll-up levels to write
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelArg {
    Weekly,
    Monthly,
    All,
}

/// Arguments for the synthesize command.
#[derive(Args, Debug)]
pub struct SynthesizeArgs {
    /// Roll-up level
    #[arg(long, value_enum, default_value = "all")]
    pub level: LevelArg,
}

/// Arguments for the maintain command.
#[derive(Args, Debug)]
pub struct MaintainArgs {
    /// Run even if the last cycle is recent
    #[arg(long)]
    pub force: bool,
}
