//! Note records
//!
//! A [`NoteEntry`] is one line of a per-source JSONL file. Records are
//! produced by an upstream capture step, so every field is optional on the
//! wire and documented defaults are applied here, once, at the read
//! boundary (see [`NoteEntry::normalize`]).

mod time;

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub use time::parse_datetime;

/// Salience assumed when a record carries none
pub const DEFAULT_SALIENCE: f64 = 0.5;

/// Archive reason used by the archiver
pub const REASON_FADED: &str = "faded";

/// Archive reason used by the consolidator
pub const REASON_CONSOLIDATED: &str = "consolidated";

/// Length of the hex note key
const KEY_LEN: usize = 16;

/// Longest summary line rendered for a note
const SUMMARY_MAX_CHARS: usize = 160;

/// Roll-up level of a derived record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisLevel {
    /// A primary note, not a roll-up
    #[default]
    None,
    /// Weekly roll-up over primary notes
    Weekly,
    /// Monthly roll-up over weekly roll-ups
    Monthly,
}

impl SynthesisLevel {
    /// Parse a level name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(SynthesisLevel::None),
            "weekly" => Some(SynthesisLevel::Weekly),
            "monthly" => Some(SynthesisLevel::Monthly),
            _ => None,
        }
    }

    /// Whether a record at this level is a derived artifact
    pub fn is_synthesis(self) -> bool {
        self != SynthesisLevel::None
    }
}

impl fmt::Display for SynthesisLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisLevel::None => write!(f, "none"),
            SynthesisLevel::Weekly => write!(f, "weekly"),
            SynthesisLevel::Monthly => write!(f, "monthly"),
        }
    }
}

/// A single note record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    /// Originating session id (empty for synthetic records)
    #[serde(default)]
    pub session: String,

    /// Source tag, usually the machine the note was captured on
    #[serde(default)]
    pub machine: String,

    /// Event time, used for age and period bucketing
    #[serde(
        default,
        with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,

    /// Last time the note was surfaced or reinforced
    #[serde(
        default,
        with = "time::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_referenced: Option<DateTime<Utc>>,

    /// Free-form, sectioned body
    #[serde(default)]
    pub text: String,

    /// Short topic tags, order-insensitive
    #[serde(default)]
    pub topic_tags: Vec<String>,

    /// Explicit follow-ups captured with the note
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub action_items: Vec<String>,

    /// Persisted base relevance
    #[serde(default = "default_salience")]
    pub salience: f64,

    /// Decay resistance in [0, 1]
    #[serde(default)]
    pub emotional_weight: f64,

    /// Informational freshness in [0, 1]
    #[serde(default)]
    pub novelty_score: f64,

    /// Times reinforced by overlap with newer notes
    #[serde(default)]
    pub reference_count: u32,

    /// Exempt from decay pressure
    #[serde(default)]
    pub pinned: bool,

    /// Excluded from live scoring and selection
    #[serde(default)]
    pub archived: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_reason: Option<String>,

    /// Source sessions merged into this note (consolidation products only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_from: Option<Vec<String>>,

    #[serde(default)]
    pub synthesis_level: SynthesisLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_start: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_end: Option<NaiveDate>,

    /// Fields this engine does not interpret, preserved across rewrites
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_salience() -> f64 {
    DEFAULT_SALIENCE
}

impl NoteEntry {
    /// Create a primary note captured at `timestamp`
    pub fn new(session: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        NoteEntry {
            session: session.into(),
            machine: String::new(),
            timestamp: Some(timestamp),
            last_referenced: Some(timestamp),
            text: text.into(),
            topic_tags: Vec::new(),
            action_items: Vec::new(),
            salience: DEFAULT_SALIENCE,
            emotional_weight: 0.0,
            novelty_score: 0.0,
            reference_count: 0,
            pinned: false,
            archived: false,
            archived_reason: None,
            consolidated_from: None,
            synthesis_level: SynthesisLevel::None,
            period_start: None,
            period_end: None,
            extra: Map::new(),
        }
    }

    /// Set topic tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topic_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the persisted salience
    pub fn with_salience(mut self, salience: f64) -> Self {
        self.salience = salience;
        self
    }

    /// Set the source tag
    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = machine.into();
        self
    }

    /// Apply documented defaults and bounds. Called once by the store reader.
    /// Keep a `timestamp` value from `raw` that did not parse, so that
    /// rewriting the record does not drop it
    pub fn retain_unparsed_timestamp(&mut self, raw: &Value) {
        if self.timestamp.is_some() {
            return;
        }
        if let Some(value) = raw.get("timestamp").filter(|v| !v.is_null()) {
            self.extra.insert("timestamp".to_string(), value.clone());
        }
    }

    pub fn normalize(&mut self, min_salience: f64) {
        self.emotional_weight = clamp_unit(self.emotional_weight);
        self.novelty_score = clamp_unit(self.novelty_score);
        if !self.salience.is_finite() {
            self.salience = DEFAULT_SALIENCE;
        }
        self.salience = self.salience.max(min_salience);
        if self.last_referenced.is_none() {
            self.last_referenced = self.timestamp;
        }

        let mut seen = BTreeSet::new();
        self.topic_tags = self
            .topic_tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
    }

    /// Stable identity used by usage statistics and rewrites
    pub fn key(&self) -> String {
        let timestamp = self
            .timestamp
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(self.session.as_bytes());
        hasher.update([0u8]);
        hasher.update(timestamp.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.text.as_bytes());
        let hash = hasher.finalize();

        let mut key = hex::encode(hash.as_slice());
        key.truncate(KEY_LEN);
        key
    }

    /// Whether this record is a weekly or monthly roll-up
    pub fn is_synthesis(&self) -> bool {
        self.synthesis_level.is_synthesis()
    }

    /// Whether this record is the product of consolidation
    pub fn is_consolidated(&self) -> bool {
        self.consolidated_from
            .as_ref()
            .is_some_and(|sources| !sources.is_empty())
    }

    /// Days since the event time, or `default_days` when unknown
    pub fn age_days(&self, now: DateTime<Utc>, default_days: f64) -> f64 {
        days_between(self.timestamp, now, default_days)
    }

    /// Days since the note was last referenced (falls back to event time)
    pub fn days_since_reference(&self, now: DateTime<Utc>, default_days: f64) -> f64 {
        days_between(self.last_referenced.or(self.timestamp), now, default_days)
    }

    /// Normalized tag set
    pub fn tag_set(&self) -> BTreeSet<String> {
        self.topic_tags
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Number of tags shared with `tags`
    pub fn tag_overlap(&self, tags: &BTreeSet<String>) -> usize {
        self.tag_set().intersection(tags).count()
    }

    /// First content line, skipping headings, truncated for listings
    pub fn summary_line(&self) -> String {
        let line = self
            .text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .unwrap_or("")
            .trim_start_matches(['-', '*', ' '])
            .trim();

        if line.chars().count() > SUMMARY_MAX_CHARS {
            let truncated: String = line.chars().take(SUMMARY_MAX_CHARS - 3).collect();
            format!("{}...", truncated.trim_end())
        } else {
            line.to_string()
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn days_between(from: Option<DateTime<Utc>>, now: DateTime<Utc>, default_days: f64) -> f64 {
    match from {
        Some(t) => ((now - t).num_seconds() as f64 / 86_400.0).max(0.0),
        None => default_days,
    }
}
