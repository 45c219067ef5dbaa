//! Configuration type definitions

use serde::{Deserialize, Serialize};

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Engine configuration, loaded from `config.toml` in the store root.
///
/// Every lifecycle call receives this (or one of its sections) explicitly;
/// there are no process-wide policy constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Config format version for compatibility checking
    #[serde(default = "default_version")]
    pub version: u32,

    /// Decay and scoring policy
    #[serde(default)]
    pub decay: DecayPolicy,

    /// Selection budget
    #[serde(default)]
    pub selection: SelectionConfig,

    /// Archival thresholds
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Consolidation thresholds and cluster shape
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// Weekly/monthly roll-up shape
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Maintenance cycle scheduling
    #[serde(default)]
    pub maintenance: MaintenanceConfig,

    /// Reinforcement applied when new notes arrive
    #[serde(default)]
    pub reinforcement: ReinforcementConfig,

    /// External summarizer used by consolidation
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            decay: DecayPolicy::default(),
            selection: SelectionConfig::default(),
            archive: ArchiveConfig::default(),
            consolidation: ConsolidationConfig::default(),
            synthesis: SynthesisConfig::default(),
            maintenance: MaintenanceConfig::default(),
            reinforcement: ReinforcementConfig::default(),
            summarizer: SummarizerConfig::default(),
        }
    }
}

/// Forgetting-curve and modifier policy for the scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayPolicy {
    /// Per-day multiplicative decay, just under 1.0
    pub decay_factor: f64,
    /// Floor applied to every decayed score
    pub min_salience: f64,
    /// Additive boost for pinned notes, applied before flooring
    pub pinned_boost: f64,
    /// How strongly emotional weight slows decay (0.5 halves the age at weight 1.0)
    pub emotional_damping: f64,
    /// Age assumed for notes with no usable timestamp
    pub default_age_days: f64,
    /// Surfacings required before reference effectiveness applies
    pub effectiveness_min_surfaced: u32,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            decay_factor: 0.97,
            min_salience: 0.01,
            pinned_boost: 0.8,
            emotional_damping: 0.5,
            default_age_days: 30.0,
            effectiveness_min_surfaced: 3,
        }
    }
}

/// Selection budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Default number of notes surfaced per selection
    pub capacity: usize,
    /// Most-recent notes always included regardless of score
    pub recency_floor: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            recency_floor: 3,
        }
    }
}

/// Archival thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Notes with salience below this are archival candidates
    pub salience_ceiling: f64,
    /// Notes younger than this are never archived
    pub retention_days: i64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            salience_ceiling: 0.1,
            retention_days: 90,
        }
    }
}

/// Consolidation thresholds and cluster shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsolidationConfig {
    /// Notes with salience below this are consolidation candidates
    pub salience_ceiling: f64,
    /// Notes younger than this are left alone
    pub min_age_days: i64,
    /// Shared tags required to join a cluster
    pub min_overlap: usize,
    /// Clusters smaller than this are discarded
    pub min_cluster_size: usize,
    /// Clusters stop accepting members at this size
    pub max_cluster_size: usize,
    /// Salience given to a freshly consolidated note
    pub consolidated_salience: f64,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            salience_ceiling: 0.4,
            min_age_days: 14,
            min_overlap: 1,
            min_cluster_size: 2,
            max_cluster_size: 8,
            consolidated_salience: 0.5,
        }
    }
}

/// Weekly/monthly roll-up shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Number of themes (tags) rendered per period
    pub top_tags: usize,
    /// Source notes listed under each theme
    pub sources_per_tag: usize,
    /// Sources averaged into the record's salience
    pub aggregate_top: usize,
    /// Lower clamp for the aggregate salience
    pub min_salience: f64,
    /// Upper clamp for the aggregate salience
    pub max_salience: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            top_tags: 5,
            sources_per_tag: 3,
            aggregate_top: 5,
            min_salience: 0.3,
            max_salience: 0.9,
        }
    }
}

/// Maintenance cycle scheduling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintenanceConfig {
    /// Minimum spacing between completed cycles
    pub interval_hours: i64,
    /// Run consolidation inside the cycle when a summarizer is configured
    pub consolidate: bool,
    /// How often `watch` re-checks the gate
    pub poll_seconds: u64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            consolidate: false,
            poll_seconds: 300,
        }
    }
}

/// Reinforcement applied to existing notes when a new note shares their tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReinforcementConfig {
    /// Salience added per shared tag
    pub step: f64,
    /// Reinforcement never lifts salience above this
    pub cap: f64,
}

impl Default for ReinforcementConfig {
    fn default() -> Self {
        Self {
            step: 0.05,
            cap: 2.0,
        }
    }
}

/// External summarizer invoked by consolidation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Program that reads a prompt on stdin and writes the merged note to stdout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Extra arguments passed to the program
    pub args: Vec<String>,
    /// Per-cluster time limit
    pub timeout_seconds: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_seconds: 60,
        }
    }
}

fn default_version() -> u32 {
    CONFIG_FORMAT_VERSION
}
