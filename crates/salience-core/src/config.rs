//! Engine configuration for salience
//!
//! Configuration is stored in `config.toml` at the store root. Every field
//! has a default, so a missing or partial file is valid; out-of-range
//! constants are rejected by [`EngineConfig::validate`].

pub mod types;

use std::fs;
use std::path::Path;

use crate::bail_config;
use crate::error::{Result, SalienceError};

pub use types::{
    ArchiveConfig, ConsolidationConfig, DecayPolicy, EngineConfig, MaintenanceConfig,
    ReinforcementConfig, SelectionConfig, SummarizerConfig, SynthesisConfig,
    CONFIG_FORMAT_VERSION,
};

impl EngineConfig {
    /// Load configuration from a file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: EngineConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration if the file exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SalienceError::Other(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject constants that would break the engine's invariants
    pub fn validate(&self) -> Result<()> {
        let decay = &self.decay;
        if !(decay.decay_factor > 0.0 && decay.decay_factor < 1.0) {
            bail_config!("decay.decay_factor", "must be in (0, 1)");
        }
        if !(decay.min_salience > 0.0) {
            bail_config!("decay.min_salience", "must be positive");
        }
        if decay.pinned_boost < 0.0 {
            bail_config!("decay.pinned_boost", "must not be negative");
        }
        if !(0.0..1.0).contains(&decay.emotional_damping) {
            bail_config!("decay.emotional_damping", "must be in [0, 1)");
        }
        if decay.default_age_days < 0.0 {
            bail_config!("decay.default_age_days", "must not be negative");
        }

        if self.selection.capacity == 0 {
            bail_config!("selection.capacity", "must be at least 1");
        }

        if self.archive.salience_ceiling <= decay.min_salience {
            bail_config!(
                "archive.salience_ceiling",
                "must be above decay.min_salience"
            );
        }
        if self.archive.retention_days < 0 {
            bail_config!("archive.retention_days", "must not be negative");
        }

        let consolidation = &self.consolidation;
        if consolidation.salience_ceiling <= self.archive.salience_ceiling {
            bail_config!(
                "consolidation.salience_ceiling",
                "must be above archive.salience_ceiling"
            );
        }
        if consolidation.min_overlap == 0 {
            bail_config!("consolidation.min_overlap", "must be at least 1");
        }
        if consolidation.min_cluster_size < 2 {
            bail_config!("consolidation.min_cluster_size", "must be at least 2");
        }
        if consolidation.max_cluster_size < consolidation.min_cluster_size {
            bail_config!(
                "consolidation.max_cluster_size",
                "must not be below min_cluster_size"
            );
        }
        if consolidation.consolidated_salience < decay.min_salience {
            bail_config!(
                "consolidation.consolidated_salience",
                "must not be below decay.min_salience"
            );
        }

        let synthesis = &self.synthesis;
        if synthesis.top_tags == 0 || synthesis.sources_per_tag == 0 || synthesis.aggregate_top == 0
        {
            bail_config!("synthesis", "top_tags, sources_per_tag and aggregate_top must be positive");
        }
        if synthesis.min_salience > synthesis.max_salience {
            bail_config!("synthesis.min_salience", "must not exceed max_salience");
        }

        if self.maintenance.interval_hours < 0 {
            bail_config!("maintenance.interval_hours", "must not be negative");
        }
        if self.maintenance.poll_seconds == 0 {
            bail_config!("maintenance.poll_seconds", "must be at least 1");
        }

        if self.reinforcement.step < 0.0 || self.reinforcement.cap < decay.min_salience {
            bail_config!(
                "reinforcement",
                "step must not be negative and cap must be at least decay.min_salience"
            );
        }

        if self.summarizer.timeout_seconds == 0 {
            bail_config!("summarizer.timeout_seconds", "must be at least 1");
        }

        Ok(())
    }
}
