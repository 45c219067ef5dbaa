//! Usage statistics: how often each note was surfaced and later referenced
//!
//! Persisted as `state/usage.json`. The selector records surfacings; the
//! component that detects later references (outside this crate) records
//! references through [`UsageStats::record_reference`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::io;

/// Counters for a single note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Selections that included the note
    #[serde(default)]
    pub surfaced: u32,
    /// Later references to the note after it was surfaced
    #[serde(default)]
    pub referenced: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_surfaced: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_referenced: Option<DateTime<Utc>>,
}

impl UsageRecord {
    /// Share of surfacings that led to a reference, once `min_surfaced` is reached
    pub fn yield_ratio(&self, min_surfaced: u32) -> Option<f64> {
        if self.surfaced < min_surfaced.max(1) {
            return None;
        }
        Some((self.referenced as f64 / self.surfaced as f64).min(1.0))
    }
}

/// Note key → usage counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default)]
    pub notes: BTreeMap<String, UsageRecord>,
}

impl UsageStats {
    /// Load statistics; a missing or corrupt file yields empty statistics
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read usage statistics");
                return Self::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corrupt usage statistics, starting fresh");
            Self::default()
        })
    }

    /// Persist statistics atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        io::write_atomic(path, content.as_bytes())
    }

    /// Counters for a note, if any were recorded
    pub fn get(&self, key: &str) -> Option<&UsageRecord> {
        self.notes.get(key)
    }

    /// Record that a note was surfaced by a selection
    pub fn record_surfaced(&mut self, key: &str, now: DateTime<Utc>) {
        let record = self.notes.entry(key.to_string()).or_default();
        record.surfaced = record.surfaced.saturating_add(1);
        record.last_surfaced = Some(now);
    }

    /// Record that a note was referenced after being surfaced
    pub fn record_reference(&mut self, key: &str, now: DateTime<Utc>) {
        let record = self.notes.entry(key.to_string()).or_default();
        record.referenced = record.referenced.saturating_add(1);
        record.last_referenced = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_yield_ratio_requires_minimum_surfacings() {
        let record = UsageRecord {
            surfaced: 2,
            referenced: 2,
            ..Default::default()
        };
        assert_eq!(record.yield_ratio(3), None);

        let record = UsageRecord {
            surfaced: 4,
            referenced: 1,
            ..Default::default()
        };
        assert_eq!(record.yield_ratio(3), Some(0.25));
    }

    #[test]
    fn test_record_and_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("usage.json");
        let now = Utc::now();

        let mut stats = UsageStats::default();
        stats.record_surfaced("abc", now);
        stats.record_surfaced("abc", now);
        stats.record_reference("abc", now);
        stats.save(&path).unwrap();

        let loaded = UsageStats::load(&path);
        let record = loaded.get("abc").unwrap();
        assert_eq!(record.surfaced, 2);
        assert_eq!(record.referenced, 1);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("usage.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(UsageStats::load(&path), UsageStats::default());
    }
}
