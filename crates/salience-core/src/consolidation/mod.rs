//! Consolidation of fading, related notes
//!
//! Weak notes that have been around for a while are grouped by shared tags,
//! each group is merged by the external summarizer into one denser note, and
//! the sources are archived in place. A cluster either commits completely
//! (new note appended, every source marked) or leaves no trace.

pub mod cluster;
pub mod prompt;
pub mod summarizer;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::config::EngineConfig;
use crate::error::{Result, SalienceError};
use crate::note::{NoteEntry, REASON_CONSOLIDATED};
use crate::store::io::SnapshotSet;
use crate::store::paths::CONSOLIDATED_SOURCE;
use crate::store::{LoadedNote, Store};
use crate::trace_time;

pub use cluster::Cluster;
pub use prompt::{build_prompt, parse_response, SummaryResponse};
pub use summarizer::{CommandSummarizer, Summarizer};

/// A cluster that was left untouched
#[derive(Debug, Clone, Serialize)]
pub struct SkippedCluster {
    /// Source sessions of the cluster
    pub sessions: Vec<String>,
    pub error: String,
}

/// Outcome of a consolidation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsolidationReport {
    /// Notes that qualified as candidates
    pub candidates: usize,
    /// Clusters large enough to merge
    pub clusters: usize,
    /// Consolidated notes written
    pub consolidated: usize,
    /// Source notes archived into them
    pub archived: usize,
    pub skipped: Vec<SkippedCluster>,
}

/// Whether a note may be merged into a consolidated note
pub fn is_candidate(note: &NoteEntry, now: DateTime<Utc>, config: &EngineConfig) -> bool {
    if note.archived || note.pinned || note.is_consolidated() || note.is_synthesis() {
        return false;
    }
    let age = note.age_days(now, config.decay.default_age_days);
    note.salience < config.consolidation.salience_ceiling
        && age >= config.consolidation.min_age_days as f64
}

/// Candidates weakest first, and the clusters they form
pub fn plan<'a>(
    corpus: &'a [LoadedNote],
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> (Vec<&'a LoadedNote>, Vec<Cluster>) {
    let mut candidates: Vec<&LoadedNote> = corpus
        .iter()
        .filter(|n| is_candidate(&n.entry, now, config))
        .collect();
    candidates.sort_by(|a, b| a.entry.salience.total_cmp(&b.entry.salience));

    let tag_sets: Vec<BTreeSet<String>> = candidates.iter().map(|n| n.entry.tag_set()).collect();
    let clusters = cluster::build_clusters(&tag_sets, &config.consolidation);
    (candidates, clusters)
}

/// Consolidate every eligible cluster in the store
#[tracing::instrument(skip(store, summarizer), fields(root = %store.root().display()))]
pub fn consolidate(
    store: &Store,
    summarizer: &dyn Summarizer,
    now: DateTime<Utc>,
) -> ConsolidationReport {
    let start = Instant::now();
    let config = store.config();
    let timeout = Duration::from_secs(config.summarizer.timeout_seconds);

    let corpus = store.load_entries();
    let (candidates, clusters) = plan(&corpus, now, config);
    let mut report = ConsolidationReport {
        candidates: candidates.len(),
        clusters: clusters.len(),
        ..Default::default()
    };

    for cluster in &clusters {
        let mut members: Vec<&LoadedNote> = cluster.members.iter().map(|&i| candidates[i]).collect();
        members.sort_by_key(|n| n.entry.timestamp);
        let sessions = source_sessions(&members);

        match merge_cluster(store, summarizer, &members, cluster, now, timeout) {
            Ok(()) => {
                report.consolidated += 1;
                report.archived += members.len();
                tracing::info!(sources = members.len(), "consolidated cluster");
            }
            Err(e) => {
                tracing::warn!(error = %e, sessions = ?sessions, "skipped cluster");
                report.skipped.push(SkippedCluster {
                    sessions,
                    error: e.to_string(),
                });
            }
        }
    }

    trace_time!(start, "consolidate", consolidated = report.consolidated);
    report
}

fn merge_cluster(
    store: &Store,
    summarizer: &dyn Summarizer,
    members: &[&LoadedNote],
    cluster: &Cluster,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<()> {
    let entries: Vec<&NoteEntry> = members.iter().map(|n| &n.entry).collect();
    let raw = summarizer.summarize(&build_prompt(&entries), timeout)?;
    let response = parse_response(&raw)?;
    let note = consolidated_note(&response, members, cluster, now, store.config());
    commit(store, &note, members)
}

/// The merged note for a cluster
pub fn consolidated_note(
    response: &SummaryResponse,
    members: &[&LoadedNote],
    cluster: &Cluster,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> NoteEntry {
    let tags: Vec<String> = if response.tags.is_empty() {
        cluster.tags.iter().cloned().collect()
    } else {
        response.tags.clone()
    };

    let mut seen = BTreeSet::new();
    let action_items = members
        .iter()
        .flat_map(|n| n.entry.action_items.iter().cloned())
        .filter(|item| seen.insert(item.clone()))
        .collect();

    let mut note = NoteEntry::new(
        format!("consolidated-{}", Ulid::new().to_string().to_lowercase()),
        response.body.clone(),
        now,
    )
    .with_tags(tags)
    .with_machine(CONSOLIDATED_SOURCE)
    .with_salience(config.consolidation.consolidated_salience);
    note.emotional_weight = response.weight;
    note.novelty_score = 0.0;
    note.action_items = action_items;
    note.consolidated_from = Some(source_sessions(members));
    note
}

/// Append `note` and mark every source archived, all or nothing
fn commit(store: &Store, note: &NoteEntry, members: &[&LoadedNote]) -> Result<()> {
    let mut by_file: HashMap<PathBuf, HashMap<String, NoteEntry>> = HashMap::new();
    for member in members {
        let mut archived = member.entry.clone();
        archived.archived = true;
        archived.archived_reason = Some(REASON_CONSOLIDATED.to_string());
        by_file
            .entry(member.origin.clone())
            .or_default()
            .insert(member.entry.key(), archived);
    }

    let mut snapshots = SnapshotSet::new();
    let consolidated_path = store.source_path(CONSOLIDATED_SOURCE);
    let result = (|| -> Result<()> {
        snapshots.capture(&consolidated_path)?;
        for path in by_file.keys() {
            snapshots.capture(path)?;
        }

        store.append_note(CONSOLIDATED_SOURCE, note)?;
        for (path, updates) in &by_file {
            let replaced = store.update_records(path, updates)?;
            if replaced < updates.len() {
                return Err(SalienceError::io_operation(
                    "mark sources in",
                    path.display(),
                    format!("found {} of {} source notes", replaced, updates.len()),
                ));
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => snapshots.commit(),
        Err(e) => {
            if let Err(restore_err) = snapshots.restore() {
                tracing::error!(error = %restore_err, "consolidation rollback incomplete");
            }
            Err(e)
        }
    }
}

/// Non-empty source sessions, deduplicated in member order
fn source_sessions(members: &[&LoadedNote]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    members
        .iter()
        .map(|n| n.entry.session.clone())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn loaded(session: &str, days: i64, salience: f64, tags: &[&str]) -> LoadedNote {
        LoadedNote {
            entry: NoteEntry::new(session, "text", now() - ChronoDuration::days(days))
                .with_salience(salience)
                .with_tags(tags.iter().copied()),
            origin: PathBuf::from("notes/desk.jsonl"),
        }
    }

    #[test]
    fn test_candidate_filters() {
        let config = EngineConfig::default();
        assert!(is_candidate(&loaded("a", 20, 0.2, &[]).entry, now(), &config));
        assert!(!is_candidate(&loaded("a", 5, 0.2, &[]).entry, now(), &config));
        assert!(!is_candidate(&loaded("a", 20, 0.5, &[]).entry, now(), &config));

        let mut merged = loaded("a", 20, 0.2, &[]).entry;
        merged.consolidated_from = Some(vec!["x".into()]);
        assert!(!is_candidate(&merged, now(), &config));

        let mut pinned = loaded("a", 20, 0.2, &[]).entry;
        pinned.pinned = true;
        assert!(!is_candidate(&pinned, now(), &config));
    }

    #[test]
    fn test_plan_orders_weakest_first() {
        let config = EngineConfig::default();
        let corpus = vec![
            loaded("a", 20, 0.3, &["ci"]),
            loaded("b", 20, 0.1, &["ci"]),
            loaded("c", 20, 0.9, &["ci"]),
        ];
        let (candidates, clusters) = plan(&corpus, now(), &config);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].entry.session, "b");
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec![0, 1]);
    }

    #[test]
    fn test_consolidated_note_falls_back_to_cluster_tags() {
        let config = EngineConfig::default();
        let a = loaded("a", 20, 0.2, &["ci", "build"]);
        let mut b = loaded("b", 20, 0.2, &["ci"]);
        b.entry.action_items = vec!["fix flaky test".into()];
        let cluster = Cluster {
            tags: ["build", "ci"].iter().map(|s| s.to_string()).collect(),
            members: vec![0, 1],
        };
        let response = SummaryResponse {
            body: "merged".into(),
            tags: Vec::new(),
            weight: 0.7,
        };

        let note = consolidated_note(&response, &[&a, &b], &cluster, now(), &config);
        assert_eq!(note.topic_tags, vec!["build", "ci"]);
        assert_eq!(note.salience, config.consolidation.consolidated_salience);
        assert_eq!(note.novelty_score, 0.0);
        assert_eq!(note.emotional_weight, 0.7);
        assert_eq!(note.action_items, vec!["fix flaky test"]);
        assert_eq!(note.consolidated_from, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(note.session.starts_with("consolidated-"));
    }
}
