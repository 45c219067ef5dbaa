//! Ingestion of new notes and reinforcement of the notes they touch
//!
//! Adding a note bumps the salience of every active primary note that shares
//! a tag with it, which is what keeps a recurring topic from fading. A new
//! note without a novelty score gets one from its tag overlap with the
//! corpus.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ReinforcementConfig;
use crate::error::Result;
use crate::note::NoteEntry;
use crate::store::paths::DEFAULT_SOURCE;
use crate::store::{LoadedNote, Store};
use crate::usage::UsageStats;

/// Outcome of adding a note
#[derive(Debug, Clone, Default, Serialize)]
pub struct AddReport {
    pub key: String,
    /// File the note was appended to
    pub path: PathBuf,
    pub novelty_score: f64,
    /// Existing notes reinforced by the new one
    pub reinforced: usize,
    /// Rewrites that failed; the note itself was still added
    pub errors: Vec<String>,
}

/// Jaccard similarity of two tag sets (0 when both are empty)
pub fn tag_jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// `1 - max tag-Jaccard` against the corpus; a note without tags is fully novel
pub fn novelty<'a>(note: &NoteEntry, corpus: impl IntoIterator<Item = &'a NoteEntry>) -> f64 {
    let tags = note.tag_set();
    if tags.is_empty() {
        return 1.0;
    }
    let max = corpus
        .into_iter()
        .filter(|other| !other.archived && !other.is_synthesis())
        .map(|other| tag_jaccard(&tags, &other.tag_set()))
        .fold(0.0, f64::max);
    1.0 - max
}

/// The reinforced version of `existing`, or `None` if it shares no tag with `tags`
pub fn reinforced(
    existing: &NoteEntry,
    tags: &BTreeSet<String>,
    now: DateTime<Utc>,
    config: &ReinforcementConfig,
) -> Option<NoteEntry> {
    if existing.archived || existing.is_synthesis() {
        return None;
    }
    let overlap = existing.tag_overlap(tags);
    if overlap == 0 {
        return None;
    }

    let mut updated = existing.clone();
    let bumped = existing.salience + config.step * overlap as f64;
    // Never push a note down because it already sits above the cap
    updated.salience = bumped.min(config.cap).max(existing.salience);
    updated.reference_count = existing.reference_count.saturating_add(1);
    updated.last_referenced = Some(now);
    Some(updated)
}

/// Apply reinforcement for a note with `tags` across the loaded corpus.
///
/// Returns the keys reinforced; rewrite failures are collected in `errors`
/// and leave that file untouched.
pub fn reinforce(
    store: &Store,
    corpus: &[LoadedNote],
    tags: &BTreeSet<String>,
    now: DateTime<Utc>,
    usage: &mut UsageStats,
    errors: &mut Vec<String>,
) -> Vec<String> {
    let config = &store.config().reinforcement;
    let mut by_file: HashMap<PathBuf, HashMap<String, NoteEntry>> = HashMap::new();

    for loaded in corpus {
        if let Some(updated) = reinforced(&loaded.entry, tags, now, config) {
            by_file
                .entry(loaded.origin.clone())
                .or_default()
                .insert(loaded.entry.key(), updated);
        }
    }

    let mut keys = Vec::new();
    for (path, updates) in by_file {
        match store.update_records(&path, &updates) {
            Ok(_) => {
                for key in updates.into_keys() {
                    usage.record_reference(&key, now);
                    keys.push(key);
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "reinforcement rewrite failed");
                errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    keys.sort();
    keys
}

/// Append a new note and reinforce the notes it overlaps.
///
/// A zero novelty score is treated as unset and computed from the corpus.
#[tracing::instrument(skip(store, entry), fields(session = %entry.session))]
pub fn add_note(store: &Store, mut entry: NoteEntry, now: DateTime<Utc>) -> Result<AddReport> {
    entry.normalize(store.config().decay.min_salience);
    if entry.timestamp.is_none() {
        entry.timestamp = Some(now);
        entry.last_referenced = Some(now);
    }

    let corpus = store.load_entries();
    if entry.novelty_score == 0.0 {
        entry.novelty_score = novelty(&entry, corpus.iter().map(|n| &n.entry));
    }

    let source = if entry.machine.is_empty() {
        DEFAULT_SOURCE.to_string()
    } else {
        entry.machine.clone()
    };
    let path = store.append_note(&source, &entry)?;

    let mut errors = Vec::new();
    let mut usage = store.load_usage();
    let keys = reinforce(store, &corpus, &entry.tag_set(), now, &mut usage, &mut errors);
    if !keys.is_empty() {
        if let Err(e) = store.save_usage(&usage) {
            tracing::warn!(error = %e, "failed to save usage statistics");
            errors.push(e.to_string());
        }
    }

    tracing::info!(key = %entry.key(), reinforced = keys.len(), "added note");

    Ok(AddReport {
        key: entry.key(),
        path,
        novelty_score: entry.novelty_score,
        reinforced: keys.len(),
        errors,
    })
}
