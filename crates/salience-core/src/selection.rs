//! Budget-constrained selection of notes to surface
//!
//! A selection always contains the `recency_floor` most recent notes, fills
//! the remaining capacity by effective score, and returns everything ordered
//! by score. Ties keep input order.

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::{DecayPolicy, SelectionConfig};
use crate::note::NoteEntry;
use crate::scoring::{self, ScoreContext};
use crate::usage::UsageStats;

/// A note chosen by [`select`]
#[derive(Debug, Clone, Serialize)]
pub struct Selected {
    /// Position of the note in the input slice
    pub index: usize,
    pub key: String,
    pub score: f64,
    /// Included through the recency floor rather than by score
    pub recent: bool,
}

/// A note with its effective score
#[derive(Debug, Clone, Serialize)]
pub struct Ranked {
    pub index: usize,
    pub score: f64,
}

/// Score every active note, best first (stable)
pub fn rank(
    notes: &[NoteEntry],
    usage: &UsageStats,
    ctx: &ScoreContext,
    policy: &DecayPolicy,
) -> Vec<Ranked> {
    let mut ranked: Vec<Ranked> = notes
        .iter()
        .enumerate()
        .filter(|(_, note)| !note.archived)
        .map(|(index, note)| Ranked {
            index,
            score: scoring::score(note, usage.get(&note.key()), ctx, policy),
        })
        .collect();
    ranked.sort_by(|a, b| by_score_desc(a.score, a.index, b.score, b.index));
    ranked
}

/// Pick the notes to surface and record one surfacing per selected note.
///
/// Scores are computed against `usage` as it was before this call.
#[tracing::instrument(skip_all, fields(notes = notes.len(), capacity = config.capacity))]
pub fn select(
    notes: &[NoteEntry],
    config: &SelectionConfig,
    usage: &mut UsageStats,
    ctx: &ScoreContext,
    policy: &DecayPolicy,
) -> Vec<Selected> {
    let ranked = rank(notes, usage, ctx, policy);
    if ranked.is_empty() || config.capacity == 0 {
        return Vec::new();
    }

    // Most recent first; missing timestamps sort as oldest
    let mut by_recency: Vec<&Ranked> = ranked.iter().collect();
    by_recency.sort_by(|a, b| {
        notes[b.index]
            .timestamp
            .cmp(&notes[a.index].timestamp)
            .then(a.index.cmp(&b.index))
    });

    let floor = config.recency_floor.min(config.capacity);
    let mut chosen = vec![false; notes.len()];
    let mut selected: Vec<Selected> = Vec::with_capacity(config.capacity);

    for r in by_recency.into_iter().take(floor) {
        chosen[r.index] = true;
        selected.push(Selected {
            index: r.index,
            key: notes[r.index].key(),
            score: r.score,
            recent: true,
        });
    }

    let remaining = config.capacity - selected.len();
    for r in ranked.iter().filter(|r| !chosen[r.index]).take(remaining) {
        selected.push(Selected {
            index: r.index,
            key: notes[r.index].key(),
            score: r.score,
            recent: false,
        });
    }

    selected.sort_by(|a, b| by_score_desc(a.score, a.index, b.score, b.index));

    for s in &selected {
        usage.record_surfaced(&s.key, ctx.now);
    }

    tracing::debug!(selected = selected.len(), floor, "selection complete");
    selected
}

fn by_score_desc(a_score: f64, a_index: usize, b_score: f64, b_index: usize) -> Ordering {
    b_score.total_cmp(&a_score).then(a_index.cmp(&b_index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn note(i: usize, days: i64, salience: f64) -> NoteEntry {
        NoteEntry::new(
            format!("s{}", i),
            format!("Investigated build cache behaviour, round {}", i),
            now() - Duration::days(days),
        )
        .with_salience(salience)
    }

    fn config(capacity: usize, recency_floor: usize) -> SelectionConfig {
        SelectionConfig {
            capacity,
            recency_floor,
        }
    }

    #[test]
    fn test_recency_floor_included_even_with_lowest_scores() {
        // Recent notes carry almost no salience, old ones plenty
        let mut notes: Vec<NoteEntry> = (0..6).map(|i| note(i, 40 + i as i64, 1.5)).collect();
        notes.push(note(6, 0, 0.01));
        notes.push(note(7, 1, 0.01));

        let mut usage = UsageStats::default();
        let ctx = ScoreContext::new(now());
        let picked = select(&notes, &config(4, 2), &mut usage, &ctx, &DecayPolicy::default());

        let indexes: Vec<usize> = picked.iter().map(|s| s.index).collect();
        assert_eq!(picked.len(), 4);
        assert!(indexes.contains(&6));
        assert!(indexes.contains(&7));
        // Re-sorted by score: the recent low scorers come last
        assert_eq!(&indexes[2..], &[6, 7]);
        assert!(picked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_capacity_below_floor_returns_most_recent() {
        let notes: Vec<NoteEntry> = (0..5).map(|i| note(i, i as i64 * 3, 1.0)).collect();
        let mut usage = UsageStats::default();
        let ctx = ScoreContext::new(now());
        let picked = select(&notes, &config(2, 3), &mut usage, &ctx, &DecayPolicy::default());

        let mut indexes: Vec<usize> = picked.iter().map(|s| s.index).collect();
        indexes.sort();
        assert_eq!(indexes, vec![0, 1]);
        assert!(picked.iter().all(|s| s.recent));
    }

    #[test]
    fn test_archived_notes_never_selected() {
        let mut notes: Vec<NoteEntry> = (0..3).map(|i| note(i, i as i64, 0.9)).collect();
        notes[0].archived = true;
        let mut usage = UsageStats::default();
        let ctx = ScoreContext::new(now());
        let picked = select(&notes, &config(10, 3), &mut usage, &ctx, &DecayPolicy::default());
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|s| s.index != 0));
    }

    #[test]
    fn test_one_surfacing_per_call() {
        let notes: Vec<NoteEntry> = (0..3).map(|i| note(i, i as i64, 0.9)).collect();
        let mut usage = UsageStats::default();
        let ctx = ScoreContext::new(now());
        let policy = DecayPolicy::default();

        select(&notes, &config(2, 1), &mut usage, &ctx, &policy);
        select(&notes, &config(2, 1), &mut usage, &ctx, &policy);

        let total: u32 = usage.notes.values().map(|r| r.surfaced).sum();
        assert_eq!(total, 4);
        assert!(usage.notes.values().all(|r| r.surfaced <= 2));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let notes: Vec<NoteEntry> = (0..4)
            .map(|i| {
                let mut n = note(i, 10, 0.5);
                n.text = "Same text everywhere".to_string();
                n.session = format!("tie{}", i);
                n
            })
            .collect();
        let mut usage = UsageStats::default();
        let ctx = ScoreContext::new(now());
        let picked = select(&notes, &config(4, 0), &mut usage, &ctx, &DecayPolicy::default());
        let indexes: Vec<usize> = picked.iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_missing_timestamp_is_least_recent() {
        let mut notes: Vec<NoteEntry> = (0..3).map(|i| note(i, 5 + i as i64, 0.5)).collect();
        notes[0].timestamp = None;
        notes[0].last_referenced = None;
        let mut usage = UsageStats::default();
        let ctx = ScoreContext::new(now());
        let picked = select(&notes, &config(1, 1), &mut usage, &ctx, &DecayPolicy::default());
        assert_eq!(picked[0].index, 1);
    }
}
