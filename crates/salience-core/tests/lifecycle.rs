//! End-to-end lifecycle tests against a real store directory

use std::cell::Cell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::tempdir;

use salience_core::archive::archive;
use salience_core::config::EngineConfig;
use salience_core::consolidation::{consolidate, Summarizer};
use salience_core::error::{Result, SalienceError};
use salience_core::maintenance::{run_cycle, CycleOutcome, MaintenanceState};
use salience_core::note::{NoteEntry, SynthesisLevel, REASON_CONSOLIDATED, REASON_FADED};
use salience_core::selection::select;
use salience_core::scoring::ScoreContext;
use salience_core::store::Store;
use salience_core::synthesis::rollup;

fn now() -> DateTime<Utc> {
    // A Wednesday
    Utc.with_ymd_and_hms(2026, 6, 17, 12, 0, 0).unwrap()
}

fn aged(session: &str, days: i64, salience: f64, tags: &[&str]) -> NoteEntry {
    NoteEntry::new(
        session,
        format!("Notes from session {} about {}", session, tags.join(", ")),
        now() - Duration::days(days),
    )
    .with_salience(salience)
    .with_tags(tags.iter().copied())
    .with_machine("desk")
}

fn store_with(dir: &Path, notes: &[NoteEntry]) -> Store {
    let store = Store::init(dir).unwrap();
    for note in notes {
        store.append_note(&note.machine, note).unwrap();
    }
    store
}

/// Returns a canned response and counts calls
struct FixedSummarizer {
    response: String,
    calls: Cell<usize>,
}

impl FixedSummarizer {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: Cell::new(0),
        }
    }
}

impl Summarizer for FixedSummarizer {
    fn summarize(&self, prompt: &str, _timeout: StdDuration) -> Result<String> {
        assert!(prompt.contains("## Note 1"));
        self.calls.set(self.calls.get() + 1);
        Ok(self.response.clone())
    }
}

struct FailingSummarizer;

impl Summarizer for FailingSummarizer {
    fn summarize(&self, _prompt: &str, timeout: StdDuration) -> Result<String> {
        Err(SalienceError::SummarizerTimeout {
            seconds: timeout.as_secs(),
        })
    }
}

fn leftover_artifacts(dir: &Path) -> Vec<String> {
    walk(dir)
        .into_iter()
        .filter(|name| name.ends_with(".tmp") || name.ends_with(".bak"))
        .collect()
}

fn walk(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            names.extend(walk(&path));
        } else {
            names.push(path.file_name().unwrap().to_string_lossy().into_owned());
        }
    }
    names
}

#[test]
fn test_archival_moves_only_old_faded_notes() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[
            aged("old-low", 120, 0.01, &["ci"]),
            aged("old-high", 120, 0.8, &["ci"]),
            aged("new-low", 1, 0.01, &["ci"]),
        ],
    );

    let report = archive(&store, now());
    assert_eq!(report.archived, 1);
    assert!(report.failures.is_empty());

    let live: Vec<String> = store
        .load_entries()
        .into_iter()
        .map(|n| n.entry.session)
        .collect();
    assert_eq!(live, vec!["old-high", "new-low"]);

    let archived = store.load_archived();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].session, "old-low");
    assert!(archived[0].archived);
    assert_eq!(archived[0].archived_reason.as_deref(), Some(REASON_FADED));
    assert!(leftover_artifacts(dir.path()).is_empty());
}

#[test]
fn test_failed_archive_append_rolls_back_live_file() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[aged("old-low", 120, 0.01, &["ci"]), aged("keep", 2, 0.5, &["ci"])],
    );
    let live = store.source_path("desk");
    fs::write(
        &live,
        format!("{}{{\"text\": \"half-written\n", fs::read_to_string(&live).unwrap()),
    )
    .unwrap();
    let before = fs::read(&live).unwrap();

    // A directory where the archive file should be makes the append fail
    fs::create_dir_all(store.archive_path_for(&live)).unwrap();

    let report = archive(&store, now());
    assert_eq!(report.archived, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(fs::read(&live).unwrap(), before);
    assert!(leftover_artifacts(dir.path()).is_empty());
    assert!(store.load_archived().is_empty());
}

#[test]
fn test_archival_continues_past_a_failing_file() {
    let dir = tempdir().unwrap();
    let mut laptop = aged("laptop-old", 200, 0.01, &[]);
    laptop.machine = "laptop".into();
    let store = store_with(dir.path(), &[aged("desk-old", 200, 0.01, &[]), laptop]);
    fs::create_dir_all(store.archive_path_for(&store.source_path("desk"))).unwrap();

    let report = archive(&store, now());
    assert_eq!(report.archived, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(store.load_archived()[0].session, "laptop-old");
}

#[test]
fn test_consolidating_three_related_notes() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[
            aged("a", 30, 0.2, &["build", "ci"]),
            aged("b", 25, 0.25, &["ci"]),
            aged("c", 20, 0.3, &["ci", "flaky"]),
            aged("fresh", 2, 0.2, &["ci"]),
        ],
    );
    let summarizer = FixedSummarizer::new("CI was flaky all month.\n---\ntags: ci\nweight: 0.4\n");

    let report = consolidate(&store, &summarizer, now());
    assert_eq!(report.consolidated, 1);
    assert_eq!(report.archived, 3);
    assert_eq!(summarizer.calls.get(), 1);

    let live = store.load_entries();
    let merged: Vec<&NoteEntry> = live
        .iter()
        .map(|n| &n.entry)
        .filter(|e| e.is_consolidated())
        .collect();
    assert_eq!(merged.len(), 1);
    let sources: HashSet<&str> = merged[0]
        .consolidated_from
        .as_ref()
        .unwrap()
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(sources, HashSet::from(["a", "b", "c"]));
    assert_eq!(merged[0].novelty_score, 0.0);
    assert_eq!(merged[0].salience, 0.5);
    assert_eq!(merged[0].emotional_weight, 0.4);
    assert_eq!(merged[0].topic_tags, vec!["ci"]);

    // Sources stay in their file, marked archived
    let content = fs::read_to_string(store.source_path("desk")).unwrap();
    let marked: Vec<NoteEntry> = content
        .lines()
        .map(|l| serde_json::from_str::<NoteEntry>(l).unwrap())
        .filter(|e| e.archived)
        .collect();
    assert_eq!(marked.len(), 3);
    assert!(marked
        .iter()
        .all(|e| e.archived_reason.as_deref() == Some(REASON_CONSOLIDATED)));
    assert!(live.iter().any(|n| n.entry.session == "fresh"));

    // Nothing left to merge on a second pass
    let again = consolidate(&store, &summarizer, now());
    assert_eq!(again.consolidated, 0);
}

#[test]
fn test_summarizer_failure_leaves_store_untouched() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[aged("a", 30, 0.2, &["ci"]), aged("b", 30, 0.2, &["ci"])],
    );
    let live = store.source_path("desk");
    let before = fs::read(&live).unwrap();

    let report = consolidate(&store, &FailingSummarizer, now());
    assert_eq!(report.consolidated, 0);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(fs::read(&live).unwrap(), before);
    assert!(!store.source_path("consolidated").exists());
    assert!(leftover_artifacts(dir.path()).is_empty());
}

#[test]
fn test_rollups_are_idempotent() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[
            aged("w1", 16, 0.6, &["ci"]),
            aged("w2", 9, 0.7, &["rust"]),
            aged("w3", 45, 0.4, &["docs"]),
        ],
    );
    let entries: Vec<NoteEntry> = store.load_entries().into_iter().map(|n| n.entry).collect();

    let first = rollup(&store, &entries, SynthesisLevel::Weekly, now()).unwrap();
    assert_eq!(first.count(), 3);
    let second = rollup(&store, &entries, SynthesisLevel::Weekly, now()).unwrap();
    assert_eq!(second.count(), 0);
    assert_eq!(second.existing, 3);
    assert_eq!(store.load_synthesis(SynthesisLevel::Weekly).len(), 3);

    let entries: Vec<NoteEntry> = store.load_entries().into_iter().map(|n| n.entry).collect();
    let monthly = rollup(&store, &entries, SynthesisLevel::Monthly, now()).unwrap();
    // April (week of 2026-04-27) is closed, June is still open
    assert_eq!(monthly.count(), 1);
    let again = rollup(&store, &entries, SynthesisLevel::Monthly, now()).unwrap();
    assert_eq!(again.count(), 0);
}

#[test]
fn test_selection_always_includes_recent_notes() {
    let mut notes: Vec<NoteEntry> = (0..8)
        .map(|i| aged(&format!("old{}", i), 20 + i, 1.8, &["x"]))
        .collect();
    notes.push(aged("newest", 0, 0.01, &[]));
    notes.push(aged("newer", 1, 0.01, &[]));
    notes.push(aged("new", 2, 0.01, &[]));

    let dir = tempdir().unwrap();
    let store = store_with(dir.path(), &notes);
    let loaded: Vec<NoteEntry> = store.load_entries().into_iter().map(|n| n.entry).collect();

    let mut usage = store.load_usage();
    let mut config = store.config().selection.clone();
    config.capacity = 5;
    config.recency_floor = 3;
    let picked = select(
        &loaded,
        &config,
        &mut usage,
        &ScoreContext::new(now()),
        &store.config().decay,
    );
    store.save_usage(&usage).unwrap();

    let sessions: HashSet<&str> = picked
        .iter()
        .map(|s| loaded[s.index].session.as_str())
        .collect();
    assert_eq!(picked.len(), 5);
    for recent in ["newest", "newer", "new"] {
        assert!(sessions.contains(recent), "{} missing", recent);
    }
    assert_eq!(
        store
            .load_usage()
            .notes
            .values()
            .map(|r| r.surfaced)
            .sum::<u32>(),
        5
    );
}

#[test]
fn test_maintenance_cycle_runs_all_steps() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[
            aged("faded", 150, 0.01, &["old"]),
            aged("recent", 10, 0.6, &["ci"]),
        ],
    );

    let CycleOutcome::Ran(state) = run_cycle(&store, None, now(), false) else {
        panic!("first cycle should run");
    };
    assert_eq!(state.archived, 1);
    assert_eq!(state.weekly, 1);
    assert_eq!(state.consolidated, 0);
    assert!(state.errors.is_empty());
    assert_eq!(MaintenanceState::load(&store.maintenance_path()), state);

    assert!(matches!(
        run_cycle(&store, None, now() + Duration::hours(3), false),
        CycleOutcome::Skipped { .. }
    ));
}

#[test]
fn test_maintenance_records_step_errors_and_continues() {
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[aged("faded", 150, 0.01, &[]), aged("recent", 10, 0.6, &["ci"])],
    );
    fs::create_dir_all(store.archive_path_for(&store.source_path("desk"))).unwrap();

    let CycleOutcome::Ran(state) = run_cycle(&store, None, now(), true) else {
        panic!("forced cycle should run");
    };
    assert_eq!(state.archived, 0);
    assert_eq!(state.errors.len(), 1);
    assert!(state.weekly >= 1);
    assert!(store.maintenance_path().exists());
}

#[test]
fn test_maintenance_consolidates_when_enabled() {
    let dir = tempdir().unwrap();
    store_with(
        dir.path(),
        &[
            aged("a", 30, 0.2, &["deploy", "infra"]),
            aged("b", 25, 0.2, &["deploy"]),
        ],
    );
    let mut config = EngineConfig::default();
    config.maintenance.consolidate = true;
    let store = Store::with_config(dir.path(), config).unwrap();
    let summarizer = FixedSummarizer::new("Deploys moved to the new pipeline.");

    let CycleOutcome::Ran(state) = run_cycle(&store, Some(&summarizer), now(), false) else {
        panic!("first cycle should run");
    };
    assert_eq!(state.consolidated, 1);
    assert_eq!(summarizer.calls.get(), 1);

    // Without a summarizer the step is skipped, not failed
    let CycleOutcome::Ran(state) = run_cycle(&store, None, now(), true) else {
        panic!("forced cycle should run");
    };
    assert_eq!(state.consolidated, 0);
    assert!(state.errors.is_empty());
}

#[test]
fn test_monthly_rollup_includes_week_spanning_month_end() {
    let at = |m: u32, d: u32| Utc.with_ymd_and_hms(2026, m, d, 10, 0, 0).unwrap();
    let dir = tempdir().unwrap();
    let store = store_with(
        dir.path(),
        &[
            NoteEntry::new("ci", "Stabilized the ci runners", at(6, 23))
                .with_salience(0.6)
                .with_tags(["ci"])
                .with_machine("desk"),
            NoteEntry::new("docs", "Rewrote the docs landing page", at(6, 30))
                .with_salience(0.6)
                .with_tags(["docs"])
                .with_machine("desk"),
        ],
    );

    for day in [at(7, 2), at(7, 8), at(8, 3)] {
        let CycleOutcome::Ran(state) = run_cycle(&store, None, day, true) else {
            panic!("forced cycle should run");
        };
        assert!(state.errors.is_empty());
    }

    let weekly_starts: Vec<String> = store
        .load_synthesis(SynthesisLevel::Weekly)
        .iter()
        .filter_map(|e| e.period_start)
        .map(|d| d.to_string())
        .collect();
    assert_eq!(weekly_starts, vec!["2026-06-22", "2026-06-29"]);

    let monthly = store.load_synthesis(SynthesisLevel::Monthly);
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].period_start.map(|d| d.to_string()).as_deref(), Some("2026-06-01"));
    assert!(monthly[0].topic_tags.contains(&"ci".to_string()));
    assert!(monthly[0].topic_tags.contains(&"docs".to_string()));
    assert!(monthly[0].text.contains("week of 2026-06-29"));
}
