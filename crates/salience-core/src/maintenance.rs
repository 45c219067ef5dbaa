//! Time-gated maintenance cycle
//!
//! A cycle runs archival, optional consolidation, then weekly and monthly
//! roll-ups, reloading the store between steps that change it. The finish
//! time and counts go to `state/maintenance.json`; a new cycle only starts
//! once `interval_hours` have passed since the last one. A failing step is
//! recorded and the remaining steps still run.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::archive;
use crate::config::MaintenanceConfig;
use crate::consolidation::{self, Summarizer};
use crate::error::Result;
use crate::note::{NoteEntry, SynthesisLevel};
use crate::store::{io, Store};
use crate::synthesis;
use crate::trace_time;

/// Persisted result of the last completed cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceState {
    pub last_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: usize,
    #[serde(default)]
    pub consolidated: usize,
    #[serde(default)]
    pub weekly: usize,
    #[serde(default)]
    pub monthly: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl MaintenanceState {
    /// Load the gate; missing or corrupt state reads as never run
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read maintenance state");
                return Self::default();
            }
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corrupt maintenance state, treating as never run");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        io::write_atomic(path, content.as_bytes())
    }

    /// When the next cycle may start
    pub fn next_due(&self, config: &MaintenanceConfig) -> Option<DateTime<Utc>> {
        self.last_run
            .map(|last| last + Duration::hours(config.interval_hours))
    }

    /// Whether more than the interval has passed since the last cycle
    pub fn is_due(&self, now: DateTime<Utc>, config: &MaintenanceConfig) -> bool {
        self.next_due(config).is_none_or(|due| now > due)
    }
}

/// What a call to [`run_cycle`] did
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CycleOutcome {
    /// The gate was closed
    Skipped { next_due: Option<DateTime<Utc>> },
    /// A cycle ran; this is the state that was persisted
    Ran(MaintenanceState),
}

fn active_entries(store: &Store) -> Vec<NoteEntry> {
    store.load_entries().into_iter().map(|n| n.entry).collect()
}

/// Run one maintenance cycle if the gate allows it (or `force` is set).
///
/// Consolidation runs only when enabled in the config and a summarizer is
/// supplied. Never fails: step errors are recorded in the persisted state.
#[tracing::instrument(skip(store, summarizer), fields(root = %store.root().display()))]
pub fn run_cycle(
    store: &Store,
    summarizer: Option<&dyn Summarizer>,
    now: DateTime<Utc>,
    force: bool,
) -> CycleOutcome {
    let config = store.config();
    let state_path = store.maintenance_path();
    let previous = MaintenanceState::load(&state_path);

    if !force && !previous.is_due(now, &config.maintenance) {
        let next_due = previous.next_due(&config.maintenance);
        tracing::debug!(?next_due, "maintenance not due");
        return CycleOutcome::Skipped { next_due };
    }

    let start = Instant::now();
    let mut state = MaintenanceState {
        last_run: Some(now),
        ..Default::default()
    };

    let report = archive::archive(store, now);
    state.archived = report.archived;
    state.errors.extend(
        report
            .failures
            .iter()
            .map(|f| format!("archive {}: {}", f.path.display(), f.error)),
    );

    let mut entries = active_entries(store);

    match summarizer {
        Some(summarizer) if config.maintenance.consolidate => {
            let report = consolidation::consolidate(store, summarizer, now);
            state.consolidated = report.consolidated;
            state.errors.extend(
                report
                    .skipped
                    .iter()
                    .map(|s| format!("consolidate {}: {}", s.sessions.join(","), s.error)),
            );
            if report.consolidated > 0 {
                entries = active_entries(store);
            }
        }
        None if config.maintenance.consolidate => {
            tracing::warn!("consolidation enabled but no summarizer configured");
        }
        _ => {}
    }

    match synthesis::rollup(store, &entries, SynthesisLevel::Weekly, now) {
        Ok(report) => {
            state.weekly = report.count();
            if state.weekly > 0 {
                entries = active_entries(store);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "weekly roll-up failed");
            state.errors.push(format!("weekly: {}", e));
        }
    }

    match synthesis::rollup(store, &entries, SynthesisLevel::Monthly, now) {
        Ok(report) => state.monthly = report.count(),
        Err(e) => {
            tracing::warn!(error = %e, "monthly roll-up failed");
            state.errors.push(format!("monthly: {}", e));
        }
    }

    if let Err(e) = state.save(&state_path) {
        tracing::error!(error = %e, "failed to persist maintenance state");
        state.errors.push(format!("state: {}", e));
    }

    tracing::info!(
        archived = state.archived,
        consolidated = state.consolidated,
        weekly = state.weekly,
        monthly = state.monthly,
        errors = state.errors.len(),
        "maintenance cycle complete"
    );
    trace_time!(start, "maintenance_cycle");
    CycleOutcome::Ran(state)
}

/// Re-check the gate every `poll_seconds` until `stop` is set
pub fn watch(
    store: &Store,
    summarizer: Option<&dyn Summarizer>,
    stop: &AtomicBool,
    mut on_cycle: impl FnMut(&CycleOutcome),
) {
    let poll = StdDuration::from_secs(store.config().maintenance.poll_seconds);
    let tick = StdDuration::from_millis(200).min(poll);

    while !stop.load(Ordering::SeqCst) {
        let outcome = run_cycle(store, summarizer, Utc::now(), false);
        on_cycle(&outcome);

        let slept = Instant::now();
        while slept.elapsed() < poll && !stop.load(Ordering::SeqCst) {
            thread::sleep(tick);
        }
    }
    tracing::debug!("watch stopped");
}
