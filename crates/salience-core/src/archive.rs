//! Archival of faded notes
//!
//! Eligible notes are moved, never copied, from `notes/<name>.jsonl` to
//! `archive/<name>.jsonl`. Each live file is handled on its own: both files
//! are snapshotted, the live file is rewritten atomically, the archive is
//! appended, and any failure restores both snapshots so every note ends up
//! in exactly one of the two files.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::note::{NoteEntry, REASON_FADED};
use crate::store::io::{self, FileSnapshot};
use crate::store::{RecordFile, RecordLine, Store};
use crate::trace_time;

/// A per-file failure, reported instead of aborting the run
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of an archival run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArchiveReport {
    /// Notes moved to the archive
    pub archived: usize,
    /// Live files rewritten
    pub files: usize,
    pub failures: Vec<FileFailure>,
}

/// Whether a note should move to the archive.
///
/// Uses the persisted salience and the age since the note's event time;
/// pinned notes and roll-ups are never archived.
pub fn is_archivable(note: &NoteEntry, now: DateTime<Utc>, config: &EngineConfig) -> bool {
    if note.archived || note.pinned || note.is_synthesis() {
        return false;
    }
    let age = note.age_days(now, config.decay.default_age_days);
    note.salience < config.archive.salience_ceiling && age > config.archive.retention_days as f64
}

/// Archive every eligible note in the store's live files
#[tracing::instrument(skip(store), fields(root = %store.root().display()))]
pub fn archive(store: &Store, now: DateTime<Utc>) -> ArchiveReport {
    let start = Instant::now();
    let mut report = ArchiveReport::default();

    for live in store.source_files() {
        let file = store.read_records(&live);
        let archive_path = store.archive_path_for(&live);

        match archive_file(&file, &archive_path, now, store.config()) {
            Ok(0) => {}
            Ok(moved) => {
                tracing::info!(path = %live.display(), moved, "archived notes");
                report.archived += moved;
                report.files += 1;
            }
            Err(e) => {
                tracing::warn!(path = %live.display(), error = %e, "archival rolled back");
                report.failures.push(FileFailure {
                    path: live.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    trace_time!(start, "archive", archived = report.archived);
    report
}

/// Move the eligible notes of one live file; returns how many moved
fn archive_file(
    file: &RecordFile,
    archive_path: &Path,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<usize> {
    let mut kept = RecordFile::empty(file.path());
    let mut moved = Vec::new();

    for line in &file.lines {
        match line.entry() {
            Some(entry) if is_archivable(entry, now, config) => {
                let mut entry = entry.clone();
                entry.archived = true;
                entry.archived_reason = Some(REASON_FADED.to_string());
                moved.push(RecordLine::from_entry(entry)?.raw().to_string());
            }
            _ => kept.lines.push(line.clone()),
        }
    }

    if moved.is_empty() {
        return Ok(0);
    }

    let live_snapshot = FileSnapshot::capture(file.path())?;
    let archive_snapshot = FileSnapshot::capture(archive_path)?;

    let result = io::write_atomic(file.path(), kept.render().as_bytes())
        .and_then(|()| io::append_lines(archive_path, &moved));

    match result {
        Ok(()) => {
            live_snapshot.commit()?;
            archive_snapshot.commit()?;
            Ok(moved.len())
        }
        Err(e) => {
            if let Err(restore_err) = live_snapshot.restore() {
                tracing::error!(error = %restore_err, "failed to restore live file");
            }
            if let Err(restore_err) = archive_snapshot.restore() {
                tracing::error!(error = %restore_err, "failed to restore archive file");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn aged(days: i64, salience: f64) -> NoteEntry {
        NoteEntry::new("s", "x", now() - Duration::days(days)).with_salience(salience)
    }

    #[test]
    fn test_eligibility_thresholds() {
        let config = EngineConfig::default();
        assert!(is_archivable(&aged(120, 0.01), now(), &config));
        assert!(!is_archivable(&aged(120, 0.8), now(), &config));
        assert!(!is_archivable(&aged(1, 0.01), now(), &config));
        assert!(!is_archivable(&aged(90, 0.01), now(), &config));
    }

    #[test]
    fn test_pinned_and_synthesis_are_exempt() {
        let config = EngineConfig::default();
        let mut pinned = aged(400, 0.01);
        pinned.pinned = true;
        assert!(!is_archivable(&pinned, now(), &config));

        let mut weekly = aged(400, 0.01);
        weekly.synthesis_level = crate::note::SynthesisLevel::Weekly;
        assert!(!is_archivable(&weekly, now(), &config));
    }

    #[test]
    fn test_missing_timestamp_is_too_young() {
        let config = EngineConfig::default();
        let mut note = aged(400, 0.01);
        note.timestamp = None;
        assert!(!is_archivable(&note, now(), &config));
    }
}
