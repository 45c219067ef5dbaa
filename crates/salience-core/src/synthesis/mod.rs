//! Weekly and monthly synthesis roll-ups
//!
//! Weekly records summarize primary notes; monthly records summarize the
//! weekly records that start in their month, so a month is rolled up only
//! once its last week has closed. Each closed period gets exactly one record
//! per level, appended once and never rewritten, so a second run over the
//! same input creates nothing.

pub mod period;
pub mod render;

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::config::SynthesisConfig;
use crate::error::Result;
use crate::note::{NoteEntry, SynthesisLevel};
use crate::store::Store;
use crate::trace_time;

pub use period::Period;

/// Source tag of roll-up records
pub const SYNTHESIS_MACHINE: &str = "synthesis";

/// Outcome of a roll-up run
#[derive(Debug, Clone, Serialize)]
pub struct RollupReport {
    pub level: SynthesisLevel,
    /// Start dates of the periods that got a new record
    pub created: Vec<NaiveDate>,
    /// Closed periods that already had a record
    pub existing: usize,
}

impl RollupReport {
    pub fn count(&self) -> usize {
        self.created.len()
    }
}

/// Entries a roll-up of `level` draws from, with the date that buckets them
fn bucket_date(entry: &NoteEntry, level: SynthesisLevel) -> Option<NaiveDate> {
    if entry.archived {
        return None;
    }
    match level {
        SynthesisLevel::Weekly if !entry.is_synthesis() => entry.timestamp.map(|t| t.date_naive()),
        SynthesisLevel::Monthly if entry.synthesis_level == SynthesisLevel::Weekly => entry
            .period_start
            .or_else(|| entry.timestamp.map(|t| t.date_naive())),
        _ => None,
    }
}

/// New roll-up records for every closed, uncovered period
pub fn plan_rollup(
    entries: &[NoteEntry],
    level: SynthesisLevel,
    covered: &BTreeSet<NaiveDate>,
    now: DateTime<Utc>,
    config: &SynthesisConfig,
) -> (Vec<NoteEntry>, usize) {
    let mut groups: BTreeMap<Period, Vec<&NoteEntry>> = BTreeMap::new();
    for entry in entries {
        let Some(period) = bucket_date(entry, level).and_then(|d| Period::of(level, d)) else {
            continue;
        };
        groups.entry(period).or_default().push(entry);
    }

    let mut records = Vec::new();
    let mut existing = 0;
    for (period, members) in groups {
        if !period.is_settled(level, now) {
            continue;
        }
        if covered.contains(&period.start) {
            existing += 1;
            continue;
        }
        records.push(rollup_record(level, &period, &members, config));
    }
    (records, existing)
}

fn rollup_record(
    level: SynthesisLevel,
    period: &Period,
    members: &[&NoteEntry],
    config: &SynthesisConfig,
) -> NoteEntry {
    let themes = render::rank_themes(members, config);
    let text = render::render(level, period, members, &themes);
    let closed_at = period.end.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default());

    let mut record = NoteEntry::new("", text, closed_at.and_utc())
        .with_machine(SYNTHESIS_MACHINE)
        .with_tags(themes.iter().map(|t| t.tag.clone()))
        .with_salience(render::aggregate_salience(members, config));
    record.synthesis_level = level;
    record.period_start = Some(period.start);
    record.period_end = Some(period.end);
    record
}

/// Append roll-ups of `level` for closed periods not yet covered
#[tracing::instrument(skip(store, entries), fields(entries = entries.len()))]
pub fn rollup(
    store: &Store,
    entries: &[NoteEntry],
    level: SynthesisLevel,
    now: DateTime<Utc>,
) -> Result<RollupReport> {
    let start = Instant::now();
    let covered: BTreeSet<NaiveDate> = store
        .load_synthesis(level)
        .iter()
        .filter_map(|e| e.period_start)
        .collect();

    let (records, existing) = plan_rollup(entries, level, &covered, now, &store.config().synthesis);
    store.append_synthesis(level, &records)?;

    let created: Vec<NaiveDate> = records.iter().filter_map(|r| r.period_start).collect();
    if !created.is_empty() {
        tracing::info!(%level, created = created.len(), "wrote roll-ups");
    }
    trace_time!(start, "rollup", created = created.len());

    Ok(RollupReport {
        level,
        created,
        existing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2026, 6, 17, 12, 0, 0).unwrap()
    }

    fn on(y: i32, m: u32, d: u32, tags: &[&str]) -> NoteEntry {
        NoteEntry::new(
            format!("{}-{}", m, d),
            format!("work on {}", tags.join(" and ")),
            Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap(),
        )
        .with_tags(tags.iter().copied())
    }

    #[test]
    fn test_weekly_skips_open_week() {
        let entries = vec![
            on(2026, 6, 2, &["ci"]),
            on(2026, 6, 4, &["ci", "rust"]),
            on(2026, 6, 16, &["docs"]),
        ];
        let (records, existing) = plan_rollup(
            &entries,
            SynthesisLevel::Weekly,
            &BTreeSet::new(),
            now(),
            &SynthesisConfig::default(),
        );
        assert_eq!(existing, 0);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.period_start, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(record.period_end, NaiveDate::from_ymd_opt(2026, 6, 7));
        assert_eq!(record.synthesis_level, SynthesisLevel::Weekly);
        assert_eq!(record.topic_tags, vec!["ci", "rust"]);
        assert!(record.salience >= 0.3 && record.salience <= 0.9);
    }

    #[test]
    fn test_covered_periods_are_skipped() {
        let entries = vec![on(2026, 6, 2, &["ci"])];
        let covered = BTreeSet::from([NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()]);
        let (records, existing) = plan_rollup(
            &entries,
            SynthesisLevel::Weekly,
            &covered,
            now(),
            &SynthesisConfig::default(),
        );
        assert!(records.is_empty());
        assert_eq!(existing, 1);
    }

    #[test]
    fn test_monthly_reads_only_weekly_records() {
        let config = SynthesisConfig::default();
        let notes = vec![on(2026, 5, 5, &["ci"]), on(2026, 5, 12, &["rust"])];
        let (weeklies, _) =
            plan_rollup(&notes, SynthesisLevel::Weekly, &BTreeSet::new(), now(), &config);
        assert_eq!(weeklies.len(), 2);

        let mut all = notes.clone();
        all.extend(weeklies);
        let (monthly, _) =
            plan_rollup(&all, SynthesisLevel::Monthly, &BTreeSet::new(), now(), &config);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].period_start, NaiveDate::from_ymd_opt(2026, 5, 1));
        assert!(monthly[0].text.contains("2 weekly summaries"));
        assert!(monthly[0].text.contains("week of 2026-05-04"));
    }

    #[test]
    fn test_archived_and_undated_notes_ignored() {
        let mut archived = on(2026, 6, 2, &["ci"]);
        archived.archived = true;
        let mut undated = on(2026, 6, 3, &["ci"]);
        undated.timestamp = None;
        let (records, _) = plan_rollup(
            &[archived, undated],
            SynthesisLevel::Weekly,
            &BTreeSet::new(),
            now(),
            &SynthesisConfig::default(),
        );
        assert!(records.is_empty());
    }
}
