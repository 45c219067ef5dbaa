//! Calendar periods for roll-ups

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::note::SynthesisLevel;

/// An inclusive date range covered by one roll-up record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Monday-aligned week containing `date`
    pub fn week_of(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
        Self {
            start,
            end: start + Days::new(6),
        }
    }

    /// Calendar month containing `date`
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = (start + Months::new(1))
            .pred_opt()
            .unwrap_or(start);
        Self { start, end }
    }

    /// Period of `level` containing `date`; primary notes have none
    pub fn of(level: SynthesisLevel, date: NaiveDate) -> Option<Self> {
        match level {
            SynthesisLevel::Weekly => Some(Self::week_of(date)),
            SynthesisLevel::Monthly => Some(Self::month_of(date)),
            SynthesisLevel::None => None,
        }
    }

    /// Whether the period has fully elapsed at `now`
    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        now.date_naive() > self.end
    }

    /// Whether every input a roll-up of `level` reads for this period is
    /// final at `now`.
    ///
    /// Weekly records are bucketed into months by their start date, so a
    /// month stays open until the week holding its last day has closed.
    pub fn is_settled(&self, level: SynthesisLevel, now: DateTime<Utc>) -> bool {
        match level {
            SynthesisLevel::Monthly => Self::week_of(self.end).is_closed(now),
            _ => self.is_closed(now),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
