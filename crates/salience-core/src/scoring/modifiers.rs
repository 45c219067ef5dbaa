//! Multiplicative score modifiers
//!
//! Each modifier is centered near 1.0 and bounded, so no single heuristic can
//! dominate the decayed base score.

use std::collections::HashSet;
use std::sync::OnceLock;

use chrono::{DateTime, Timelike, Utc};
use regex::Regex;

use crate::note::NoteEntry;
use crate::text;
use crate::usage::UsageRecord;

pub const DENSITY_MIN: f64 = 0.8;
pub const DENSITY_MAX: f64 = 1.2;
pub const ACTIONABILITY_MAX: f64 = 1.3;
pub const CONTEXT_MAX: f64 = 1.1;
pub const EFFECTIVENESS_MIN: f64 = 0.8;
pub const EFFECTIVENESS_MAX: f64 = 1.2;

/// Notes longer than this start paying a length penalty
const LONG_NOTE_WORDS: usize = 400;

/// Hours either side of the note's capture hour that count as "same time of day"
const TIME_OF_DAY_WINDOW: u32 = 2;

static ACTION_CUES: OnceLock<Option<Regex>> = OnceLock::new();
static NUMBERED_ITEM: OnceLock<Option<Regex>> = OnceLock::new();

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!(error = %e, "failed to compile actionability pattern");
            None
        }
    }
}

fn action_cues() -> Option<&'static Regex> {
    ACTION_CUES
        .get_or_init(|| {
            compile(
                r"(?i)\b(todo|to-do|action items?|decided|decisions?|decide|blocked|blockers?|deadlines?|due|must|need to|follow[- ]up|next steps?)\b",
            )
        })
        .as_ref()
}

fn numbered_item() -> Option<&'static Regex> {
    NUMBERED_ITEM
        .get_or_init(|| compile(r"^\d+[.)]\s"))
        .as_ref()
}

/// Rewards lexically varied text, penalizes filler and very long notes
pub fn information_density(text: &str) -> f64 {
    let words = text::word_count(text);
    if words == 0 {
        return DENSITY_MIN;
    }

    let unique = text::unique_ratio(text);
    let tokens = text::estimate_tokens(text).max(1);
    let words_per_token = (words as f64 / tokens as f64).min(1.0);
    let length_penalty = if words > LONG_NOTE_WORDS {
        ((words - LONG_NOTE_WORDS) as f64 / 2000.0).min(0.15)
    } else {
        0.0
    };

    (DENSITY_MIN + 0.25 * unique + 0.1 * words_per_token - length_penalty)
        .clamp(DENSITY_MIN, DENSITY_MAX)
}

/// Rewards decisions, blockers, deadlines, bullet structure and explicit action items
pub fn actionability(note: &NoteEntry) -> f64 {
    let cues: HashSet<String> = action_cues()
        .map(|re| {
            re.find_iter(&note.text)
                .map(|m| m.as_str().to_lowercase())
                .collect()
        })
        .unwrap_or_default();

    let bullets = note
        .text
        .lines()
        .map(str::trim_start)
        .filter(|l| l.starts_with("- ") || l.starts_with("* ") || numbered_item().is_some_and(|re| re.is_match(l)))
        .count();

    let mut multiplier = 1.0 + (0.05 * cues.len() as f64).min(0.15);
    if bullets >= 2 {
        multiplier += 0.05;
    }
    if !note.action_items.is_empty() {
        multiplier += 0.1;
    }
    multiplier.min(ACTIONABILITY_MAX)
}

/// Small boost when the note matches the caller's time of day or source
pub fn context_affinity(note: &NoteEntry, now: DateTime<Utc>, machine: Option<&str>) -> f64 {
    let mut multiplier: f64 = 1.0;

    if let Some(captured) = note.timestamp {
        let diff = captured.hour().abs_diff(now.hour());
        if diff.min(24 - diff) <= TIME_OF_DAY_WINDOW {
            multiplier += 0.05;
        }
    }

    if let Some(machine) = machine {
        if !machine.is_empty() && note.machine.eq_ignore_ascii_case(machine) {
            multiplier += 0.05;
        }
    }

    multiplier.min(CONTEXT_MAX)
}

/// Scales by how often surfacing a note led to a later reference
pub fn reference_effectiveness(usage: Option<&UsageRecord>, min_surfaced: u32) -> f64 {
    match usage.and_then(|u| u.yield_ratio(min_surfaced)) {
        Some(ratio) => EFFECTIVENESS_MIN + (EFFECTIVENESS_MAX - EFFECTIVENESS_MIN) * ratio,
        None => 1.0,
    }
}
