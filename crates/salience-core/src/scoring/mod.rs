//! Salience scoring
//!
//! The effective score of a note is its persisted salience decayed along a
//! forgetting curve, boosted when pinned, floored at `min_salience`, then
//! scaled by a handful of bounded modifiers:
//!
//! ```text
//! adjusted_age = days_since_reference * (1 - emotional_weight * damping)
//! decayed      = salience * decay_factor ^ adjusted_age (+ pinned_boost)
//! base         = max(min_salience, decayed)
//! score        = max(min_salience, base * density * actionability * context * effectiveness)
//! ```
//!
//! Archived notes always score exactly `min_salience`.

pub mod modifiers;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::DecayPolicy;
use crate::note::NoteEntry;
use crate::usage::UsageRecord;

/// Caller context for a scoring pass
#[derive(Debug, Clone)]
pub struct ScoreContext {
    /// Reference time for decay
    pub now: DateTime<Utc>,
    /// Source the caller is running on, for context affinity
    pub machine: Option<String>,
}

impl ScoreContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now, machine: None }
    }

    pub fn with_machine(mut self, machine: impl Into<String>) -> Self {
        self.machine = Some(machine.into());
        self
    }
}

/// Every factor that went into a score, for display and debugging
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub density: f64,
    pub actionability: f64,
    pub context: f64,
    pub effectiveness: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    fn floor(min_salience: f64) -> Self {
        Self {
            base: min_salience,
            density: 1.0,
            actionability: 1.0,
            context: 1.0,
            effectiveness: 1.0,
            total: min_salience,
        }
    }
}

/// Decayed base salience before modifiers, floored at `min_salience`
pub fn decayed_base(note: &NoteEntry, now: DateTime<Utc>, policy: &DecayPolicy) -> f64 {
    let age_days = note.days_since_reference(now, policy.default_age_days);
    let adjusted_age = age_days * (1.0 - note.emotional_weight * policy.emotional_damping);
    let mut decayed = note.salience * policy.decay_factor.powf(adjusted_age);

    if note.pinned {
        decayed += policy.pinned_boost;
    }

    decayed.max(policy.min_salience)
}

/// Effective score of a note
pub fn score(
    note: &NoteEntry,
    usage: Option<&UsageRecord>,
    ctx: &ScoreContext,
    policy: &DecayPolicy,
) -> f64 {
    breakdown(note, usage, ctx, policy).total
}

/// Effective score with every factor exposed
pub fn breakdown(
    note: &NoteEntry,
    usage: Option<&UsageRecord>,
    ctx: &ScoreContext,
    policy: &DecayPolicy,
) -> ScoreBreakdown {
    if note.archived {
        return ScoreBreakdown::floor(policy.min_salience);
    }

    let base = decayed_base(note, ctx.now, policy);
    let density = modifiers::information_density(&note.text);
    let actionability = modifiers::actionability(note);
    let context = modifiers::context_affinity(note, ctx.now, ctx.machine.as_deref());
    let effectiveness =
        modifiers::reference_effectiveness(usage, policy.effectiveness_min_surfaced);

    let total =
        (base * density * actionability * context * effectiveness).max(policy.min_salience);

    ScoreBreakdown {
        base,
        density,
        actionability,
        context,
        effectiveness,
        total,
    }
}
