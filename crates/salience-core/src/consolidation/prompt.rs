//! Summarizer prompt and response format
//!
//! The response is free text optionally followed by a metadata block:
//!
//! ```text
//! merged note body ...
//! ---
//! tags: build, ci
//! weight: 0.6
//! ```

use std::collections::BTreeSet;

use chrono::SecondsFormat;

use crate::error::{Result, SalienceError};
use crate::note::NoteEntry;

/// Weight used when the response carries none
pub const NEUTRAL_WEIGHT: f64 = 0.5;

const METADATA_SEPARATOR: &str = "---";

/// Parsed summarizer output
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryResponse {
    pub body: String,
    pub tags: Vec<String>,
    pub weight: f64,
}

/// Deterministic prompt for merging `notes`, in the order given
pub fn build_prompt(notes: &[&NoteEntry]) -> String {
    let mut prompt = format!(
        "Merge the following {} related notes into one concise note.\n\
         Keep decisions, open questions and action items; drop repetition.\n\
         After the note, write a line containing only `{}` followed by:\n\
         tags: comma-separated topic tags\n\
         weight: a number between 0 and 1 for how much the merged note matters\n",
        notes.len(),
        METADATA_SEPARATOR
    );

    for (i, note) in notes.iter().enumerate() {
        prompt.push_str(&format!("\n## Note {}\n", i + 1));
        if !note.session.is_empty() {
            prompt.push_str(&format!("session: {}\n", note.session));
        }
        if let Some(ts) = note.timestamp {
            prompt.push_str(&format!(
                "date: {}\n",
                ts.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        if !note.topic_tags.is_empty() {
            prompt.push_str(&format!("tags: {}\n", note.topic_tags.join(", ")));
        }
        if !note.action_items.is_empty() {
            prompt.push_str("action items:\n");
            for item in &note.action_items {
                prompt.push_str(&format!("- {}\n", item));
            }
        }
        prompt.push('\n');
        prompt.push_str(note.text.trim());
        prompt.push('\n');
    }

    prompt
}

/// Split a response into body and metadata. A missing or unreadable block
/// yields no tags and [`NEUTRAL_WEIGHT`]; an empty body is an error.
pub fn parse_response(raw: &str) -> Result<SummaryResponse> {
    let lines: Vec<&str> = raw.trim().lines().collect();
    let separator = lines
        .iter()
        .rposition(|l| l.trim() == METADATA_SEPARATOR)
        .filter(|&i| lines[i + 1..].iter().any(|l| metadata_field(l).is_some()));

    let (body_lines, meta_lines) = match separator {
        Some(i) => (&lines[..i], &lines[i + 1..]),
        None => (&lines[..], &[][..]),
    };

    let body = body_lines.join("\n").trim().to_string();
    if body.is_empty() {
        return Err(SalienceError::Summarizer(
            "response contained no note body".to_string(),
        ));
    }

    let mut tags = Vec::new();
    let mut weight = NEUTRAL_WEIGHT;
    for line in meta_lines {
        match metadata_field(line) {
            Some(("tags", value)) => tags = parse_tags(value),
            Some(("weight", value)) => {
                weight = value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|w| w.is_finite())
                    .map_or(NEUTRAL_WEIGHT, |w| w.clamp(0.0, 1.0));
            }
            _ => {}
        }
    }

    Ok(SummaryResponse { body, tags, weight })
}

fn metadata_field(line: &str) -> Option<(&'static str, &str)> {
    let (key, value) = line.split_once(':')?;
    match key.trim().to_lowercase().as_str() {
        "tags" => Some(("tags", value)),
        "weight" => Some(("weight", value)),
        _ => None,
    }
}

fn parse_tags(value: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    value
        .split(',')
        .map(|t| t.trim().trim_start_matches('#').to_lowercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
