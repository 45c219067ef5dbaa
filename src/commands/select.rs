//! `salience select` command - pick the notes to surface
//!
//! Records one surfacing per selected note in the usage statistics.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::cli::{Cli, SelectArgs};
use crate::commands::format::{output_by_format_result, print_json, score_label};
use salience_core::error::Result;
use salience_core::note::NoteEntry;
use salience_core::scoring::ScoreContext;
use salience_core::selection;
use salience_core::store::Store;

/// Execute the select command
pub fn execute(cli: &Cli, store: &Store, args: &SelectArgs, now: DateTime<Utc>) -> Result<()> {
    let mut config = store.config().selection.clone();
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(floor) = args.recency_floor {
        config.recency_floor = floor;
    }

    let mut ctx = ScoreContext::new(now);
    if let Some(machine) = &args.machine {
        ctx = ctx.with_machine(machine.clone());
    }

    let notes: Vec<NoteEntry> = store.load_entries().into_iter().map(|n| n.entry).collect();
    let mut usage = store.load_usage();
    let selected = selection::select(&notes, &config, &mut usage, &ctx, &store.config().decay);

    if !selected.is_empty() {
        store.save_usage(&usage)?;
    }

    output_by_format_result!(cli.format,
        json => {
            let rows: Vec<serde_json::Value> = selected
                .iter()
                .map(|s| {
                    let note = &notes[s.index];
                    json!({
                        "key": s.key,
                        "score": s.score,
                        "recent": s.recent,
                        "timestamp": note.timestamp,
                        "tags": note.topic_tags,
                        "text": note.text,
                    })
                })
                .collect();
            print_json(&rows)
        },
        human => {
            for s in &selected {
                let note = &notes[s.index];
                let marker = if s.recent { "*" } else { " " };
                if args.full {
                    println!("{}{} {}", marker, score_label(s.score), s.key);
                    println!("{}", note.text);
                    println!();
                } else {
                    println!("{}{} {} {}", marker, score_label(s.score), s.key, note.summary_line());
                }
            }
        }
    )
}
