//! `salience add` command - capture a note
//!
//! The body comes from `--text`, from stdin, or (with `--json`) a full
//! record is read from stdin. Existing notes sharing tags with the new one
//! are reinforced.

use std::io::{self, IsTerminal, Read};

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::cli::{AddArgs, Cli};
use crate::commands::format::{output_by_format_result, print_json_status};
use salience_core::bail_usage;
use salience_core::error::Result;
use salience_core::note::NoteEntry;
use salience_core::reinforcement;
use salience_core::store::Store;

/// Execute the add command
pub fn execute(cli: &Cli, store: &Store, args: &AddArgs, now: DateTime<Utc>) -> Result<()> {
    let entry = if args.json {
        let record: NoteEntry = serde_json::from_str(&read_stdin()?)?;
        overlay(record, args)
    } else {
        let text = match &args.text {
            Some(text) => text.clone(),
            None => read_stdin()?,
        };
        let record = NoteEntry::new(
            args.session.clone().unwrap_or_default(),
            text.trim_end(),
            args.timestamp.unwrap_or(now),
        );
        overlay(record, args)
    };

    if entry.text.trim().is_empty() {
        bail_usage!("note text is empty");
    }

    let report = reinforcement::add_note(store, entry, now)?;

    output_by_format_result!(cli.format,
        json => print_json_status(
            "ok",
            None,
            &[
                ("key", json!(report.key)),
                ("path", json!(report.path.display().to_string())),
                ("novelty_score", json!(report.novelty_score)),
                ("reinforced", json!(report.reinforced)),
                ("errors", json!(report.errors)),
            ],
        ),
        human => {
            println!("{}", report.key);
            if !cli.quiet {
                if report.reinforced > 0 {
                    println!("reinforced {} related note(s)", report.reinforced);
                }
                for error in &report.errors {
                    eprintln!("warning: {}", error);
                }
            }
        }
    )
}

/// Apply command-line fields on top of a record
fn overlay(mut entry: NoteEntry, args: &AddArgs) -> NoteEntry {
    if let Some(session) = &args.session {
        entry.session = session.clone();
    }
    if let Some(machine) = &args.machine {
        entry.machine = machine.clone();
    }
    if !args.tags.is_empty() {
        entry.topic_tags = args.tags.clone();
    }
    if !args.action_items.is_empty() {
        entry.action_items = args.action_items.clone();
    }
    if let Some(salience) = args.salience {
        entry.salience = salience;
    }
    if let Some(weight) = args.emotional_weight {
        entry.emotional_weight = weight;
    }
    if let Some(novelty) = args.novelty {
        entry.novelty_score = novelty;
    }
    if let Some(timestamp) = args.timestamp {
        entry.timestamp = Some(timestamp);
        entry.last_referenced = Some(timestamp);
    }
    entry.pinned |= args.pinned;
    entry
}

fn read_stdin() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail_usage!("no note text given (use --text or pipe it on stdin)");
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf)?;
    Ok(buf)
}
