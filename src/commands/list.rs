//! `salience list` command - active notes ranked by effective score

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::cli::{Cli, ListArgs};
use crate::commands::format::{output_by_format_result, print_json, score_label};
use salience_core::error::Result;
use salience_core::note::NoteEntry;
use salience_core::scoring::{self, ScoreContext};
use salience_core::selection;
use salience_core::store::Store;

/// Execute the list command
pub fn execute(cli: &Cli, store: &Store, args: &ListArgs, now: DateTime<Utc>) -> Result<()> {
    let policy = &store.config().decay;
    let usage = store.load_usage();

    let mut notes: Vec<NoteEntry> = store.load_entries().into_iter().map(|n| n.entry).collect();
    if let Some(tag) = &args.tag {
        let tag = tag.trim().to_lowercase();
        notes.retain(|n| n.tag_set().contains(&tag));
    }

    let mut ctx = ScoreContext::new(now);
    if let Some(machine) = &args.machine {
        ctx = ctx.with_machine(machine.clone());
    }

    let mut ranked = selection::rank(&notes, &usage, &ctx, policy);
    if let Some(limit) = args.limit {
        ranked.truncate(limit);
    }

    output_by_format_result!(cli.format,
        json => {
            let rows: Vec<serde_json::Value> = ranked
                .iter()
                .map(|r| {
                    let note = &notes[r.index];
                    let mut row = json!({
                        "key": note.key(),
                        "score": r.score,
                        "salience": note.salience,
                        "timestamp": note.timestamp,
                        "machine": note.machine,
                        "tags": note.topic_tags,
                        "pinned": note.pinned,
                        "synthesis_level": note.synthesis_level,
                        "summary": note.summary_line(),
                    });
                    if args.explain {
                        let breakdown = scoring::breakdown(note, usage.get(&note.key()), &ctx, policy);
                        row["breakdown"] = json!(breakdown);
                    }
                    row
                })
                .collect();
            print_json(&rows)
        },
        human => {
            if ranked.is_empty() && !cli.quiet {
                println!("No notes found");
            }
            for r in &ranked {
                let note = &notes[r.index];
                let pin = if note.pinned { " [pinned]" } else { "" };
                println!("{} {} {}{}", score_label(r.score), note.key(), note.summary_line(), pin);
                if args.explain {
                    let b = scoring::breakdown(note, usage.get(&note.key()), &ctx, policy);
                    println!(
                        "       base={:.3} density={:.2} action={:.2} context={:.2} effectiveness={:.2}",
                        b.base, b.density, b.actionability, b.context, b.effectiveness
                    );
                }
            }
        }
    )
}
