//! `salience consolidate` command - merge clusters of fading notes

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::cli::{Cli, ConsolidateArgs};
use crate::commands::format::{output_by_format_result, print_json};
use salience_core::bail_usage;
use salience_core::consolidation::{self, Summarizer};
use salience_core::error::Result;
use salience_core::store::Store;

/// Execute the consolidate command
pub fn execute(
    cli: &Cli,
    store: &Store,
    summarizer: Option<&dyn Summarizer>,
    args: &ConsolidateArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    if args.dry_run {
        return show_plan(cli, store, now);
    }

    let Some(summarizer) = summarizer else {
        bail_usage!("no summarizer configured (set summarizer.command in config.toml)");
    };

    let report = consolidation::consolidate(store, summarizer, now);

    output_by_format_result!(cli.format,
        json => print_json(&report),
        human => {
            if !cli.quiet {
                println!(
                    "{} candidate(s), {} cluster(s): wrote {} consolidated note(s) from {} source(s)",
                    report.candidates, report.clusters, report.consolidated, report.archived
                );
            }
            for skipped in &report.skipped {
                eprintln!("warning: skipped cluster {}: {}", skipped.sessions.join(","), skipped.error);
            }
        }
    )
}

fn show_plan(cli: &Cli, store: &Store, now: DateTime<Utc>) -> Result<()> {
    let corpus = store.load_entries();
    let (candidates, clusters) = consolidation::plan(&corpus, now, store.config());

    output_by_format_result!(cli.format,
        json => {
            let rows: Vec<serde_json::Value> = clusters
                .iter()
                .map(|c| {
                    json!({
                        "tags": c.tags,
                        "members": c
                            .members
                            .iter()
                            .map(|&i| candidates[i].entry.key())
                            .collect::<Vec<_>>(),
                    })
                })
                .collect();
            print_json(&json!({
                "candidates": candidates.len(),
                "clusters": rows,
            }))
        },
        human => {
            println!("{} candidate(s), {} cluster(s)", candidates.len(), clusters.len());
            for cluster in &clusters {
                let tags: Vec<&str> = cluster.tags.iter().map(String::as_str).collect();
                println!("[{}]", tags.join(", "));
                for &i in &cluster.members {
                    let note = &candidates[i].entry;
                    println!("  {} {:.3} {}", note.key(), note.salience, note.summary_line());
                }
            }
        }
    )
}
