//! `salience reference` command - record that a surfaced note was used

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::cli::Cli;
use crate::commands::format::{output_by_format_result, print_json_status};
use salience_core::error::Result;
use salience_core::store::Store;

/// Execute the reference command
pub fn execute(cli: &Cli, store: &Store, key: &str, now: DateTime<Utc>) -> Result<()> {
    let note = store.find(key)?;
    let key = note.entry.key();

    let mut usage = store.load_usage();
    usage.record_reference(&key, now);
    store.save_usage(&usage)?;

    let record = usage.get(&key).cloned().unwrap_or_default();
    tracing::debug!(%key, referenced = record.referenced, "recorded reference");

    output_by_format_result!(cli.format,
        json => print_json_status(
            "ok",
            None,
            &[
                ("key", json!(key)),
                ("surfaced", json!(record.surfaced)),
                ("referenced", json!(record.referenced)),
            ],
        ),
        human => {
            if !cli.quiet {
                println!(
                    "{}: referenced {} of {} surfacing(s)",
                    key, record.referenced, record.surfaced
                );
            }
        }
    )
}
