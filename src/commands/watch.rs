//! `salience watch` command - maintenance loop until Ctrl-C

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cli::{Cli, OutputFormat};
use crate::commands::maintain::print_outcome;
use salience_core::consolidation::Summarizer;
use salience_core::error::{Result, SalienceError};
use salience_core::maintenance::{self, CycleOutcome};
use salience_core::store::Store;

/// Execute the watch command
pub fn execute(cli: &Cli, store: &Store, summarizer: Option<&dyn Summarizer>) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| SalienceError::failed("install signal handler", e))?;

    tracing::info!(
        poll_seconds = store.config().maintenance.poll_seconds,
        interval_hours = store.config().maintenance.interval_hours,
        "watching store"
    );

    maintenance::watch(store, summarizer, &stop, |outcome| {
        report(cli, outcome);
    });
    Ok(())
}

fn report(cli: &Cli, outcome: &CycleOutcome) {
    match cli.format {
        OutputFormat::Json => match serde_json::to_string(outcome) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::warn!(error = %e, "failed to serialize cycle outcome"),
        },
        OutputFormat::Human => {
            if !cli.quiet && matches!(outcome, CycleOutcome::Ran(_)) {
                print_outcome(outcome);
            }
        }
    }
}
