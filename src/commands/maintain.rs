//! `salience maintain` command - one gated maintenance cycle

use chrono::{DateTime, Utc};

use crate::cli::Cli;
use crate::commands::format::{output_by_format_result, print_json};
use salience_core::consolidation::Summarizer;
use salience_core::error::Result;
use salience_core::maintenance::{self, CycleOutcome};
use salience_core::store::Store;

/// Execute the maintain command
pub fn execute(
    cli: &Cli,
    store: &Store,
    summarizer: Option<&dyn Summarizer>,
    force: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let outcome = maintenance::run_cycle(store, summarizer, now, force);

    output_by_format_result!(cli.format,
        json => print_json(&outcome),
        human => {
            if !cli.quiet {
                print_outcome(&outcome);
            }
        }
    )
}

/// One-line human summary of a cycle
pub fn print_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Skipped { next_due } => match next_due {
            Some(due) => println!("maintenance not due until {}", due.to_rfc3339()),
            None => println!("maintenance not due"),
        },
        CycleOutcome::Ran(state) => {
            println!(
                "maintenance: archived {}, consolidated {}, weekly {}, monthly {}",
                state.archived, state.consolidated, state.weekly, state.monthly
            );
            for error in &state.errors {
                eprintln!("warning: {}", error);
            }
        }
    }
}
