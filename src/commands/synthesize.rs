//! `salience synthesize` command - weekly and monthly roll-ups
//!
//! Monthly roll-ups read the weekly stream, so `--level all` reloads the
//! store between the two levels.

use chrono::{DateTime, Utc};

use crate::cli::args::LevelArg;
use crate::cli::Cli;
use crate::commands::format::{output_by_format_result, print_json};
use salience_core::error::Result;
use salience_core::note::{NoteEntry, SynthesisLevel};
use salience_core::store::Store;
use salience_core::synthesis::{self, RollupReport};

fn levels(arg: LevelArg) -> &'static [SynthesisLevel] {
    match arg {
        LevelArg::Weekly => &[SynthesisLevel::Weekly],
        LevelArg::Monthly => &[SynthesisLevel::Monthly],
        LevelArg::All => &[SynthesisLevel::Weekly, SynthesisLevel::Monthly],
    }
}

/// Execute the synthesize command
pub fn execute(cli: &Cli, store: &Store, level: LevelArg, now: DateTime<Utc>) -> Result<()> {
    let mut reports: Vec<RollupReport> = Vec::new();
    for &level in levels(level) {
        let entries: Vec<NoteEntry> = store.load_entries().into_iter().map(|n| n.entry).collect();
        reports.push(synthesis::rollup(store, &entries, level, now)?);
    }

    output_by_format_result!(cli.format,
        json => print_json(&reports),
        human => {
            if !cli.quiet {
                for report in &reports {
                    println!(
                        "{}: {} new, {} already covered",
                        report.level,
                        report.count(),
                        report.existing
                    );
                    for start in &report.created {
                        println!("  {}", start);
                    }
                }
            }
        }
    )
}
