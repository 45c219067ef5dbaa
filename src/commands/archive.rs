//! `salience archive` command - move faded notes to the archive

use chrono::{DateTime, Utc};

use crate::cli::Cli;
use crate::commands::format::{output_by_format_result, print_json};
use salience_core::archive;
use salience_core::error::{Result, SalienceError};
use salience_core::store::Store;

/// Execute the archive command
///
/// Every file is attempted; the command fails afterwards if any file could
/// not be archived.
pub fn execute(cli: &Cli, store: &Store, now: DateTime<Utc>) -> Result<()> {
    let report = archive::archive(store, now);

    output_by_format_result!(cli.format,
        json => print_json(&report),
        human => {
            if !cli.quiet {
                println!("archived {} note(s) from {} file(s)", report.archived, report.files);
            }
            for failure in &report.failures {
                eprintln!("warning: {}: {}", failure.path.display(), failure.error);
            }
        }
    )?;

    match report.failures.len() {
        0 => Ok(()),
        n => Err(SalienceError::failed(
            "archive",
            format!("{} file(s) left unchanged", n),
        )),
    }
}
