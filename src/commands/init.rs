//! `salience init` command - create a new store
//!
//! Idempotent: directories are created when missing and an existing
//! `config.toml` is left alone.

use std::path::Path;

use serde_json::json;

use crate::cli::Cli;
use crate::commands::format::{output_by_format_result, print_json_status};
use salience_core::error::Result;
use salience_core::store::Store;

/// Execute the init command
pub fn execute(cli: &Cli, root: &Path) -> Result<()> {
    let store = Store::init(root)?;

    output_by_format_result!(cli.format,
        json => print_json_status(
            "ok",
            Some("Store initialized"),
            &[("store", json!(store.root().display().to_string()))],
        ),
        human => {
            if !cli.quiet {
                println!("Initialized salience store at {}", store.root().display());
            }
        }
    )
}
