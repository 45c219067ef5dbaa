//! Command dispatch logic for salience

use std::time::Instant;

use crate::cli::Cli;
use salience_core::error::Result;
use salience_core::store::paths::resolve_store_path;
use tracing::debug;

mod command;
mod commands;

use command::{Command, CommandContext, NoCommand};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let root = resolve_store_path(cli.store.clone());

    debug!(elapsed = ?start.elapsed(), root = %root.display(), "resolve_store");

    let ctx = CommandContext::new(cli, &root, start);

    match &cli.command {
        None => NoCommand.execute(&ctx),
        Some(cmd) => cmd.execute(&ctx),
    }
}
