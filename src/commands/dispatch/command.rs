//! Command trait and context for dispatching commands

use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};

use crate::cli::Cli;
use salience_core::consolidation::CommandSummarizer;
use salience_core::error::Result;
use salience_core::store::Store;

/// Shared context for command execution
pub struct CommandContext<'a> {
    pub cli: &'a Cli,
    pub root: &'a PathBuf,
    pub start: Instant,
}

impl<'a> CommandContext<'a> {
    pub fn new(cli: &'a Cli, root: &'a PathBuf, start: Instant) -> Self {
        Self { cli, root, start }
    }

    /// Open the store at the resolved root
    pub fn open_store(&self) -> Result<Store> {
        let store = Store::open(self.root)?;
        tracing::debug!(elapsed = ?self.start.elapsed(), "open_store");
        Ok(store)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.cli.now()
    }

    /// The external summarizer, if one is configured
    pub fn summarizer(&self, store: &Store) -> Option<CommandSummarizer> {
        CommandSummarizer::from_config(&store.config().summarizer)
    }
}

/// Trait for commands that can be executed
pub trait Command {
    fn execute(&self, ctx: &CommandContext) -> Result<()>;
}

/// No-op command (when no subcommand is provided)
pub struct NoCommand;

impl Command for NoCommand {
    fn execute(&self, _ctx: &CommandContext) -> Result<()> {
        println!("salience {}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("A note store whose notes fade unless they are reinforced.");
        println!();
        println!("Run `salience --help` for usage information.");
        Ok(())
    }
}
