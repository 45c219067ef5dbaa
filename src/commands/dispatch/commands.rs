//! Command implementations for all salience commands

use crate::cli::Commands;
use crate::commands::dispatch::command::{Command, CommandContext};
use salience_core::error::Result;

impl Command for Commands {
    fn execute(&self, ctx: &CommandContext) -> Result<()> {
        dispatch_command::execute(self, ctx)
    }
}

pub(super) mod dispatch_command {
    use super::*;

    use salience_core::consolidation::Summarizer;

    use crate::commands;

    pub(super) fn execute(cmd: &Commands, ctx: &CommandContext) -> Result<()> {
        match cmd {
            Commands::Init => commands::init::execute(ctx.cli, ctx.root),
            Commands::Add(args) => {
                let store = ctx.open_store()?;
                commands::add::execute(ctx.cli, &store, args, ctx.now())
            }
            Commands::List(args) => {
                let store = ctx.open_store()?;
                commands::list::execute(ctx.cli, &store, args, ctx.now())
            }
            Commands::Select(args) => {
                let store = ctx.open_store()?;
                commands::select::execute(ctx.cli, &store, args, ctx.now())
            }
            Commands::Reference { key } => {
                let store = ctx.open_store()?;
                commands::reference::execute(ctx.cli, &store, key, ctx.now())
            }
            Commands::Archive => {
                let store = ctx.open_store()?;
                commands::archive::execute(ctx.cli, &store, ctx.now())
            }
            Commands::Consolidate(args) => {
                let store = ctx.open_store()?;
                let summarizer = ctx.summarizer(&store);
                commands::consolidate::execute(
                    ctx.cli,
                    &store,
                    summarizer.as_ref().map(|s| s as &dyn Summarizer),
                    args,
                    ctx.now(),
                )
            }
            Commands::Synthesize(args) => {
                let store = ctx.open_store()?;
                commands::synthesize::execute(ctx.cli, &store, args.level, ctx.now())
            }
            Commands::Maintain(args) => {
                let store = ctx.open_store()?;
                let summarizer = ctx.summarizer(&store);
                commands::maintain::execute(
                    ctx.cli,
                    &store,
                    summarizer.as_ref().map(|s| s as &dyn Summarizer),
                    args.force,
                    ctx.now(),
                )
            }
            Commands::Watch => {
                let store = ctx.open_store()?;
                let summarizer = ctx.summarizer(&store);
                commands::watch::execute(
                    ctx.cli,
                    &store,
                    summarizer.as_ref().map(|s| s as &dyn Summarizer),
                )
            }
            Commands::Status => {
                let store = ctx.open_store()?;
                commands::status::execute(ctx.cli, &store, ctx.now())
            }
        }
    }
}
