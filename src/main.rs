//! Salience - a decaying personal note store
//!
//! Notes lose relevance over time unless reinforced. This CLI scores and
//! selects them, archives the faded ones, merges fading clusters and writes
//! weekly/monthly roll-ups.

mod cli;
mod commands;

use std::env;
use std::process::ExitCode;
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;

use cli::{Cli, OutputFormat};
use salience_core::error::{ExitCode as SalienceExitCode, SalienceError};
use salience_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err, requests_json(env::args().skip(1))),
    };

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    let outcome = commands::dispatch::run(&cli, start);
    tracing::debug!(elapsed = ?start.elapsed(), ok = outcome.is_ok(), "finished");

    match outcome {
        Ok(()) => exit_with(SalienceExitCode::Success),
        Err(e) => command_failure(&cli, &e),
    }
}

fn exit_with(code: SalienceExitCode) -> ExitCode {
    ExitCode::from(code as u8)
}

/// Report a command-line parse failure.
///
/// clap fails before `Cli.format` exists, so a JSON request is read from the
/// raw arguments. Help and version output always go through clap.
fn parse_failure(err: clap::Error, json: bool) -> ExitCode {
    let informational = matches!(
        err.kind(),
        ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
    );
    if !json || informational {
        err.exit();
    }

    let error = match err.kind() {
        ErrorKind::ValueValidation
        | ErrorKind::InvalidValue
        | ErrorKind::InvalidSubcommand
        | ErrorKind::UnknownArgument
        | ErrorKind::MissingRequiredArgument
        | ErrorKind::ArgumentConflict
        | ErrorKind::TooManyValues
        | ErrorKind::WrongNumberOfValues => SalienceError::UsageError(err.to_string()),
        _ => SalienceError::Other(err.to_string()),
    };
    eprintln!("{}", error.to_json());
    exit_with(error.exit_code())
}

/// Report a failed command in the requested format
fn command_failure(cli: &Cli, error: &SalienceError) -> ExitCode {
    match cli.format {
        OutputFormat::Json => eprintln!("{}", error.to_json()),
        OutputFormat::Human if !cli.quiet => eprintln!("error: {}", error),
        OutputFormat::Human => {}
    }
    exit_with(error.exit_code())
}

/// Whether the raw arguments ask for `--format json`
fn requests_json<I>(args: I) -> bool
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--format=json" => return true,
            "--format" if args.next().is_some_and(|v| v == "json") => return true,
            _ => {}
        }
    }
    false
}
