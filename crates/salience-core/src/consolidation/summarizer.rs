//! External summarizer seam
//!
//! Consolidation never talks to a model directly. It hands a prompt to a
//! [`Summarizer`] and gets text back; the bundled [`CommandSummarizer`] runs a
//! configured program with the prompt on stdin and reads its stdout.

use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SummarizerConfig;
use crate::error::{Result, SalienceError};

/// How often a running summarizer process is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Merges prompt text into a summary. Must return within `timeout` or fail.
pub trait Summarizer {
    fn summarize(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

/// Runs an external program as the summarizer
#[derive(Debug, Clone)]
pub struct CommandSummarizer {
    program: String,
    args: Vec<String>,
}

impl CommandSummarizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The configured summarizer, if a command is set
    pub fn from_config(config: &SummarizerConfig) -> Option<Self> {
        config
            .command
            .as_ref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| Self::new(c.clone(), config.args.clone()))
    }

    fn spawn(&self) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SalienceError::Summarizer(format!("failed to start {}: {}", self.program, e)))
    }
}

impl Summarizer for CommandSummarizer {
    #[tracing::instrument(skip(self, prompt), fields(program = %self.program, prompt_len = prompt.len()))]
    fn summarize(&self, prompt: &str, timeout: Duration) -> Result<String> {
        let mut child = self.spawn()?;

        // Feed stdin and drain stdout/stderr on their own threads so a chatty
        // child cannot block on a full pipe while we wait on it
        let stdin = child.stdin.take();
        let input = prompt.to_string();
        let writer = thread::spawn(move || {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(input.as_bytes());
            }
        });
        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + timeout;
        let timed_out = || {
            tracing::warn!(seconds = timeout.as_secs(), "summarizer timed out");
            SalienceError::SummarizerTimeout {
                seconds: timeout.as_secs(),
            }
        };

        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(timed_out());
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Detached, a descendant may hold stdin open without reading it
        drop(writer);

        // A descendant that inherited stdout keeps the pipe open after the
        // child itself exits, so reads share the same deadline
        let output = drain(stdout.as_ref(), deadline).ok_or_else(timed_out)?;
        let errors = drain(stderr.as_ref(), deadline).ok_or_else(timed_out)?;

        if !status.success() {
            return Err(SalienceError::Summarizer(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                errors.trim()
            )));
        }

        Ok(output)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Everything a reader collected, or `None` if the pipe is still open at `deadline`
fn drain(reader: Option<&Receiver<String>>, deadline: Instant) -> Option<String> {
    let Some(reader) = reader else {
        return Some(String::new());
    };
    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => Some(text),
        Err(RecvTimeoutError::Disconnected) => Some(String::new()),
        Err(RecvTimeoutError::Timeout) => None,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandSummarizer {
        CommandSummarizer::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[test]
    fn test_prompt_round_trips_through_stdin() {
        let out = sh("cat").summarize("hello\n", Duration::from_secs(5)).unwrap();
        assert_eq!(out, "hello\n");
    }

    #[test]
    fn test_nonzero_exit_is_error() {
        let err = sh("echo nope >&2; exit 3")
            .summarize("", Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, SalienceError::Summarizer(ref m) if m.contains("nope")));
    }

    #[test]
    fn test_timeout_kills_child() {
        let start = Instant::now();
        let err = sh("sleep 5")
            .summarize("", Duration::from_millis(200))
            .unwrap_err();
        assert!(matches!(err, SalienceError::SummarizerTimeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_timeout_covers_inherited_stdout() {
        // The shell exits at once but its background job keeps stdout open
        let start = Instant::now();
        let err = sh("sleep 6 & echo body")
            .summarize("", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, SalienceError::SummarizerTimeout { seconds: 1 }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_from_config_requires_command() {
        assert!(CommandSummarizer::from_config(&SummarizerConfig::default()).is_none());
        let config = SummarizerConfig {
            command: Some("summarize".into()),
            ..Default::default()
        };
        assert!(CommandSummarizer::from_config(&config).is_some());
    }
}
