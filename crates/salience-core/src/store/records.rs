//! Line-level view of a JSONL record file
//!
//! Lines are kept verbatim so a rewrite only touches the records it changes;
//! malformed lines (for example a half-written trailing append) are skipped
//! by readers but preserved on rewrite.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::note::NoteEntry;

/// One line of a record file
#[derive(Debug, Clone)]
pub struct RecordLine {
    raw: String,
    entry: Option<NoteEntry>,
}

impl RecordLine {
    fn parse(raw: &str, min_salience: f64) -> Self {
        let entry = serde_json::from_str::<serde_json::Value>(raw)
            .ok()
            .and_then(|value| {
                let mut entry = NoteEntry::deserialize(&value).ok()?;
                entry.retain_unparsed_timestamp(&value);
                entry.normalize(min_salience);
                Some(entry)
            });
        Self {
            raw: raw.to_string(),
            entry,
        }
    }

    /// Build a line from a record
    pub fn from_entry(entry: NoteEntry) -> Result<Self> {
        Ok(Self {
            raw: serde_json::to_string(&entry)?,
            entry: Some(entry),
        })
    }

    /// Parsed record, `None` for malformed lines
    pub fn entry(&self) -> Option<&NoteEntry> {
        self.entry.as_ref()
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Swap in an updated record, re-serializing the line
    pub fn replace(&mut self, entry: NoteEntry) -> Result<()> {
        self.raw = serde_json::to_string(&entry)?;
        self.entry = Some(entry);
        Ok(())
    }
}

/// A whole record file held in memory
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
    pub lines: Vec<RecordLine>,
}

impl RecordFile {
    /// Read a record file; a missing file reads as empty
    pub fn read(path: &Path, min_salience: f64) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let mut skipped = 0usize;
        let lines = content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| {
                let line = RecordLine::parse(l, min_salience);
                if line.entry.is_none() {
                    skipped += 1;
                }
                line
            })
            .collect();

        if skipped > 0 {
            tracing::debug!(path = %path.display(), skipped, "skipped malformed records");
        }

        Ok(Self {
            path: path.to_path_buf(),
            lines,
        })
    }

    /// An empty in-memory file for `path`
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed records with their line positions
    pub fn entries(&self) -> impl Iterator<Item = (usize, &NoteEntry)> {
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| line.entry().map(|e| (i, e)))
    }

    /// Serialized file contents, one record per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line.raw());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_malformed_lines_skipped_but_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        fs::write(
            &path,
            "{\"text\":\"one\"}\n{\"text\": \"trunc\n\n{\"text\":\"two\",\"extra\":1}\n",
        )
        .unwrap();

        let file = RecordFile::read(&path, 0.01).unwrap();
        assert_eq!(file.lines.len(), 3);
        assert_eq!(file.entries().count(), 2);
        assert_eq!(
            file.render(),
            "{\"text\":\"one\"}\n{\"text\": \"trunc\n{\"text\":\"two\",\"extra\":1}\n"
        );
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let file = RecordFile::read(&dir.path().join("none.jsonl"), 0.01).unwrap();
        assert!(file.lines.is_empty());
        assert_eq!(file.render(), "");
    }

    #[test]
    fn test_replace_rewrites_only_that_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        fs::write(&path, "{\"text\":\"one\"}\n{\"text\":\"two\"}\n").unwrap();

        let mut file = RecordFile::read(&path, 0.01).unwrap();
        let mut entry = file.lines[1].entry().unwrap().clone();
        entry.archived = true;
        file.lines[1].replace(entry).unwrap();

        let rendered = file.render();
        assert!(rendered.starts_with("{\"text\":\"one\"}\n"));
        assert!(rendered.contains("\"archived\":true"));
    }

    #[test]
    fn test_replace_keeps_raw_timestamps() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.jsonl");
        fs::write(
            &path,
            "{\"text\":\"one\",\"timestamp\":\"last tuesday\"}\n\
             {\"text\":\"two\",\"timestamp\":\"2026-03-01T10:00:00.250Z\"}\n",
        )
        .unwrap();

        let mut file = RecordFile::read(&path, 0.01).unwrap();
        assert!(file.lines[0].entry().unwrap().timestamp.is_none());
        for i in 0..2 {
            let mut entry = file.lines[i].entry().unwrap().clone();
            entry.reference_count += 1;
            file.lines[i].replace(entry).unwrap();
        }

        let rendered = file.render();
        assert_eq!(rendered.matches("\"timestamp\"").count(), 2);
        assert!(rendered.contains("\"timestamp\":\"last tuesday\""));
        assert!(rendered.contains("\"timestamp\":\"2026-03-01T10:00:00.250Z\""));

        // A second read sees the same records
        fs::write(&path, &rendered).unwrap();
        let again = RecordFile::read(&path, 0.01).unwrap();
        assert!(again.lines[0].entry().unwrap().timestamp.is_none());
        assert_eq!(again.render(), rendered);
    }
}
