//! Note store
//!
//! The store is a directory of append-only JSONL record files:
//!
//! ```text
//! <root>/
//!   config.toml
//!   notes/<source>.jsonl        live records, one file per source
//!   archive/<source>.jsonl      archived records, same names as notes/
//!   synthesis/weekly.jsonl      weekly roll-ups
//!   synthesis/monthly.jsonl     monthly roll-ups
//!   state/usage.json            usage statistics
//!   state/maintenance.json      maintenance gate
//! ```

pub mod io;
pub mod paths;
pub mod records;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::EngineConfig;
use crate::error::{Result, SalienceError};
use crate::map_io_err;
use crate::note::{NoteEntry, SynthesisLevel};
use crate::usage::UsageStats;
use paths::{
    ARCHIVE_DIR, CONFIG_FILE, MAINTENANCE_FILE, NOTES_DIR, RECORD_EXT, STATE_DIR, SYNTHESIS_DIR,
    USAGE_FILE,
};
pub use records::{RecordFile, RecordLine};

/// A record together with where it was read from
#[derive(Debug, Clone)]
pub struct LoadedNote {
    pub entry: NoteEntry,
    /// File the record lives in
    pub origin: PathBuf,
}

/// Handle to a store directory
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
    config: EngineConfig,
}

impl Store {
    /// Open an existing store
    #[tracing::instrument(skip(path), fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() || !path.join(NOTES_DIR).is_dir() {
            return Err(SalienceError::StoreNotFound {
                path: path.to_path_buf(),
            });
        }

        let config = EngineConfig::load_or_default(&path.join(CONFIG_FILE))?;

        Ok(Store {
            root: path.to_path_buf(),
            config,
        })
    }

    /// Create the store layout (idempotent; an existing config is kept)
    pub fn init(path: &Path) -> Result<Self> {
        for dir in [NOTES_DIR, ARCHIVE_DIR, SYNTHESIS_DIR, STATE_DIR] {
            let dir = path.join(dir);
            fs::create_dir_all(&dir).map_err(|e| map_io_err!("create directory", dir, e))?;
        }

        let config_path = path.join(CONFIG_FILE);
        if !config_path.exists() {
            EngineConfig::default().save(&config_path)?;
        }

        tracing::info!(path = %path.display(), "initialized store");
        Self::open(path)
    }

    /// Open a store with an explicit configuration, bypassing `config.toml`
    pub fn with_config(path: &Path, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut store = Self::open(path)?;
        store.config = config;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.root.join(NOTES_DIR)
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join(ARCHIVE_DIR)
    }

    /// Archive file paired with a live record file
    pub fn archive_path_for(&self, live: &Path) -> PathBuf {
        let name = live.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        self.archive_dir().join(name)
    }

    /// Live record file for a source tag
    pub fn source_path(&self, source: &str) -> PathBuf {
        self.notes_dir().join(paths::source_file_name(source))
    }

    /// Stream holding roll-ups of `level`
    pub fn synthesis_path(&self, level: SynthesisLevel) -> PathBuf {
        self.root
            .join(SYNTHESIS_DIR)
            .join(format!("{}.{}", level, RECORD_EXT))
    }

    pub fn usage_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(USAGE_FILE)
    }

    pub fn maintenance_path(&self) -> PathBuf {
        self.root.join(STATE_DIR).join(MAINTENANCE_FILE)
    }

    /// Live record files, sorted by name
    pub fn source_files(&self) -> Vec<PathBuf> {
        record_files_in(&self.notes_dir())
    }

    /// Read one record file, treating read failures as an empty file
    pub fn read_records(&self, path: &Path) -> RecordFile {
        let min = self.config.decay.min_salience;
        RecordFile::read(path, min).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to read records, treating as empty");
            RecordFile::empty(path)
        })
    }

    /// All active (non-archived) records: primary notes first, then roll-ups
    #[tracing::instrument(skip(self))]
    pub fn load_entries(&self) -> Vec<LoadedNote> {
        let mut files = self.source_files();
        files.push(self.synthesis_path(SynthesisLevel::Weekly));
        files.push(self.synthesis_path(SynthesisLevel::Monthly));

        let mut loaded = Vec::new();
        for path in files {
            let file = self.read_records(&path);
            loaded.extend(
                file.entries()
                    .filter(|(_, e)| !e.archived)
                    .map(|(_, e)| LoadedNote {
                        entry: e.clone(),
                        origin: path.clone(),
                    }),
            );
        }

        tracing::debug!(count = loaded.len(), "loaded entries");
        loaded
    }

    /// Roll-up records of one level
    pub fn load_synthesis(&self, level: SynthesisLevel) -> Vec<NoteEntry> {
        self.read_records(&self.synthesis_path(level))
            .entries()
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Records in the archive store
    pub fn load_archived(&self) -> Vec<NoteEntry> {
        record_files_in(&self.archive_dir())
            .iter()
            .flat_map(|path| {
                self.read_records(path)
                    .entries()
                    .map(|(_, e)| e.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Append a note to the live file for `source`
    pub fn append_note(&self, source: &str, entry: &NoteEntry) -> Result<PathBuf> {
        let path = self.source_path(source);
        io::append_lines(&path, &[serde_json::to_string(entry)?])?;
        Ok(path)
    }

    /// Append roll-up records to the stream for `level`
    pub fn append_synthesis(&self, level: SynthesisLevel, entries: &[NoteEntry]) -> Result<()> {
        let lines = entries
            .iter()
            .map(serde_json::to_string)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        io::append_lines(&self.synthesis_path(level), &lines)
    }

    /// Rewrite `path`, replacing records whose key appears in `updates`.
    ///
    /// Returns the number of lines replaced. The file is not touched when
    /// nothing matched.
    pub fn update_records(&self, path: &Path, updates: &HashMap<String, NoteEntry>) -> Result<usize> {
        let mut file = RecordFile::read(path, self.config.decay.min_salience)?;
        let mut replaced = 0;

        for line in file.lines.iter_mut() {
            let Some(key) = line.entry().map(NoteEntry::key) else {
                continue;
            };
            if let Some(updated) = updates.get(&key) {
                line.replace(updated.clone())?;
                replaced += 1;
            }
        }

        if replaced > 0 {
            io::write_atomic(path, file.render().as_bytes())?;
        }
        Ok(replaced)
    }

    pub fn load_usage(&self) -> UsageStats {
        UsageStats::load(&self.usage_path())
    }

    pub fn save_usage(&self, usage: &UsageStats) -> Result<()> {
        usage.save(&self.usage_path())
    }

    /// Find an active record by key
    pub fn find(&self, key: &str) -> Result<LoadedNote> {
        self.load_entries()
            .into_iter()
            .find(|n| n.entry.key() == key)
            .ok_or_else(|| SalienceError::NoteNotFound {
                key: key.to_string(),
            })
    }
}

/// `*.jsonl` files directly inside `dir`, sorted by name
fn record_files_in(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == RECORD_EXT))
        .collect();
    files.sort();
    files
}
