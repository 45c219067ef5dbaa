//! Store layout and discovery

use std::env;
use std::path::PathBuf;

/// Engine configuration file
pub const CONFIG_FILE: &str = "config.toml";

/// Live per-source record files
pub const NOTES_DIR: &str = "notes";

/// Archived records, one file per live source file
pub const ARCHIVE_DIR: &str = "archive";

/// Weekly/monthly synthesis streams
pub const SYNTHESIS_DIR: &str = "synthesis";

/// Persisted engine state
pub const STATE_DIR: &str = "state";

/// Usage statistics, under `STATE_DIR`
pub const USAGE_FILE: &str = "usage.json";

/// Maintenance gate, under `STATE_DIR`
pub const MAINTENANCE_FILE: &str = "maintenance.json";

/// Record file extension
pub const RECORD_EXT: &str = "jsonl";

/// Source name used for consolidation products
pub const CONSOLIDATED_SOURCE: &str = "consolidated";

/// Source name used when a note carries no machine tag
pub const DEFAULT_SOURCE: &str = "default";

/// Environment variable overriding the store location
pub const STORE_ENV: &str = "SALIENCE_STORE";

/// Suffix of in-flight temporary files
pub const TEMP_SUFFIX: &str = "tmp";

/// Suffix of rollback copies
pub const BACKUP_SUFFIX: &str = "bak";

/// Resolve the store root: explicit path, then `SALIENCE_STORE`, then the
/// platform data directory.
pub fn resolve_store_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = env::var(STORE_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::data_dir()
        .map(|d| d.join("salience"))
        .unwrap_or_else(|| PathBuf::from(".salience"))
}

/// File name for a source tag
pub fn source_file_name(source: &str) -> String {
    let slug = slug::slugify(source);
    let stem = if slug.is_empty() {
        DEFAULT_SOURCE.to_string()
    } else {
        slug
    };
    format!("{}.{}", stem, RECORD_EXT)
}
