//! CLI commands for salience

pub mod add;
pub mod archive;
pub mod consolidate;
pub mod dispatch;
pub mod format;
pub mod init;
pub mod list;
pub mod maintain;
pub mod reference;
pub mod select;
pub mod status;
pub mod synthesize;
pub mod watch;
