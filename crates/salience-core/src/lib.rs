//! Salience Core Library
//!
//! Lifecycle engine for a decaying personal note store: salience scoring,
//! budgeted selection, archival, consolidation and periodic synthesis.

pub mod archive;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod logging;
pub mod maintenance;
pub mod note;
pub mod reinforcement;
pub mod scoring;
pub mod selection;
pub mod store;
pub mod synthesis;
pub mod text;
pub mod usage;
