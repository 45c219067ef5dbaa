//! `salience status` command - store counts and maintenance state

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::Cli;
use crate::commands::format::{output_by_format_result, print_json};
use salience_core::error::Result;
use salience_core::maintenance::MaintenanceState;
use salience_core::note::SynthesisLevel;
use salience_core::store::Store;

#[derive(Debug, Serialize)]
struct StoreStatus {
    store: String,
    notes: usize,
    pinned: usize,
    consolidated: usize,
    weekly: usize,
    monthly: usize,
    archived: usize,
    tracked: usize,
    maintenance: MaintenanceState,
    next_due: Option<DateTime<Utc>>,
    due: bool,
}

/// Execute the status command
pub fn execute(cli: &Cli, store: &Store, now: DateTime<Utc>) -> Result<()> {
    let entries = store.load_entries();
    let primary = entries.iter().filter(|n| !n.entry.is_synthesis());
    let count_level = |level: SynthesisLevel| {
        entries
            .iter()
            .filter(|n| n.entry.synthesis_level == level)
            .count()
    };

    let config = &store.config().maintenance;
    let maintenance = MaintenanceState::load(&store.maintenance_path());

    let status = StoreStatus {
        store: store.root().display().to_string(),
        notes: primary.clone().count(),
        pinned: primary.clone().filter(|n| n.entry.pinned).count(),
        consolidated: primary.filter(|n| n.entry.is_consolidated()).count(),
        weekly: count_level(SynthesisLevel::Weekly),
        monthly: count_level(SynthesisLevel::Monthly),
        archived: store.load_archived().len(),
        tracked: store.load_usage().notes.len(),
        next_due: maintenance.next_due(config),
        due: maintenance.is_due(now, config),
        maintenance,
    };

    output_by_format_result!(cli.format,
        json => print_json(&status),
        human => {
            println!("store:        {}", status.store);
            println!(
                "notes:        {} ({} pinned, {} consolidated)",
                status.notes, status.pinned, status.consolidated
            );
            println!("roll-ups:     {} weekly, {} monthly", status.weekly, status.monthly);
            println!("archived:     {}", status.archived);
            println!("tracked:      {}", status.tracked);
            match status.maintenance.last_run {
                Some(last) => println!("last cycle:   {}", last.to_rfc3339()),
                None => println!("last cycle:   never"),
            }
            if status.due {
                println!("maintenance:  due");
            } else if let Some(due) = status.next_due {
                println!("maintenance:  next due {}", due.to_rfc3339());
            }
        }
    )
}
