//! Ordered schema upgrades for the note database.
//!
//! # Invariants
//! - Steps are listed in strictly increasing `version` order.
//! - The applied step is mirrored into `PRAGMA user_version` in the same
//!   transaction as its SQL.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct Step {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        version: 1,
        name: "notes",
        sql: include_str!("0001_notes.sql"),
    },
    Step {
        version: 2,
        name: "note_changes",
        sql: include_str!("0002_note_changes.sql"),
    },
];

/// Highest schema version this build can open.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to `latest_version()`. Returns how many steps ran.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    // Immediate: two hosts starting together must not both migrate.
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from: u32 = tx.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();

    if from > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&Step> = STEPS.iter().filter(|step| step.version > from).collect();
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    Ok(pending.len())
}
