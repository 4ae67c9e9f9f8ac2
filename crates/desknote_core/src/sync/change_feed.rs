//! Durable relay of note events between processes sharing one store.
//!
//! # Responsibility
//! - Record locally published events in the store's change log with this
//!   process's origin id.
//! - On poll, republish events recorded by other origins on the local bus.
//!
//! # Invariants
//! - Events from this feed's own origin are never replayed locally.
//! - The cursor starts at the log head at construction; history is not replayed.
//! - Polling is explicit; nothing runs in the background.

use crate::repo::note_store::{ChangeLog, StoreResult};
use crate::sync::bus::{NoteEvent, SyncBus};
use log::{debug, warn};
use std::sync::Mutex;
use uuid::Uuid;

pub struct ChangeFeed {
    origin: String,
    cursor: Mutex<i64>,
}

impl ChangeFeed {
    /// Creates a feed with a fresh origin id, positioned at the log head.
    pub fn new<L: ChangeLog + ?Sized>(log: &L) -> StoreResult<Self> {
        Ok(Self {
            origin: Uuid::new_v4().to_string(),
            cursor: Mutex::new(log.latest_change_seq()?),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Appends `event` to the durable log. Failures are logged, not returned:
    /// in-process delivery must not depend on the log write.
    pub fn record<L: ChangeLog + ?Sized>(&self, log: &L, event: &NoteEvent) -> Option<i64> {
        match log.append_change(event, &self.origin) {
            Ok(seq) => Some(seq),
            Err(err) => {
                warn!(
                    "event=change_record module=sync status=error kind={} note_id={} error={err}",
                    event.kind(),
                    event.note_id()
                );
                None
            }
        }
    }

    /// Republishes events recorded by other origins since the last poll.
    ///
    /// Returns the events that were relayed, in log order.
    pub fn poll<L: ChangeLog + ?Sized>(
        &self,
        log: &L,
        bus: &SyncBus,
    ) -> StoreResult<Vec<NoteEvent>> {
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let records = log.changes_after(*cursor)?;

        let mut relayed = Vec::new();
        for record in records {
            *cursor = record.seq;
            if record.origin == self.origin {
                continue;
            }
            bus.publish(record.event);
            relayed.push(record.event);
        }

        if !relayed.is_empty() {
            debug!(
                "event=change_poll module=sync status=ok relayed={} cursor={}",
                relayed.len(),
                *cursor
            );
        }
        Ok(relayed)
    }
}
