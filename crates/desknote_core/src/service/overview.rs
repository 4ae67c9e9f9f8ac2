//! "All notes" management view model.
//!
//! Lists every note and offers status toggling and deletion. It talks to
//! instances only through the store and the bus.

use crate::context::NoteContext;
use crate::model::note::{NoteId, NoteStatus, PartialFields};
use crate::repo::note_store::{StoreError, StoreResult};
use crate::sync::{NoteEvent, Subscription};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

/// One listed note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverviewRow {
    pub id: NoteId,
    pub filepath: Option<PathBuf>,
    pub status: NoteStatus,
}

impl OverviewRow {
    /// File name, or a marker for unbound notes.
    pub fn label(&self) -> String {
        match self.filepath.as_deref() {
            Some(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            None => "(no file)".to_string(),
        }
    }
}

pub struct NotesOverview {
    ctx: NoteContext,
    rows: Vec<OverviewRow>,
    subscription: Subscription,
}

impl NotesOverview {
    pub fn open(ctx: NoteContext) -> StoreResult<Self> {
        let subscription = ctx.bus().subscribe_all();
        let mut overview = Self {
            ctx,
            rows: Vec::new(),
            subscription,
        };
        overview.refresh()?;
        Ok(overview)
    }

    pub fn rows(&self) -> &[OverviewRow] {
        &self.rows
    }

    pub fn refresh(&mut self) -> StoreResult<()> {
        self.rows = self
            .ctx
            .store()
            .list_all()?
            .into_iter()
            .map(|note| OverviewRow {
                id: note.id,
                filepath: note.filepath,
                status: note.status,
            })
            .collect();
        Ok(())
    }

    pub fn set_status(&mut self, id: NoteId, status: NoteStatus) -> StoreResult<()> {
        self.ctx.store().update(id, &PartialFields::status(status))?;
        self.ctx.publish(NoteEvent::StatusChanged {
            note_id: id,
            status,
        });
        info!("event=overview_set_status module=service status=ok note_id={id} visibility={status}");
        self.refresh()
    }

    pub fn toggle_status(&mut self, id: NoteId) -> StoreResult<NoteStatus> {
        let note = self.ctx.store().get(id)?.ok_or(StoreError::NotFound(id))?;
        let next = note.status.toggled();
        self.set_status(id, next)?;
        Ok(next)
    }

    pub fn delete(&mut self, id: NoteId) -> StoreResult<()> {
        self.ctx.store().delete(id)?;
        self.ctx.publish(NoteEvent::NoteDeleted { note_id: id });
        info!("event=overview_delete module=service status=ok note_id={id}");
        self.refresh()
    }

    /// Drains bus events and refreshes the listing when any arrived.
    ///
    /// Returns whether the listing was refreshed.
    pub fn pump_events(&mut self) -> StoreResult<bool> {
        if self.subscription.drain().is_empty() {
            return Ok(false);
        }
        self.refresh()?;
        Ok(true)
    }
}
