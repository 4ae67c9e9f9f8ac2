//! Style edit transaction with preview, commit and revert.
//!
//! # Responsibility
//! - Snapshot a note's style on open and stage edits in a working copy.
//! - Push previews to the live surface without touching the store.
//!
//! # Invariants
//! - At most one open session per note id across every holder of the same
//!   `SessionRegistry`.
//! - After `commit`, store and surface both present `working`.
//! - After `cancel`, store and surface both present the style seen at `open`.

use crate::external::surface::NoteSurface;
use crate::model::color::Color;
use crate::model::note::{clamp_margin, clamp_transparency, NoteId, NoteStyle, PartialFields};
use crate::repo::note_store::{NoteStore, StoreError};
use log::{debug, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
pub enum StyleSessionError {
    /// A session for this note is already open.
    Conflict(NoteId),
    NotFound(NoteId),
    /// Preview value rejected; nothing changed.
    InvalidValue(String),
    Store(StoreError),
}

impl Display for StyleSessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Conflict(id) => write!(f, "style session already open for note {id}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
            Self::InvalidValue(message) => write!(f, "invalid style value: {message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StyleSessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for StyleSessionError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Tracks which note ids currently have an open session.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    open: Arc<Mutex<HashSet<NoteId>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, id: NoteId) -> bool {
        self.lock().contains(&id)
    }

    fn acquire(&self, id: NoteId) -> Result<SessionSlot, StyleSessionError> {
        if !self.lock().insert(id) {
            return Err(StyleSessionError::Conflict(id));
        }
        Ok(SessionSlot {
            registry: self.clone(),
            id,
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<NoteId>> {
        self.open
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the registry entry when the session ends, however it ends.
#[derive(Debug)]
struct SessionSlot {
    registry: SessionRegistry,
    id: NoteId,
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.registry.lock().remove(&self.id);
    }
}

/// One field-level style edit.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleChange {
    /// Clamped to `[0.0, 1.0]`; non-finite values are rejected.
    Transparency(f64),
    /// `#RGB` or `#RRGGBB`.
    BackgroundColor(String),
    /// Clamped to `[0, MAX_MARGIN]`.
    Margin(i64),
}

#[derive(Debug)]
pub struct StyleEditSession {
    id: NoteId,
    original: NoteStyle,
    working: NoteStyle,
    _slot: SessionSlot,
}

impl StyleEditSession {
    /// Opens a session, snapshotting the stored style.
    ///
    /// # Errors
    /// - `Conflict` when another session for `id` is open.
    /// - `NotFound` when `id` does not exist.
    pub fn open(
        store: &dyn NoteStore,
        sessions: &SessionRegistry,
        id: NoteId,
    ) -> Result<Self, StyleSessionError> {
        let slot = sessions.acquire(id)?;
        let note = store.get(id)?.ok_or(StyleSessionError::NotFound(id))?;
        debug!("event=style_session_open module=service status=ok note_id={id}");
        Ok(Self {
            id,
            original: note.style,
            working: note.style,
            _slot: slot,
        })
    }

    pub fn note_id(&self) -> NoteId {
        self.id
    }

    pub fn original(&self) -> NoteStyle {
        self.original
    }

    pub fn working(&self) -> NoteStyle {
        self.working
    }

    /// Stages one change and applies the working style to `surface`.
    ///
    /// Rejected values leave both the working copy and the surface untouched.
    pub fn preview_change(
        &mut self,
        change: StyleChange,
        surface: &mut dyn NoteSurface,
    ) -> Result<NoteStyle, StyleSessionError> {
        let mut next = self.working;
        match change {
            StyleChange::Transparency(value) => {
                if !value.is_finite() {
                    return Err(StyleSessionError::InvalidValue(format!(
                        "transparency {value}"
                    )));
                }
                next.transparency = clamp_transparency(value);
            }
            StyleChange::BackgroundColor(text) => {
                next.background_color = text
                    .parse::<Color>()
                    .map_err(|err| StyleSessionError::InvalidValue(err.to_string()))?;
            }
            StyleChange::Margin(value) => {
                let bounded = value.clamp(0, i64::from(u32::MAX));
                next.margin = clamp_margin(u32::try_from(bounded).unwrap_or(u32::MAX));
            }
        }

        self.working = next;
        surface.apply_style(&self.working);
        Ok(self.working)
    }

    /// Persists the working style. The surface already shows it.
    pub fn commit(self, store: &dyn NoteStore) -> Result<NoteStyle, StyleSessionError> {
        store.update(self.id, &PartialFields::style(self.working))?;
        info!(
            "event=style_session_commit module=service status=ok note_id={}",
            self.id
        );
        Ok(self.working)
    }

    /// Restores the original style on the surface and writes it back to the store.
    pub fn cancel(
        self,
        store: &dyn NoteStore,
        surface: &mut dyn NoteSurface,
    ) -> Result<NoteStyle, StyleSessionError> {
        surface.apply_style(&self.original);
        store.update(self.id, &PartialFields::style(self.original))?;
        info!(
            "event=style_session_cancel module=service status=ok note_id={}",
            self.id
        );
        Ok(self.original)
    }
}
