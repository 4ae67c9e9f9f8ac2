//! Core state and synchronization engine for desktop sticky notes.
//! This crate is the single source of truth for note invariants.

pub mod config;
pub mod context;
pub mod db;
pub mod external;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use config::{AppConfig, ConfigError};
pub use context::NoteContext;
pub use logging::{default_log_level, init_logging, init_logging_from, logging_status};
pub use model::color::{Color, ColorParseError};
pub use model::note::{
    Note, NoteId, NoteStatus, NoteStyle, PartialFields, PartialNote, Position, Size,
};
pub use repo::note_store::{NoteStore, SqliteNoteStore, StoreError, StoreResult};
pub use service::geometry::{GeometryInteractionController, Point};
pub use service::host::{NoteHost, SurfaceFactory};
pub use service::instance::{
    ActionOutcome, Collaborators, InstanceError, InstanceState, NoteInstanceController,
    PointerOutcome,
};
pub use service::overview::{NotesOverview, OverviewRow};
pub use service::placement::next_position;
pub use service::style_session::{StyleChange, StyleEditSession, StyleSessionError};
pub use sync::{NoteEvent, SyncBus};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
