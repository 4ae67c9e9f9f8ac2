//! Interfaces to collaborators outside the note engine.
//!
//! # Responsibility
//! - Define what controllers need from the live widget, the file system,
//!   the external editor and the file picker.
//! - Provide default std-backed implementations where one exists.
//!
//! # Invariants
//! - No collaborator failure is fatal to a controller; every failure maps to
//!   a presentable `NoteContent` or a logged report.

pub mod editor;
pub mod files;
pub mod surface;

pub use editor::{CommandEditorLauncher, EditorLauncher, LaunchError};
pub use files::{
    ensure_file_exists, ContentError, FilePicker, FileSource, FsFileSource, PickError,
};
pub use surface::{CursorHint, NoteContent, NoteSurface, PLACEHOLDER_TEXT};
