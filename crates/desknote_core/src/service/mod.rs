//! Note engine services.
//!
//! # Responsibility
//! - Placement of new notes, geometry gestures, and style edit sessions.
//! - Per-widget lifecycle controllers, the process host, and the
//!   management view.
//! - Keep surfaces and collaborators behind traits so every service runs
//!   without a GUI toolkit.

pub mod geometry;
pub mod host;
pub mod instance;
pub mod overview;
pub mod placement;
pub mod style_session;
