//! Note synchronization between controllers.
//!
//! # Responsibility
//! - Fan out note-id scoped events to in-process subscribers (`SyncBus`).
//! - Relay the same events across processes through the store's change log
//!   (`ChangeFeed`).
//!
//! # Invariants
//! - Components never hold back-references to siblings; they only publish
//!   and subscribe by note id.

pub mod bus;
pub mod change_feed;

pub use bus::{NoteEvent, Subscription, SyncBus};
pub use change_feed::ChangeFeed;
