//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the note store contract shared by every controller.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Each store operation is atomic with respect to every other operation.
//! - Repository APIs return semantic errors (`NotFound`) separately from
//!   storage transport errors.

pub mod note_store;
