//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted `Note` entity and its value types.
//! - Define typed create/update payloads (`PartialNote`, `PartialFields`).
//!
//! # Invariants
//! - Every `Note` field has a total default; only `filepath` may be unset.
//! - Numeric fields are clamped into range by `clamp_*` helpers before persistence.

pub mod color;
pub mod note;
