//! Domain model for the circulation catalog.
//!
//! # Responsibility
//! - Define the canonical record shape shared by catalog, storage and CLI.
//!
//! # Invariants
//! - Every record is identified by a unique, immutable catalog number.
//! - Records are never hard-deleted through the exposed surface.

pub mod record;
