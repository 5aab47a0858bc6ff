//! Repository layer for durable record storage.
//!
//! # Responsibility
//! - Define the store contract the catalog persists through.
//! - Isolate SQLite details from catalog orchestration.
//!
//! # Invariants
//! - Store writes replace the full record set atomically.
//! - Stores return semantic errors (`InvalidData`) in addition to transport errors.

pub mod record_repo;
