//! Catalog use-case services.
//!
//! # Responsibility
//! - Own the authoritative in-memory record set.
//! - Orchestrate persistence through repository stores.
//! - Keep CLI callers decoupled from storage details.

pub mod catalog;
