//! Core domain logic for the shelfkeep circulation catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, CatalogConfig, ConfigError, CorruptStorePolicy, EmptyQueryPolicy};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::record::{Record, RecordStatus, RecordValidationError};
pub use repo::record_repo::{
    MemoryRecordStore, RecordStore, RepoError, RepoResult, SqliteRecordStore,
};
pub use service::catalog::{open_catalog, Catalog, CatalogError, CatalogResult, Transition};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
