//! Catalog use-case service.
//!
//! # Responsibility
//! - Hold the authoritative, insertion-ordered record set.
//! - Enforce catalog-number uniqueness and mediate circulation changes.
//! - Persist the full set through a [`RecordStore`] after mutations.
//!
//! # Invariants
//! - At most one record per catalog number.
//! - `index[n]` always points at the record whose catalog number is `n`.
//! - A failed save never rolls back in-memory state; it marks the catalog dirty.
//! - Records leave the catalog only as shared references.

use crate::config::{CatalogConfig, CorruptStorePolicy, EmptyQueryPolicy};
use crate::model::record::{Record, RecordValidationError};
use crate::repo::record_repo::{MemoryRecordStore, RecordStore, RepoError, SqliteRecordStore};
use log::{error, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog-level error taxonomy.
#[derive(Debug)]
pub enum CatalogError {
    Validation(RecordValidationError),
    DuplicateKey(String),
    /// The durable copy may be stale; in-memory state is still authoritative.
    Persistence(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateKey(number) => {
                write!(f, "a record with catalog number `{number}` already exists")
            }
            Self::Persistence(err) => write!(f, "catalog store error: {err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::DuplicateKey(_) => None,
            Self::Persistence(err) => Some(err),
        }
    }
}

impl From<RecordValidationError> for CatalogError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        Self::Persistence(value)
    }
}

/// Outcome of a catalog-mediated circulation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed and the catalog was saved.
    Applied,
    /// Record already in the target state; nothing written.
    Unchanged,
    /// No record with that catalog number.
    NotFound,
}

/// In-memory catalog backed by a durable record store.
pub struct Catalog<S: RecordStore> {
    store: S,
    records: Vec<Record>,
    index: HashMap<String, usize>,
    config: CatalogConfig,
    dirty: bool,
}

impl Catalog<MemoryRecordStore> {
    /// Creates an empty catalog over a throwaway in-memory store.
    pub fn in_memory(config: CatalogConfig) -> Self {
        Self {
            store: MemoryRecordStore::new(),
            records: Vec::new(),
            index: HashMap::new(),
            config,
            dirty: false,
        }
    }
}

impl<S: RecordStore> Catalog<S> {
    /// Builds a catalog from everything currently in `store`.
    ///
    /// # Errors
    /// - `CatalogError::Persistence` when the store cannot be read or holds
    ///   invalid or duplicate records.
    pub fn load(store: S, config: CatalogConfig) -> CatalogResult<Self> {
        let records = match store.load_all() {
            Ok(records) => records,
            Err(err) => {
                error!(
                    "event=catalog_load module=catalog status=error error_code=store_read_failed error={}",
                    err
                );
                return Err(err.into());
            }
        };

        let mut index = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if index
                .insert(record.catalog_number().to_string(), position)
                .is_some()
            {
                error!(
                    "event=catalog_load module=catalog status=error error_code=duplicate_key catalog_number={}",
                    record.catalog_number()
                );
                return Err(RepoError::InvalidData(format!(
                    "duplicate catalog number `{}` in store",
                    record.catalog_number()
                ))
                .into());
            }
        }

        info!(
            "event=catalog_load module=catalog status=ok records={}",
            records.len()
        );
        Ok(Self {
            store,
            records,
            index,
            config,
            dirty: false,
        })
    }

    /// Adds a record under its catalog number.
    ///
    /// # Errors
    /// - `DuplicateKey` when the number exists; the catalog is unchanged.
    /// - `Persistence` when `persist_on_add` is set and the save fails; the
    ///   record stays in memory and the catalog is marked dirty.
    pub fn add(&mut self, record: Record) -> CatalogResult<()> {
        if self.index.contains_key(record.catalog_number()) {
            warn!(
                "event=record_add module=catalog status=rejected error_code=duplicate_key catalog_number={}",
                record.catalog_number()
            );
            return Err(CatalogError::DuplicateKey(
                record.catalog_number().to_string(),
            ));
        }

        self.index
            .insert(record.catalog_number().to_string(), self.records.len());
        info!(
            "event=record_add module=catalog status=ok catalog_number={}",
            record.catalog_number()
        );
        self.records.push(record);
        self.dirty = true;

        if self.config.persist_on_add {
            self.save()?;
        }
        Ok(())
    }

    /// Validates the three identifying fields and adds the resulting record.
    pub fn add_new(
        &mut self,
        title: impl Into<String>,
        author: impl Into<String>,
        catalog_number: impl Into<String>,
    ) -> CatalogResult<()> {
        let record = Record::new(title, author, catalog_number)?;
        self.add(record)
    }

    /// Exact lookup by catalog number (surrounding whitespace ignored).
    pub fn search_by_catalog_number(&self, catalog_number: &str) -> Option<&Record> {
        self.index
            .get(catalog_number.trim())
            .and_then(|&position| self.records.get(position))
    }

    /// Case-insensitive title substring search in insertion order.
    ///
    /// Blank queries follow `CatalogConfig::empty_title_query`.
    pub fn search_by_title(&self, query: &str) -> Vec<&Record> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return match self.config.empty_title_query {
                EmptyQueryPolicy::MatchAll => self.records.iter().collect(),
                EmptyQueryPolicy::MatchNone => Vec::new(),
            };
        }

        self.records
            .iter()
            .filter(|record| record.title().to_lowercase().contains(&needle))
            .collect()
    }

    /// One summary line per record, in insertion order.
    pub fn display_all(&self) -> Vec<String> {
        self.records.iter().map(Record::summary).collect()
    }

    /// Issues the record with `catalog_number`, saving when the state changes.
    pub fn issue_by_key(&mut self, catalog_number: &str) -> CatalogResult<Transition> {
        self.transition(catalog_number, "record_issue", Record::issue)
    }

    /// Returns the record with `catalog_number`, saving when the state changes.
    pub fn return_by_key(&mut self, catalog_number: &str) -> CatalogResult<Transition> {
        self.transition(catalog_number, "record_return", Record::return_record)
    }

    /// Writes the full record set to the store, replacing prior contents.
    ///
    /// # Errors
    /// - `Persistence` on store failure. In-memory state is kept and the
    ///   catalog stays dirty until a later save succeeds.
    pub fn save(&mut self) -> CatalogResult<()> {
        match self.store.replace_all(&self.records) {
            Ok(()) => {
                self.dirty = false;
                info!(
                    "event=catalog_save module=catalog status=ok records={}",
                    self.records.len()
                );
                Ok(())
            }
            Err(err) => {
                self.dirty = true;
                error!(
                    "event=catalog_save module=catalog status=error error_code=store_write_failed records={} error={}",
                    self.records.len(),
                    err
                );
                Err(err.into())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Whether in-memory state differs from the last successful save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Test support: inspect the backing store.
    #[doc(hidden)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Test support: reconfigure the backing store (e.g. reject writes).
    /// Callers must not write records through it.
    #[doc(hidden)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn transition(
        &mut self,
        catalog_number: &str,
        event: &str,
        apply: fn(&mut Record) -> bool,
    ) -> CatalogResult<Transition> {
        let key = catalog_number.trim();
        let Some(&position) = self.index.get(key) else {
            info!("event={event} module=catalog status=not_found catalog_number={key}");
            return Ok(Transition::NotFound);
        };
        let Some(record) = self.records.get_mut(position) else {
            return Err(RepoError::InvalidData(format!(
                "index points past record set for `{key}`"
            ))
            .into());
        };

        if !apply(record) {
            info!("event={event} module=catalog status=unchanged catalog_number={key}");
            return Ok(Transition::Unchanged);
        }

        info!("event={event} module=catalog status=ok catalog_number={key}");
        self.dirty = true;
        self.save()?;
        Ok(Transition::Applied)
    }
}

/// Opens the file-backed catalog at `path`.
///
/// A missing file yields an empty catalog. A present-but-unreadable file is
/// handled per `config.on_corrupt_store`: `Fail` returns the error, while
/// `StartEmpty` renames the file to `<name>.corrupt-<unix_seconds>` and starts
/// over with an empty store.
///
/// # Errors
/// - `Persistence` for unreadable stores under `Fail`, newer schema versions,
///   or file-system failures while quarantining.
pub fn open_catalog(
    path: impl AsRef<Path>,
    config: CatalogConfig,
) -> CatalogResult<Catalog<SqliteRecordStore>> {
    let path = path.as_ref();
    match open_and_load(path, config.clone()) {
        Err(CatalogError::Persistence(err))
            if err.is_corrupt_store()
                && config.on_corrupt_store == CorruptStorePolicy::StartEmpty =>
        {
            let quarantined = quarantine_store(path)?;
            warn!(
                "event=catalog_recover module=catalog status=start_empty store={} quarantined={} error={}",
                path.display(),
                quarantined.display(),
                err
            );
            open_and_load(path, config)
        }
        other => other,
    }
}

fn open_and_load(path: &Path, config: CatalogConfig) -> CatalogResult<Catalog<SqliteRecordStore>> {
    let store = SqliteRecordStore::open(path)?;
    Catalog::load(store, config)
}

fn quarantine_store(path: &Path) -> Result<PathBuf, RepoError> {
    let file_name = path.file_name().ok_or_else(|| {
        RepoError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("store path `{}` has no file name", path.display()),
        ))
    })?;
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();

    // Earlier quarantined files are never overwritten.
    let mut attempt = 0_u32;
    let target = loop {
        let mut target_name = file_name.to_os_string();
        target_name.push(format!(".corrupt-{seconds}"));
        if attempt > 0 {
            target_name.push(format!("-{attempt}"));
        }
        let candidate = path.with_file_name(target_name);
        if !candidate.exists() {
            break candidate;
        }
        attempt += 1;
    };

    std::fs::rename(path, &target)?;
    Ok(target)
}
