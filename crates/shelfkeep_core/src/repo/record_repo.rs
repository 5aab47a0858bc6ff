//! Record store contracts and implementations.
//!
//! # Responsibility
//! - Persist and reload the full ordered record set.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `replace_all` is all-or-nothing: readers see either the previous set or
//!   the new set, never a mix.
//! - `load_all` returns records in the order they were last written.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::{open_db, DbError};
use crate::model::record::{Record, RecordValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error for record storage.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Io(std::io::Error),
    InvalidData(String),
    /// Raised by stores configured to reject writes (tests, read-only media).
    WriteRejected(String),
}

impl RepoError {
    /// Whether the store exists but cannot be trusted as a record source.
    pub fn is_corrupt_store(&self) -> bool {
        match self {
            Self::Db(err) => err.is_corruption(),
            Self::InvalidData(_) => true,
            Self::Io(_) | Self::WriteRejected(_) => false,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::WriteRejected(message) => write!(f, "store rejected write: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::InvalidData(_) | Self::WriteRejected(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Durable store holding the full ordered record set.
pub trait RecordStore {
    /// Reads every persisted record in saved order.
    fn load_all(&self) -> RepoResult<Vec<Record>>;
    /// Replaces the persisted set with `records`, preserving their order.
    fn replace_all(&mut self, records: &[Record]) -> RepoResult<()>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Wraps an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (or creates) a store file and applies migrations.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }
}

impl RecordStore for SqliteRecordStore {
    fn load_all(&self) -> RepoResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(
            "SELECT title, author, catalog_number, issued
             FROM records
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn replace_all(&mut self, records: &[Record]) -> RepoResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records;", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO records (position, catalog_number, title, author, issued)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
            )?;
            for (position, record) in (0_i64..).zip(records) {
                insert.execute(params![
                    position,
                    record.catalog_number(),
                    record.title(),
                    record.author(),
                    bool_to_int(record.is_issued()),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// In-process store used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Vec<Record>,
    reject_writes: bool,
    writes: usize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store as if `records` had been saved earlier.
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Makes every subsequent `replace_all` fail without touching contents.
    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Records as of the last successful write.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of successful `replace_all` calls.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl RecordStore for MemoryRecordStore {
    fn load_all(&self) -> RepoResult<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn replace_all(&mut self, records: &[Record]) -> RepoResult<()> {
        if self.reject_writes {
            return Err(RepoError::WriteRejected(
                "memory store is read-only".to_string(),
            ));
        }
        self.records = records.to_vec();
        self.writes += 1;
        Ok(())
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<Record> {
    let catalog_number: String = row.get("catalog_number")?;
    let issued = match row.get::<_, i64>("issued")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid issued value `{other}` for catalog number `{catalog_number}`"
            )));
        }
    };

    Record::restore(
        row.get::<_, String>("title")?,
        row.get::<_, String>("author")?,
        catalog_number.clone(),
        issued,
    )
    .map_err(|err: RecordValidationError| {
        RepoError::InvalidData(format!("record `{catalog_number}`: {err}"))
    })
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
