//! Record domain model.
//!
//! # Responsibility
//! - Define the single loanable catalog entry.
//! - Own the `available <-> issued` circulation state machine.
//!
//! # Invariants
//! - `title`, `author` and `catalog_number` are non-empty after trimming.
//! - Identifying fields are immutable once the record exists.
//! - `issue`/`return_record` never fail; they report whether the state changed.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Circulation state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// On the shelf and loanable.
    Available,
    /// Checked out.
    Issued,
}

impl RecordStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Issued => "Issued",
        }
    }
}

/// Construction-time validation failure for a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyTitle,
    EmptyAuthor,
    EmptyCatalogNumber,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title cannot be empty"),
            Self::EmptyAuthor => write!(f, "author cannot be empty"),
            Self::EmptyCatalogNumber => write!(f, "catalog number cannot be empty"),
        }
    }
}

impl Error for RecordValidationError {}

/// One catalog entry representing a single loanable item.
///
/// Fields are private so identity cannot be rewritten after construction;
/// only the circulation flag moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecordWire")]
pub struct Record {
    title: String,
    author: String,
    catalog_number: String,
    issued: bool,
}

/// Unvalidated wire shape used as the deserialization entry point.
#[derive(Deserialize)]
struct RecordWire {
    title: String,
    author: String,
    catalog_number: String,
    #[serde(default)]
    issued: bool,
}

impl TryFrom<RecordWire> for Record {
    type Error = RecordValidationError;

    fn try_from(value: RecordWire) -> Result<Self, Self::Error> {
        Self::restore(value.title, value.author, value.catalog_number, value.issued)
    }
}

impl Record {
    /// Creates an available record.
    ///
    /// # Errors
    /// - Returns the first empty (or whitespace-only) field, checked in
    ///   `title`, `author`, `catalog_number` order.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        catalog_number: impl Into<String>,
    ) -> Result<Self, RecordValidationError> {
        Self::restore(title, author, catalog_number, false)
    }

    /// Rebuilds a record with a known circulation flag.
    ///
    /// Used by load paths; applies the same validation as [`Record::new`].
    pub fn restore(
        title: impl Into<String>,
        author: impl Into<String>,
        catalog_number: impl Into<String>,
        issued: bool,
    ) -> Result<Self, RecordValidationError> {
        let title = normalize_field(title.into()).ok_or(RecordValidationError::EmptyTitle)?;
        let author = normalize_field(author.into()).ok_or(RecordValidationError::EmptyAuthor)?;
        let catalog_number = normalize_field(catalog_number.into())
            .ok_or(RecordValidationError::EmptyCatalogNumber)?;

        Ok(Self {
            title,
            author,
            catalog_number,
            issued,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn catalog_number(&self) -> &str {
        &self.catalog_number
    }

    pub fn is_issued(&self) -> bool {
        self.issued
    }

    pub fn status(&self) -> RecordStatus {
        if self.issued {
            RecordStatus::Issued
        } else {
            RecordStatus::Available
        }
    }

    /// Transitions `available -> issued`.
    ///
    /// Returns `false` and leaves state unchanged when already issued.
    pub fn issue(&mut self) -> bool {
        if self.issued {
            return false;
        }
        self.issued = true;
        true
    }

    /// Transitions `issued -> available`.
    ///
    /// Returns `false` and leaves state unchanged when already available.
    pub fn return_record(&mut self) -> bool {
        if !self.issued {
            return false;
        }
        self.issued = false;
        true
    }

    /// Human-readable one-line summary used by listings.
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} by {} (Catalog No: {}) - {}",
            self.title,
            self.author,
            self.catalog_number,
            self.status().label()
        )
    }
}

fn normalize_field(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() == value.len() {
        return Some(value);
    }
    Some(trimmed.to_string())
}
