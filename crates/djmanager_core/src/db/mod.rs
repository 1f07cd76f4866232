//! SQLite bootstrap for the document store backend.
//!
//! # Responsibility
//! - Open and configure the connection that hosts the document collections.
//! - Bring the `documents` table to the schema `SqliteRecordStore` expects.
//!
//! # Invariants
//! - No document is read or written before the schema upgrade and the column
//!   check both succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// The database at `target` could not be opened or configured.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// Schema step `version` (`step`) failed; the upgrade was rolled back.
    Migration {
        version: u32,
        step: &'static str,
        source: rusqlite::Error,
    },
    /// The file was written by a build with a newer document schema.
    SchemaTooNew { found: u32, supported: u32 },
    /// `documents` lacks a column the store reads or writes.
    MissingColumn(&'static str),
    /// A statement against `documents` failed.
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => write!(f, "cannot open document store {target}: {source}"),
            Self::Migration {
                version,
                step,
                source,
            } => write!(f, "document schema step {version} ({step}) failed: {source}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "document store schema v{found} is newer than this build (v{supported})"
            ),
            Self::MissingColumn(column) => {
                write!(f, "documents table has no `{column}` column")
            }
            Self::Sqlite(err) => write!(f, "document store query failed: {err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::Sqlite(err) => Some(err),
            Self::SchemaTooNew { .. } | Self::MissingColumn(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
