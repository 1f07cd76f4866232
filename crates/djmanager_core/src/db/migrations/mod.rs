//! Versioned schema of the `documents` table.
//!
//! Step `n` of [`STEPS`] moves `PRAGMA user_version` from `n - 1` to `n`.
//! Pending steps run in one transaction. After any upgrade the table is
//! checked against [`DOCUMENT_COLUMNS`], so a file whose version claims to
//! be current but whose table is not usable fails at open time.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;
use std::collections::HashSet;

/// Table that holds every collection.
pub const DOCUMENTS_TABLE: &str = "documents";

/// Columns `SqliteRecordStore` reads or writes.
pub const DOCUMENT_COLUMNS: &[&str] = &[
    "seq",
    "collection",
    "id",
    "body",
    "created_at",
    "updated_at",
];

/// `(step name, sql)`, in version order starting at 1.
const STEPS: &[(&str, &str)] = &[
    ("documents", include_str!("0001_documents.sql")),
    ("document_indexes", include_str!("0002_document_indexes.sql")),
];

/// Outcome of [`upgrade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaUpgrade {
    pub from: u32,
    pub to: u32,
}

/// Newest schema version this build knows.
pub fn latest_version() -> u32 {
    STEPS.len() as u32
}

/// Schema version recorded in the database file.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Runs pending steps, then verifies the `documents` columns.
pub fn upgrade(conn: &mut Connection) -> DbResult<SchemaUpgrade> {
    let from = schema_version(conn)?;
    let supported = latest_version();
    if from > supported {
        return Err(DbError::SchemaTooNew {
            found: from,
            supported,
        });
    }

    if from < supported {
        let tx = conn.transaction()?;
        for (version, &(step, sql)) in (1..).zip(STEPS).skip(from as usize) {
            tx.execute_batch(sql)
                .and_then(|()| tx.pragma_update(None, "user_version", version))
                .map_err(|source| DbError::Migration {
                    version,
                    step,
                    source,
                })?;
        }
        tx.commit()?;
    }

    check_document_columns(conn)?;
    Ok(SchemaUpgrade {
        from,
        to: supported,
    })
}

fn check_document_columns(conn: &Connection) -> DbResult<()> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let present = stmt
        .query_map([DOCUMENTS_TABLE], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    match DOCUMENT_COLUMNS
        .iter()
        .find(|column| !present.contains(**column))
    {
        Some(column) => Err(DbError::MissingColumn(*column)),
        None => Ok(()),
    }
}
