//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist each collection's documents as JSON rows in `documents`.
//! - Answer id lookups by key and other filters by an ordered scan.
//!
//! # Invariants
//! - The `id` column holds the normalized id; the JSON body keeps the raw `_id`.
//! - Scans return documents in insertion (`seq`) order.
//! - Plain calls run in autocommit mode; only `atomically` opens a transaction.

use super::schema::validate_document;
use super::{
    ensure_id, merge_patch, resolve_references, Collection, DeleteSummary, Document, Filter,
    FindOptions, RecordStore, StoreError, StoreResult,
};
use crate::model::id::RecordId;
use log::{debug, warn};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;

pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn scan(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<(i64, Document)>> {
        if let Some(id) = filter.as_single_id() {
            let row = self
                .conn
                .query_row(
                    "SELECT seq, body FROM documents WHERE collection = ?1 AND id = ?2;",
                    params![collection.name(), id.normalized()],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;
            return match row {
                Some((seq, body)) => Ok(vec![(seq, parse_body(collection, &body)?)]),
                None => Ok(Vec::new()),
            };
        }

        let mut stmt = self.conn.prepare(
            "SELECT seq, body FROM documents WHERE collection = ?1 ORDER BY seq ASC;",
        )?;
        let mut rows = stmt.query([collection.name()])?;
        let mut matched = Vec::new();
        while let Some(row) = rows.next()? {
            let seq: i64 = row.get(0)?;
            let body: String = row.get(1)?;
            let doc = parse_body(collection, &body)?;
            if filter.matches(&doc) {
                matched.push((seq, doc));
            }
        }
        Ok(matched)
    }

    fn delete_seqs(&self, seqs: &[i64]) -> StoreResult<usize> {
        let mut deleted = 0;
        for seq in seqs {
            deleted += self
                .conn
                .execute("DELETE FROM documents WHERE seq = ?1;", [seq])?;
        }
        Ok(deleted)
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn insert(&self, collection: Collection, mut doc: Document) -> StoreResult<Document> {
        let id = ensure_id(collection, &mut doc)?;
        validate_document(collection, &doc)?;
        let body = serde_json::to_string(&doc)?;

        let inserted = self.conn.execute(
            "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3);",
            params![collection.name(), id.normalized(), body],
        );
        match inserted {
            Ok(_) => Ok(doc),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateId {
                    collection,
                    id: id.to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Option<Document>> {
        let Some((_, doc)) = self.scan(collection, filter)?.into_iter().next() else {
            return Ok(None);
        };
        let mut docs = [doc];
        resolve_references(self, &mut docs, options)?;
        let [doc] = docs;
        Ok(Some(doc))
    }

    fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let mut docs: Vec<Document> = self
            .scan(collection, filter)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect();
        resolve_references(self, &mut docs, options)?;
        Ok(docs)
    }

    fn update_one(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let Some((seq, mut doc)) = self.scan(collection, &Filter::id(id))?.into_iter().next()
        else {
            return Ok(None);
        };

        merge_patch(&mut doc, patch);
        validate_document(collection, &doc)?;
        let body = serde_json::to_string(&doc)?;
        self.conn.execute(
            "UPDATE documents
             SET
                body = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE seq = ?2;",
            params![body, seq],
        )?;
        Ok(Some(doc))
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<DeleteSummary> {
        let Some((seq, _)) = self.scan(collection, filter)?.into_iter().next() else {
            return Ok(DeleteSummary::default());
        };
        let deleted = self.delete_seqs(&[seq])?;
        Ok(DeleteSummary {
            matched_count: 1,
            deleted_count: deleted,
        })
    }

    fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<DeleteSummary> {
        let seqs: Vec<i64> = self
            .scan(collection, filter)?
            .into_iter()
            .map(|(seq, _)| seq)
            .collect();
        let deleted = self.delete_seqs(&seqs)?;
        Ok(DeleteSummary {
            matched_count: seqs.len(),
            deleted_count: deleted,
        })
    }

    fn count(&self, collection: Collection) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1;",
            [collection.name()],
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| StoreError::InvalidData(format!("negative row count {count}")))
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        // Nested calls join the enclosing transaction.
        if !self.conn.is_autocommit() {
            return f();
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(StoreError::from)?;
        match f() {
            Ok(value) => {
                tx.commit().map_err(StoreError::from)?;
                debug!("event=store_tx module=store status=committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!("event=store_tx module=store status=error error={rollback_err}");
                } else {
                    debug!("event=store_tx module=store status=rolled_back");
                }
                Err(err)
            }
        }
    }
}

fn parse_body(collection: Collection, body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::InvalidData(format!(
            "{collection} row holds a non-object body: {other}"
        ))),
    }
}
