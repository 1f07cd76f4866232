//! Document store contract consumed by the core services.
//!
//! # Responsibility
//! - Define per-collection insert/find/update/delete primitives.
//! - Keep backend details (SQLite, in-process) behind one trait.
//!
//! # Invariants
//! - No operation spans collections atomically unless run inside
//!   [`RecordStore::atomically`] on a backend that supports it.
//! - Every stored document carries a string `_id`.
//! - Writes run collection field validation (`schema`) before persisting.

use crate::db::DbError;
use crate::model::id::RecordId;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod filter;
mod memory;
pub mod schema;
mod sqlite;

pub use filter::Filter;
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

/// Field that holds a document's id.
pub const ID_FIELD: &str = "_id";

/// Schema-flexible stored document.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// The three document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Albums,
    Songs,
    Sets,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Self::Albums, Self::Songs, Self::Sets];

    pub fn name(self) -> &'static str {
        match self {
            Self::Albums => "albums",
            Self::Songs => "songs",
            Self::Sets => "sets",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure surfaced by a store backend.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// A stored field failed collection validation.
    SchemaViolation {
        collection: Collection,
        field: String,
        message: String,
    },
    DuplicateId {
        collection: Collection,
        id: String,
    },
    /// Persisted data could not be decoded.
    InvalidData(String),
    Serialization(serde_json::Error),
    /// Backend not reachable or otherwise out of service.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::SchemaViolation {
                collection,
                field,
                message,
            } => write!(f, "{collection}.{field} failed validation: {message}"),
            Self::DuplicateId { collection, id } => {
                write!(f, "duplicate id `{id}` in {collection}")
            }
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
            Self::Unavailable(message) => write!(f, "record store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Outcome of a delete call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub matched_count: usize,
    pub deleted_count: usize,
}

/// An id-array field that points into another collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub collection: Collection,
}

/// Read options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Id-array fields to replace with the referenced documents.
    pub resolve: Vec<Reference>,
}

impl FindOptions {
    pub fn resolving(field: &'static str, collection: Collection) -> Self {
        Self {
            resolve: vec![Reference { field, collection }],
        }
    }
}

/// Store capability handed to every core component.
///
/// Implementations must be usable through a shared reference; the blanket
/// impl for `&T` lets several services share one store.
pub trait RecordStore {
    /// Inserts one document, generating `_id` when absent.
    fn insert(&self, collection: Collection, doc: Document) -> StoreResult<Document>;

    /// Best-effort bulk insert with one outcome per input, in order.
    fn insert_many(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Vec<StoreResult<Document>> {
        docs.into_iter()
            .map(|doc| self.insert(collection, doc))
            .collect()
    }

    fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Option<Document>>;

    /// Returns matching documents in insertion order.
    fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    /// Shallow-merges `patch` into the document with `id`.
    ///
    /// Returns `None` when no such document exists. `_id` in the patch is ignored.
    fn update_one(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> StoreResult<Option<Document>>;

    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<DeleteSummary>;

    fn delete_many(&self, collection: Collection, filter: &Filter)
        -> StoreResult<DeleteSummary>;

    fn count(&self, collection: Collection) -> StoreResult<usize> {
        Ok(self
            .find_many(collection, &Filter::All, &FindOptions::default())?
            .len())
    }

    /// Runs `f` so that its writes commit or roll back together.
    ///
    /// The default runs `f` directly with no atomicity.
    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        f()
    }
}

impl<S: RecordStore> RecordStore for &S {
    fn insert(&self, collection: Collection, doc: Document) -> StoreResult<Document> {
        (**self).insert(collection, doc)
    }

    fn insert_many(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Vec<StoreResult<Document>> {
        (**self).insert_many(collection, docs)
    }

    fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one(collection, filter, options)
    }

    fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        (**self).find_many(collection, filter, options)
    }

    fn update_one(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        (**self).update_one(collection, id, patch)
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<DeleteSummary> {
        (**self).delete_one(collection, filter)
    }

    fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<DeleteSummary> {
        (**self).delete_many(collection, filter)
    }

    fn count(&self, collection: Collection) -> StoreResult<usize> {
        (**self).count(collection)
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        (**self).atomically(f)
    }
}

/// Reads a document's id.
pub fn document_id(doc: &Document) -> Option<RecordId> {
    doc.get(ID_FIELD)
        .and_then(Value::as_str)
        .map(RecordId::new)
}

/// Makes sure `doc` has an `_id`, generating one if needed, and returns it.
pub(crate) fn ensure_id(collection: Collection, doc: &mut Document) -> StoreResult<RecordId> {
    match doc.get(ID_FIELD) {
        None | Some(Value::Null) => {
            let id = RecordId::generate();
            doc.insert(ID_FIELD.to_string(), Value::String(id.as_str().to_string()));
            Ok(id)
        }
        Some(Value::String(raw)) if !raw.trim().is_empty() => Ok(RecordId::new(raw.clone())),
        Some(_) => Err(StoreError::SchemaViolation {
            collection,
            field: ID_FIELD.to_string(),
            message: "must be a non-empty string".to_string(),
        }),
    }
}

/// Shallow merge used by every backend's `update_one`.
pub(crate) fn merge_patch(target: &mut Document, patch: Document) {
    for (field, value) in patch {
        if field == ID_FIELD {
            continue;
        }
        target.insert(field, value);
    }
}

/// Replaces id arrays named in `options` with the referenced documents.
///
/// Dangling ids are dropped; order of the remaining references is kept.
pub(crate) fn resolve_references<S: RecordStore>(
    store: &S,
    docs: &mut [Document],
    options: &FindOptions,
) -> StoreResult<()> {
    for reference in &options.resolve {
        let mut wanted: Vec<RecordId> = Vec::new();
        for doc in docs.iter() {
            wanted.extend(reference_ids(doc, reference.field));
        }
        if wanted.is_empty() {
            continue;
        }

        let targets = store.find_many(
            reference.collection,
            &Filter::ids(&wanted),
            &FindOptions::default(),
        )?;
        let by_id: HashMap<String, Document> = targets
            .into_iter()
            .filter_map(|target| document_id(&target).map(|id| (id.normalized(), target)))
            .collect();

        for doc in docs.iter_mut() {
            let resolved: Vec<Value> = reference_ids(doc, reference.field)
                .iter()
                .filter_map(|id| by_id.get(&id.normalized()).cloned())
                .map(Value::Object)
                .collect();
            if doc.contains_key(reference.field) {
                doc.insert(reference.field.to_string(), Value::Array(resolved));
            }
        }
    }
    Ok(())
}

fn reference_ids(doc: &Document, field: &str) -> Vec<RecordId> {
    doc.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(RecordId::new)
                .collect()
        })
        .unwrap_or_default()
}
