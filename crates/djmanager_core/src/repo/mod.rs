//! Typed collection access over the document store.
//!
//! # Responsibility
//! - Convert between domain records and store documents.
//! - Expose the collection-scoped queries the services need.
//!
//! # Invariants
//! - Documents that fail to decode surface as `StoreError::InvalidData`,
//!   never as a silently skipped record.

use crate::store::{document_id, Collection, Document, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub mod album_repo;
pub mod set_repo;
pub mod song_repo;

pub(crate) fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::InvalidData(format!(
            "record serialized to a non-object value: {other}"
        ))),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(
    collection: Collection,
    doc: Document,
) -> StoreResult<T> {
    let id = document_id(&doc).map_or_else(|| "<missing>".to_string(), |id| id.to_string());
    serde_json::from_value(Value::Object(doc)).map_err(|err| {
        StoreError::InvalidData(format!("{collection} document `{id}` does not decode: {err}"))
    })
}

pub(crate) fn from_documents<T: DeserializeOwned>(
    collection: Collection,
    docs: Vec<Document>,
) -> StoreResult<Vec<T>> {
    docs.into_iter()
        .map(|doc| from_document(collection, doc))
        .collect()
}
