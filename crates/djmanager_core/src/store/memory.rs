//! In-process document store.
//!
//! Collections keep insertion order. `atomically` snapshots all collections
//! and restores the snapshot when the closure fails; writes made by other
//! callers in the meantime are lost on restore, so this backend suits tests
//! and single-caller embedding.

use super::schema::validate_document;
use super::{
    document_id, ensure_id, merge_patch, resolve_references, Collection, DeleteSummary,
    Document, Filter, FindOptions, RecordStore, StoreError, StoreResult,
};
use crate::model::id::RecordId;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// One collection: documents in insertion order plus their normalized ids.
#[derive(Debug, Clone, Default)]
struct CollectionDocs {
    docs: Vec<Document>,
    ids: HashSet<String>,
}

impl CollectionDocs {
    fn remove_where(&mut self, mut pred: impl FnMut(&Document) -> bool) -> usize {
        let before = self.docs.len();
        let ids = &mut self.ids;
        self.docs.retain(|doc| {
            if !pred(doc) {
                return true;
            }
            if let Some(id) = document_id(doc) {
                ids.remove(&id.normalized());
            }
            false
        });
        before - self.docs.len()
    }
}

type Collections = BTreeMap<Collection, CollectionDocs>;

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    collections: Mutex<Collections>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn insert(&self, collection: Collection, mut doc: Document) -> StoreResult<Document> {
        let id = ensure_id(collection, &mut doc)?;
        validate_document(collection, &doc)?;

        let mut collections = self.lock()?;
        let entry = collections.entry(collection).or_default();
        if !entry.ids.insert(id.normalized()) {
            return Err(StoreError::DuplicateId {
                collection,
                id: id.to_string(),
            });
        }
        entry.docs.push(doc.clone());
        Ok(doc)
    }

    fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Option<Document>> {
        let found = {
            let collections = self.lock()?;
            collections.get(&collection).and_then(|entry| {
                if let Some(id) = filter.as_single_id() {
                    if !entry.ids.contains(&id.normalized()) {
                        return None;
                    }
                }
                entry.docs.iter().find(|doc| filter.matches(doc)).cloned()
            })
        };

        match found {
            Some(doc) => {
                let mut docs = [doc];
                resolve_references(self, &mut docs, options)?;
                let [doc] = docs;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let mut found: Vec<Document> = {
            let collections = self.lock()?;
            collections
                .get(&collection)
                .map(|entry| {
                    entry
                        .docs
                        .iter()
                        .filter(|doc| filter.matches(doc))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };
        resolve_references(self, &mut found, options)?;
        Ok(found)
    }

    fn update_one(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.lock()?;
        let Some(existing) = collections.get_mut(&collection).and_then(|entry| {
            entry
                .docs
                .iter_mut()
                .find(|doc| document_id(doc).as_ref() == Some(id))
        }) else {
            return Ok(None);
        };

        let mut merged = existing.clone();
        merge_patch(&mut merged, patch);
        validate_document(collection, &merged)?;
        *existing = merged.clone();
        Ok(Some(merged))
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<DeleteSummary> {
        let mut collections = self.lock()?;
        let Some(entry) = collections.get_mut(&collection) else {
            return Ok(DeleteSummary::default());
        };
        let mut taken = false;
        let removed = entry.remove_where(|doc| {
            if taken || !filter.matches(doc) {
                return false;
            }
            taken = true;
            true
        });
        Ok(DeleteSummary {
            matched_count: removed,
            deleted_count: removed,
        })
    }

    fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> StoreResult<DeleteSummary> {
        let mut collections = self.lock()?;
        let Some(entry) = collections.get_mut(&collection) else {
            return Ok(DeleteSummary::default());
        };
        let removed = entry.remove_where(|doc| filter.matches(doc));
        Ok(DeleteSummary {
            matched_count: removed,
            deleted_count: removed,
        })
    }

    fn count(&self, collection: Collection) -> StoreResult<usize> {
        let collections = self.lock()?;
        Ok(collections.get(&collection).map_or(0, |entry| entry.docs.len()))
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        let snapshot = self.lock()?.clone();
        let outcome = f();
        if outcome.is_err() {
            *self.lock()? = snapshot;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryRecordStore;
    use crate::model::id::RecordId;
    use crate::store::{Collection, Document, Filter, FindOptions, RecordStore, StoreError};
    use serde_json::json;

    fn song(title: &str, album_id: &str) -> Document {
        json!({"title": title, "artists": ["A"], "album_id": album_id})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn insert_generates_id_and_keeps_order() {
        let store = MemoryRecordStore::new();
        let first = store.insert(Collection::Songs, song("one", "a")).unwrap();
        store.insert(Collection::Songs, song("two", "a")).unwrap();

        assert!(first.get("_id").and_then(|id| id.as_str()).is_some());
        let all = store
            .find_many(Collection::Songs, &Filter::All, &FindOptions::default())
            .unwrap();
        let titles: Vec<_> = all.iter().map(|doc| doc["title"].clone()).collect();
        assert_eq!(titles, vec![json!("one"), json!("two")]);
    }

    #[test]
    fn update_missing_returns_none() {
        let store = MemoryRecordStore::new();
        let updated = store
            .update_one(
                Collection::Songs,
                &RecordId::new("missing"),
                serde_json::Map::new(),
            )
            .unwrap();
        assert!(updated.is_none());
    }

    #[test]
    fn atomically_restores_snapshot_on_error() {
        let store = MemoryRecordStore::new();
        store.insert(Collection::Songs, song("kept", "a")).unwrap();

        let result: Result<(), StoreError> = store.atomically(|| {
            store.insert(Collection::Songs, song("rolled back", "a"))?;
            Err(StoreError::Unavailable("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.count(Collection::Songs).unwrap(), 1);
    }

    #[test]
    fn delete_many_reports_counts() {
        let store = MemoryRecordStore::new();
        store.insert(Collection::Songs, song("one", "a")).unwrap();
        store.insert(Collection::Songs, song("two", "a")).unwrap();
        store.insert(Collection::Songs, song("three", "b")).unwrap();

        let summary = store
            .delete_many(
                Collection::Songs,
                &Filter::reference("album_id", &RecordId::new("a")),
            )
            .unwrap();
        assert_eq!(summary.deleted_count, 2);
        assert_eq!(store.count(Collection::Songs).unwrap(), 1);
    }

    #[test]
    fn insert_many_reports_each_item_and_keeps_going() {
        let store = MemoryRecordStore::new();
        let mut first = song("one", "a");
        first.insert("_id".to_string(), json!("ABCD-0001"));
        let mut clash = song("two", "a");
        clash.insert("_id".to_string(), json!("abcd0001"));

        let outcomes = store.insert_many(Collection::Songs, vec![first, clash, song("three", "a")]);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].is_ok());
        assert!(matches!(outcomes[1], Err(StoreError::DuplicateId { .. })));
        assert!(outcomes[2].is_ok());
        assert_eq!(store.count(Collection::Songs).unwrap(), 2);
    }

    #[test]
    fn deleted_id_can_be_reused() {
        let store = MemoryRecordStore::new();
        let mut doc = song("one", "a");
        doc.insert("_id".to_string(), json!("s1"));
        store.insert(Collection::Songs, doc.clone()).unwrap();

        store
            .delete_one(Collection::Songs, &Filter::id(&RecordId::new("S1")))
            .unwrap();
        assert!(store
            .find_one(Collection::Songs, &Filter::id(&RecordId::new("s1")), &FindOptions::default())
            .unwrap()
            .is_none());
        store.insert(Collection::Songs, doc).unwrap();
        assert_eq!(store.count(Collection::Songs).unwrap(), 1);
    }

    #[test]
    fn snapshot_restore_keeps_id_index_in_step() {
        let store = MemoryRecordStore::new();
        let mut doc = song("one", "a");
        doc.insert("_id".to_string(), json!("s1"));

        let result: Result<(), StoreError> = store.atomically(|| {
            store.insert(Collection::Songs, doc.clone())?;
            Err(StoreError::Unavailable("boom".to_string()))
        });

        assert!(result.is_err());
        store.insert(Collection::Songs, doc).unwrap();
    }
}
