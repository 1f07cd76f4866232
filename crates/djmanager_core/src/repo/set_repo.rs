//! Set collection access.
//!
//! Reads come in two shapes: raw (`DjSet`, song ids as stored) and resolved
//! (`ResolvedDjSet`, song references replaced by song records).

use super::{from_document, from_documents, to_document};
use crate::model::dj_set::{DjSet, DjSetPatch, DjSetSpec, ResolvedDjSet};
use crate::model::id::RecordId;
use crate::store::{Collection, DeleteSummary, Filter, FindOptions, RecordStore, StoreResult};

const SONGS_FIELD: &str = "songs";

pub struct SetRepo<'s, S> {
    store: &'s S,
}

impl<'s, S: RecordStore> SetRepo<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn insert(&self, spec: &DjSetSpec) -> StoreResult<DjSet> {
        let stored = self.store.insert(Collection::Sets, to_document(spec)?)?;
        from_document(Collection::Sets, stored)
    }

    pub fn get(&self, id: &RecordId) -> StoreResult<Option<DjSet>> {
        self.store
            .find_one(Collection::Sets, &Filter::id(id), &FindOptions::default())?
            .map(|doc| from_document(Collection::Sets, doc))
            .transpose()
    }

    pub fn get_resolved(&self, id: &RecordId) -> StoreResult<Option<ResolvedDjSet>> {
        self.store
            .find_one(Collection::Sets, &Filter::id(id), &resolve_songs())?
            .map(|doc| from_document(Collection::Sets, doc))
            .transpose()
    }

    /// Full collection scan with song references resolved.
    pub fn list_resolved(&self) -> StoreResult<Vec<ResolvedDjSet>> {
        let docs = self
            .store
            .find_many(Collection::Sets, &Filter::All, &resolve_songs())?;
        from_documents(Collection::Sets, docs)
    }

    /// Applies the provided patch fields. `None` when the set does not exist.
    pub fn update(&self, id: &RecordId, patch: &DjSetPatch) -> StoreResult<Option<DjSet>> {
        self.store
            .update_one(Collection::Sets, id, to_document(patch)?)?
            .map(|doc| from_document(Collection::Sets, doc))
            .transpose()
    }

    pub fn delete(&self, id: &RecordId) -> StoreResult<DeleteSummary> {
        self.store.delete_one(Collection::Sets, &Filter::id(id))
    }
}

fn resolve_songs() -> FindOptions {
    FindOptions::resolving(SONGS_FIELD, Collection::Songs)
}
