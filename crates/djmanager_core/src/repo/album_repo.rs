//! Album collection access.

use super::{from_document, from_documents, to_document};
use crate::model::album::{Album, AlbumSpec};
use crate::model::id::RecordId;
use crate::store::{Collection, DeleteSummary, Filter, FindOptions, RecordStore, StoreResult};

const LABEL_NUMBER_FIELD: &str = "label_number";
const TITLE_FIELD: &str = "title";

pub struct AlbumRepo<'s, S> {
    store: &'s S,
}

impl<'s, S: RecordStore> AlbumRepo<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn insert(&self, spec: &AlbumSpec) -> StoreResult<Album> {
        let stored = self.store.insert(Collection::Albums, to_document(spec)?)?;
        from_document(Collection::Albums, stored)
    }

    pub fn get(&self, id: &RecordId) -> StoreResult<Option<Album>> {
        self.find_one(&Filter::id(id))
    }

    /// First album carrying `label_number`, exact match.
    pub fn find_by_label_number(&self, label_number: &str) -> StoreResult<Option<Album>> {
        self.find_one(&Filter::field_eq(LABEL_NUMBER_FIELD, label_number))
    }

    pub fn list(&self) -> StoreResult<Vec<Album>> {
        self.find_many(&Filter::All)
    }

    pub fn search_by_title(&self, title_prefix: &str) -> StoreResult<Vec<Album>> {
        self.find_many(&Filter::prefix(TITLE_FIELD, title_prefix))
    }

    pub fn delete(&self, id: &RecordId) -> StoreResult<DeleteSummary> {
        self.store.delete_one(Collection::Albums, &Filter::id(id))
    }

    fn find_one(&self, filter: &Filter) -> StoreResult<Option<Album>> {
        self.store
            .find_one(Collection::Albums, filter, &FindOptions::default())?
            .map(|doc| from_document(Collection::Albums, doc))
            .transpose()
    }

    fn find_many(&self, filter: &Filter) -> StoreResult<Vec<Album>> {
        let docs = self
            .store
            .find_many(Collection::Albums, filter, &FindOptions::default())?;
        from_documents(Collection::Albums, docs)
    }
}
