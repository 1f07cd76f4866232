//! Song collection access, including the album-scoped queries used by the
//! cascade and conflict checks.

use super::{from_document, from_documents, to_document};
use crate::model::id::RecordId;
use crate::model::song::{Song, SongSearch, SongSpec};
use crate::store::{
    Collection, DeleteSummary, Filter, FindOptions, RecordStore, StoreResult,
};
use std::collections::HashSet;

const ALBUM_ID_FIELD: &str = "album_id";
const TITLE_FIELD: &str = "title";
const ARTISTS_FIELD: &str = "artists";

pub struct SongRepo<'s, S> {
    store: &'s S,
}

impl<'s, S: RecordStore> SongRepo<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// One outcome per spec, in order. Items are written independently.
    ///
    /// The outer error means a spec could not be encoded; nothing was written.
    pub fn insert_many(&self, specs: &[SongSpec]) -> StoreResult<Vec<StoreResult<Song>>> {
        let docs = specs
            .iter()
            .map(to_document)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(self
            .store
            .insert_many(Collection::Songs, docs)
            .into_iter()
            .map(|outcome| outcome.and_then(|doc| from_document(Collection::Songs, doc)))
            .collect())
    }

    pub fn get(&self, id: &RecordId) -> StoreResult<Option<Song>> {
        self.store
            .find_one(Collection::Songs, &Filter::id(id), &FindOptions::default())?
            .map(|doc| from_document(Collection::Songs, doc))
            .transpose()
    }

    pub fn by_album(&self, album_id: &RecordId) -> StoreResult<Vec<Song>> {
        self.find_many(&Filter::reference(ALBUM_ID_FIELD, album_id))
    }

    pub fn delete_by_album(&self, album_id: &RecordId) -> StoreResult<DeleteSummary> {
        self.store
            .delete_many(Collection::Songs, &Filter::reference(ALBUM_ID_FIELD, album_id))
    }

    /// Ids from `ids` that do not resolve to a stored song, in input order.
    pub fn missing_ids(&self, ids: &[RecordId]) -> StoreResult<Vec<RecordId>> {
        let found: HashSet<String> = self
            .find_many(&Filter::ids(ids))?
            .iter()
            .map(|song| song.id.normalized())
            .collect();
        Ok(ids
            .iter()
            .filter(|id| !found.contains(&id.normalized()))
            .cloned()
            .collect())
    }

    pub fn search(&self, search: &SongSearch) -> StoreResult<Vec<Song>> {
        let title = search.title_prefix.clone().unwrap_or_default();
        let artist = search.artist_prefix.clone().unwrap_or_default();
        self.find_many(&Filter::And(vec![
            Filter::prefix(TITLE_FIELD, title),
            Filter::prefix(ARTISTS_FIELD, artist),
        ]))
    }

    fn find_many(&self, filter: &Filter) -> StoreResult<Vec<Song>> {
        let docs = self
            .store
            .find_many(Collection::Songs, filter, &FindOptions::default())?;
        from_documents(Collection::Songs, docs)
    }
}
