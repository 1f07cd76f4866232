#![allow(dead_code)]

use djmanager_core::{
    AlbumRegistrar, AlbumSpec, AlbumWithSongs, Collection, DeleteSummary, Document, Filter,
    FindOptions, MemoryRecordStore, NewSong, RecordId, RecordStore, StoreError, StoreResult,
};
use std::cell::Cell;

pub fn artists(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

pub fn album_spec(title: &str, label_number: &str) -> AlbumSpec {
    AlbumSpec::new(title, "Warp", label_number, artists(&["Aphex Twin"]))
}

pub fn new_song(title: &str) -> NewSong {
    NewSong::new(title, artists(&["Aphex Twin"]))
}

pub fn seed_album<S: RecordStore>(store: S, title: &str, label_number: &str, songs: &[&str]) -> AlbumWithSongs {
    AlbumRegistrar::new(store)
        .create_album_with_songs(
            &album_spec(title, label_number),
            songs.iter().map(|title| new_song(title)).collect(),
        )
        .unwrap()
}

/// Memory store that fails selected writes.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryRecordStore,
    fail_song_insert_at: Option<usize>,
    song_inserts: Cell<usize>,
    fail_song_delete: bool,
}

impl FlakyStore {
    /// Fails the song insert with zero-based position `index`; later inserts succeed.
    pub fn failing_song_insert(index: usize) -> Self {
        Self {
            fail_song_insert_at: Some(index),
            ..Self::default()
        }
    }

    pub fn failing_song_delete() -> Self {
        Self {
            fail_song_delete: true,
            ..Self::default()
        }
    }
}

impl RecordStore for FlakyStore {
    fn insert(&self, collection: Collection, doc: Document) -> StoreResult<Document> {
        if collection == Collection::Songs {
            let position = self.song_inserts.get();
            self.song_inserts.set(position + 1);
            if self.fail_song_insert_at == Some(position) {
                return Err(StoreError::Unavailable("injected insert failure".to_string()));
            }
        }
        self.inner.insert(collection, doc)
    }

    fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Option<Document>> {
        self.inner.find_one(collection, filter, options)
    }

    fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        self.inner.find_many(collection, filter, options)
    }

    fn update_one(
        &self,
        collection: Collection,
        id: &RecordId,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        self.inner.update_one(collection, id, patch)
    }

    fn delete_one(&self, collection: Collection, filter: &Filter) -> StoreResult<DeleteSummary> {
        self.inner.delete_one(collection, filter)
    }

    fn delete_many(&self, collection: Collection, filter: &Filter) -> StoreResult<DeleteSummary> {
        if self.fail_song_delete && collection == Collection::Songs {
            return Err(StoreError::Unavailable("injected delete failure".to_string()));
        }
        self.inner.delete_many(collection, filter)
    }

    fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        self.inner.atomically(f)
    }
}
