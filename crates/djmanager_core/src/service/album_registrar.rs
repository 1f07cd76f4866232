//! Album registrar.
//!
//! # Responsibility
//! - Create an album together with its initial song batch.
//! - Enforce label-number uniqueness by a check before insert.
//! - Serve album lookups and title search.
//!
//! # Invariants
//! - The uniqueness check and the insert are separate store calls. Two
//!   concurrent creates with one label number can both pass the check.
//! - In best-effort mode a failed song batch leaves the album (and any songs
//!   already written) in place; nothing is rolled back.

use crate::config::{CoreConfig, WriteMode};
use crate::error::{Conflict, CoreError, CoreResult, PartialWrite};
use crate::model::album::{Album, AlbumSpec};
use crate::model::id::RecordId;
use crate::model::song::{NewSong, Song, SongSpec};
use crate::repo::album_repo::AlbumRepo;
use crate::service::song_batch::SongBatchWriter;
use crate::store::{Collection, RecordStore};
use crate::validation::validate_album_with_songs;
use log::{info, warn};
use serde::Serialize;
use std::time::Instant;

/// Result of a successful album creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumWithSongs {
    pub album: Album,
    pub songs: Vec<Song>,
}

pub struct AlbumRegistrar<S: RecordStore> {
    store: S,
    write_mode: WriteMode,
}

impl<S: RecordStore> AlbumRegistrar<S> {
    pub fn new(store: S) -> Self {
        Self::with_write_mode(store, WriteMode::default())
    }

    pub fn with_write_mode(store: S, write_mode: WriteMode) -> Self {
        Self { store, write_mode }
    }

    /// Uses the configured `write_mode` for album creation.
    pub fn from_config(store: S, config: &CoreConfig) -> Self {
        Self::with_write_mode(store, config.write_mode)
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Creates an album and its songs.
    ///
    /// # Errors
    /// - `ValidationFailure` before any store call.
    /// - `Conflict` with the already stored album when `label_number` is taken.
    /// - `StoreFailure` when a write fails. In best-effort mode the partial
    ///   payload names the album and songs that stayed persisted; in
    ///   transactional mode everything is rolled back.
    pub fn create_album_with_songs(
        &self,
        spec: &AlbumSpec,
        songs: Vec<NewSong>,
    ) -> CoreResult<AlbumWithSongs> {
        let started_at = Instant::now();
        validate_album_with_songs(spec, &songs)?;

        if let Some(existing) = AlbumRepo::new(&self.store).find_by_label_number(&spec.label_number)? {
            warn!(
                "event=album_create module=album_registrar status=rejected reason=duplicate_label_number existing_id={}",
                existing.id
            );
            return Err(CoreError::Conflict(Conflict::DuplicateLabelNumber {
                existing,
            }));
        }

        let created = match self.write_mode {
            WriteMode::BestEffort => self.insert_album_and_songs(spec, songs),
            WriteMode::Transactional => self
                .store
                .atomically(|| self.insert_album_and_songs(spec, songs))
                .map_err(|err| err.with_partial(PartialWrite::None)),
        };

        match &created {
            Ok(created) => info!(
                "event=album_create module=album_registrar status=ok album_id={} songs={} duration_ms={}",
                created.album.id,
                created.songs.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=album_create module=album_registrar status=error kind={:?} mode={:?} duration_ms={} error={err}",
                err.kind(),
                self.write_mode,
                started_at.elapsed().as_millis()
            ),
        }
        created
    }

    fn insert_album_and_songs(
        &self,
        spec: &AlbumSpec,
        songs: Vec<NewSong>,
    ) -> CoreResult<AlbumWithSongs> {
        let album = AlbumRepo::new(&self.store).insert(spec)?;

        let batch: Vec<SongSpec> = songs
            .into_iter()
            .map(|song| song.for_album(album.id.clone()))
            .collect();

        match SongBatchWriter::new(&self.store).insert_batch(&batch) {
            Ok(songs) => Ok(AlbumWithSongs { album, songs }),
            Err(err) => {
                let songs = match err.partial_write() {
                    Some(PartialWrite::Songs(songs)) => songs.clone(),
                    _ => Vec::new(),
                };
                Err(err.with_partial(PartialWrite::AlbumWithSongs { album, songs }))
            }
        }
    }

    pub fn get_album(&self, id: &RecordId) -> CoreResult<Album> {
        AlbumRepo::new(&self.store)
            .get(id)?
            .ok_or_else(|| CoreError::not_found(Collection::Albums, id))
    }

    pub fn list_albums(&self) -> CoreResult<Vec<Album>> {
        Ok(AlbumRepo::new(&self.store).list()?)
    }

    pub fn find_by_label_number(&self, label_number: &str) -> CoreResult<Option<Album>> {
        Ok(AlbumRepo::new(&self.store).find_by_label_number(label_number)?)
    }

    /// Case-insensitive title prefix search; an empty prefix lists every album.
    pub fn search_albums(&self, title_prefix: &str) -> CoreResult<Vec<Album>> {
        Ok(AlbumRepo::new(&self.store).search_by_title(title_prefix)?)
    }
}
