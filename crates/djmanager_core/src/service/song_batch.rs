//! Song batch writer.
//!
//! # Responsibility
//! - Persist homogeneous song batches tied to one existing album.
//! - Serve album-scoped song queries and the cascade delete hook.
//!
//! # Invariants
//! - A batch naming more than one album, or an unknown album, is rejected
//!   before any write.
//! - Item inserts are independent: a failing item does not undo earlier ones,
//!   and later items are still attempted.

use crate::error::{BatchInconsistency, CoreError, CoreResult, PartialWrite};
use crate::model::id::RecordId;
use crate::model::song::{Song, SongSearch, SongSpec};
use crate::repo::album_repo::AlbumRepo;
use crate::repo::song_repo::SongRepo;
use crate::store::{Collection, DeleteSummary, RecordStore};
use crate::validation::validate_song_batch;
use log::{info, warn};
use std::collections::HashSet;

pub struct SongBatchWriter<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> SongBatchWriter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Inserts every song of `batch`.
    ///
    /// # Errors
    /// - `ValidationFailure` for an empty batch or malformed entries.
    /// - `InconsistentBatch` when entries disagree on `album_id` or the album
    ///   does not exist. Nothing is written in either case.
    /// - `StoreFailure` when any item insert fails; its partial payload lists
    ///   the songs that did persist.
    pub fn insert_batch(&self, batch: &[SongSpec]) -> CoreResult<Vec<Song>> {
        validate_song_batch(batch)?;
        let album_id = common_album_id(batch)?;

        if AlbumRepo::new(&self.store).get(&album_id)?.is_none() {
            warn!("event=song_batch module=song_batch status=rejected reason=unknown_album album_id={album_id}");
            return Err(CoreError::InconsistentBatch(
                BatchInconsistency::UnknownAlbum(album_id),
            ));
        }

        let outcomes = SongRepo::new(&self.store).insert_many(batch)?;
        let mut persisted = Vec::with_capacity(batch.len());
        let mut first_failure = None;
        let mut failed = 0usize;
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(song) => persisted.push(song),
                Err(err) => {
                    failed += 1;
                    warn!(
                        "event=song_batch_item module=song_batch status=error album_id={album_id} index={index} error={err}"
                    );
                    first_failure.get_or_insert(err);
                }
            }
        }

        match first_failure {
            None => {
                info!(
                    "event=song_batch module=song_batch status=ok album_id={album_id} inserted={}",
                    persisted.len()
                );
                Ok(persisted)
            }
            Some(err) => {
                warn!(
                    "event=song_batch module=song_batch status=partial album_id={album_id} inserted={} failed={failed}",
                    persisted.len()
                );
                Err(CoreError::from(err).with_partial(PartialWrite::Songs(persisted)))
            }
        }
    }

    pub fn get_song(&self, id: &RecordId) -> CoreResult<Song> {
        SongRepo::new(&self.store)
            .get(id)?
            .ok_or_else(|| CoreError::not_found(Collection::Songs, id))
    }

    /// Songs owned by `album_id`; empty when there are none.
    pub fn get_by_album_id(&self, album_id: &RecordId) -> CoreResult<Vec<Song>> {
        Ok(SongRepo::new(&self.store).by_album(album_id)?)
    }

    /// Deletes every song owned by `album_id`.
    pub fn delete_by_album_id(&self, album_id: &RecordId) -> CoreResult<DeleteSummary> {
        let summary = SongRepo::new(&self.store).delete_by_album(album_id)?;
        info!(
            "event=song_cascade module=song_batch status=ok album_id={album_id} deleted={}",
            summary.deleted_count
        );
        Ok(summary)
    }

    /// Case-insensitive prefix search; both terms must match when given.
    pub fn search(&self, search: &SongSearch) -> CoreResult<Vec<Song>> {
        Ok(SongRepo::new(&self.store).search(search)?)
    }
}

fn common_album_id(batch: &[SongSpec]) -> CoreResult<RecordId> {
    let mut seen = HashSet::new();
    let distinct: Vec<RecordId> = batch
        .iter()
        .map(|spec| spec.album_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    match distinct.as_slice() {
        [single] => Ok(single.clone()),
        _ => {
            warn!(
                "event=song_batch module=song_batch status=rejected reason=mixed_albums album_count={}",
                distinct.len()
            );
            Err(CoreError::InconsistentBatch(
                BatchInconsistency::MixedAlbums(distinct),
            ))
        }
    }
}
