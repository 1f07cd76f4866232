//! Deletion conflict resolver.
//!
//! # Responsibility
//! - Refuse to delete an album while any of its songs is listed in a set.
//! - Otherwise delete the album and cascade-delete its songs.
//!
//! # Invariants
//! - Song identity in the conflict check uses normalized ids.
//! - The album delete and the song cascade are two writes. In best-effort
//!   mode a failure between them leaves orphaned songs, reported through
//!   `PartialWrite::AlbumDeleted`.
//! - The cascade runs even when no album record matched, so stray songs of a
//!   missing album are cleaned up before `NotFound` is reported.

use crate::config::{CoreConfig, WriteMode};
use crate::error::{Conflict, CoreError, CoreResult, PartialWrite};
use crate::model::dj_set::{ResolvedDjSet, SongInUse};
use crate::model::id::RecordId;
use crate::model::song::Song;
use crate::repo::album_repo::AlbumRepo;
use crate::repo::set_repo::SetRepo;
use crate::service::song_batch::SongBatchWriter;
use crate::store::{Collection, RecordStore};
use log::{info, warn};
use serde::Serialize;
use std::collections::HashMap;

/// Result of a successful album deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlbumDeletion {
    pub deleted_count: usize,
    pub songs_deleted: usize,
}

pub struct DeletionConflictResolver<S: RecordStore> {
    store: S,
    write_mode: WriteMode,
}

impl<S: RecordStore> DeletionConflictResolver<S> {
    pub fn new(store: S) -> Self {
        Self::with_write_mode(store, WriteMode::default())
    }

    pub fn with_write_mode(store: S, write_mode: WriteMode) -> Self {
        Self { store, write_mode }
    }

    /// Uses the configured `write_mode` for album deletion.
    pub fn from_config(store: S, config: &CoreConfig) -> Self {
        Self::with_write_mode(store, config.write_mode)
    }

    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    /// Deletes `album_id` and its songs unless a set references one of them.
    ///
    /// # Errors
    /// - `Conflict` listing every (song, set) pair in use; nothing is deleted.
    /// - `NotFound` when no album record matched.
    /// - `StoreFailure` when a read or write fails.
    pub fn delete_album(&self, album_id: &RecordId) -> CoreResult<AlbumDeletion> {
        let album_songs = SongBatchWriter::new(&self.store).get_by_album_id(album_id)?;
        let sets = SetRepo::new(&self.store).list_resolved()?;

        let conflicts = find_conflicts(&album_songs, &sets);
        if !conflicts.is_empty() {
            warn!(
                "event=album_delete module=album_deletion status=rejected reason=songs_in_sets album_id={album_id} conflicts={}",
                conflicts.len()
            );
            return Err(CoreError::Conflict(Conflict::AlbumInUse {
                album_id: album_id.clone(),
                conflicts,
            }));
        }

        let deletion = match self.write_mode {
            WriteMode::BestEffort => self.delete_album_and_songs(album_id),
            WriteMode::Transactional => self
                .store
                .atomically(|| self.delete_album_and_songs(album_id))
                .map_err(|err| err.with_partial(PartialWrite::None)),
        }?;

        if deletion.deleted_count == 0 {
            info!(
                "event=album_delete module=album_deletion status=not_found album_id={album_id} songs_deleted={}",
                deletion.songs_deleted
            );
            return Err(CoreError::not_found(Collection::Albums, album_id));
        }

        info!(
            "event=album_delete module=album_deletion status=ok album_id={album_id} songs_deleted={}",
            deletion.songs_deleted
        );
        Ok(deletion)
    }

    fn delete_album_and_songs(&self, album_id: &RecordId) -> CoreResult<AlbumDeletion> {
        let album_summary = AlbumRepo::new(&self.store).delete(album_id)?;

        let songs_summary = SongBatchWriter::new(&self.store)
            .delete_by_album_id(album_id)
            .map_err(|err| {
                if album_summary.deleted_count > 0 {
                    warn!(
                        "event=album_delete module=album_deletion status=error reason=cascade_failed album_id={album_id} error={err}"
                    );
                    err.with_partial(PartialWrite::AlbumDeleted {
                        album_id: album_id.clone(),
                    })
                } else {
                    err
                }
            })?;

        Ok(AlbumDeletion {
            deleted_count: album_summary.deleted_count,
            songs_deleted: songs_summary.deleted_count,
        })
    }
}

/// Every (song, set) pair where a song of the album appears in a set.
///
/// Album song ids are indexed first, so the scan over sets is linear in the
/// total number of set entries. Pairs come out in set order, then in the
/// set's song order; a song listed twice in one set yields two pairs.
pub fn find_conflicts(album_songs: &[Song], sets: &[ResolvedDjSet]) -> Vec<SongInUse> {
    let index: HashMap<String, &Song> = album_songs
        .iter()
        .map(|song| (song.id.normalized(), song))
        .collect();
    if index.is_empty() {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for set in sets {
        for set_song in &set.songs {
            if let Some(album_song) = index.get(&set_song.id.normalized()) {
                conflicts.push(SongInUse {
                    song_id: album_song.id.clone(),
                    song_title: album_song.title.clone(),
                    set_id: set.id.clone(),
                    set_title: set.title.clone(),
                });
            }
        }
    }
    conflicts
}
