//! Set mutation guard.
//!
//! # Responsibility
//! - Create sets whose song references exist at creation time.
//! - Apply partial updates to draft sets only.
//! - Delete sets unconditionally.
//!
//! # Invariants
//! - A published set rejects every update, including one that tries to
//!   unpublish it. Published is terminal for updates; deletion still works.
//! - Song references are checked on create only, not on update.
//! - Read-then-write on update holds no lock; concurrent updates can race.

use crate::error::{CoreError, CoreResult};
use crate::model::dj_set::{DjSetPatch, DjSetSpec, PublishState, ResolvedDjSet};
use crate::model::id::RecordId;
use crate::repo::set_repo::SetRepo;
use crate::repo::song_repo::SongRepo;
use crate::store::{Collection, RecordStore};
use crate::validation::{validate_set_patch, validate_set_spec};
use log::{info, warn};
use serde::Serialize;

/// Result of a set deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    pub deleted_count: usize,
}

pub struct SetMutationGuard<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> SetMutationGuard<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a set with the caller's initial publish flag.
    ///
    /// Returns `NotFound` for the first song reference that does not exist.
    pub fn create_set(&self, spec: &DjSetSpec) -> CoreResult<ResolvedDjSet> {
        validate_set_spec(spec)?;

        if let Some(missing) = SongRepo::new(&self.store)
            .missing_ids(&spec.songs)?
            .into_iter()
            .next()
        {
            warn!("event=set_create module=set_guard status=rejected reason=unknown_song song_id={missing}");
            return Err(CoreError::not_found(Collection::Songs, &missing));
        }

        let repo = SetRepo::new(&self.store);
        let created = repo.insert(spec)?;
        info!(
            "event=set_create module=set_guard status=ok set_id={} published={} songs={}",
            created.id,
            created.is_published,
            created.songs.len()
        );
        self.reload(&created.id)
    }

    /// Applies the provided patch fields to a draft set.
    ///
    /// # Errors
    /// - `NotFound` when the set does not exist.
    /// - `ImmutableResource` when the set is published; nothing is written.
    pub fn update_set(&self, set_id: &RecordId, patch: &DjSetPatch) -> CoreResult<ResolvedDjSet> {
        validate_set_patch(patch)?;

        let repo = SetRepo::new(&self.store);
        let current = repo
            .get(set_id)?
            .ok_or_else(|| CoreError::not_found(Collection::Sets, set_id))?;

        if current.publish_state() == PublishState::Published {
            warn!("event=set_update module=set_guard status=rejected reason=published set_id={set_id}");
            return Err(CoreError::ImmutableResource {
                set_id: set_id.clone(),
            });
        }

        if repo.update(set_id, patch)?.is_none() {
            return Err(CoreError::not_found(Collection::Sets, set_id));
        }
        info!(
            "event=set_update module=set_guard status=ok set_id={set_id} publishes={}",
            patch.is_published == Some(true)
        );
        self.reload(set_id)
    }

    /// Deletes a set without any reference check.
    pub fn delete_set(&self, set_id: &RecordId) -> CoreResult<DeleteReport> {
        let summary = SetRepo::new(&self.store).delete(set_id)?;
        if summary.deleted_count == 0 {
            return Err(CoreError::not_found(Collection::Sets, set_id));
        }
        info!("event=set_delete module=set_guard status=ok set_id={set_id}");
        Ok(DeleteReport {
            deleted_count: summary.deleted_count,
        })
    }

    pub fn get_set(&self, set_id: &RecordId) -> CoreResult<ResolvedDjSet> {
        self.reload(set_id)
    }

    pub fn list_sets(&self) -> CoreResult<Vec<ResolvedDjSet>> {
        Ok(SetRepo::new(&self.store).list_resolved()?)
    }

    fn reload(&self, set_id: &RecordId) -> CoreResult<ResolvedDjSet> {
        SetRepo::new(&self.store)
            .get_resolved(set_id)?
            .ok_or_else(|| CoreError::not_found(Collection::Sets, set_id))
    }
}
