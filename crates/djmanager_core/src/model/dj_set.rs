//! Curated set record and its one-way publish lock.
//!
//! # Invariants
//! - Song references are weak: a set never owns the songs it lists.
//! - Once `is_published` is true the stored fields never change again.

use crate::model::id::RecordId;
use crate::model::song::Song;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Publish state derived from `is_published`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    /// Editable through updates.
    Draft,
    /// Terminal for updates; still deletable.
    Published,
}

/// A stored set as persisted, with song references as ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DjSet {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub title: String,
    pub creator: String,
    pub is_published: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Ordered song references.
    pub songs: Vec<RecordId>,
}

impl DjSet {
    pub fn publish_state(&self) -> PublishState {
        if self.is_published {
            PublishState::Published
        } else {
            PublishState::Draft
        }
    }
}

/// A set with its song references resolved to song records.
///
/// References whose song no longer exists are dropped during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDjSet {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub title: String,
    pub creator: String,
    pub is_published: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub songs: Vec<Song>,
}

/// Caller input for a new set. The initial publish flag is the caller's choice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DjSetSpec {
    pub title: String,
    pub creator: String,
    pub is_published: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub songs: Vec<RecordId>,
}

/// Partial update for a draft set. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DjSetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub songs: Option<Vec<RecordId>>,
}

impl DjSetPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.creator.is_none()
            && self.is_published.is_none()
            && self.tags.is_none()
            && self.songs.is_none()
    }

    /// Patch that only flips the publish flag.
    pub fn publish(is_published: bool) -> Self {
        Self {
            is_published: Some(is_published),
            ..Self::default()
        }
    }
}

/// Proof that a song is in use: `song_id` appears in the set `set_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInUse {
    pub song_id: RecordId,
    pub song_title: String,
    pub set_id: RecordId,
    pub set_title: String,
}
