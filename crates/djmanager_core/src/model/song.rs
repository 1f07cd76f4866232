//! Song record and batch inputs.
//!
//! # Invariants
//! - `album_id` is checked against the albums collection at insert time only.
//! - Songs are created in batches and never updated individually.

use crate::model::id::RecordId;
use serde::{Deserialize, Serialize};

/// A stored track belonging to one album.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub title: String,
    pub artists: Vec<String>,
    pub album_id: RecordId,
}

/// Song input that is not yet tied to an album.
///
/// The album registrar stamps the freshly created album id onto each one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub artists: Vec<String>,
}

impl NewSong {
    pub fn new(title: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            title: title.into(),
            artists,
        }
    }

    /// Binds this song to an album, producing a batch entry.
    pub fn for_album(self, album_id: RecordId) -> SongSpec {
        SongSpec {
            title: self.title,
            artists: self.artists,
            album_id,
        }
    }
}

/// One entry of a song batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongSpec {
    pub title: String,
    pub artists: Vec<String>,
    pub album_id: RecordId,
}

/// Search terms for [`crate::SongBatchWriter::search`].
///
/// Absent or empty terms match everything for that field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongSearch {
    pub title_prefix: Option<String>,
    pub artist_prefix: Option<String>,
}

impl SongSearch {
    pub fn title(prefix: impl Into<String>) -> Self {
        Self {
            title_prefix: Some(prefix.into()),
            artist_prefix: None,
        }
    }

    pub fn artist(prefix: impl Into<String>) -> Self {
        Self {
            title_prefix: None,
            artist_prefix: Some(prefix.into()),
        }
    }
}
