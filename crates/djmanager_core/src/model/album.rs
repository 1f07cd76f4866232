//! Album record.
//!
//! # Invariants
//! - `label_number` is intended to be unique; only the registrar checks it.
//! - Album fields are never mutated after creation.

use crate::model::id::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A stored release record owning zero or more songs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub title: String,
    pub record_label: String,
    /// Catalog number; the registrar's uniqueness key.
    pub label_number: String,
    /// Artist names in credit order.
    pub artists: Vec<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Caller input for a new album.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumSpec {
    pub title: String,
    pub record_label: String,
    pub label_number: String,
    pub artists: Vec<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl AlbumSpec {
    pub fn new(
        title: impl Into<String>,
        record_label: impl Into<String>,
        label_number: impl Into<String>,
        artists: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            record_label: record_label.into(),
            label_number: label_number.into(),
            artists,
            tags: BTreeSet::new(),
        }
    }

    /// Adds tags, builder style.
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}
