//! Record identity.
//!
//! Ids are stored as text. Equality and hashing go through [`normalize_id`],
//! so `3F2A-...` and `3f2a...` name the same record. Cross-collection
//! matching (conflict detection, album-scoped song queries) depends on this.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Stable identifier of a stored document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh id (UUID v4, simple lowercase form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps an existing textual id without rewriting it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw textual form, as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized form used for every identity comparison.
    pub fn normalized(&self) -> String {
        normalize_id(&self.0)
    }
}

/// Trims, lowercases and strips hyphens.
pub fn normalize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|ch| *ch != '-')
        .map(|ch| ch.to_ascii_lowercase())
        .collect()
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Uuid> for RecordId {
    fn from(value: Uuid) -> Self {
        Self(value.simple().to_string())
    }
}
