//! Core error taxonomy and the uniform outcome envelope.
//!
//! # Responsibility
//! - Define the closed set of failure kinds every core operation reports.
//! - Carry partial-write payloads so callers see what a failed sequence left
//!   behind in the store.
//!
//! # Invariants
//! - Core operations return these values; they never panic or swallow a
//!   failure.
//! - `CoreError::kind()` always maps onto exactly one [`ErrorKind`].

use crate::model::album::Album;
use crate::model::dj_set::SongInUse;
use crate::model::id::RecordId;
use crate::model::song::Song;
use crate::store::{Collection, StoreError};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

/// Closed failure kind set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationFailure,
    Conflict,
    NotFound,
    InconsistentBatch,
    ImmutableResource,
    StoreFailure,
}

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Why a conflict was reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// An album with the same label number already exists.
    DuplicateLabelNumber { existing: Album },
    /// Songs of the album are referenced by sets.
    AlbumInUse {
        album_id: RecordId,
        conflicts: Vec<SongInUse>,
    },
}

/// Why a song batch was rejected before any write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchInconsistency {
    /// Entries name more than one album. Lists distinct ids in first-seen order.
    MixedAlbums(Vec<RecordId>),
    /// The shared album id does not resolve to a stored album.
    UnknownAlbum(RecordId),
}

/// Store state left behind by a multi-step write that failed midway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PartialWrite {
    #[default]
    None,
    /// Songs of a batch that were inserted before the failure.
    Songs(Vec<Song>),
    /// Album inserted, song batch failed (possibly after some inserts).
    AlbumWithSongs { album: Album, songs: Vec<Song> },
    /// Album record deleted, song cascade failed: its songs are orphaned.
    AlbumDeleted { album_id: RecordId },
}

#[derive(Debug)]
pub enum CoreError {
    ValidationFailure(Vec<FieldViolation>),
    Conflict(Conflict),
    NotFound {
        collection: Collection,
        id: RecordId,
    },
    InconsistentBatch(BatchInconsistency),
    ImmutableResource {
        set_id: RecordId,
    },
    StoreFailure {
        source: StoreError,
        partial: PartialWrite,
    },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailure(_) => ErrorKind::ValidationFailure,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InconsistentBatch(_) => ErrorKind::InconsistentBatch,
            Self::ImmutableResource { .. } => ErrorKind::ImmutableResource,
            Self::StoreFailure { .. } => ErrorKind::StoreFailure,
        }
    }

    pub(crate) fn not_found(collection: Collection, id: &RecordId) -> Self {
        Self::NotFound {
            collection,
            id: id.clone(),
        }
    }

    /// Attaches a partial-write payload to a store failure. Other kinds are
    /// returned unchanged.
    pub(crate) fn with_partial(self, partial: PartialWrite) -> Self {
        match self {
            Self::StoreFailure { source, .. } => Self::StoreFailure { source, partial },
            other => other,
        }
    }

    /// Partial-write payload, if this is a store failure.
    pub fn partial_write(&self) -> Option<&PartialWrite> {
        match self {
            Self::StoreFailure { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ValidationFailure(violations) => {
                write!(f, "validation failed:")?;
                for violation in violations {
                    write!(f, " {}: {};", violation.field, violation.message)?;
                }
                Ok(())
            }
            Self::Conflict(Conflict::DuplicateLabelNumber { existing }) => write!(
                f,
                "label number `{}` is already used by album {}",
                existing.label_number, existing.id
            ),
            Self::Conflict(Conflict::AlbumInUse {
                album_id,
                conflicts,
            }) => write!(
                f,
                "album {album_id} cannot be deleted: {} song reference(s) in sets",
                conflicts.len()
            ),
            Self::NotFound { collection, id } => write!(f, "no record {id} in {collection}"),
            Self::InconsistentBatch(BatchInconsistency::MixedAlbums(ids)) => write!(
                f,
                "song batch spans {} albums; a batch must target exactly one",
                ids.len()
            ),
            Self::InconsistentBatch(BatchInconsistency::UnknownAlbum(id)) => {
                write!(f, "song batch targets unknown album {id}")
            }
            Self::ImmutableResource { set_id } => {
                write!(f, "set {set_id} is published and can no longer be edited")
            }
            Self::StoreFailure { source, .. } => write!(f, "store failure: {source}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        Self::StoreFailure {
            source: value,
            partial: PartialWrite::None,
        }
    }
}

/// Error half of [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Kind-specific payload (conflicting album, conflict tuples, violations,
    /// partial writes).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// Uniform `{data, error}` value handed to a transport layer.
///
/// `error` is absent on success. On failure `data` may still carry a partial
/// payload (the existing album on a label conflict, persisted songs on a
/// failed batch).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl Outcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

impl<T: Serialize> From<CoreResult<T>> for Outcome {
    fn from(value: CoreResult<T>) -> Self {
        match value {
            Ok(data) => match serde_json::to_value(&data) {
                Ok(data) => Self {
                    data: Some(data),
                    error: None,
                },
                Err(err) => Self {
                    data: None,
                    error: Some(OutcomeError {
                        kind: ErrorKind::StoreFailure,
                        message: format!("result serialization failed: {err}"),
                        detail: None,
                    }),
                },
            },
            Err(err) => {
                let (data, detail) = error_payload(&err);
                Self {
                    data,
                    error: Some(OutcomeError {
                        kind: err.kind(),
                        message: err.to_string(),
                        detail,
                    }),
                }
            }
        }
    }
}

fn error_payload(err: &CoreError) -> (Option<serde_json::Value>, Option<serde_json::Value>) {
    use serde_json::json;

    match err {
        CoreError::ValidationFailure(violations) => (None, serde_json::to_value(violations).ok()),
        CoreError::Conflict(Conflict::DuplicateLabelNumber { existing }) => {
            (serde_json::to_value(existing).ok(), None)
        }
        CoreError::Conflict(Conflict::AlbumInUse { conflicts, .. }) => {
            (None, Some(json!({ "conflict": conflicts })))
        }
        CoreError::InconsistentBatch(BatchInconsistency::MixedAlbums(ids)) => {
            (None, Some(json!({ "album_ids": ids })))
        }
        CoreError::StoreFailure { partial, .. } => match partial {
            PartialWrite::None => (None, None),
            PartialWrite::Songs(songs) => (serde_json::to_value(songs).ok(), None),
            PartialWrite::AlbumWithSongs { album, songs } => {
                (Some(json!({ "album": album, "songs": songs })), None)
            }
            PartialWrite::AlbumDeleted { album_id } => {
                (None, Some(json!({ "orphaned_songs_of": album_id })))
            }
        },
        CoreError::NotFound { .. }
        | CoreError::InconsistentBatch(BatchInconsistency::UnknownAlbum(_))
        | CoreError::ImmutableResource { .. } => (None, None),
    }
}
