//! Consistency core for the DJ manager catalog.
//!
//! Albums, songs and curated sets live in a document store with no foreign
//! keys, joins or multi-document transactions. This crate enforces the
//! cross-collection rules in application code: label-number uniqueness,
//! insert-time album references, conflict-checked album deletion with song
//! cascade, and the one-way publish lock on sets.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod validation;

pub use config::{ConfigError, CoreConfig, DatabaseConfig, LoggingConfig, WriteMode};
pub use error::{
    BatchInconsistency, Conflict, CoreError, CoreResult, ErrorKind, FieldViolation, Outcome,
    OutcomeError, PartialWrite,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::album::{Album, AlbumSpec};
pub use model::dj_set::{DjSet, DjSetPatch, DjSetSpec, PublishState, ResolvedDjSet, SongInUse};
pub use model::id::RecordId;
pub use model::song::{NewSong, Song, SongSearch, SongSpec};
pub use service::album_deletion::{find_conflicts, AlbumDeletion, DeletionConflictResolver};
pub use service::album_registrar::{AlbumRegistrar, AlbumWithSongs};
pub use service::set_guard::{DeleteReport, SetMutationGuard};
pub use service::song_batch::SongBatchWriter;
pub use store::{
    Collection, DeleteSummary, Document, Filter, FindOptions, MemoryRecordStore, RecordStore,
    SqliteRecordStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
