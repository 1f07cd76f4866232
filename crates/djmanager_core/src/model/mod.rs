//! Domain records for the album/song/set catalog.
//!
//! # Responsibility
//! - Define the typed shapes of the three document collections.
//! - Define caller-facing input specs and patches.
//!
//! # Invariants
//! - Every record is identified by a [`RecordId`] compared in normalized form.
//! - Songs reference exactly one album; sets reference songs weakly.

pub mod album;
pub mod dj_set;
pub mod id;
pub mod song;
