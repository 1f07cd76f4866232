//! Core use-case services.
//!
//! # Responsibility
//! - Enforce the cross-collection invariants the document store cannot:
//!   label-number uniqueness, insert-time album references, conflict-checked
//!   album deletion with song cascade, and the set publish lock.
//! - Report every outcome as a [`crate::CoreResult`].
//!
//! # Invariants
//! - Services only reach the store through the [`crate::RecordStore`] handed
//!   to them; there is no global store.
//! - Check-then-act sequences hold no lock across steps. Concurrent callers
//!   can interleave between a check and the write it guards.

pub mod album_deletion;
pub mod album_registrar;
pub mod set_guard;
pub mod song_batch;
