//! Crate-level error type.
//!
//! Routine, expected outcomes on the lookup path (empty bucket, end of
//! probe, out-of-range read, a swallowed refresh failure) are never
//! represented here — they are `bool`/`Option` returns on [`crate::Handle`].
//! This type only covers the things that can go wrong while opening,
//! mapping, or republishing a database.

use std::path::PathBuf;

/// Errors surfaced by [`crate::Db::create`], [`crate::Db::reopen_threadsafe`]
/// and [`crate::Db::refresh_check`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The database file, or its containing directory, could not be opened.
    #[error("open {path:?}: {source}")]
    OpenError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `mmap(2)` of an opened file descriptor failed.
    #[error("map {path:?}: {source}")]
    MapError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `fstat`/`fstatat` failed while sizing the file or checking its mtime.
    #[error("stat {path:?}: {source}")]
    StatError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reserved for allocator-fallible construction paths. The C original this
    /// crate's registry protocol is ported from took caller-supplied
    /// `alloc`/`free` callbacks that could report out-of-memory; this crate
    /// uses the ordinary Rust global allocator instead (see DESIGN.md), so
    /// nothing currently constructs this variant.
    #[error("allocation failed")]
    AllocError,

    /// A registry operation (register, reopen_threadsafe) was attempted
    /// against a generation that has already been fully destroyed. Callers
    /// should re-`create` the database.
    #[error("database generation has already been destroyed")]
    Superseded,
}

pub type Result<T> = std::result::Result<T, Error>;
