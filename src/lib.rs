//! A read-only, memory-mapped reader for a constant (cdb-family) key/value
//! database file.
//!
//! A database is built once, offline, by some other tool, and then served
//! to many concurrent readers for its entire lifetime — this crate only
//! ever reads. The one piece of mutable state it manages is *which*
//! generation of the file's contents a reader currently has mapped: a
//! maintenance thread can call [`Db::reopen_threadsafe`] at any time to
//! pick up a newer version of the file on disk, and existing [`Handle`]s
//! migrate to it lazily, between lookups, without ever seeing a mapping
//! disappear out from under an in-progress read.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let db = mcdb::Db::create(None, Path::new("users.cdb"))?;
//! let mut h = db.handle();
//! if let Some(value) = h.get(b"alice", 0) {
//!     println!("{} bytes", value.len());
//! }
//! # Ok::<(), mcdb::Error>(())
//! ```

mod codec;
mod config;
mod db;
mod error;
mod handle;
mod mapping;
mod registry;

pub use db::Db;
pub use error::{Error, Result};
pub use handle::Handle;
