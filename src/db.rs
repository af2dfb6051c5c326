//! The public handle-less database object: owns the file source and the
//! generation chain, and is the only thing that can publish a new
//! generation. Equivalent to a `struct mcdb_mmap *` as driven by the
//! "maintenance thread" half of the usage pattern documented above
//! `mcdb_mmap_create` in the C source.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::handle::Handle;
use crate::mapping::{GenerationData, Source};
use crate::registry::Registry;

/// An open constant database.
///
/// A `Db` owns the means to (re)open its backing file and the chain of
/// mapped generations readers are using. It does not itself read records —
/// call [`Db::handle`] to get a [`Handle`] for that. Dropping the last
/// `Arc<Db>` (and every `Handle` derived from it, since a `Handle` holds its
/// own strong reference) is this crate's equivalent of `mcdb_mmap_destroy`:
/// there is no explicit destroy call, and — unlike the C original, which
/// documents "must not be called while refcnt > 0" as a caller obligation —
/// it is simply impossible to drop a `Db` while a `Handle` still references
/// one of its generations.
pub struct Db {
    source: Source,
    registry: Registry,
}

impl Db {
    /// Opens `filename` (optionally relative to an already-open `dirname`)
    /// and maps its current contents as generation 0.
    ///
    /// Equivalent to `mcdb_mmap_create` followed by the implicit initial
    /// `mcdb_mmap_thread_registration(MCDB_REGISTER_USE_INCR)` a caller
    /// performs before its first lookup.
    pub fn create(dirname: Option<&Path>, filename: &Path) -> Result<Arc<Db>> {
        let source = Source::open(dirname, filename)?;
        let initial = GenerationData::open(&source)?;
        let (registry, _id) = Registry::new(initial);
        Ok(Arc::new(Db { source, registry }))
    }

    /// A reader handle pinned to the current tail generation.
    pub fn handle(self: &Arc<Db>) -> Handle {
        let (gen_id, data) = self.registry.register();
        Handle::new(Arc::clone(self), gen_id, data)
    }

    /// Releases `current_id` and registers the tail generation in its
    /// place, for use by a [`Handle`] refreshing itself between probes.
    pub(crate) fn registry_migrate(&self, current_id: u64) -> (u64, Arc<GenerationData>) {
        self.registry.migrate(current_id)
    }

    /// Releases a generation a [`Handle`] no longer references, called from
    /// its `Drop` impl.
    pub(crate) fn registry_unregister(&self, id: u64) {
        self.registry.unregister(id)
    }

    /// Cheap check for whether the backing file has changed since the
    /// generation currently at the tail of the chain was mapped. Does not
    /// reopen or remap anything; a `true` result is a hint that a caller
    /// (typically a maintenance thread on a timer) should call
    /// [`Db::reopen_threadsafe`]. Equivalent to `mcdb_mmap_refresh_check`.
    pub fn refresh_check(&self) -> Result<bool> {
        let stale = self.source.stat_mtime()? != self.registry.tail_mtime();
        log::debug!("refresh_check({:?}) = {stale}", self.source.display_path());
        Ok(stale)
    }

    /// Unconditionally reopens and maps the backing file's current
    /// contents, publishing the result as a new tail generation — unless a
    /// reopen is already pending (a prior call published a generation no
    /// handle has migrated to yet) or the file's mtime has not actually
    /// changed since the current tail was mapped, in which case this is a
    /// no-op. Returns whether a new generation was published.
    ///
    /// Equivalent to `mcdb_mmap_reopen_threadsafe`, minus its malloc-failure
    /// path (Rust's global allocator aborts rather than returning a
    /// recoverable error here; see DESIGN.md).
    pub fn reopen_threadsafe(&self) -> Result<bool> {
        let data = GenerationData::open(&self.source)?;
        let published = self.registry.publish(data);
        if published {
            log::debug!("reopened {:?}: new generation published", self.source.display_path());
        } else {
            log::debug!("reopened {:?}: no change, generation not republished", self.source.display_path());
        }
        Ok(published)
    }
}
