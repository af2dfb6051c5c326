//! The generation chain: the republish/reclaim protocol behind
//! `mcdb_mmap_thread_registration` and `mcdb_mmap_reopen_threadsafe`.
//!
//! The C original links generations through a raw `mcdb_mmap *next` pointer
//! per node and reclaims a node the instant its refcount hits zero, walking
//! forward from wherever the just-decremented node sits in the chain. That is
//! safe only so long as every still-live node is reachable from a live
//! ancestor; see SPEC_FULL.md 9.1(b) for the scenario where a node more than
//! one generation behind the current tail can end up with a dangling `next`
//! under that rule. This registry instead keeps the chain as an explicit,
//! ordered `Vec<Node>` and only ever reclaims a contiguous run starting at
//! the oldest (index 0) entry, stopping at the first node still referenced
//! and never dropping the tail. A lagging reader simply keeps its old
//! generation pinned for longer; nothing is ever freed out from under a live
//! reference.

use std::sync::{Arc, Mutex};

use crate::mapping::GenerationData;

struct Node {
    id: u64,
    data: Arc<GenerationData>,
    refcnt: usize,
}

struct Chain {
    nodes: Vec<Node>,
    next_id: u64,
}

impl Chain {
    /// Drops every node from the front that is both unreferenced and not
    /// the last remaining node. The tail is never reclaimed this way — it
    /// is the chain's only entry once a database has no pending
    /// `reopen_threadsafe`, and removing it would leave the chain empty.
    fn reclaim_front(&mut self) {
        while self.nodes.len() > 1 && self.nodes[0].refcnt == 0 {
            let reclaimed = self.nodes.remove(0);
            log::trace!("reclaimed generation {}", reclaimed.id);
        }
    }

    fn index_of(&self, id: u64) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

/// Owns the chain of mapped generations for one [`crate::Db`] and
/// serializes every mutation behind a single mutex, the way the C original
/// serializes `mcdb_mmap_thread_registration` calls behind one process-wide
/// mutex (narrowed here to one mutex per database; see SPEC_FULL.md 9.1(a)).
/// Reads of an already-registered generation's bytes never take this lock —
/// only registering, migrating, unregistering, or publishing a new
/// generation does.
pub(crate) struct Registry {
    chain: Mutex<Chain>,
}

impl Registry {
    /// Seeds the chain with the first generation, already counted as
    /// referenced once (the handle returned by `Db::create`).
    pub(crate) fn new(initial: GenerationData) -> (Self, u64) {
        let id = 0;
        let chain = Chain {
            nodes: vec![Node {
                id,
                data: Arc::new(initial),
                refcnt: 1,
            }],
            next_id: 1,
        };
        (Registry { chain: Mutex::new(chain) }, id)
    }

    /// The current tail generation, with its refcount bumped by one for the
    /// caller. Equivalent to a fresh `mcdb_mmap_thread_registration` call
    /// with no prior generation to release.
    pub(crate) fn register(&self) -> (u64, Arc<GenerationData>) {
        let mut chain = self.chain.lock().unwrap();
        let tail = chain.nodes.last_mut().expect("chain is never empty");
        tail.refcnt += 1;
        (tail.id, Arc::clone(&tail.data))
    }

    /// Releases a previously registered generation, reclaiming it (and any
    /// older now-unreferenced generations) if it was the oldest live node.
    pub(crate) fn unregister(&self, id: u64) {
        let mut chain = self.chain.lock().unwrap();
        if let Some(idx) = chain.index_of(id) {
            chain.nodes[idx].refcnt -= 1;
        }
        chain.reclaim_front();
    }

    /// Atomically releases `current_id` and registers the tail generation,
    /// returning its id and data. Used by a handle that discovers, via
    /// [`crate::Db::refresh_check`] or a failed probe, that a newer
    /// generation exists. Equivalent to the release-then-register sequence
    /// a reader performs around `mcdb_mmap_thread_registration`.
    pub(crate) fn migrate(&self, current_id: u64) -> (u64, Arc<GenerationData>) {
        let mut chain = self.chain.lock().unwrap();
        if let Some(idx) = chain.index_of(current_id) {
            chain.nodes[idx].refcnt -= 1;
        }
        let tail = chain.nodes.last_mut().expect("chain is never empty");
        tail.refcnt += 1;
        let result = (tail.id, Arc::clone(&tail.data));
        chain.reclaim_front();
        result
    }

    /// Appends a newly mapped generation as the chain's tail. Returns
    /// `false` without doing anything if `data` describes the same mtime as
    /// the current tail — mirroring `mcdb_mmap_reopen_threadsafe`'s
    /// short-circuit when the file has not actually changed.
    pub(crate) fn publish(&self, data: GenerationData) -> bool {
        let mut chain = self.chain.lock().unwrap();
        let tail_mtime = chain.nodes.last().expect("chain is never empty").data.mtime();
        if tail_mtime == data.mtime() {
            return false;
        }
        let id = chain.next_id;
        chain.next_id += 1;
        chain.nodes.push(Node {
            id,
            data: Arc::new(data),
            refcnt: 0,
        });
        chain.reclaim_front();
        true
    }

    /// The tail generation's recorded mtime, without registering a
    /// reference to it. `mcdb_mmap_refresh_check` reads `map->mtime`
    /// directly through a `const` pointer for the same reason: checking
    /// staleness is not a use of the mapping and should not perturb its
    /// refcount.
    pub(crate) fn tail_mtime(&self) -> i64 {
        self.chain.lock().unwrap().nodes.last().expect("chain is never empty").data.mtime()
    }
}
