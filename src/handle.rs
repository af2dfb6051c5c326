//! Per-reader probe state. Equivalent to `struct mcdb` plus
//! `mcdb_findtagstart`/`mcdb_findtagnext`/`mcdb_read`/`mcdb_thread_refresh_self`.

use std::sync::Arc;

use crate::codec::{hash_tagged, try_u32_be};
use crate::config::{HEADER_SIZE, RECORD_HEADER_SIZE, SLOT_SIZE};
use crate::db::Db;
use crate::mapping::GenerationData;

/// A reader bound to one [`Db`].
///
/// A `Handle` pins one generation of the database's contents in memory
/// (via its `Arc<GenerationData>`) and carries the scratch state of the
/// current key probe between a [`Handle::find_start`] and any number of
/// subsequent [`Handle::find_next`] calls, the way a single `struct mcdb`
/// is threaded through repeated `mcdb_findtagstart`/`mcdb_findtagnext`
/// calls in the C original. Cloning a `Db` into many `Handle`s is the
/// intended way to give each worker thread its own probe state while
/// sharing one generation chain.
pub struct Handle {
    db: Arc<Db>,
    gen_id: u64,
    data: Arc<GenerationData>,
    probe: Option<Probe>,
}

/// State of an in-progress probe: which hash table, which slot we're
/// about to examine, and how many slots remain before the probe has
/// visited every slot in the table (a full cycle means "not found").
struct Probe {
    khash: u32,
    hpos: u32,
    hslots: u32,
    kpos: u32,
    loop_count: u32,
    tagc: u8,
}

impl Drop for Handle {
    fn drop(&mut self) {
        self.db.registry_unregister(self.gen_id);
    }
}

impl Handle {
    pub(crate) fn new(db: Arc<Db>, gen_id: u64, data: Arc<GenerationData>) -> Self {
        Handle { db, gen_id, data, probe: None }
    }

    /// Migrates to the database's current tail generation if a newer one
    /// has been published since this handle last looked, silently keeping
    /// the existing generation if the migration attempt fails for any
    /// reason. Equivalent to `mcdb_thread_refresh_self`: the C original
    /// likewise discards the return value of its internal
    /// `mcdb_mmap_thread_registration` call and simply continues the
    /// lookup against whichever generation the handle ends up holding —
    /// preserved here rather than "fixed" into a propagated error, since
    /// changing it would change observable behavior for no testable
    /// benefit (see SPEC_FULL.md 9).
    fn refresh_self(&mut self) {
        let (new_id, new_data) = self.db.registry_migrate(self.gen_id);
        if new_id != self.gen_id {
            log::trace!("handle migrated from generation {} to {new_id}", self.gen_id);
        }
        self.gen_id = new_id;
        self.data = new_data;
    }

    /// Begins a probe for `key` under `tag` (`0` for "no tag"), positioning
    /// the handle at the first slot of the key's hash table. Returns
    /// `false` immediately, with no positioning performed, if that table is
    /// empty — mirroring `mcdb_findtagstart`'s `!m->hslots` early return.
    pub fn find_start(&mut self, key: &[u8], tag: u8) -> bool {
        self.refresh_self();

        let khash = hash_tagged(key, tag);
        let bytes = self.data.bytes();
        let table_off = ((khash as u64) << 3) & (HEADER_SIZE - 1);
        let hslots = match try_u32_be(bytes, table_off as usize + 4) {
            Some(v) => v,
            None => {
                self.probe = None;
                return false;
            }
        };
        if hslots == 0 {
            self.probe = None;
            return false;
        }
        let hpos = match try_u32_be(bytes, table_off as usize) {
            Some(v) => v,
            None => {
                self.probe = None;
                return false;
            }
        };
        let kpos = hpos.wrapping_add(((khash >> 8) % hslots) << 3);
        self.probe = Some(Probe {
            khash,
            hpos,
            hslots,
            kpos,
            loop_count: 0,
            tagc: tag,
        });
        true
    }

    /// Advances an in-progress probe to the next slot matching `key`'s
    /// hash, returning `true` and leaving the matched record's position
    /// and length available to [`Handle::read_value`] once the key and tag
    /// also compare equal. Returns `false` once the probe has visited every
    /// slot in the table (key not present) or if [`Handle::find_start`] was
    /// never called or itself returned `false`.
    pub fn find_next(&mut self, key: &[u8], tag: u8) -> Option<(u32, u32)> {
        let probe = self.probe.as_mut()?;
        let bytes = self.data.bytes();
        let slot_size = u64::from(SLOT_SIZE);

        while probe.loop_count < probe.hslots {
            let slot_off = probe.kpos as u64 + 4;
            let vpos = try_u32_be(bytes, slot_off as usize)?;
            if vpos == 0 {
                return None;
            }
            let khash = try_u32_be(bytes, probe.kpos as usize)?;

            probe.kpos += SLOT_SIZE;
            let table_end = probe.hpos as u64 + probe.hslots as u64 * slot_size;
            if probe.kpos as u64 == table_end {
                probe.kpos = probe.hpos;
            }
            probe.loop_count += 1;

            if khash != probe.khash {
                continue;
            }

            let rlen = try_u32_be(bytes, vpos as usize)?;
            let key_start = vpos as usize + RECORD_HEADER_SIZE as usize;
            let klen_matches = if probe.tagc != 0 {
                rlen == key.len() as u32 + 1
                    && bytes.get(key_start).copied() == Some(probe.tagc)
                    && bytes.get(key_start + 1..key_start + 1 + key.len()) == Some(key)
            } else {
                rlen == key.len() as u32
                    && bytes.get(key_start..key_start + key.len()) == Some(key)
            };
            if klen_matches {
                let dlen = try_u32_be(bytes, vpos as usize + 4)?;
                let dpos = vpos.wrapping_add(RECORD_HEADER_SIZE).wrapping_add(rlen);
                return Some((dpos, dlen));
            }
        }
        None
    }

    /// Copies `len` bytes starting at `pos` out of the current generation's
    /// mapping, or `None` if that range falls outside the mapping.
    /// Equivalent to `mcdb_read`.
    pub fn read_value(&self, pos: u32, len: u32) -> Option<Vec<u8>> {
        let bytes = self.data.bytes();
        let mapsz = self.data.size();
        if pos as u64 > mapsz || mapsz - pos as u64 < len as u64 {
            return None;
        }
        bytes.get(pos as usize..pos as usize + len as usize).map(<[u8]>::to_vec)
    }

    /// Looks up `key` under `tag`, returning its value if present. A
    /// convenience wrapper over `find_start`/`find_next`/`read_value` for
    /// databases with no duplicate keys; callers that need every value for
    /// a duplicate key should drive the lower-level methods directly.
    pub fn get(&mut self, key: &[u8], tag: u8) -> Option<Vec<u8>> {
        if !self.find_start(key, tag) {
            return None;
        }
        let (pos, len) = self.find_next(key, tag)?;
        self.read_value(pos, len)
    }
}
