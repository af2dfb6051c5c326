//! Test-only cdb builder.
//!
//! An independent, from-scratch encoder for the on-disk format `mcdb::Handle`
//! reads, deliberately not sharing any code with `src/codec.rs` — these
//! tests are meant to catch a broken reader against a known-good writer, not
//! to confirm the reader agrees with itself. Layout: a 2048-byte header of
//! 256 `(hpos, hslots)` entries, followed by variable-length records, then
//! 256 hash-slot tables, mirroring the classic cdb file shape (header, data,
//! tables) with mcdb's big-endian fields and optional tag byte.

use std::io::Write;
use std::path::Path;

const NUM_TABLES: usize = 256;

fn hash(tag: u8, key: &[u8]) -> u32 {
    let mut h: u32 = 5381;
    if tag != 0 {
        h = (h.wrapping_shl(5).wrapping_add(h)) ^ (tag as u32);
    }
    for &b in key {
        h = (h.wrapping_shl(5).wrapping_add(h)) ^ (b as u32);
    }
    h
}

pub struct Entry<'a> {
    pub tag: u8,
    pub key: &'a [u8],
    pub value: &'a [u8],
}

pub fn entry<'a>(tag: u8, key: &'a [u8], value: &'a [u8]) -> Entry<'a> {
    Entry { tag, key, value }
}

/// Serializes `entries` into cdb-family bytes. Duplicate keys are allowed
/// and preserved in insertion order, the way a real build of this format
/// would append every value under a repeated key rather than overwrite.
pub fn build(entries: &[Entry]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut per_key = Vec::with_capacity(entries.len());

    for e in entries {
        let vpos = 2048 + data.len() as u32;
        let khash = hash(e.tag, e.key);
        let rlen = e.key.len() as u32 + if e.tag != 0 { 1 } else { 0 };
        data.extend_from_slice(&rlen.to_be_bytes());
        data.extend_from_slice(&(e.value.len() as u32).to_be_bytes());
        if e.tag != 0 {
            data.push(e.tag);
        }
        data.extend_from_slice(e.key);
        data.extend_from_slice(e.value);
        per_key.push((khash, vpos));
    }

    let mut buckets: Vec<Vec<(u32, u32)>> = vec![Vec::new(); NUM_TABLES];
    for (khash, vpos) in &per_key {
        buckets[(*khash & 0xff) as usize].push((*khash, *vpos));
    }

    let tables_start = 2048 + data.len() as u32;
    let mut tables = Vec::new();
    let mut header = vec![0u8; 2048];

    let mut cursor = tables_start;
    for (b, bucket) in buckets.iter().enumerate() {
        let hslots = (bucket.len() * 2) as u32;
        let hpos = cursor;
        header[b * 8..b * 8 + 4].copy_from_slice(&hpos.to_be_bytes());
        header[b * 8 + 4..b * 8 + 8].copy_from_slice(&hslots.to_be_bytes());
        if hslots == 0 {
            continue;
        }
        let mut slots = vec![0u8; hslots as usize * 8];
        for (khash, vpos) in bucket {
            let mut idx = ((khash >> 8) % hslots) as usize;
            loop {
                let off = idx * 8;
                let existing_vpos = u32::from_be_bytes(slots[off + 4..off + 8].try_into().unwrap());
                if existing_vpos == 0 {
                    slots[off..off + 4].copy_from_slice(&khash.to_be_bytes());
                    slots[off + 4..off + 8].copy_from_slice(&vpos.to_be_bytes());
                    break;
                }
                idx = (idx + 1) % hslots as usize;
            }
        }
        tables.extend_from_slice(&slots);
        cursor += slots.len() as u32;
    }

    let mut out = header;
    out.extend_from_slice(&data);
    out.extend_from_slice(&tables);
    out
}

/// Routes `log::debug!`/`trace!`/`warn!` output from `mcdb` to stderr when a
/// test is run with `--nocapture` (or fails). Safe to call from every test;
/// only the first call in a process actually installs the logger.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

pub fn write_db(path: &Path, entries: &[Entry]) {
    init_logging();
    let bytes = build(entries);
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(&bytes).unwrap();
    f.sync_all().unwrap();
}
