//! Compile-time layout constants for the on-disk format.
//!
//! Centralized here rather than scattered as magic numbers through
//! `codec.rs` / `handle.rs`, the way the rest of this crate's constants
//! are kept together.

/// Number of hash tables in the header (one per low byte of a key hash).
pub(crate) const NUM_TABLES: usize = 256;

/// Size in bytes of one header entry: `(hpos: u32 BE, hslots: u32 BE)`.
pub(crate) const HEADER_ENTRY_SIZE: usize = 8;

/// Total header size in bytes: 256 entries * 8 bytes.
pub(crate) const HEADER_SIZE: u64 = (NUM_TABLES * HEADER_ENTRY_SIZE) as u64;

/// Size in bytes of one hash-table slot: `(khash: u32 BE, vpos: u32 BE)`.
pub(crate) const SLOT_SIZE: u32 = 8;

/// Size in bytes of one record header: `(klen: u32 BE, vlen: u32 BE)`.
pub(crate) const RECORD_HEADER_SIZE: u32 = 8;

/// Reserved tag value meaning "no tag". Must not be hashed or compared.
pub(crate) const NO_TAG: u8 = 0;

/// Below this mapped size, skip the `madvise(MADV_RANDOM)` syscall — the
/// whole mapping fits in a page or two and sequential readahead from the
/// kernel costs nothing extra for it.
pub(crate) const RANDOM_ADVISE_THRESHOLD: u64 = 64 * 1024;

/// Largest file this reader will map: 4 GiB minus one page, so that
/// `u32` offsets stored in the header/slots/records never wrap.
pub(crate) const MAX_FILE_SIZE: u64 = u32::MAX as u64;
