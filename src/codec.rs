//! Pure byte-offset helpers over the mmap'd database.
//!
//! Mirrors `uint32.h` / the `uint32_hash_djb*` family from the mcdb source:
//! no typed record objects, just functions reading big-endian integers out
//! of a raw byte slice at a caller-supplied offset. All bounds checking is
//! the caller's responsibility — these are hot-path primitives called once
//! per slot examined during a probe.

use crate::config::NO_TAG;

/// DJB2 hash seed (`5381`). Equivalent to `UINT32_HASH_DJB_INIT`.
#[inline]
pub(crate) fn hash_init() -> u32 {
    5381
}

/// Fold one byte into a running DJB2-XOR hash: `h' = (h*33) ^ b`.
/// Equivalent to `uint32_hash_djb_uchar`.
#[inline]
pub(crate) fn hash_byte(seed: u32, b: u8) -> u32 {
    (seed.wrapping_shl(5).wrapping_add(seed)) ^ (b as u32)
}

/// DJB2-XOR hash of `bytes`, starting from `seed`. Equivalent to
/// `uint32_hash_djb`.
#[inline]
pub(crate) fn hash(seed: u32, bytes: &[u8]) -> u32 {
    bytes.iter().fold(seed, |h, &b| hash_byte(h, b))
}

/// Hash of a key under an optional tag. Tag `0x00` means "no tag" and is
/// never folded into the hash — only a non-zero tag byte is hashed first,
/// ahead of the key bytes.
#[inline]
pub(crate) fn hash_tagged(key: &[u8], tag: u8) -> u32 {
    let seed = if tag != NO_TAG {
        hash_byte(hash_init(), tag)
    } else {
        hash_init()
    };
    hash(seed, key)
}

/// Interpret 4 bytes at `buf[off..off+4]` as a big-endian `u32`.
///
/// # Panics
/// Panics if `off + 4 > buf.len()`. Callers on the lookup path are expected
/// to have already range-checked offsets derived from trusted header
/// fields; callers parsing untrusted offsets (fuzzing, corrupted files)
/// must bounds-check before calling this.
#[inline]
pub(crate) fn u32_be(buf: &[u8], off: usize) -> u32 {
    let b = &buf[off..off + 4];
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// Like [`u32_be`] but returns `None` instead of panicking when the read
/// would run past the end of `buf`.
#[inline]
pub(crate) fn try_u32_be(buf: &[u8], off: usize) -> Option<u32> {
    buf.get(off..off + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_init_is_djb_seed() {
        assert_eq!(hash_init(), 5381);
    }

    #[test]
    fn hash_empty_is_seed() {
        assert_eq!(hash(hash_init(), b""), 5381);
    }

    #[test]
    fn hash_matches_classic_cdb_vector() {
        // Classic DJB2-XOR reference value for the empty string is the seed
        // itself; single-byte folding is the defining recurrence, so walk it
        // by hand for a short, known input.
        let mut h = hash_init();
        for b in b"a" {
            h = (h.wrapping_shl(5).wrapping_add(h)) ^ (*b as u32);
        }
        assert_eq!(hash(hash_init(), b"a"), h);
    }

    #[test]
    fn tag_zero_is_not_hashed() {
        assert_eq!(hash_tagged(b"key", 0), hash(hash_init(), b"key"));
    }

    #[test]
    fn nonzero_tag_changes_hash() {
        assert_ne!(hash_tagged(b"key", b'x'), hash_tagged(b"key", 0));
        assert_ne!(hash_tagged(b"key", b'x'), hash_tagged(b"key", b'y'));
    }

    #[test]
    fn u32_be_reads_big_endian() {
        let buf = [0x00, 0x00, 0x01, 0x02];
        assert_eq!(u32_be(&buf, 0), 0x0102);
    }

    #[test]
    fn try_u32_be_none_on_short_buffer() {
        let buf = [0u8; 3];
        assert_eq!(try_u32_be(&buf, 0), None);
        assert_eq!(try_u32_be(&buf, 1), None);
    }

    #[test]
    #[should_panic]
    fn u32_be_panics_out_of_range() {
        let buf = [0u8; 3];
        u32_be(&buf, 0);
    }
}
