//! Identifier-space arithmetic: hashing into `Z_{2^m}` and cyclic arc membership.
use sha2::{Digest, Sha256};

pub type Id = u64;

/// `SHA256(data) mod 2^m`, used both for node ids (hashed from address) and
/// record hashes (hashed from the education field).
pub fn hash_mod(data: &str, m: u32) -> Id {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = hasher.finalize();

    // The low 8 bytes of the digest carry plenty of entropy for any m <= 64
    // the spec's `ft_size` config supports.
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[digest.len() - 8..]);
    let full = u64::from_be_bytes(bytes);
    modulo(full, m)
}

pub fn modulo(x: u64, m: u32) -> Id {
    if m >= 64 {
        x
    } else {
        x % (1u64 << m)
    }
}

pub fn ring_size(m: u32) -> u64 {
    if m >= 64 { u64::MAX } else { 1u64 << m }
}

pub fn offset(x: Id, delta: i64, m: u32) -> Id {
    let size = ring_size(m) as i128;
    let x = x as i128;
    let result = ((x + delta as i128) % size + size) % size;
    result as u64
}

/// Half-open arc `[lo, hi)` on the identifier circle. Equal bounds denote an
/// empty arc, never the whole ring -- callers meaning "everywhere" must not
/// call this with `lo == hi`.
pub fn in_arc_closed_open(lo: Id, hi: Id, x: Id) -> bool {
    if lo < hi {
        lo <= x && x < hi
    } else if lo > hi {
        x >= lo || x < hi
    } else {
        false
    }
}

/// Half-open arc `(lo, hi]`.
pub fn in_arc_open_closed(lo: Id, hi: Id, x: Id, m: u32) -> bool {
    in_arc_closed_open(offset(lo, 1, m), offset(hi, 1, m), x)
}

/// Open arc `(lo, hi)`.
pub fn in_arc_open_open(lo: Id, hi: Id, x: Id, m: u32) -> bool {
    in_arc_closed_open(offset(lo, 1, m), hi, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_open_basic() {
        assert!(in_arc_closed_open(2, 6, 2));
        assert!(in_arc_closed_open(2, 6, 5));
        assert!(!in_arc_closed_open(2, 6, 6));
        assert!(!in_arc_closed_open(2, 6, 1));
    }

    #[test]
    fn closed_open_wraps() {
        // m = 3, ring size 8: arc [6, 2) wraps past 7 -> {6,7,0,1}
        assert!(in_arc_closed_open(6, 2, 7));
        assert!(in_arc_closed_open(6, 2, 0));
        assert!(!in_arc_closed_open(6, 2, 3));
    }

    #[test]
    fn equal_bounds_is_empty() {
        assert!(!in_arc_closed_open(4, 4, 4));
        assert!(!in_arc_closed_open(4, 4, 0));
    }

    #[test]
    fn open_closed_includes_right_excludes_left() {
        // (2, 6] on m = 3
        assert!(!in_arc_open_closed(2, 6, 2, 3));
        assert!(in_arc_open_closed(2, 6, 3, 3));
        assert!(in_arc_open_closed(2, 6, 6, 3));
        assert!(!in_arc_open_closed(2, 6, 7, 3));
    }

    #[test]
    fn open_open_excludes_both_ends() {
        assert!(!in_arc_open_open(2, 6, 2, 3));
        assert!(!in_arc_open_open(2, 6, 6, 3));
        assert!(in_arc_open_open(2, 6, 4, 3));
    }

    #[test]
    fn offset_wraps_past_zero() {
        assert_eq!(offset(1, -2, 3), 7);
        assert_eq!(offset(0, -1, 3), 7);
        assert_eq!(offset(7, 1, 3), 0);
    }

    #[test]
    fn hash_is_stable_and_bounded() {
        let m = 7;
        let a = hash_mod("10.0.0.1:50051", m);
        let b = hash_mod("10.0.0.1:50051", m);
        assert_eq!(a, b);
        assert!(a < ring_size(m));
    }
}
