//! DELTA filter: encode/decode a buffer relative to a reference buffer of
//! the same typesize, element-wise XOR.
//!
//! Ported from the teacher repo's `blosc/delta.rs` (`delta_encoder`/
//! `delta_decoder`), but re-architected per spec.md §9: the reference is
//! passed as an explicit borrowed slice instead of being looked up through a
//! process-global "current schunk" context, and raw-pointer casts are
//! replaced with safe `chunks_exact`/`from_le_bytes` element access.
//!
//! Two modes, matching the original:
//! - `offset == 0` (the reference block itself): each element is XORed
//!   against the *previous* element in the same buffer (the first element
//!   is left untouched).
//! - `offset != 0` (a later block): each element is XORed against the
//!   corresponding element of `reference`.
//!
//! `typesize` can be any value up to 255 (spec.md has no upper bound below
//! that), but the element-at-a-time XOR below only handles `typesize <= 8`
//! directly. For larger typesizes, the original recurses with `typesize = 8`
//! when the real typesize is a multiple of 8, or `typesize = 1` otherwise
//! (`examples/keller-mark-blusc/src/blosc/delta.rs`); this keeps the same
//! fallback so a 16-byte (or other >8-byte) element never panics.

fn elem_at(buf: &[u8], typesize: usize, i: usize) -> u64 {
    let start = i * typesize;
    let mut bytes = [0u8; 8];
    bytes[..typesize].copy_from_slice(&buf[start..start + typesize]);
    u64::from_le_bytes(bytes)
}

fn write_elem(buf: &mut [u8], typesize: usize, i: usize, value: u64) {
    let start = i * typesize;
    let bytes = value.to_le_bytes();
    buf[start..start + typesize].copy_from_slice(&bytes[..typesize]);
}

/// Fall back to an 8-byte or 1-byte element size for typesizes the
/// fixed-width `elem_at`/`write_elem` helpers can't hold directly.
fn effective_typesize(typesize: usize) -> usize {
    if typesize > 8 {
        if typesize % 8 == 0 {
            8
        } else {
            1
        }
    } else {
        typesize
    }
}

/// Encode `src` into `dest`, both `nbytes` long, against `reference`
/// (also at least `nbytes` long) using `typesize`-byte elements.
pub fn encode(reference: &[u8], offset: i64, typesize: usize, src: &[u8], dest: &mut [u8]) {
    let typesize = effective_typesize(typesize);
    let nbytes = src.len();
    let nelem = nbytes / typesize;

    if offset == 0 {
        if nelem > 0 {
            dest[..typesize].copy_from_slice(&src[..typesize]);
        }
        for i in 1..nelem {
            let prev = elem_at(src, typesize, i - 1);
            let cur = elem_at(src, typesize, i);
            write_elem(dest, typesize, i, cur ^ prev);
        }
    } else {
        for i in 0..nelem {
            let r = elem_at(reference, typesize, i);
            let cur = elem_at(src, typesize, i);
            write_elem(dest, typesize, i, cur ^ r);
        }
    }

    let leftover = nelem * typesize;
    dest[leftover..nbytes].copy_from_slice(&src[leftover..nbytes]);
}

/// Undo [`encode`] in place.
pub fn decode(reference: &[u8], offset: i64, typesize: usize, buf: &mut [u8]) {
    let typesize = effective_typesize(typesize);
    let nbytes = buf.len();
    let nelem = nbytes / typesize;

    if offset == 0 {
        for i in 1..nelem {
            let prev = elem_at(buf, typesize, i - 1);
            let cur = elem_at(buf, typesize, i);
            write_elem(buf, typesize, i, cur ^ prev);
        }
    } else {
        for i in 0..nelem {
            let r = elem_at(reference, typesize, i);
            let cur = elem_at(buf, typesize, i);
            write_elem(buf, typesize, i, cur ^ r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_block_round_trips_against_itself() {
        let src: Vec<u8> = (0..64u32).map(|i| (i * 7 % 256) as u8).collect();
        for typesize in [1usize, 2, 4, 8] {
            let mut encoded = vec![0u8; src.len()];
            encode(&src, 0, typesize, &src, &mut encoded);
            let mut decoded = encoded.clone();
            decode(&src, 0, typesize, &mut decoded);
            assert_eq!(decoded, src, "typesize={typesize}");
        }
    }

    #[test]
    fn later_block_round_trips_against_reference() {
        let reference: Vec<u8> = (0..64u32).map(|i| (i * 3 % 256) as u8).collect();
        let src: Vec<u8> = (0..64u32).map(|i| ((i * 11 + 5) % 256) as u8).collect();
        for typesize in [1usize, 2, 4, 8] {
            let mut encoded = vec![0u8; src.len()];
            encode(&reference, 1, typesize, &src, &mut encoded);
            let mut decoded = encoded.clone();
            decode(&reference, 1, typesize, &mut decoded);
            assert_eq!(decoded, src, "typesize={typesize}");
        }
    }

    #[test]
    fn typesizes_above_8_do_not_panic_and_round_trip() {
        // 16 (multiple of 8, falls back to effective typesize 8) and 17 (not
        // a multiple of 8, falls back to effective typesize 1).
        let reference: Vec<u8> = (0..64u32).map(|i| (i * 3 % 256) as u8).collect();
        let src: Vec<u8> = (0..64u32).map(|i| ((i * 11 + 5) % 256) as u8).collect();
        for typesize in [16usize, 17] {
            let mut encoded = vec![0u8; src.len()];
            encode(&reference, 0, typesize, &src, &mut encoded);
            let mut decoded = encoded.clone();
            decode(&reference, 0, typesize, &mut decoded);
            assert_eq!(decoded, src, "typesize={typesize}");

            let mut encoded = vec![0u8; src.len()];
            encode(&reference, 1, typesize, &src, &mut encoded);
            let mut decoded = encoded.clone();
            decode(&reference, 1, typesize, &mut decoded);
            assert_eq!(decoded, src, "typesize={typesize}");
        }
    }
}
