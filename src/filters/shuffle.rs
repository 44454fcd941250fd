//! Byte-wise shuffle filter.
//!
//! Ported from the teacher repo's `blosc/shuffle-generic.rs`
//! (`shuffle_generic`/`unshuffle_generic`), dropping the CPU-feature
//! dispatch table (this engine is single-threaded and has no SIMD
//! backends) and exposing the generic routine directly.

/// Rearrange `src` so that byte `j` of every `typesize`-byte element is
/// grouped together, in element order. `dest` must be at least as long as
/// `src`.
pub fn shuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    let len = src.len();
    if typesize <= 1 || len < typesize {
        dest[..len].copy_from_slice(&src[..len]);
        return;
    }

    let nelem = len / typesize;
    let leftover = len % typesize;

    for j in 0..typesize {
        for i in 0..nelem {
            dest[j * nelem + i] = src[i * typesize + j];
        }
    }

    let start = len - leftover;
    dest[start..len].copy_from_slice(&src[start..len]);
}

/// Inverse of [`shuffle`].
pub fn unshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    let len = src.len();
    if typesize <= 1 || len < typesize {
        dest[..len].copy_from_slice(&src[..len]);
        return;
    }

    let nelem = len / typesize;
    let leftover = len % typesize;

    for i in 0..nelem {
        for j in 0..typesize {
            dest[i * typesize + j] = src[j * nelem + i];
        }
    }

    let start = len - leftover;
    dest[start..len].copy_from_slice(&src[start..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shuffle_unshuffle_round_trips() {
        let src: Vec<u8> = (0..403u32).map(|i| (i % 251) as u8).collect();
        for typesize in [1usize, 2, 4, 8, 3] {
            let mut shuffled = vec![0u8; src.len()];
            shuffle(typesize, &src, &mut shuffled);
            let mut restored = vec![0u8; src.len()];
            unshuffle(typesize, &shuffled, &mut restored);
            assert_eq!(restored, src, "typesize={typesize}");
        }
    }

    #[test]
    fn groups_element_bytes_for_typesize_4() {
        let src: Vec<u8> = (0u8..16).collect();
        let mut dest = vec![0u8; 16];
        shuffle(4, &src, &mut dest);
        // byte-plane 0 across all 4 elements, then plane 1, ...
        assert_eq!(dest, vec![0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14, 3, 7, 11, 15]);
    }
}
