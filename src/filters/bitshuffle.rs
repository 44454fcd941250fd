//! Bit-wise shuffle filter.
//!
//! Ported from the teacher repo's `blosc/bitshuffle-generic.rs`, which is
//! itself a safe-Rust transliteration of c-blosc2's scalar bitshuffle
//! kernel. Only the scalar path is kept (no SIMD backends, matching this
//! engine's single-threaded, portable scope).

#[inline]
fn trans_bit_8x8(x: &mut u64) {
    let mut t: u64;
    t = (*x ^ (*x >> 7)) & 0x00AA_00AA_00AA_00AA;
    *x ^= t ^ (t << 7);
    t = (*x ^ (*x >> 14)) & 0x0000_CCCC_0000_CCCC;
    *x ^= t ^ (t << 14);
    t = (*x ^ (*x >> 28)) & 0x0000_0000_F0F0_F0F0;
    *x ^= t ^ (t << 28);
}

fn trans_byte_elem(input: &[u8], output: &mut [u8], size: usize, elem_size: usize) {
    for ii in 0..size {
        for jj in 0..elem_size {
            output[jj * size + ii] = input[ii * elem_size + jj];
        }
    }
}

fn trans_byte_bitrow(input: &[u8], output: &mut [u8], size: usize, elem_size: usize) {
    let nbyte_row = size / 8;
    for jj in 0..elem_size {
        for ii in 0..nbyte_row {
            for kk in 0..8 {
                output[ii * 8 * elem_size + jj * 8 + kk] = input[(jj * 8 + kk) * nbyte_row + ii];
            }
        }
    }
}

fn trans_bit_byte(input: &[u8], output: &mut [u8], size: usize, elem_size: usize) {
    let nbyte = elem_size * size;
    let nbyte_bitrow = nbyte / 8;
    for ii in 0..nbyte_bitrow {
        let mut x = u64::from_ne_bytes(input[ii * 8..ii * 8 + 8].try_into().unwrap());
        trans_bit_8x8(&mut x);
        for kk in 0..8 {
            output[(kk as usize) * nbyte_bitrow + ii] = (x & 0xFF) as u8;
            x >>= 8;
        }
    }
}

fn shuffle_bit_eightelem(input: &[u8], output: &mut [u8], size: usize, elem_size: usize) {
    let nbyte = elem_size * size;
    let mut jj = 0;
    while jj < 8 * elem_size {
        let mut ii = 0;
        while ii + 8 * elem_size - 1 < nbyte {
            let mut x = u64::from_ne_bytes(input[ii + jj..ii + jj + 8].try_into().unwrap());
            trans_bit_8x8(&mut x);
            for kk in 0..8 {
                output[ii + jj / 8 + kk * elem_size] = (x & 0xFF) as u8;
                x >>= 8;
            }
            ii += 8 * elem_size;
        }
        jj += 8;
    }
}

/// Transpose the bits of every `typesize`-byte element across the buffer.
/// Only operates on the leading multiple-of-8-elements region of `src`;
/// leftover bytes at the end are copied through unshuffled, matching the
/// teacher's `blosc2_bitshuffle` wrapper behavior.
pub fn bitshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    let len = src.len();
    if typesize == 0 || len < typesize {
        dest[..len].copy_from_slice(&src[..len]);
        return;
    }
    let mut size = len / typesize;
    size -= size % 8;

    if size == 0 {
        dest[..len].copy_from_slice(&src[..len]);
        return;
    }

    let mut byte_transposed = vec![0u8; size * typesize];
    trans_byte_elem(&src[..size * typesize], &mut byte_transposed, size, typesize);
    let mut bit_transposed = vec![0u8; size * typesize];
    trans_bit_byte(&byte_transposed, &mut bit_transposed, size, typesize);
    trans_byte_bitrow(&bit_transposed, &mut dest[..size * typesize], size, typesize);

    let offset = size * typesize;
    dest[offset..len].copy_from_slice(&src[offset..len]);
}

/// Inverse of [`bitshuffle`].
pub fn bitunshuffle(typesize: usize, src: &[u8], dest: &mut [u8]) {
    let len = src.len();
    if typesize == 0 || len < typesize {
        dest[..len].copy_from_slice(&src[..len]);
        return;
    }
    let mut size = len / typesize;
    size -= size % 8;

    if size == 0 {
        dest[..len].copy_from_slice(&src[..len]);
        return;
    }

    let mut byte_bitrow = vec![0u8; size * typesize];
    trans_byte_bitrow(&src[..size * typesize], &mut byte_bitrow, size, typesize);
    shuffle_bit_eightelem(&byte_bitrow, &mut dest[..size * typesize], size, typesize);

    let offset = size * typesize;
    dest[offset..len].copy_from_slice(&src[offset..len]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitshuffle_bitunshuffle_round_trips() {
        let src: Vec<u8> = (0..400u32).map(|i| (i % 253) as u8).collect();
        for typesize in [1usize, 2, 4, 8] {
            let mut shuffled = vec![0u8; src.len()];
            bitshuffle(typesize, &src, &mut shuffled);
            let mut restored = vec![0u8; src.len()];
            bitunshuffle(typesize, &shuffled, &mut restored);
            assert_eq!(restored, src, "typesize={typesize}");
        }
    }
}
