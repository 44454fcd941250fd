//! Filter pipeline descriptor (C1): packs up to [`MAX_FILTERS`] filter codes
//! into a single u16, and unpacks them again.
//!
//! Grounded on `original_source/c-blosc2/blosc/schunk.c`'s `encode_filters`/
//! `decode_filters`. The original encodes each slot with a 3-bit stride but
//! decodes with a 2-bit mask (`& 0x3`) — an asymmetry spec.md §4.1/§9 flags
//! as an open question. This implementation resolves it in favor of the
//! encoder: decoding masks with `& 0x7`, so `decode(encode(filters)) ==
//! filters` for every filter code in `0..=7`.

use crate::constants::MAX_FILTERS;

/// Pack `filters[0..MAX_FILTERS]` into a 16-bit word, 3 bits per slot.
///
/// # Panics
/// Panics if any slot holds a value outside `0..=7` — callers are expected
/// to validate filter codes at `Params` construction time.
pub fn encode(filters: &[u8; MAX_FILTERS]) -> u16 {
    let mut word: u16 = 0;
    for (i, &f) in filters.iter().enumerate() {
        assert!(f <= 7, "filter code {f} does not fit in 3 bits");
        word += (f as u16) << (i * 3);
    }
    word
}

/// Unpack a 16-bit filter word into `MAX_FILTERS` slot codes.
pub fn decode(word: u16) -> [u8; MAX_FILTERS] {
    let mut filters = [0u8; MAX_FILTERS];
    for (i, slot) in filters.iter_mut().enumerate() {
        *slot = ((word >> (i * 3)) & 0x7) as u8;
    }
    filters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BLOSC_DELTA, BLOSC_SHUFFLE};

    #[test]
    fn round_trips_plain_filters() {
        let filters = [BLOSC_DELTA, BLOSC_SHUFFLE, 0, 0, 0];
        assert_eq!(decode(encode(&filters)), filters);
    }

    #[test]
    fn round_trips_every_single_code_0_through_7() {
        for code in 0..=7u8 {
            let filters = [code, 0, 0, 0, 0];
            assert_eq!(decode(encode(&filters)), filters, "code {code} did not round-trip");
        }
    }

    #[test]
    fn round_trips_a_code_at_or_above_4_in_every_slot() {
        // Pins the open question from spec.md: a naive 2-bit decode mask
        // would corrupt any slot holding a code >= 4.
        let filters = [4, 5, 6, 7, 4];
        assert_eq!(decode(encode(&filters)), filters);
    }
}
