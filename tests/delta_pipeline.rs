//! Scenario 2 and scenario 6 from the container's testable-properties list:
//! the DELTA reference manager, and what happens when a packed image is
//! asked to append under DELTA without ever having had a reference.

use superchunk::codec::Codec;
use superchunk::constants::{BLOSC_DELTA, BLOSC_SHUFFLE};
use superchunk::schunk::{Params, Superchunk};
use superchunk::{packed, SchunkError};

fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(seed).wrapping_add(7)).collect()
}

#[test]
fn first_append_installs_the_delta_reference() {
    let mut sc = Superchunk::new(Params {
        filters: [BLOSC_DELTA, BLOSC_SHUFFLE, 0, 0, 0],
        filters_meta: 0,
        compressor: Codec::Zstd { level: 3 },
        clevel: 5,
    });

    assert!(sc.filters_chunk.is_none());
    let buffers: Vec<Vec<u8>> = (1..=3u8).map(|s| pattern(s, 1000)).collect();
    sc.append_buffer(4, &buffers[0]).unwrap();
    assert!(sc.filters_chunk.is_some());
    assert_eq!(
        superchunk::chunk::chunk_nbytes(sc.filters_chunk.as_ref().unwrap()),
        1000
    );

    sc.append_buffer(4, &buffers[1]).unwrap();
    sc.append_buffer(4, &buffers[2]).unwrap();

    let image = packed::pack(&sc);
    let sc2 = packed::unpack(&image).unwrap();
    for (i, original) in buffers.iter().enumerate() {
        let mut dst = vec![0u8; 1000];
        sc2.decompress_chunk(i as i64, &mut dst).unwrap();
        assert_eq!(&dst, original, "chunk {i} did not survive pack/unpack");
    }
}

#[test]
fn packed_append_under_delta_without_a_reference_is_rejected() {
    let sc = Superchunk::new(Params {
        filters: [BLOSC_DELTA, 0, 0, 0, 0],
        filters_meta: 0,
        compressor: Codec::Lz4,
        clevel: 5,
    });
    let mut image = packed::pack(&sc);
    assert!(image[40..48].iter().all(|&b| b == 0), "filters_chunk offset should be absent");

    let err = packed::packed_append_buffer(&mut image, 4, &pattern(1, 100)).unwrap_err();
    assert!(matches!(err, SchunkError::DeltaReferenceMissing));
}

#[test]
fn set_delta_ref_called_twice_keeps_one_reference_and_decodes_correctly() {
    let mut sc = Superchunk::new(Params {
        filters: [BLOSC_DELTA, 0, 0, 0, 0],
        filters_meta: 0,
        compressor: Codec::Lz4,
        clevel: 5,
    });
    sc.set_delta_ref(&pattern(9, 200)).unwrap();
    sc.set_delta_ref(&pattern(11, 200)).unwrap();
    assert!(sc.filters_chunk.is_some());

    sc.append_buffer(4, &pattern(13, 200)).unwrap();
    let mut dst = vec![0u8; 200];
    sc.decompress_chunk(0, &mut dst).unwrap();
    assert_eq!(dst, pattern(13, 200));
}
