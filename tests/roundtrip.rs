//! Scenario 1 from the container's testable-properties list: three buffers
//! through a plain SHUFFLE pipeline, retrieved bit-for-bit.

use rand::Rng;
use superchunk::codec::Codec;
use superchunk::constants::{BLOSC_BITSHUFFLE, BLOSC_SHUFFLE};
use superchunk::schunk::{Params, Superchunk};

fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(seed).wrapping_add(7)).collect()
}

#[test]
fn three_buffers_round_trip_through_shuffle_and_lz4() {
    let mut sc = Superchunk::new(Params {
        filters: [BLOSC_SHUFFLE, 0, 0, 0, 0],
        filters_meta: 0,
        compressor: Codec::Lz4,
        clevel: 5,
    });

    let buffers: Vec<Vec<u8>> = (1..=3u8).map(|s| pattern(s, 1000)).collect();
    for buf in &buffers {
        sc.append_buffer(4, buf).unwrap();
    }

    assert_eq!(sc.nchunks, 3);
    assert_eq!(sc.nbytes, 3000);

    for (i, original) in buffers.iter().enumerate() {
        let mut dst = vec![0u8; 1000];
        let n = sc.decompress_chunk(i as i64, &mut dst).unwrap();
        assert_eq!(n as usize, original.len());
        assert_eq!(&dst, original, "chunk {i} did not round-trip");
    }
}

#[test]
fn every_backend_and_typesize_combination_round_trips() {
    for compressor in [Codec::BloscLz, Codec::Lz4, Codec::Zstd { level: 3 }, Codec::Zlib, Codec::Snappy] {
        for typesize in [1usize, 2, 4, 8] {
            let mut sc = Superchunk::new(Params {
                filters: [BLOSC_SHUFFLE, 0, 0, 0, 0],
                filters_meta: 0,
                compressor,
                clevel: 5,
            });
            let buf = pattern(typesize as u8 + 3, 2000);
            sc.append_buffer(typesize, &buf).unwrap();
            let mut dst = vec![0u8; 2000];
            sc.decompress_chunk(0, &mut dst).unwrap();
            assert_eq!(dst, buf, "{compressor:?} typesize={typesize}");
        }
    }
}

#[test]
fn random_buffers_round_trip_under_every_filter() {
    let mut rng = rand::thread_rng();
    for filters in [[0u8, 0, 0, 0, 0], [BLOSC_SHUFFLE, 0, 0, 0, 0], [BLOSC_BITSHUFFLE, 0, 0, 0, 0]] {
        let mut sc = Superchunk::new(Params {
            filters,
            filters_meta: 0,
            compressor: Codec::Zstd { level: 3 },
            clevel: 5,
        });
        let mut originals = Vec::new();
        for _ in 0..5 {
            let len = rng.gen_range(1..=2000usize);
            let buf: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            sc.append_buffer(4, &buf).unwrap();
            originals.push(buf);
        }
        for (i, original) in originals.iter().enumerate() {
            let mut dst = vec![0u8; original.len()];
            sc.decompress_chunk(i as i64, &mut dst).unwrap();
            assert_eq!(&dst, original, "filters={filters:?} chunk {i}");
        }
    }
}
