//! Scenario 5 from the container's testable-properties list: repeated
//! in-place appends to a packed image, verified against `unpack`.

use superchunk::codec::{self, Codec, Doshuffle};
use superchunk::constants::BLOSC_SHUFFLE;
use superchunk::packed::{self, get_packed_length};
use superchunk::schunk::{Params, Superchunk};

fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(seed).wrapping_add(1)).collect()
}

#[test]
fn repeated_packed_append_then_unpack_preserves_append_order() {
    let sc = Superchunk::new(Params {
        filters: [BLOSC_SHUFFLE, 0, 0, 0, 0],
        ..Params::default()
    });
    let mut image = packed::pack(&sc);

    let chunks: Vec<Vec<u8>> = (0..6)
        .map(|s| codec::compress(Codec::Lz4, 5, Doshuffle::Byte, 4, &pattern(s + 2, 400)).unwrap())
        .collect();
    for chunk in &chunks {
        packed::packed_append_chunk(&mut image, chunk).unwrap();
    }

    let rebuilt = packed::unpack(&image).unwrap();
    assert_eq!(rebuilt.nchunks, chunks.len() as i64);
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(&rebuilt.data[i], chunk, "chunk {i} out of order or corrupted");
    }
}

#[test]
fn packed_append_buffer_matches_live_append_buffer() {
    let params = Params {
        filters: [BLOSC_SHUFFLE, 0, 0, 0, 0],
        compressor: Codec::Zstd { level: 3 },
        ..Params::default()
    };
    let mut live = Superchunk::new(params.clone());
    let mut image = packed::pack(&Superchunk::new(params));

    let buffers: Vec<Vec<u8>> = (1..=4u8).map(|s| pattern(s, 777)).collect();
    for buf in &buffers {
        live.append_buffer(4, buf).unwrap();
        packed::packed_append_buffer(&mut image, 4, buf).unwrap();
    }

    assert_eq!(image.len(), get_packed_length(&live));
    let unpacked = packed::unpack(&image).unwrap();
    assert_eq!(unpacked.nchunks, live.nchunks);
    assert_eq!(unpacked.nbytes, live.nbytes);
    for (i, original) in buffers.iter().enumerate() {
        let mut dst = vec![0u8; 777];
        unpacked.decompress_chunk(i as i64, &mut dst).unwrap();
        assert_eq!(&dst, original);
    }
}
