//! Scenarios 3 and 4 from the container's testable-properties list: manual
//! chunk append accounting, and the `BufferTooSmall` boundary.

use superchunk::chunk::{chunk_cbytes, chunk_nbytes};
use superchunk::codec::{self, Codec, Doshuffle};
use superchunk::constants::POINTER_SLOT_SIZE;
use superchunk::schunk::{Params, Superchunk};
use superchunk::SchunkError;

#[test]
fn append_chunk_accounts_for_pointer_slot_overhead() {
    let mut sc = Superchunk::new(Params::default());
    let cbytes_before = sc.cbytes;

    let precompiled = codec::compress(Codec::Lz4, 5, Doshuffle::None, 4, &vec![9u8; 400]).unwrap();
    let nbytes = chunk_nbytes(&precompiled) as i64;
    let cbytes = chunk_cbytes(&precompiled) as i64;

    sc.append_chunk(precompiled).unwrap();

    assert_eq!(sc.nchunks, 1);
    assert_eq!(sc.nbytes, nbytes);
    assert_eq!(sc.cbytes, cbytes_before + cbytes + POINTER_SLOT_SIZE as i64);
}

#[test]
fn append_chunk_copy_leaves_original_buffer_usable() {
    let mut sc = Superchunk::new(Params::default());
    let original = codec::compress(Codec::Lz4, 5, Doshuffle::None, 1, &vec![3u8; 64]).unwrap();
    sc.append_chunk_copy(&original).unwrap();
    // The caller's buffer is untouched and independently usable.
    assert_eq!(chunk_nbytes(&original), 64);
    assert_eq!(sc.data[0], original);
}

#[test]
fn decompress_into_undersized_buffer_fails_without_mutating_dst() {
    use superchunk::constants::BLOSC_SHUFFLE;

    let mut sc = Superchunk::new(Params {
        filters: [BLOSC_SHUFFLE, 0, 0, 0, 0],
        ..Params::default()
    });
    sc.append_buffer(4, &vec![5u8; 1000]).unwrap();

    let mut dst = vec![0xAAu8; 999];
    let err = sc.decompress_chunk(0, &mut dst).unwrap_err();
    assert!(matches!(err, SchunkError::BufferTooSmall { needed: 1000, have: 999 }));
    assert!(dst.iter().all(|&b| b == 0xAA), "destination must be untouched on failure");
}

#[test]
fn retrieving_at_nchunks_is_out_of_range() {
    // Exercises the one diagnostic line spec.md §7 allows on this path.
    let _ = env_logger::builder().is_test(true).try_init();

    let mut sc = Superchunk::new(Params::default());
    sc.append_chunk(codec::compress(Codec::Lz4, 5, Doshuffle::None, 1, &[1, 2, 3]).unwrap())
        .unwrap();

    let mut dst = vec![0u8; 16];
    let err = sc.decompress_chunk(1, &mut dst).unwrap_err();
    assert!(matches!(err, SchunkError::OutOfRange { index: 1, nchunks: 1 }));
}
