//! A super-chunk engine: an in-memory and serializable container that
//! aggregates many independently compressed chunks under one logical
//! object, with a shared filter/compression configuration and optional
//! ancillary sections (a DELTA reference, free-form metadata, user data).
//!
//! Two representations are kept bit-compatible: a live, pointer-based
//! [`Superchunk`] that can be grown by appending buffers or pre-compressed
//! chunks, and a packed, single-`Vec<u8>` image produced by [`packed::pack`]
//! that round-trips back through [`packed::unpack`]. The packed form also
//! supports appending new chunks directly, without ever materializing the
//! live form.
//!
//! ```
//! use superchunk::codec::Codec;
//! use superchunk::constants::BLOSC_SHUFFLE;
//! use superchunk::schunk::{Params, Superchunk};
//!
//! let mut sc = Superchunk::new(Params {
//!     filters: [BLOSC_SHUFFLE, 0, 0, 0, 0],
//!     filters_meta: 0,
//!     compressor: Codec::Lz4,
//!     clevel: 5,
//! });
//! let buf = vec![1u8; 4000];
//! sc.append_buffer(4, &buf).unwrap();
//! let mut out = vec![0u8; 4000];
//! sc.decompress_chunk(0, &mut out).unwrap();
//! assert_eq!(out, buf);
//! ```

pub mod chunk;
pub mod codec;
pub mod constants;
pub mod error;
pub mod filters;
pub mod packed;
pub mod schunk;

pub use chunk::ChunkView;
pub use error::{Result, SchunkError};
pub use packed::{get_packed_length, pack, packed_append_buffer, packed_append_chunk, packed_decompress_chunk, unpack};
pub use schunk::{Params, Superchunk};
