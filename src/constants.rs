//! Wire-format constants: codec codes, filter codes, and packed-image offsets.
//!
//! Values are chosen to match the c-blosc2 family this engine is modeled on
//! (`BLOSC_LZ4 == 1`, `BLOSC_SHUFFLE == 1`, etc.) so that anyone familiar with
//! that ecosystem recognizes the numbering, even though no C code is linked.

/// Maximum number of filter pipeline slots. Chosen so the encoded descriptor
/// (3 bits/slot) fits in a u16: `5 * 3 = 15 <= 16`.
pub const MAX_FILTERS: usize = 5;

/// Length of a chunk's self-describing prefix (version, compcode, flags,
/// typesize, nbytes, blocksize, cbytes).
pub const CHUNK_HEADER_LEN: usize = 16;

/// Worst-case overhead a compressed chunk can add over its uncompressed size.
pub const CHUNK_OVERHEAD: usize = CHUNK_HEADER_LEN;

/// Fixed length of the packed image's leading header region (§4.5).
pub const PACKED_HEADER_LEN: usize = 80;

/// Length of the stable header prefix shared byte-for-byte between the live
/// and packed representations (version/compressor/clevel/filters_meta,
/// duplicated compressor, clevel, filters word). `Superchunk::cbytes` starts
/// at this value, and `pack` begins by copying exactly this many bytes.
pub const SCHUNK_HEADER_LEN: usize = 40;

/// Size in bytes of one packed data-offsets-table entry / one live pointer slot.
pub const POINTER_SLOT_SIZE: usize = 8;

// --- Codec codes -----------------------------------------------------------

pub const BLOSC_BLOSCLZ: u8 = 0;
pub const BLOSC_LZ4: u8 = 1;
pub const BLOSC_SNAPPY: u8 = 3;
pub const BLOSC_ZLIB: u8 = 4;
pub const BLOSC_ZSTD: u8 = 5;

// --- Filter codes ------------------------------------------------------------

pub const BLOSC_NOFILTER: u8 = 0;
pub const BLOSC_SHUFFLE: u8 = 1;
pub const BLOSC_BITSHUFFLE: u8 = 2;
pub const BLOSC_DELTA: u8 = 3;

// --- Chunk flags byte --------------------------------------------------------

pub const FLAG_SHUFFLE: u8 = 0x1;
pub const FLAG_MEMCPYED: u8 = 0x2;
pub const FLAG_BITSHUFFLE: u8 = 0x4;

// --- Error codes (spec.md §7/§6) --------------------------------------------

pub const ERR_OUT_OF_RANGE: i32 = -10;
pub const ERR_BUFFER_TOO_SMALL: i32 = -11;
