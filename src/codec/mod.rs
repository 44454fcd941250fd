//! The chunk codec: the single-buffer block compressor `spec.md` treats as
//! an external collaborator. Since this crate has no sibling C library, it
//! provides its own, backed by real compression crates (matching the
//! teacher crate's own dependency stack: `lz4_flex`, `zstd`, `flate2`,
//! `snap`), plus an in-crate port of BloscLZ for a dependency-free default.
//!
//! Every chunk produced here carries the 16-byte self-describing prefix
//! `spec.md` §3/§4.2 requires: `nbytes` at offset 4, `cbytes` at offset 12.
//! The remaining prefix bytes (`version`, `compcode`, `flags`, `typesize`,
//! `blocksize`) are this module's own bookkeeping — the engine never reads
//! them, but storing `compcode` and the shuffle flags here makes every
//! chunk self-contained, replacing `spec.md` §9's process-global "current
//! schunk" codec context with data carried in the chunk itself.

pub mod blosclz;

use crate::chunk::ChunkView;
use crate::constants::{
    BLOSC_BLOSCLZ, BLOSC_LZ4, BLOSC_SNAPPY, BLOSC_ZLIB, BLOSC_ZSTD, CHUNK_HEADER_LEN,
    FLAG_BITSHUFFLE, FLAG_MEMCPYED, FLAG_SHUFFLE,
};
use crate::error::{Result, SchunkError};
use crate::filters::{bitshuffle, shuffle};

/// The compression backend used for the chunk body. The numeric values
/// match the c-blosc2 codec codes this engine is modeled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    BloscLz,
    Lz4,
    Zstd { level: i32 },
    Zlib,
    Snappy,
}

impl Codec {
    pub fn code(&self) -> u8 {
        match self {
            Codec::BloscLz => BLOSC_BLOSCLZ,
            Codec::Lz4 => BLOSC_LZ4,
            Codec::Zstd { .. } => BLOSC_ZSTD,
            Codec::Zlib => BLOSC_ZLIB,
            Codec::Snappy => BLOSC_SNAPPY,
        }
    }

    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            BLOSC_BLOSCLZ => Ok(Codec::BloscLz),
            BLOSC_LZ4 => Ok(Codec::Lz4),
            BLOSC_ZSTD => Ok(Codec::Zstd { level: 3 }),
            BLOSC_ZLIB => Ok(Codec::Zlib),
            BLOSC_SNAPPY => Ok(Codec::Snappy),
            other => Err(SchunkError::InvalidImage(format!("unknown codec code {other}"))),
        }
    }

    fn compress_body(&self, clevel: u8, src: &[u8]) -> Result<Vec<u8>> {
        match self {
            Codec::BloscLz => {
                let mut out = vec![0u8; src.len() + src.len() / 2 + 128];
                let n = blosclz::compress(clevel as i32, src, &mut out);
                if n == 0 {
                    return Err(SchunkError::Codec("blosclz: input incompressible or too small".into()));
                }
                out.truncate(n);
                Ok(out)
            }
            Codec::Lz4 => Ok(lz4_flex::compress(src)),
            Codec::Zstd { level } => zstd::bulk::compress(src, *level)
                .map_err(|e| SchunkError::Codec(format!("zstd: {e}"))),
            Codec::Zlib => {
                use std::io::Write;
                let mut encoder = flate2::write::ZlibEncoder::new(
                    Vec::new(),
                    flate2::Compression::new(clevel.clamp(0, 9) as u32),
                );
                encoder
                    .write_all(src)
                    .map_err(|e| SchunkError::Codec(format!("zlib: {e}")))?;
                encoder.finish().map_err(|e| SchunkError::Codec(format!("zlib: {e}")))
            }
            Codec::Snappy => {
                let mut encoder = snap::raw::Encoder::new();
                encoder
                    .compress_vec(src)
                    .map_err(|e| SchunkError::Codec(format!("snappy: {e}")))
            }
        }
    }

    fn decompress_body(&self, src: &[u8], nbytes: usize) -> Result<Vec<u8>> {
        match self {
            Codec::BloscLz => {
                let mut out = vec![0u8; nbytes];
                let n = blosclz::decompress(src, &mut out);
                if n != nbytes {
                    return Err(SchunkError::ShortDecompress {
                        expected: nbytes as i32,
                        got: n as i32,
                    });
                }
                Ok(out)
            }
            Codec::Lz4 => lz4_flex::decompress(src, nbytes)
                .map_err(|e| SchunkError::Codec(format!("lz4: {e}"))),
            Codec::Zstd { .. } => zstd::bulk::decompress(src, nbytes)
                .map_err(|e| SchunkError::Codec(format!("zstd: {e}"))),
            Codec::Zlib => {
                use std::io::Read;
                let mut decoder = flate2::read::ZlibDecoder::new(src);
                let mut out = Vec::with_capacity(nbytes);
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| SchunkError::Codec(format!("zlib: {e}")))?;
                Ok(out)
            }
            Codec::Snappy => {
                let mut decoder = snap::raw::Decoder::new();
                decoder
                    .decompress_vec(src)
                    .map_err(|e| SchunkError::Codec(format!("snappy: {e}")))
            }
        }
    }
}

/// Which shuffle-family filter (if any) the codec should apply to the
/// buffer before handing it to the backend compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Doshuffle {
    None,
    Byte,
    Bit,
}

impl Doshuffle {
    pub fn from_filter_code(code: u8) -> Self {
        match code {
            crate::constants::BLOSC_SHUFFLE => Doshuffle::Byte,
            crate::constants::BLOSC_BITSHUFFLE => Doshuffle::Bit,
            _ => Doshuffle::None,
        }
    }
}

/// Compress `src` (`typesize`-byte elements) into a self-describing chunk.
///
/// `clevel == 0` stores `src` verbatim (prefixed, unfiltered) — used both as
/// an explicit "no compression" level and internally for the DELTA
/// reference chunk (spec.md §4.3's `set_delta_ref`).
///
/// `typesize` must fit the chunk prefix's 1-byte `typesize` field: a value
/// of 256 would silently truncate to 0 there and later divide-by-zero a
/// filter pass (`nbytes / typesize`) on decompress, so it is rejected here
/// instead, at the single chokepoint every append path compresses through.
pub fn compress(codec: Codec, clevel: u8, doshuffle: Doshuffle, typesize: usize, src: &[u8]) -> Result<Vec<u8>> {
    if typesize == 0 || typesize > 255 {
        return Err(SchunkError::InvalidTypesize { typesize });
    }
    let nbytes = src.len();

    if clevel == 0 {
        let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + nbytes);
        write_header(&mut out, codec.code(), FLAG_MEMCPYED, typesize, nbytes, nbytes);
        out.extend_from_slice(src);
        return Ok(out);
    }

    let mut filtered = vec![0u8; nbytes];
    let flags = match doshuffle {
        Doshuffle::None => {
            filtered.copy_from_slice(src);
            0
        }
        Doshuffle::Byte => {
            shuffle::shuffle(typesize, src, &mut filtered);
            FLAG_SHUFFLE
        }
        Doshuffle::Bit => {
            bitshuffle::bitshuffle(typesize, src, &mut filtered);
            FLAG_BITSHUFFLE
        }
    };

    match codec.compress_body(clevel, &filtered) {
        Ok(body) if body.len() < nbytes => {
            let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + body.len());
            write_header(&mut out, codec.code(), flags, typesize, nbytes, body.len());
            out.extend_from_slice(&body);
            Ok(out)
        }
        // Backend declined (too small, or expanded the data): store instead,
        // same fallback c-blosc2 itself performs when compression doesn't pay off.
        _ => {
            log::debug!("codec {:?} did not shrink {nbytes} bytes; storing verbatim", codec);
            let mut out = Vec::with_capacity(CHUNK_HEADER_LEN + nbytes);
            write_header(&mut out, codec.code(), flags | FLAG_MEMCPYED, typesize, nbytes, nbytes);
            if flags == 0 {
                out.extend_from_slice(src);
            } else {
                out.extend_from_slice(&filtered);
            }
            Ok(out)
        }
    }
}

/// Decompress a chunk produced by [`compress`], reversing whichever filter
/// was applied (recorded in the chunk's own flags byte).
pub fn decompress(chunk: &[u8]) -> Result<Vec<u8>> {
    let view = ChunkView::new(chunk)?;
    // compcode/flags/typesize are the codec's own bookkeeping, not part of
    // the engine's nbytes/cbytes contract, so they are read directly rather
    // than through `ChunkView` (see its doc comment).
    let compcode = chunk[1];
    let flags = chunk[2];
    let typesize = view.typesize() as usize;
    let nbytes = view.nbytes() as usize;
    let cbytes = view.cbytes() as usize;
    let body = &chunk[CHUNK_HEADER_LEN..cbytes];

    let filtered = if flags & FLAG_MEMCPYED != 0 {
        body.to_vec()
    } else {
        let codec = Codec::from_code(compcode)?;
        let plain = codec.decompress_body(body, nbytes)?;
        if plain.len() != nbytes {
            return Err(SchunkError::ShortDecompress {
                expected: nbytes as i32,
                got: plain.len() as i32,
            });
        }
        plain
    };

    let mut out = vec![0u8; nbytes];
    if flags & FLAG_SHUFFLE != 0 {
        shuffle::unshuffle(typesize, &filtered, &mut out);
    } else if flags & FLAG_BITSHUFFLE != 0 {
        bitshuffle::bitunshuffle(typesize, &filtered, &mut out);
    } else {
        out.copy_from_slice(&filtered);
    }
    Ok(out)
}

fn write_header(out: &mut Vec<u8>, compcode: u8, flags: u8, typesize: usize, nbytes: usize, cbytes_body: usize) {
    out.push(1); // version
    out.push(compcode);
    out.push(flags);
    out.push(typesize as u8);
    out.extend_from_slice(&(nbytes as i32).to_le_bytes());
    out.extend_from_slice(&(nbytes as i32).to_le_bytes()); // blocksize: whole buffer is one block
    out.extend_from_slice(&((CHUNK_HEADER_LEN + cbytes_body) as i32).to_le_bytes());
}
