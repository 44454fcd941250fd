//! The live super-chunk (C3) and its DELTA reference manager (C4).
//!
//! Grounded on `original_source/c-blosc2/blosc/schunk.c`'s `blosc2_new_schunk`,
//! `blosc2_append_chunk`, `blosc2_append_buffer`, `blosc2_set_delta_ref` and
//! `blosc2_decompress_chunk`, but reworked around owned `Vec<u8>` chunks
//! instead of raw pointers, and around an explicit DELTA reference passed
//! into the codec call instead of a process-global "current schunk" context
//! (spec.md §9).
//!
//! The original's `blosc2_append_buffer` hands the reference to the codec
//! implicitly and lets the codec's filter pipeline apply DELTA internally.
//! Here that step is inlined: the first buffer appended under a DELTA
//! pipeline is encoded relative to *itself* (the previous element in the
//! same buffer — `filters::delta`'s `offset == 0` mode), matching the
//! original's self-referential first block; every later buffer is decoded
//! — always fully, never read straight from the compressed ancillary chunk
//! the way the original's packed path does — and delta-encoded against that
//! plain reference.

use crate::chunk::{chunk_cbytes, chunk_nbytes, ChunkView};
use crate::codec::{self, Codec, Doshuffle};
use crate::constants::{BLOSC_DELTA, MAX_FILTERS, POINTER_SLOT_SIZE, SCHUNK_HEADER_LEN};
use crate::error::{Result, SchunkError};
use crate::filters::delta;

/// Configuration for a new super-chunk (spec.md §4.3 `new(params)`).
#[derive(Debug, Clone)]
pub struct Params {
    pub filters: [u8; MAX_FILTERS],
    pub filters_meta: u8,
    pub compressor: Codec,
    pub clevel: u8,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            filters: [0; MAX_FILTERS],
            filters_meta: 0,
            compressor: Codec::BloscLz,
            clevel: 5,
        }
    }
}

/// The owning, append-only aggregate of compressed chunks (spec.md §3/§4.3).
pub struct Superchunk {
    pub version: u8,
    pub compressor: Codec,
    pub clevel: u8,
    pub filters: [u8; MAX_FILTERS],
    pub filters_meta: u8,
    pub nchunks: i64,
    pub nbytes: i64,
    pub cbytes: i64,
    pub filters_chunk: Option<Vec<u8>>,
    pub codec_chunk: Option<Vec<u8>>,
    pub metadata_chunk: Option<Vec<u8>>,
    pub userdata_chunk: Option<Vec<u8>>,
    pub data: Vec<Vec<u8>>,
}

impl Superchunk {
    /// `nchunks=0, nbytes=0, cbytes=sizeof(header)`, no ancillary chunks, no data.
    pub fn new(params: Params) -> Self {
        Superchunk {
            version: 1,
            compressor: params.compressor,
            clevel: params.clevel,
            filters: params.filters,
            filters_meta: params.filters_meta,
            nchunks: 0,
            nbytes: 0,
            cbytes: SCHUNK_HEADER_LEN as i64,
            filters_chunk: None,
            codec_chunk: None,
            metadata_chunk: None,
            userdata_chunk: None,
            data: Vec::new(),
        }
    }

    /// Take ownership of an already-produced chunk (spec.md's `copy=false`).
    /// The chunk is caller-supplied, so its prefix is read through the
    /// bounds-checked [`ChunkView`] rather than trusted blindly.
    pub fn append_chunk(&mut self, chunk: Vec<u8>) -> Result<i64> {
        let view = ChunkView::new(&chunk)?;
        let nbytes = view.nbytes();
        let cbytes = view.cbytes();
        self.data.push(chunk);
        self.nchunks += 1;
        self.nbytes += nbytes as i64;
        self.cbytes += cbytes as i64 + POINTER_SLOT_SIZE as i64;
        Ok(self.nchunks)
    }

    /// Copy `chunk` before taking ownership (spec.md's `copy=true`).
    pub fn append_chunk_copy(&mut self, chunk: &[u8]) -> Result<i64> {
        self.append_chunk(chunk.to_vec())
    }

    /// Compress `src` through the configured filter/codec pipeline and
    /// append the resulting chunk.
    pub fn append_buffer(&mut self, typesize: usize, src: &[u8]) -> Result<i64> {
        let filters = self.filters;
        let produced = if filters[0] == BLOSC_DELTA {
            let doshuffle = Doshuffle::from_filter_code(filters[1]);
            // The very first chunk ever appended is always self-referential
            // (matches the original's first-block-of-the-stream special
            // case), regardless of whether `set_delta_ref` happened to be
            // called manually beforehand. `decompress_chunk` and the packed
            // path mirror this by keying off the same `i == 0` condition.
            let is_first_chunk = self.nchunks == 0;
            if self.filters_chunk.is_none() {
                self.set_delta_ref(src)?;
            }

            let mut delta_encoded = vec![0u8; src.len()];
            if is_first_chunk {
                delta::encode(&[], 0, typesize, src, &mut delta_encoded);
            } else {
                let reference = codec::decompress(self.filters_chunk.as_ref().unwrap())?;
                delta::encode(&reference, 1, typesize, src, &mut delta_encoded);
            }
            codec::compress(self.compressor, self.clevel, doshuffle, typesize, &delta_encoded)?
        } else {
            let doshuffle = Doshuffle::from_filter_code(filters[0]);
            codec::compress(self.compressor, self.clevel, doshuffle, typesize, src)?
        };
        self.append_chunk(produced)
    }

    /// Install or replace the DELTA reference chunk. Requires filter slot 0
    /// to be `DELTA`; the reference is always stored at `clevel=0` (store
    /// mode), `doshuffle=None`, `typesize=1` (spec.md §4.3/§4.4).
    pub fn set_delta_ref(&mut self, reference: &[u8]) -> Result<i64> {
        if self.filters[0] != BLOSC_DELTA {
            return Err(SchunkError::DeltaNotConfigured);
        }
        if let Some(old) = self.filters_chunk.take() {
            self.nbytes -= chunk_nbytes(&old) as i64;
            self.cbytes -= chunk_cbytes(&old) as i64;
        }
        let chunk = codec::compress(self.compressor, 0, Doshuffle::None, 1, reference)?;
        self.nbytes += chunk_nbytes(&chunk) as i64;
        self.cbytes += chunk_cbytes(&chunk) as i64;
        self.filters_chunk = Some(chunk);
        Ok(self.cbytes)
    }

    /// Decompress chunk `i` into `dst`, reversing DELTA if configured.
    /// Returns the number of bytes written. `typesize` is recovered from the
    /// chunk's own prefix (byte offset 3), so callers never need to track it
    /// separately from what they originally passed to `append_buffer`.
    pub fn decompress_chunk(&self, i: i64, dst: &mut [u8]) -> Result<i32> {
        if i < 0 || i >= self.nchunks {
            log::warn!("decompress_chunk: index {i} out of range (nchunks = {})", self.nchunks);
            return Err(SchunkError::OutOfRange {
                index: i,
                nchunks: self.nchunks,
            });
        }
        let chunk = &self.data[i as usize];
        let view = ChunkView::new(chunk)?;
        let nbytes = view.nbytes();
        if (dst.len() as i32) < nbytes {
            return Err(SchunkError::BufferTooSmall {
                needed: nbytes,
                have: dst.len(),
            });
        }
        let typesize = view.typesize() as usize;

        let mut plain = codec::decompress(chunk)?;
        if self.filters[0] == BLOSC_DELTA {
            if i == 0 {
                delta::decode(&[], 0, typesize, &mut plain);
            } else {
                let reference = codec::decompress(
                    self.filters_chunk.as_ref().ok_or(SchunkError::DeltaReferenceMissing)?,
                )?;
                delta::decode(&reference, 1, typesize, &mut plain);
            }
        }
        dst[..plain.len()].copy_from_slice(&plain);
        Ok(plain.len() as i32)
    }

    // --- Metalayers (expansion; see SPEC_FULL.md) ---------------------------
    //
    // Small named key/value sections layered over `metadata_chunk`, grounded
    // on `schunk.c`'s `blosc2_meta_add`/`blosc2_meta_update`/`blosc2_meta_get`.
    // Distinct from the four fixed ancillary slots: this is sugar over the
    // single `metadata_chunk` slot, not a new wire region.

    fn read_metalayers(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let Some(chunk) = &self.metadata_chunk else {
            return Ok(Vec::new());
        };
        let plain = codec::decompress(chunk)?;
        let mut out = Vec::new();
        let mut pos = 0usize;
        while pos + 2 <= plain.len() {
            let name_len = u16::from_le_bytes(plain[pos..pos + 2].try_into().unwrap()) as usize;
            pos += 2;
            let name = String::from_utf8_lossy(&plain[pos..pos + name_len]).into_owned();
            pos += name_len;
            let value_len = u32::from_le_bytes(plain[pos..pos + 4].try_into().unwrap()) as usize;
            pos += 4;
            let value = plain[pos..pos + value_len].to_vec();
            pos += value_len;
            out.push((name, value));
        }
        Ok(out)
    }

    fn write_metalayers(&mut self, layers: &[(String, Vec<u8>)]) -> Result<()> {
        let mut plain = Vec::new();
        for (name, value) in layers {
            plain.extend_from_slice(&(name.len() as u16).to_le_bytes());
            plain.extend_from_slice(name.as_bytes());
            plain.extend_from_slice(&(value.len() as u32).to_le_bytes());
            plain.extend_from_slice(value);
        }
        if let Some(old) = self.metadata_chunk.take() {
            self.nbytes -= chunk_nbytes(&old) as i64;
            self.cbytes -= chunk_cbytes(&old) as i64;
        }
        let chunk = codec::compress(self.compressor, 0, Doshuffle::None, 1, &plain)?;
        self.nbytes += chunk_nbytes(&chunk) as i64;
        self.cbytes += chunk_cbytes(&chunk) as i64;
        self.metadata_chunk = Some(chunk);
        Ok(())
    }

    /// Add a metalayer, failing if `name` already exists.
    pub fn add_metalayer(&mut self, name: &str, value: &[u8]) -> Result<()> {
        let mut layers = self.read_metalayers()?;
        if layers.iter().any(|(n, _)| n == name) {
            return Err(SchunkError::Codec(format!("metalayer '{name}' already exists")));
        }
        layers.push((name.to_string(), value.to_vec()));
        self.write_metalayers(&layers)
    }

    /// Replace the value of an existing metalayer.
    pub fn update_metalayer(&mut self, name: &str, value: &[u8]) -> Result<()> {
        let mut layers = self.read_metalayers()?;
        let Some(entry) = layers.iter_mut().find(|(n, _)| n == name) else {
            return Err(SchunkError::Codec(format!("metalayer '{name}' does not exist")));
        };
        entry.1 = value.to_vec();
        self.write_metalayers(&layers)
    }

    /// Read a metalayer's value, if present.
    pub fn get_metalayer(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let layers = self.read_metalayers()?;
        Ok(layers.into_iter().find(|(n, _)| n == name).map(|(_, v)| v))
    }

    pub fn has_metalayer(&self, name: &str) -> Result<bool> {
        Ok(self.get_metalayer(name)?.is_some())
    }
}
