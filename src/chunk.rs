//! Chunk prefix accessor (C2) and the borrowed chunk-view abstraction that
//! replaces raw pointer arithmetic over opaque chunks (spec.md §9).

use crate::constants::CHUNK_HEADER_LEN;
use crate::error::{Result, SchunkError};

/// A borrowed view over a single codec chunk: the compressed byte sequence
/// produced by [`crate::codec::compress`], self-describing via its 16-byte
/// prefix. The engine only ever inspects `nbytes`/`cbytes`; everything else
/// in the prefix is the codec's own business.
#[derive(Clone, Copy)]
pub struct ChunkView<'a> {
    bytes: &'a [u8],
}

impl<'a> ChunkView<'a> {
    /// Wrap a byte slice as a chunk view, validating that it is at least as
    /// long as the fixed prefix and that its self-reported `cbytes` does not
    /// exceed the slice length.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        if bytes.len() < CHUNK_HEADER_LEN {
            return Err(SchunkError::InvalidImage(format!(
                "chunk prefix truncated: have {} bytes, need at least {CHUNK_HEADER_LEN}",
                bytes.len()
            )));
        }
        let view = ChunkView { bytes };
        if view.cbytes() as usize > bytes.len() {
            return Err(SchunkError::InvalidImage(format!(
                "chunk claims cbytes={}, but only {} bytes are available",
                view.cbytes(),
                bytes.len()
            )));
        }
        Ok(view)
    }

    /// Uncompressed byte count, read from prefix offset 4 (spec.md §4.2).
    pub fn nbytes(&self) -> i32 {
        i32::from_le_bytes(self.bytes[4..8].try_into().unwrap())
    }

    /// Compressed byte count (including the prefix), read from offset 12.
    pub fn cbytes(&self) -> i32 {
        i32::from_le_bytes(self.bytes[12..16].try_into().unwrap())
    }

    /// The chunk's bytes, truncated to its self-reported `cbytes` (i.e. with
    /// no trailing garbage beyond the chunk's own length).
    pub fn bytes(&self) -> &'a [u8] {
        &self.bytes[..self.cbytes() as usize]
    }

    /// Element size in bytes, recorded at prefix offset 3. Unlike `nbytes`/
    /// `cbytes` this is the codec's own bookkeeping rather than a C2
    /// contract field, but it is still read through the bounds-checked view
    /// rather than a raw index.
    pub fn typesize(&self) -> u8 {
        self.bytes[3]
    }
}

/// Read `nbytes` straight from a chunk prefix without validating the rest of
/// the buffer. Used in hot paths where the caller already knows `bytes` is
/// at least `CHUNK_HEADER_LEN` long (e.g. immediately after compression).
pub fn chunk_nbytes(bytes: &[u8]) -> i32 {
    i32::from_le_bytes(bytes[4..8].try_into().unwrap())
}

/// Read `cbytes` straight from a chunk prefix (see [`chunk_nbytes`]).
pub fn chunk_cbytes(bytes: &[u8]) -> i32 {
    i32::from_le_bytes(bytes[12..16].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_chunk(nbytes: i32, cbytes: i32) -> Vec<u8> {
        let mut buf = vec![0u8; cbytes.max(CHUNK_HEADER_LEN as i32) as usize];
        buf[4..8].copy_from_slice(&nbytes.to_le_bytes());
        buf[12..16].copy_from_slice(&cbytes.to_le_bytes());
        buf
    }

    #[test]
    fn reads_nbytes_and_cbytes_from_prefix() {
        let chunk = fake_chunk(1000, 64);
        let view = ChunkView::new(&chunk).unwrap();
        assert_eq!(view.nbytes(), 1000);
        assert_eq!(view.cbytes(), 64);
        assert_eq!(view.bytes().len(), 64);
    }

    #[test]
    fn rejects_truncated_prefix() {
        let short = vec![0u8; 8];
        assert!(ChunkView::new(&short).is_err());
    }

    #[test]
    fn rejects_cbytes_past_end_of_slice() {
        let mut chunk = fake_chunk(10, 16);
        chunk[12..16].copy_from_slice(&1000i32.to_le_bytes());
        assert!(ChunkView::new(&chunk).is_err());
    }
}
