//! The packer/unpacker (C5): converts a [`Superchunk`] to and from a single
//! contiguous byte image, and supports appending directly into an image
//! without ever materializing the live form.
//!
//! Grounded on `original_source/c-blosc2/blosc/schunk.c`'s
//! `blosc2_get_packed_length`, `blosc2_pack_schunk`, `blosc2_unpack_schunk`,
//! `blosc2_packed_append_chunk`, `blosc2_packed_append_buffer` and
//! `blosc2_packed_decompress_chunk`. The original reads `filters_chunk`
//! straight out of the packed bytes and XORs against it without
//! decompressing first — only harmless because the reference happens to be
//! stored at `clevel=0`. This port always decompresses ancillary chunks
//! before using them as a DELTA reference, so the fix does not depend on
//! that coincidence.
//!
//! Every read off an image is bounds-checked (`read_chunk_at`) rather than
//! trusting offsets the way raw pointer arithmetic would — the image is
//! untrusted input in safe Rust in a way a C pointer chase never had to
//! admit.

use crate::chunk::{chunk_cbytes, chunk_nbytes, ChunkView};
use crate::codec::{self, Codec, Doshuffle};
use crate::constants::{
    BLOSC_DELTA, PACKED_HEADER_LEN, POINTER_SLOT_SIZE, SCHUNK_HEADER_LEN,
};
use crate::error::{Result, SchunkError};
use crate::filters::{delta, descriptor};
use crate::schunk::Superchunk;

const OFF_FILTERS_CHUNK: usize = 40;
const OFF_CODEC_CHUNK: usize = 48;
const OFF_METADATA_CHUNK: usize = 56;
const OFF_USERDATA_CHUNK: usize = 64;
const OFF_TABLE_LOCATION: usize = 72;

/// The byte length `pack` will produce for `sc`, without building the image.
pub fn get_packed_length(sc: &Superchunk) -> usize {
    let ancillary_len: usize = ancillary_slots(sc).iter().filter_map(|c| c.as_ref()).map(|c| c.len()).sum();
    let data_len: usize = sc.data.iter().map(|c| c.len()).sum();
    PACKED_HEADER_LEN + ancillary_len + data_len + sc.nchunks as usize * POINTER_SLOT_SIZE
}

fn ancillary_slots(sc: &Superchunk) -> [&Option<Vec<u8>>; 4] {
    [&sc.filters_chunk, &sc.codec_chunk, &sc.metadata_chunk, &sc.userdata_chunk]
}

fn write_i64(image: &mut [u8], at: usize, value: i64) {
    image[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn read_i64(image: &[u8], at: usize) -> i64 {
    i64::from_le_bytes(image[at..at + 8].try_into().unwrap())
}

/// Serialize `sc` into a contiguous image (spec.md §4.5/§6).
pub fn pack(sc: &Superchunk) -> Vec<u8> {
    let total_len = get_packed_length(sc);
    let mut image = vec![0u8; total_len];

    image[0] = sc.version;
    image[1] = sc.compressor.code();
    image[2] = sc.clevel;
    image[3] = sc.filters_meta;
    image[4..6].copy_from_slice(&(sc.compressor.code() as u16).to_le_bytes());
    image[6..8].copy_from_slice(&(sc.clevel as u16).to_le_bytes());
    image[8..10].copy_from_slice(&descriptor::encode(&sc.filters).to_le_bytes());

    let mut cursor = PACKED_HEADER_LEN;
    let slots = [
        (OFF_FILTERS_CHUNK, &sc.filters_chunk),
        (OFF_CODEC_CHUNK, &sc.codec_chunk),
        (OFF_METADATA_CHUNK, &sc.metadata_chunk),
        (OFF_USERDATA_CHUNK, &sc.userdata_chunk),
    ];
    for (slot_offset, chunk) in slots {
        match chunk {
            Some(bytes) => {
                write_i64(&mut image, slot_offset, cursor as i64);
                image[cursor..cursor + bytes.len()].copy_from_slice(bytes);
                cursor += bytes.len();
            }
            None => write_i64(&mut image, slot_offset, 0),
        }
    }

    let table_len = sc.nchunks as usize * POINTER_SLOT_SIZE;
    let table_offset = total_len - table_len;
    write_i64(&mut image, OFF_TABLE_LOCATION, table_offset as i64);

    for (idx, chunk) in sc.data.iter().enumerate() {
        let offset = cursor;
        image[cursor..cursor + chunk.len()].copy_from_slice(chunk);
        cursor += chunk.len();
        write_i64(&mut image, table_offset + idx * POINTER_SLOT_SIZE, offset as i64);
    }
    debug_assert_eq!(cursor, table_offset);

    write_i64(&mut image, 16, sc.nchunks);
    write_i64(&mut image, 24, sc.nbytes);
    write_i64(&mut image, 32, total_len as i64);

    image
}

/// Read a chunk's bytes out of `image` at `offset`, bounds-checked against
/// both the fixed prefix and the chunk's self-reported `cbytes` via
/// [`ChunkView`] — the image is untrusted input, so every chunk pulled out
/// of it goes through the bounds-checked view rather than raw slicing.
fn read_chunk_at(image: &[u8], offset: usize) -> Result<Vec<u8>> {
    if offset > image.len() {
        return Err(SchunkError::InvalidImage(format!(
            "chunk offset {offset} is past the end of a {}-byte image",
            image.len()
        )));
    }
    let view = ChunkView::new(&image[offset..])?;
    Ok(view.bytes().to_vec())
}

/// Rebuild a [`Superchunk`] from a packed image (spec.md §4.5 `unpack`).
///
/// Validates the image's declared `nbytes`/`cbytes` against what is actually
/// reachable through the ancillary offsets and the data-offsets table,
/// rejecting anything that doesn't add up rather than trusting the header.
pub fn unpack(image: &[u8]) -> Result<Superchunk> {
    if image.len() < PACKED_HEADER_LEN {
        return Err(SchunkError::InvalidImage(format!(
            "image is {} bytes, shorter than the {PACKED_HEADER_LEN}-byte fixed header",
            image.len()
        )));
    }

    let version = image[0];
    let compressor = Codec::from_code(image[1])?;
    let clevel = image[2];
    let filters_meta = image[3];
    let filters_word = u16::from_le_bytes(image[8..10].try_into().unwrap());
    let filters = descriptor::decode(filters_word);

    let nchunks = read_i64(image, 16);
    let nbytes_total = read_i64(image, 24);
    let cbytes_total = read_i64(image, 32);
    if nchunks < 0 {
        return Err(SchunkError::InvalidImage(format!("negative nchunks {nchunks}")));
    }

    let mut sc = Superchunk {
        version,
        compressor,
        clevel,
        filters,
        filters_meta,
        nchunks: 0,
        nbytes: 0,
        cbytes: SCHUNK_HEADER_LEN as i64,
        filters_chunk: None,
        codec_chunk: None,
        metadata_chunk: None,
        userdata_chunk: None,
        data: Vec::new(),
    };

    let mut nbytes_acc: i64 = 0;
    let mut payload_cbytes_acc: i64 = 0;

    let mut read_slot = |slot_offset: usize| -> Result<Option<Vec<u8>>> {
        let offset = read_i64(image, slot_offset);
        if offset == 0 {
            return Ok(None);
        }
        let chunk = read_chunk_at(image, offset as usize)?;
        nbytes_acc += chunk_nbytes(&chunk) as i64;
        payload_cbytes_acc += chunk_cbytes(&chunk) as i64;
        Ok(Some(chunk))
    };
    sc.filters_chunk = read_slot(OFF_FILTERS_CHUNK)?;
    sc.codec_chunk = read_slot(OFF_CODEC_CHUNK)?;
    sc.metadata_chunk = read_slot(OFF_METADATA_CHUNK)?;
    sc.userdata_chunk = read_slot(OFF_USERDATA_CHUNK)?;
    drop(read_slot);

    let table_offset = read_i64(image, OFF_TABLE_LOCATION);
    if table_offset < 0 {
        return Err(SchunkError::InvalidImage("negative data-offsets-table location".into()));
    }
    let table_offset = table_offset as usize;
    let table_len = nchunks as usize * POINTER_SLOT_SIZE;
    let table_end = table_offset
        .checked_add(table_len)
        .ok_or_else(|| SchunkError::InvalidImage("data-offsets table length overflows".into()))?;
    if table_end > image.len() {
        return Err(SchunkError::InvalidImage(format!(
            "data-offsets table [{table_offset}..{table_end}) runs past the end of a {}-byte image",
            image.len()
        )));
    }

    let mut data = Vec::with_capacity(nchunks as usize);
    for idx in 0..nchunks as usize {
        let entry = read_i64(image, table_offset + idx * POINTER_SLOT_SIZE);
        if entry < 0 {
            return Err(SchunkError::InvalidImage(format!("negative data chunk offset at index {idx}")));
        }
        let chunk = read_chunk_at(image, entry as usize)?;
        nbytes_acc += chunk_nbytes(&chunk) as i64;
        payload_cbytes_acc += chunk_cbytes(&chunk) as i64;
        data.push(chunk);
    }
    sc.data = data;
    sc.nchunks = nchunks;
    sc.nbytes = nbytes_acc;
    sc.cbytes = SCHUNK_HEADER_LEN as i64 + payload_cbytes_acc + nchunks * POINTER_SLOT_SIZE as i64;

    if nbytes_acc != nbytes_total {
        return Err(SchunkError::InvalidImage(format!(
            "image declares nbytes={nbytes_total}, but chunks sum to {nbytes_acc}"
        )));
    }
    let declared_total = PACKED_HEADER_LEN as i64 + payload_cbytes_acc + table_len as i64;
    if declared_total != cbytes_total {
        return Err(SchunkError::InvalidImage(format!(
            "image declares cbytes={cbytes_total}, but header + payload + table sum to {declared_total}"
        )));
    }

    Ok(sc)
}

/// Append an already-produced chunk directly into a packed image, growing it
/// in place (spec.md §4.5 `packed_append_chunk`).
pub fn packed_append_chunk(image: &mut Vec<u8>, chunk: &[u8]) -> Result<()> {
    if image.len() < PACKED_HEADER_LEN {
        return Err(SchunkError::InvalidImage("image shorter than its own fixed header".into()));
    }
    let nchunks = read_i64(image, 16);
    let nbytes = read_i64(image, 24);
    let cbytes = read_i64(image, 32);
    let table_offset = read_i64(image, OFF_TABLE_LOCATION) as usize;
    let table_len = nchunks as usize * POINTER_SLOT_SIZE;
    if table_offset + table_len != image.len() {
        return Err(SchunkError::InvalidImage(
            "data-offsets table is not located at the end of the image".into(),
        ));
    }

    // `chunk` is caller-supplied, so read it through the bounds-checked view
    // and append only its declared `cbytes` worth of bytes rather than
    // trusting the slice length the caller happened to pass in.
    let view = ChunkView::new(chunk)?;
    let chunk_nbytes_val = view.nbytes() as i64;
    let chunk_cbytes_val = view.cbytes() as i64;
    let chunk_bytes = view.bytes();

    let table = image.split_off(table_offset);
    let new_chunk_offset = image.len();
    image.extend_from_slice(chunk_bytes);
    image.extend_from_slice(&table);
    image.extend_from_slice(&(new_chunk_offset as i64).to_le_bytes());

    write_i64(image, 16, nchunks + 1);
    write_i64(image, 24, nbytes + chunk_nbytes_val);
    write_i64(image, 32, cbytes + chunk_cbytes_val + POINTER_SLOT_SIZE as i64);
    write_i64(image, OFF_TABLE_LOCATION, (table_offset as i64) + chunk_cbytes_val);
    Ok(())
}

/// Compress `src` and append it into a packed image in place (spec.md §4.5
/// `packed_append_buffer`). Fails with [`SchunkError::DeltaReferenceMissing`]
/// if the pipeline is DELTA and the image has no `filters_chunk` — the
/// packed form can never install a reference retroactively.
pub fn packed_append_buffer(image: &mut Vec<u8>, typesize: usize, src: &[u8]) -> Result<()> {
    if image.len() < PACKED_HEADER_LEN {
        return Err(SchunkError::InvalidImage("image shorter than its own fixed header".into()));
    }
    let compressor = Codec::from_code(image[1])?;
    let clevel = image[2];
    let filters_word = u16::from_le_bytes(image[8..10].try_into().unwrap());
    let filters = descriptor::decode(filters_word);
    let filters_chunk_offset = read_i64(image, OFF_FILTERS_CHUNK);
    let nchunks = read_i64(image, 16);

    let produced = if filters[0] == BLOSC_DELTA {
        if filters_chunk_offset == 0 {
            return Err(SchunkError::DeltaReferenceMissing);
        }
        // Mirrors `Superchunk::append_buffer`'s `is_first_chunk` check
        // (schunk.rs): the chunk landing at index 0 is always encoded
        // self-referentially (offset 0), regardless of a `filters_chunk`
        // already being present, so `packed_decompress_chunk`'s matching
        // `i == 0` branch reverses it correctly.
        let is_first_chunk = nchunks == 0;
        let mut delta_encoded = vec![0u8; src.len()];
        if is_first_chunk {
            delta::encode(&[], 0, typesize, src, &mut delta_encoded);
        } else {
            let ref_chunk = read_chunk_at(image, filters_chunk_offset as usize)?;
            let reference = codec::decompress(&ref_chunk)?;
            delta::encode(&reference, 1, typesize, src, &mut delta_encoded);
        }
        let doshuffle = Doshuffle::from_filter_code(filters[1]);
        codec::compress(compressor, clevel, doshuffle, typesize, &delta_encoded)?
    } else {
        let doshuffle = Doshuffle::from_filter_code(filters[0]);
        codec::compress(compressor, clevel, doshuffle, typesize, src)?
    };
    packed_append_chunk(image, &produced)
}

/// Decompress data chunk `i` straight out of a packed image, reversing DELTA
/// if the pipeline calls for it (spec.md §4.5 `packed_decompress_chunk`).
pub fn packed_decompress_chunk(image: &[u8], i: i64) -> Result<Vec<u8>> {
    if image.len() < PACKED_HEADER_LEN {
        return Err(SchunkError::InvalidImage("image shorter than its own fixed header".into()));
    }
    let nchunks = read_i64(image, 16);
    if i < 0 || i >= nchunks {
        return Err(SchunkError::OutOfRange { index: i, nchunks });
    }
    let table_offset = read_i64(image, OFF_TABLE_LOCATION) as usize;
    let entry_pos = table_offset + (i as usize) * POINTER_SLOT_SIZE;
    if entry_pos + POINTER_SLOT_SIZE > image.len() {
        return Err(SchunkError::InvalidImage(format!("data-offsets table entry {i} runs past the image")));
    }
    let offset = read_i64(image, entry_pos);
    if offset < 0 {
        return Err(SchunkError::InvalidImage(format!("negative data chunk offset at index {i}")));
    }
    let chunk = read_chunk_at(image, offset as usize)?;
    let view = ChunkView::new(&chunk)?;
    let nbytes = view.nbytes() as usize;
    let typesize = view.typesize() as usize;

    let mut plain = codec::decompress(&chunk)?;
    if plain.len() != nbytes {
        return Err(SchunkError::ShortDecompress {
            expected: nbytes as i32,
            got: plain.len() as i32,
        });
    }

    let filters_word = u16::from_le_bytes(image[8..10].try_into().unwrap());
    let filters = descriptor::decode(filters_word);
    if filters[0] == BLOSC_DELTA {
        if i == 0 {
            delta::decode(&[], 0, typesize, &mut plain);
        } else {
            let filters_chunk_offset = read_i64(image, OFF_FILTERS_CHUNK);
            if filters_chunk_offset == 0 {
                return Err(SchunkError::DeltaReferenceMissing);
            }
            let ref_chunk = read_chunk_at(image, filters_chunk_offset as usize)?;
            let reference = codec::decompress(&ref_chunk)?;
            delta::decode(&reference, 1, typesize, &mut plain);
        }
    }
    Ok(plain)
}
