//! Byte-level encoding of a `Chunk` as it appears inside an object block or
//! manager block, and the ID remap pass applied to every chunk's `ids`
//! table during load and save.

use std::io::{Read, Write};

use crate::codec::primitives::{read_u32, write_u32};
use crate::error::{NemoError, Result};

use super::model::Chunk;

/// High bit marking a reference descriptor rather than a full object
/// descriptor in a file-ID value.
pub const REFERENCE_BIT: u32 = 0x0080_0000;

pub fn is_reference_id(file_id: u32) -> bool {
    file_id & REFERENCE_BIT != 0
}

pub fn strip_reference_bit(file_id: u32) -> u32 {
    file_id & !REFERENCE_BIT
}

pub fn with_reference_bit(id: u32) -> u32 {
    id | REFERENCE_BIT
}

/// Reads one chunk body: `{class_id, chunk_version, options, data_len,
/// data..., ids_len, ids..., raw_tail_len, raw_tail...}`.
pub fn read_chunk<R: Read>(r: &mut R) -> Result<Chunk> {
    let class_id = read_u32(r)?;
    let chunk_version = read_u32(r)?;
    let options = read_u32(r)?;

    let data_len = read_u32(r)? as usize;
    let mut data = Vec::with_capacity(data_len);
    for _ in 0..data_len {
        data.push(read_u32(r)?);
    }

    let ids_len = read_u32(r)? as usize;
    let mut ids = Vec::with_capacity(ids_len);
    for _ in 0..ids_len {
        let pos = read_u32(r)?;
        if pos as usize >= data.len() {
            return Err(NemoError::InvalidFormat(format!(
                "chunk id table entry {pos} out of range for {data_len} data words"
            )));
        }
        ids.push(pos);
    }

    let raw_tail_len = read_u32(r)? as usize;
    let raw_tail = if raw_tail_len == 0 {
        None
    } else {
        let mut buf = vec![0u8; raw_tail_len];
        r.read_exact(&mut buf)?;
        Some(buf)
    };

    Ok(Chunk {
        class_id,
        chunk_version,
        options,
        data,
        ids,
        raw_tail,
    })
}

pub fn write_chunk<W: Write>(w: &mut W, chunk: &Chunk) -> Result<()> {
    write_u32(w, chunk.class_id)?;
    write_u32(w, chunk.chunk_version)?;
    write_u32(w, chunk.options)?;

    write_u32(w, chunk.data.len() as u32)?;
    for word in &chunk.data {
        write_u32(w, *word)?;
    }

    write_u32(w, chunk.ids.len() as u32)?;
    for pos in &chunk.ids {
        write_u32(w, *pos)?;
    }

    match &chunk.raw_tail {
        Some(tail) => {
            write_u32(w, tail.len() as u32)?;
            w.write_all(tail)?;
        }
        None => write_u32(w, 0)?,
    }

    Ok(())
}

/// Rewrites every object-ID word the chunk's `ids` table points at, via
/// `remap`. `remap` returns `None` for an ID with no known mapping, which
/// is left untouched rather than treated as fatal — an unresolved
/// reference is reported by the resolver, not by this pass.
pub fn remap_object_ids<F: Fn(u32) -> Option<u32>>(chunk: &mut Chunk, remap: F) {
    for &pos in &chunk.ids {
        let word = &mut chunk.data[pos as usize];
        let is_ref = is_reference_id(*word);
        let bare = strip_reference_bit(*word);
        if let Some(mapped) = remap(bare) {
            *word = if is_ref {
                with_reference_bit(mapped)
            } else {
                mapped
            };
        }
    }
}
