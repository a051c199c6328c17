//! The data section: manager blocks followed by object blocks, each a
//! length-prefixed chunk body. `ObjectBlock` additionally carries its own
//! `file_id` for `file_version < 7`; later versions rely on descriptor
//! order in Header1 instead.

use std::io::{Cursor, Read, Write};

use crate::chunk::{read_chunk, write_chunk, Chunk};
use crate::codec::primitives::{read_u32, write_u32};
use crate::error::Result;
use crate::guid::Guid;

pub const OBJECT_BLOCK_HAS_FILE_ID_BELOW_VERSION: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerBlock {
    pub guid: Guid,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectBlock {
    /// Present only for `file_version < 7`; later versions address
    /// objects by their position in Header1's descriptor list instead.
    pub file_id: Option<u32>,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSection {
    pub managers: Vec<ManagerBlock>,
    pub objects: Vec<ObjectBlock>,
}

/// A zero-sized chunk block is shorthand for "no fields at all"; decoding
/// it skips the general chunk codec entirely rather than trying to parse
/// a header out of nothing.
fn read_block_chunk<R: Read>(r: &mut R, size: usize, class_id: u32) -> Result<Chunk> {
    if size == 0 {
        return Ok(Chunk::new(class_id));
    }
    let mut buf = vec![0u8; size];
    r.read_exact(&mut buf)?;
    let mut cur = Cursor::new(buf);
    read_chunk(&mut cur)
}

fn is_trivially_empty(chunk: &Chunk) -> bool {
    chunk.options == 0 && chunk.data.is_empty() && chunk.ids.is_empty() && chunk.raw_tail.is_none()
}

fn write_block_chunk(chunk: &Chunk) -> Result<Vec<u8>> {
    if is_trivially_empty(chunk) {
        return Ok(Vec::new());
    }
    let mut buf = Vec::new();
    write_chunk(&mut buf, chunk)?;
    Ok(buf)
}

pub fn parse_data_section<R: Read>(
    r: &mut R,
    manager_count: u32,
    object_count: u32,
    file_version: u32,
) -> Result<DataSection> {
    let mut managers = Vec::with_capacity(manager_count as usize);
    for _ in 0..manager_count {
        let guid = Guid::read_from(r)?;
        let data_size = read_u32(r)? as usize;
        let chunk = read_block_chunk(r, data_size, 0)?;
        managers.push(ManagerBlock { guid, chunk });
    }

    let mut objects = Vec::with_capacity(object_count as usize);
    for _ in 0..object_count {
        let file_id = if file_version < OBJECT_BLOCK_HAS_FILE_ID_BELOW_VERSION {
            Some(read_u32(r)?)
        } else {
            None
        };
        let chunk_size = read_u32(r)? as usize;
        let chunk = read_block_chunk(r, chunk_size, 0)?;
        objects.push(ObjectBlock { file_id, chunk });
    }

    Ok(DataSection { managers, objects })
}

pub fn serialize_data_section<W: Write>(
    w: &mut W,
    section: &DataSection,
    file_version: u32,
) -> Result<()> {
    for manager in &section.managers {
        manager.guid.write_to(w)?;
        let bytes = write_block_chunk(&manager.chunk)?;
        write_u32(w, bytes.len() as u32)?;
        w.write_all(&bytes)?;
    }

    for object in &section.objects {
        if file_version < OBJECT_BLOCK_HAS_FILE_ID_BELOW_VERSION {
            write_u32(w, object.file_id.unwrap_or(0))?;
        }
        let bytes = write_block_chunk(&object.chunk)?;
        write_u32(w, bytes.len() as u32)?;
        w.write_all(&bytes)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_block_round_trips_as_zero_bytes() {
        let section = DataSection {
            managers: vec![],
            objects: vec![ObjectBlock {
                file_id: None,
                chunk: Chunk::new(0x29),
            }],
        };
        let mut buf = Vec::new();
        serialize_data_section(&mut buf, &section, 8).unwrap();
        assert_eq!(buf, vec![0, 0, 0, 0]); // just the chunk_size=0 word

        let mut cur = Cursor::new(buf);
        let decoded = parse_data_section(&mut cur, 0, 1, 8).unwrap();
        assert_eq!(decoded.objects.len(), 1);
        assert!(is_trivially_empty(&decoded.objects[0].chunk));
    }

    #[test]
    fn pre_v7_object_block_carries_file_id() {
        let mut chunk = Chunk::new(0x29);
        chunk.writer().write_dword(7);
        let section = DataSection {
            managers: vec![],
            objects: vec![ObjectBlock {
                file_id: Some(3),
                chunk,
            }],
        };
        let mut buf = Vec::new();
        serialize_data_section(&mut buf, &section, 6).unwrap();
        let mut cur = Cursor::new(buf);
        let decoded = parse_data_section(&mut cur, 0, 1, 6).unwrap();
        assert_eq!(decoded.objects[0].file_id, Some(3));
    }

    #[test]
    fn manager_block_round_trips() {
        let mut chunk = Chunk::new(0);
        chunk.writer().write_dword(99);
        let section = DataSection {
            managers: vec![ManagerBlock {
                guid: Guid(11, 22),
                chunk,
            }],
            objects: vec![],
        };
        let mut buf = Vec::new();
        serialize_data_section(&mut buf, &section, 8).unwrap();
        let mut cur = Cursor::new(buf);
        let decoded = parse_data_section(&mut cur, 1, 0, 8).unwrap();
        assert_eq!(decoded, section);
    }
}
