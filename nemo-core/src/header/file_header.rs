//! The file header: a fixed 32-byte Part0 present in every file, plus a
//! 32-byte Part1 present from `file_version >= 5` onward carrying the
//! counts and sizes that only became necessary once the data section grew
//! past what Part0 alone could describe.

use std::io::{Read, Write};

use crate::codec::primitives::{read_u32, write_u32};
use crate::error::{NemoError, Result};

pub const SIGNATURE: &[u8; 8] = b"Nemo Fi\0";
pub const MIN_VERSION: u32 = 2;
pub const MAX_VERSION: u32 = 9;
pub const PART1_MIN_VERSION: u32 = 5;

/// `file_write_mode` bit compressing Header1.
pub const COMPRESS_HEADER1: u32 = 0x1;
/// `file_write_mode` bit compressing the data section.
pub const COMPRESS_DATA: u32 = 0x2;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part1 {
    pub data_pack_size: u32,
    pub data_unpack_size: u32,
    pub manager_count: u32,
    pub object_count: u32,
    pub max_id_saved: u32,
    pub product_version: u32,
    pub product_build: u32,
    pub hdr1_unpack_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHeader {
    pub crc: u32,
    pub ck_version: u32,
    pub file_version: u32,
    /// Legacy field; carried through round-trip unchanged rather than
    /// interpreted, since nothing downstream assigns it meaning.
    pub file_version2: u32,
    pub file_write_mode: u32,
    pub hdr1_pack_size: u32,
    pub part1: Option<Part1>,
}

impl FileHeader {
    pub fn has_part1(&self) -> bool {
        self.part1.is_some()
    }

    /// Versions below `PART1_MIN_VERSION` carry no Part1 and therefore no
    /// data section counts; such files are treated as having an empty
    /// data section and an already-uncompressed Header1.
    pub fn hdr1_unpack_size(&self) -> u32 {
        self.part1
            .as_ref()
            .map(|p| p.hdr1_unpack_size)
            .unwrap_or(self.hdr1_pack_size)
    }

    pub fn data_pack_size(&self) -> u32 {
        self.part1.as_ref().map(|p| p.data_pack_size).unwrap_or(0)
    }

    pub fn data_unpack_size(&self) -> u32 {
        self.part1.as_ref().map(|p| p.data_unpack_size).unwrap_or(0)
    }

    pub fn manager_count(&self) -> u32 {
        self.part1.as_ref().map(|p| p.manager_count).unwrap_or(0)
    }

    pub fn object_count(&self) -> u32 {
        self.part1.as_ref().map(|p| p.object_count).unwrap_or(0)
    }

    pub fn max_id_saved(&self) -> u32 {
        self.part1.as_ref().map(|p| p.max_id_saved).unwrap_or(0)
    }

    pub fn compresses_header1(&self) -> bool {
        self.file_write_mode & COMPRESS_HEADER1 != 0
    }

    pub fn compresses_data(&self) -> bool {
        self.file_write_mode & COMPRESS_DATA != 0
    }

    /// The header bytes that feed the checksum ahead of the packed
    /// Header1/Data bytes: Part0 with the signature and crc fields
    /// excluded, followed by Part1 if present.
    pub fn checksum_prefix(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(20 + 32);
        write_u32(&mut buf, self.ck_version).unwrap();
        write_u32(&mut buf, self.file_version).unwrap();
        write_u32(&mut buf, self.file_version2).unwrap();
        write_u32(&mut buf, self.file_write_mode).unwrap();
        write_u32(&mut buf, self.hdr1_pack_size).unwrap();
        if let Some(part1) = &self.part1 {
            write_u32(&mut buf, part1.data_pack_size).unwrap();
            write_u32(&mut buf, part1.data_unpack_size).unwrap();
            write_u32(&mut buf, part1.manager_count).unwrap();
            write_u32(&mut buf, part1.object_count).unwrap();
            write_u32(&mut buf, part1.max_id_saved).unwrap();
            write_u32(&mut buf, part1.product_version).unwrap();
            write_u32(&mut buf, part1.product_build).unwrap();
            write_u32(&mut buf, part1.hdr1_unpack_size).unwrap();
        }
        buf
    }
}

pub fn parse_file_header<R: Read>(r: &mut R) -> Result<FileHeader> {
    let mut signature = [0u8; 8];
    r.read_exact(&mut signature)?;
    if &signature != SIGNATURE {
        return Err(NemoError::InvalidSignature);
    }

    let crc = read_u32(r)?;
    let ck_version = read_u32(r)?;
    let file_version = read_u32(r)?;
    if !(MIN_VERSION..=MAX_VERSION).contains(&file_version) {
        return Err(NemoError::UnsupportedVersion(file_version));
    }
    let file_version2 = read_u32(r)?;
    let file_write_mode = read_u32(r)?;
    let hdr1_pack_size = read_u32(r)?;

    let part1 = if file_version >= PART1_MIN_VERSION {
        Some(Part1 {
            data_pack_size: read_u32(r)?,
            data_unpack_size: read_u32(r)?,
            manager_count: read_u32(r)?,
            object_count: read_u32(r)?,
            max_id_saved: read_u32(r)?,
            product_version: read_u32(r)?,
            product_build: read_u32(r)?,
            hdr1_unpack_size: read_u32(r)?,
        })
    } else {
        None
    };

    Ok(FileHeader {
        crc,
        ck_version,
        file_version,
        file_version2,
        file_write_mode,
        hdr1_pack_size,
        part1,
    })
}

pub fn serialize_file_header<W: Write>(w: &mut W, header: &FileHeader) -> Result<()> {
    w.write_all(SIGNATURE)?;
    write_u32(w, header.crc)?;
    write_u32(w, header.ck_version)?;
    write_u32(w, header.file_version)?;
    write_u32(w, header.file_version2)?;
    write_u32(w, header.file_write_mode)?;
    write_u32(w, header.hdr1_pack_size)?;
    if let Some(part1) = &header.part1 {
        write_u32(w, part1.data_pack_size)?;
        write_u32(w, part1.data_unpack_size)?;
        write_u32(w, part1.manager_count)?;
        write_u32(w, part1.object_count)?;
        write_u32(w, part1.max_id_saved)?;
        write_u32(w, part1.product_version)?;
        write_u32(w, part1.product_build)?;
        write_u32(w, part1.hdr1_unpack_size)?;
    }
    Ok(())
}
