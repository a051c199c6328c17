//! Little-endian byte codec primitives.
//!
//! These operate directly on a byte stream (`Read`/`Write`) and back the
//! file-header, Header1, and data-section codecs, which are plain
//! byte-oriented framing outside of chunk payloads. Chunk payloads are a
//! word (`u32`) stream with their own cursor API; see `chunk::model`.

use std::io::{Read, Write};

use crate::error::{NemoError, Result};

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

pub fn read_u16<R: Read>(r: &mut R) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

pub fn write_u16<W: Write>(w: &mut W, v: u16) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_u32<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub fn write_i32<W: Write>(w: &mut W, v: i32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

pub fn read_f32<R: Read>(r: &mut R) -> Result<f32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub fn write_f32<W: Write>(w: &mut W, v: f32) -> Result<()> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Length-prefixed string: `{u32 length, length bytes}`, no trailing NUL.
/// Used for chunk-embedded string fields.
pub fn read_string<R: Read>(r: &mut R) -> Result<String> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| NemoError::InvalidFormat(format!("non-utf8 string: {e}")))
}

pub fn write_string<W: Write>(w: &mut W, s: &str) -> Result<()> {
    write_u32(w, s.len() as u32)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

/// Null-terminated string, as used by Header1's `ObjectDescriptor::name`
/// and `IncludedFileDesc::name`.
pub fn read_cstring<R: Read>(r: &mut R) -> Result<String> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = r.read(&mut byte)?;
        if n == 0 {
            return Err(NemoError::Eof("cstring truncated before NUL".into()));
        }
        if byte[0] == 0 {
            break;
        }
        bytes.push(byte[0]);
    }
    String::from_utf8(bytes).map_err(|e| NemoError::InvalidFormat(format!("non-utf8 cstring: {e}")))
}

pub fn write_cstring<W: Write>(w: &mut W, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(NemoError::InvalidArgument(
            "cstring value contains an embedded NUL".into(),
        ));
    }
    w.write_all(s.as_bytes())?;
    w.write_all(&[0])?;
    Ok(())
}
