//! The chunk model (spec §3, §4.1): a self-describing word stream used by
//! every object and manager payload, plus the cursor API
//! (`read/write dword/int/float/byte/object_id/string`) and the
//! identifier-seekable regions used for optional blocks in state-save
//! formats.

use crate::error::{NemoError, Result};

/// Option bits carried alongside a chunk's data. `HAS_IDS` is set whenever
/// the `ids` table is non-empty (spec §4.1).
pub mod options {
    pub const HAS_IDS: u32 = 0x0000_0001;
}

/// The writer-default chunk format version (spec §3).
pub const CHUNK_VERSION_CURRENT: u32 = 7;

/// Sentinel word marking an identifier-seekable block: `[MARKER, id,
/// payload_word_count, ...payload]`. Chosen to be unlikely to collide with
/// ordinary field data; a real collision only causes `seek_identifier` to
/// skip an extra few words, it cannot corrupt the stream, since every
/// reader still walks the chunk linearly from position 0.
pub const IDENTIFIER_MARKER: u32 = 0x4944_4E54; // "IDNT" as little-endian bytes

/// One object's or manager's field payload: a self-describing word stream
/// plus the table of word-positions holding object-ID values (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    pub class_id: u32,
    pub chunk_version: u32,
    pub options: u32,
    pub data: Vec<u32>,
    pub ids: Vec<u32>,
    /// Bytes a partial schema left unparsed at the tail of this chunk, so
    /// re-serializing without fully understanding every field still
    /// reproduces the original bytes (spec §3, §4.7 phase 14).
    pub raw_tail: Option<Vec<u8>>,
}

impl Chunk {
    pub fn new(class_id: u32) -> Chunk {
        Chunk {
            class_id,
            chunk_version: CHUNK_VERSION_CURRENT,
            options: 0,
            data: Vec::new(),
            ids: Vec::new(),
            raw_tail: None,
        }
    }

    pub fn has_ids(&self) -> bool {
        self.options & options::HAS_IDS != 0
    }

    pub fn reader(&self) -> ChunkReader<'_> {
        ChunkReader { chunk: self, pos: 0 }
    }

    pub fn writer(&mut self) -> ChunkWriter<'_> {
        ChunkWriter { chunk: self }
    }
}

/// A read cursor over a chunk's word stream, measured in `u32` words.
pub struct ChunkReader<'a> {
    chunk: &'a Chunk,
    pos: usize,
}

impl<'a> ChunkReader<'a> {
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining_words(&self) -> usize {
        self.chunk.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn next_word(&mut self) -> Result<u32> {
        let w = *self
            .chunk
            .data
            .get(self.pos)
            .ok_or_else(|| NemoError::Eof(format!("chunk exhausted at word {}", self.pos)))?;
        self.pos += 1;
        Ok(w)
    }

    pub fn read_dword(&mut self) -> Result<u32> {
        self.next_word()
    }

    pub fn read_int(&mut self) -> Result<i32> {
        Ok(self.next_word()? as i32)
    }

    pub fn read_float(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.next_word()?))
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok((self.next_word()? & 0xFF) as u8)
    }

    pub fn read_object_id(&mut self) -> Result<u32> {
        self.next_word()
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_dword()? as usize;
        let words = len.div_ceil(4);
        let mut bytes = Vec::with_capacity(words * 4);
        for _ in 0..words {
            bytes.extend_from_slice(&self.next_word()?.to_le_bytes());
        }
        bytes.truncate(len);
        String::from_utf8(bytes)
            .map_err(|e| NemoError::InvalidFormat(format!("non-utf8 chunk string: {e}")))
    }

    /// Generic byte array: `{u32 elem_size, u32 count, elem_size*count
    /// bytes}` (spec §4.1).
    pub fn read_byte_array(&mut self) -> Result<Vec<u8>> {
        let elem_size = self.read_dword()? as usize;
        let count = self.read_dword()? as usize;
        let total = elem_size
            .checked_mul(count)
            .ok_or_else(|| NemoError::InvalidFormat("byte array size overflow".into()))?;
        let words = total.div_ceil(4);
        let mut bytes = Vec::with_capacity(words * 4);
        for _ in 0..words {
            bytes.extend_from_slice(&self.next_word()?.to_le_bytes());
        }
        bytes.truncate(total);
        Ok(bytes)
    }

    pub fn read_dword_array(&mut self) -> Result<Vec<u32>> {
        let count = self.read_dword()? as usize;
        (0..count).map(|_| self.read_dword()).collect()
    }

    pub fn read_int_array(&mut self) -> Result<Vec<i32>> {
        let count = self.read_dword()? as usize;
        (0..count).map(|_| self.read_int()).collect()
    }

    pub fn read_float_array(&mut self) -> Result<Vec<f32>> {
        let count = self.read_dword()? as usize;
        (0..count).map(|_| self.read_float()).collect()
    }

    pub fn read_object_id_array(&mut self) -> Result<Vec<u32>> {
        let count = self.read_dword()? as usize;
        (0..count).map(|_| self.read_object_id()).collect()
    }

    pub fn read_string_array(&mut self) -> Result<Vec<String>> {
        let count = self.read_dword()? as usize;
        (0..count).map(|_| self.read_string()).collect()
    }

    /// Scans from the start of the chunk for an identifier block matching
    /// `identifier`; if found, seeks this reader to the first word of its
    /// payload and returns `true`. Leaves the cursor untouched otherwise.
    pub fn seek_identifier(&mut self, identifier: u32) -> Result<bool> {
        let data = &self.chunk.data;
        let mut p = 0usize;
        while p < data.len() {
            if data[p] == IDENTIFIER_MARKER {
                if p + 2 >= data.len() {
                    return Err(NemoError::InvalidFormat(
                        "truncated identifier block header".into(),
                    ));
                }
                let id = data[p + 1];
                let size = data[p + 2] as usize;
                let payload_start = p + 3;
                let payload_end = payload_start
                    .checked_add(size)
                    .ok_or_else(|| NemoError::InvalidFormat("identifier block size overflow".into()))?;
                if payload_end > data.len() {
                    return Err(NemoError::InvalidFormat(
                        "identifier block overruns chunk".into(),
                    ));
                }
                if id == identifier {
                    self.pos = payload_start;
                    return Ok(true);
                }
                p = payload_end;
            } else {
                p += 1;
            }
        }
        Ok(false)
    }
}

/// An append-only write cursor over a chunk's word stream.
pub struct ChunkWriter<'a> {
    chunk: &'a mut Chunk,
}

impl<'a> ChunkWriter<'a> {
    pub fn position(&self) -> usize {
        self.chunk.data.len()
    }

    fn push_word(&mut self, w: u32) {
        self.chunk.data.push(w);
    }

    pub fn write_dword(&mut self, v: u32) {
        self.push_word(v);
    }

    pub fn write_int(&mut self, v: i32) {
        self.push_word(v as u32);
    }

    pub fn write_float(&mut self, v: f32) {
        self.push_word(v.to_bits());
    }

    pub fn write_byte(&mut self, v: u8) {
        self.push_word(v as u32);
    }

    /// Writes an object-ID value and records this word's position in the
    /// chunk's `ids` table, the sole mechanism later used to rewrite
    /// references after ID remapping (spec §4.1, §4.6).
    pub fn write_object_id(&mut self, id: u32) {
        self.chunk.ids.push(self.chunk.data.len() as u32);
        self.push_word(id);
        self.chunk.options |= options::HAS_IDS;
    }

    pub fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        self.write_dword(bytes.len() as u32);
        for word_bytes in bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..word_bytes.len()].copy_from_slice(word_bytes);
            self.push_word(u32::from_le_bytes(word));
        }
    }

    pub fn write_byte_array(&mut self, elem_size: u32, bytes: &[u8]) {
        let count = if elem_size == 0 {
            0
        } else {
            bytes.len() as u32 / elem_size
        };
        self.write_dword(elem_size);
        self.write_dword(count);
        for word_bytes in bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..word_bytes.len()].copy_from_slice(word_bytes);
            self.push_word(u32::from_le_bytes(word));
        }
    }

    pub fn write_dword_array(&mut self, values: &[u32]) {
        self.write_dword(values.len() as u32);
        for v in values {
            self.write_dword(*v);
        }
    }

    pub fn write_int_array(&mut self, values: &[i32]) {
        self.write_dword(values.len() as u32);
        for v in values {
            self.write_int(*v);
        }
    }

    pub fn write_float_array(&mut self, values: &[f32]) {
        self.write_dword(values.len() as u32);
        for v in values {
            self.write_float(*v);
        }
    }

    pub fn write_object_id_array(&mut self, ids: &[u32]) {
        self.write_dword(ids.len() as u32);
        for id in ids {
            self.write_object_id(*id);
        }
    }

    pub fn write_string_array(&mut self, values: &[String]) {
        self.write_dword(values.len() as u32);
        for s in values {
            self.write_string(s);
        }
    }

    /// Opens an identifier-seekable block; returns a token to pass to
    /// `end_identifier` once the block's payload has been written.
    pub fn begin_identifier(&mut self, identifier: u32) -> usize {
        self.push_word(IDENTIFIER_MARKER);
        self.push_word(identifier);
        let size_pos = self.chunk.data.len();
        self.push_word(0); // patched below
        size_pos
    }

    pub fn end_identifier(&mut self, token: usize) {
        let word_count = (self.chunk.data.len() - (token + 1)) as u32;
        self.chunk.data[token] = word_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_fields_round_trip() {
        let mut chunk = Chunk::new(0x29);
        {
            let mut w = chunk.writer();
            w.write_dword(42);
            w.write_int(-7);
            w.write_float(3.5);
            w.write_byte(0xAB);
            w.write_string("hello");
        }
        let mut r = chunk.reader();
        assert_eq!(r.read_dword().unwrap(), 42);
        assert_eq!(r.read_int().unwrap(), -7);
        assert_eq!(r.read_float().unwrap(), 3.5);
        assert_eq!(r.read_byte().unwrap(), 0xAB);
        assert_eq!(r.read_string().unwrap(), "hello");
    }

    #[test]
    fn object_id_write_populates_ids_table_and_has_ids_bit() {
        let mut chunk = Chunk::new(1);
        {
            let mut w = chunk.writer();
            w.write_dword(0); // padding word at index 0
            w.write_object_id(99); // id word lives at index 1
        }
        assert!(chunk.has_ids());
        assert_eq!(chunk.ids, vec![1]);
        assert_eq!(chunk.data[1], 99);
    }

    #[test]
    fn identifier_block_is_found_and_skipped_correctly() {
        let mut chunk = Chunk::new(1);
        {
            let mut w = chunk.writer();
            w.write_dword(0xAAAA);
            let tok_a = w.begin_identifier(10);
            w.write_dword(111);
            w.end_identifier(tok_a);
            let tok_b = w.begin_identifier(20);
            w.write_dword(222);
            w.write_dword(223);
            w.end_identifier(tok_b);
        }
        let mut r = chunk.reader();
        assert!(r.seek_identifier(20).unwrap());
        assert_eq!(r.read_dword().unwrap(), 222);
        assert_eq!(r.read_dword().unwrap(), 223);

        let mut r2 = chunk.reader();
        assert!(!r2.seek_identifier(999).unwrap());
    }

    #[test]
    fn reading_past_end_is_eof() {
        let chunk = Chunk::new(1);
        let mut r = chunk.reader();
        assert!(matches!(r.read_dword(), Err(NemoError::Eof(_))));
    }

    #[test]
    fn arrays_round_trip() {
        let mut chunk = Chunk::new(1);
        {
            let mut w = chunk.writer();
            w.write_dword_array(&[1, 2, 3]);
            w.write_object_id_array(&[10, 20]);
            w.write_string_array(&["a".to_string(), "bb".to_string()]);
        }
        let mut r = chunk.reader();
        assert_eq!(r.read_dword_array().unwrap(), vec![1, 2, 3]);
        assert_eq!(r.read_object_id_array().unwrap(), vec![10, 20]);
        assert_eq!(
            r.read_string_array().unwrap(),
            vec!["a".to_string(), "bb".to_string()]
        );
        assert_eq!(chunk.ids, vec![5, 6]); // positions of the two object ids
    }
}
