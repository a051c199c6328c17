//! Compressed stream wrapper: zlib-compatible deflate/inflate over a
//! 64 KiB buffer, plus an Adler-32 helper exposed separately from the
//! zlib stream's own internal checksum, since the file header carries its
//! own independently-computed checksum field.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{NemoError, Result};

pub const BUFFER_SIZE: usize = 64 * 1024;

/// Wraps a `Write` sink with streaming zlib deflate. Takes ownership of the
/// inner writer; `finish()` flushes the final deflate block and returns it.
pub struct DeflatingWriter<W: Write> {
    inner: ZlibEncoder<W>,
}

impl<W: Write> DeflatingWriter<W> {
    pub fn new(inner: W, level: u32) -> Self {
        DeflatingWriter {
            inner: ZlibEncoder::new(inner, Compression::new(level)),
        }
    }

    pub fn finish(self) -> Result<W> {
        self.inner
            .finish()
            .map_err(|e| NemoError::CompressionError(e.to_string()))
    }
}

impl<W: Write> Write for DeflatingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Wraps a `Read` source with streaming zlib inflate. Takes ownership of
/// the inner reader; EOF on the inner port propagates as EOF here.
pub struct InflatingReader<R: Read> {
    inner: ZlibDecoder<R>,
}

impl<R: Read> InflatingReader<R> {
    pub fn new(inner: R) -> Self {
        InflatingReader {
            inner: ZlibDecoder::new(inner),
        }
    }
}

impl<R: Read> Read for InflatingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Whole-buffer deflate used by the header1/data codecs, which know the
/// packed size up front and compress a complete in-memory buffer in one
/// shot rather than streaming incrementally.
pub fn deflate(input: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() / 2 + 16);
    {
        let mut w = DeflatingWriter::new(&mut out, level);
        w.write_all(input)?;
        w.finish()?;
    }
    Ok(out)
}

/// Whole-buffer inflate. An `expected_out_size` mismatch is an
/// `InvalidFormat` error, not silently truncated/padded output.
pub fn inflate(input: &[u8], expected_out_size: usize) -> Result<Vec<u8>> {
    let mut r = InflatingReader::new(input);
    let mut out = Vec::with_capacity(expected_out_size);
    r.read_to_end(&mut out)
        .map_err(|e| NemoError::CompressionError(e.to_string()))?;
    if out.len() != expected_out_size {
        return Err(NemoError::InvalidFormat(format!(
            "inflate size mismatch: got {} expected {}",
            out.len(),
            expected_out_size
        )));
    }
    Ok(out)
}

/// Adler-32 over `bytes`, continuing from `seed` (use `1` for a fresh
/// checksum, matching the zlib/Adler-32 convention).
pub fn adler32(seed: u32, bytes: &[u8]) -> u32 {
    let mut rolling = adler32::RollingAdler32::from_value(seed);
    rolling.update_buffer(bytes);
    rolling.hash()
}
