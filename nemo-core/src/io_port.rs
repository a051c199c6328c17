use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::error::Result;

/// A sequential read/write/seek/tell/close contract for whatever backs a
/// load or save: a file, an in-memory buffer, anything. Modeled as a trait
/// over `Read + Write + Seek` rather than an opaque handle so the
/// pipelines stay generic (`fn load<IO: IoPort>(io: &mut IO, ...)`).
///
/// `seek(0)` must succeed on whatever backs this port — the save pipeline
/// rewinds to rewrite the header once the checksum is known.
pub trait IoPort: Read + Write + Seek {
    fn tell(&mut self) -> Result<u64> {
        Ok(self.seek(SeekFrom::Current(0))?)
    }

    /// Closing is a no-op by default; ports that wrap another port (the
    /// compressed stream wrapper) override this to flush and release it.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl IoPort for File {}
impl IoPort for Cursor<Vec<u8>> {}
impl<'a> IoPort for Cursor<&'a mut Vec<u8>> {}
impl<'a> IoPort for Cursor<&'a [u8]> {}
