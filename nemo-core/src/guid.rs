use std::io::{Read, Write};

use crate::error::Result;

/// A Virtools/Nemo class/type GUID: two little-endian `u32`s.
///
/// Used both for plugin-dependency identification (Header1's `PluginDep`
/// list) and for the `type_guid` carried by parameter-like objects, which
/// the guid-resolution strategy in `resolver` matches on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Guid(pub u32, pub u32);

impl Guid {
    pub const ZERO: Guid = Guid(0, 0);

    pub fn is_zero(&self) -> bool {
        self.0 == 0 && self.1 == 0
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Guid> {
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf)?;
        Ok(Guid(
            u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            u32::from_le_bytes(buf[4..8].try_into().unwrap()),
        ))
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.0.to_le_bytes())?;
        w.write_all(&self.1.to_le_bytes())?;
        Ok(())
    }
}
