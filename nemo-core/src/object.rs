//! The runtime object: a loaded descriptor plus its chunk payload, indexed
//! by the object repository and addressed by the reference resolver.

use crate::chunk::Chunk;
use crate::guid::Guid;

/// Runtime identity assigned during a load session or already held by an
/// object newly created in memory. Distinct from the on-disk `file_id`,
/// which only exists for the duration of a single load or save.
pub type RuntimeId = u32;

/// The opaque, engine-defined `flags` word carried by every descriptor.
/// This crate does not interpret any bit of it — it is read from
/// Header1 on load and written back unchanged on save, the same way
/// `file_version2` is carried through without interpretation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectFlags(pub u32);

impl ObjectFlags {
    pub const NONE: ObjectFlags = ObjectFlags(0);

    pub fn contains(&self, bit: u32) -> bool {
        self.0 & bit != 0
    }
}

/// A single loaded (or about-to-be-saved) object: its class, name, GUID,
/// source-file index (for multi-file scenes), and field chunk.
#[derive(Debug, Clone)]
pub struct Object {
    pub id: RuntimeId,
    pub class_id: u32,
    pub name: Option<String>,
    pub flags: ObjectFlags,
    pub chunk: Chunk,
    pub type_guid: Guid,
    pub file_index: u32,
    /// Runtime-only marker, set by the caller before a save: this object
    /// should be emitted as a reference descriptor (empty chunk, no
    /// Data-section block) rather than a full object block (spec §4.8
    /// phase 1). Distinct from `flags`, which is the opaque persisted
    /// field and must never be repurposed to carry this decision.
    pub save_as_reference: bool,
}

impl Object {
    pub fn new(id: RuntimeId, class_id: u32) -> Object {
        Object {
            id,
            class_id,
            name: None,
            flags: ObjectFlags::NONE,
            chunk: Chunk::new(class_id),
            type_guid: Guid::ZERO,
            file_index: 0,
            save_as_reference: false,
        }
    }
}
