//! Header1: the object descriptor table, plugin dependency list, and
//! optional included-file index. Each list is self-counted (a leading
//! `u32` count) inside the Header1 byte buffer, so older file versions
//! that predate a given list simply encode a zero count rather than
//! omitting the field outright.

use std::io::{Read, Write};

use crate::codec::primitives::{read_cstring, read_u32, write_cstring, write_u32};
use crate::error::Result;
use crate::guid::Guid;

/// High bit of `file_id` marking a reference descriptor.
pub const REFERENCE_BIT: u32 = 0x0080_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectDescriptor {
    pub file_id: u32,
    pub class_id: u32,
    pub name: String,
    pub file_index: u32,
    pub flags: u32,
}

impl ObjectDescriptor {
    pub fn is_reference(&self) -> bool {
        self.file_id & REFERENCE_BIT != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDep {
    pub category: u32,
    pub guid: Guid,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFileDesc {
    pub name: String,
    pub data_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header1 {
    pub objects: Vec<ObjectDescriptor>,
    pub plugin_deps: Vec<PluginDep>,
    pub included_files: Vec<IncludedFileDesc>,
}

pub fn parse_header1<R: Read>(r: &mut R) -> Result<Header1> {
    let object_count = read_u32(r)? as usize;
    let mut objects = Vec::with_capacity(object_count);
    for _ in 0..object_count {
        objects.push(ObjectDescriptor {
            file_id: read_u32(r)?,
            class_id: read_u32(r)?,
            name: read_cstring(r)?,
            file_index: read_u32(r)?,
            flags: read_u32(r)?,
        });
    }

    let plugin_count = read_u32(r)? as usize;
    let mut plugin_deps = Vec::with_capacity(plugin_count);
    for _ in 0..plugin_count {
        plugin_deps.push(PluginDep {
            category: read_u32(r)?,
            guid: Guid::read_from(r)?,
            version: read_u32(r)?,
        });
    }

    let included_count = read_u32(r)? as usize;
    let mut included_files = Vec::with_capacity(included_count);
    for _ in 0..included_count {
        included_files.push(IncludedFileDesc {
            name: read_cstring(r)?,
            data_size: read_u32(r)?,
        });
    }

    Ok(Header1 {
        objects,
        plugin_deps,
        included_files,
    })
}

pub fn serialize_header1<W: Write>(w: &mut W, header1: &Header1) -> Result<()> {
    write_u32(w, header1.objects.len() as u32)?;
    for obj in &header1.objects {
        write_u32(w, obj.file_id)?;
        write_u32(w, obj.class_id)?;
        write_cstring(w, &obj.name)?;
        write_u32(w, obj.file_index)?;
        write_u32(w, obj.flags)?;
    }

    write_u32(w, header1.plugin_deps.len() as u32)?;
    for dep in &header1.plugin_deps {
        write_u32(w, dep.category)?;
        dep.guid.write_to(w)?;
        write_u32(w, dep.version)?;
    }

    write_u32(w, header1.included_files.len() as u32)?;
    for file in &header1.included_files {
        write_cstring(w, &file.name)?;
        write_u32(w, file.data_size)?;
    }

    Ok(())
}
