//! The save pipeline: walks the repository, builds a dense file-ID plan,
//! serializes managers and objects into the data section, then the
//! object descriptors into Header1, and finally rewrites the file header
//! once the checksum is known.

use std::collections::{HashMap, HashSet};
use std::io::SeekFrom;

use tracing::debug;

use crate::chunk::with_reference_bit;
use crate::compression::{adler32, deflate};
use crate::data::section::{
    serialize_data_section, DataSection, ManagerBlock, ObjectBlock,
    OBJECT_BLOCK_HAS_FILE_ID_BELOW_VERSION,
};
use crate::error::{NemoError, Result};
use crate::header::file_header::{
    serialize_file_header, FileHeader, Part1, COMPRESS_DATA, COMPRESS_HEADER1, PART1_MIN_VERSION,
};
use crate::header::header1::{serialize_header1, Header1, ObjectDescriptor, PluginDep};
use crate::io_port::IoPort;
use crate::object::{Object, RuntimeId};
use crate::repository::ObjectRepository;
use crate::schema::SchemaRegistry;
use crate::session::SavePlan;

use super::load::IncludedFile;

#[derive(Debug, Clone)]
pub struct SaveOptions {
    pub compress: bool,
    pub compression_level: u32,
    pub ck_version: u32,
    pub file_version: u32,
    pub file_version2: u32,
    pub product_version: u32,
    pub product_build: u32,
    /// class_id -> the plugin dependency that owns it, used to build
    /// Header1's plugin dependency list from the classes actually saved.
    pub class_plugins: HashMap<u32, PluginDep>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptions {
            compress: false,
            compression_level: 6,
            ck_version: 0,
            file_version: 8,
            file_version2: 0,
            product_version: 0,
            product_build: 0,
            class_plugins: HashMap::new(),
        }
    }
}

/// Rewrites a chunk's object-ID table from runtime IDs to dense file IDs,
/// setting the reference bit on any pointer whose target is itself being
/// saved as a reference descriptor. Unlike the load-direction remap, the
/// bit here is derived from the target's save-time role rather than
/// preserved from a previously-encoded value, since in-memory pointers
/// never carry the bit until they are written to disk.
fn remap_for_save(
    chunk: &mut crate::chunk::Chunk,
    plan: &SavePlan,
    reference_runtime_ids: &HashSet<RuntimeId>,
) {
    for &pos in &chunk.ids {
        let word = &mut chunk.data[pos as usize];
        if let Some(file_id) = plan.file_id_for(*word) {
            *word = if reference_runtime_ids.contains(&*word) {
                with_reference_bit(file_id)
            } else {
                file_id
            };
        }
    }
}

pub fn save<IO: IoPort>(
    io: &mut IO,
    repository: &dyn ObjectRepository,
    managers: &[ManagerBlock],
    included_files: &[IncludedFile],
    schema_registry: &dyn SchemaRegistry,
    options: &SaveOptions,
) -> Result<()> {
    // Phase 1: validate and compute the reference map.
    let objects: Vec<&Object> = repository.iter().collect();
    let reference_runtime_ids: HashSet<RuntimeId> = objects
        .iter()
        .filter(|o| o.save_as_reference)
        .map(|o| o.id)
        .collect();

    // Phase 2: pre-save manager hooks (no registry, logged).
    debug!("no manager hooks registered, skipping pre-save hooks");

    // Phase 3: build the ID remap plan. Non-reference objects are planned
    // first so their file-ids land densely in 0..object_count, matching
    // the invariant that reference descriptors carry higher ids.
    let mut ordered: Vec<&Object> = Vec::with_capacity(objects.len());
    ordered.extend(objects.iter().copied().filter(|o| !reference_runtime_ids.contains(&o.id)));
    ordered.extend(objects.iter().copied().filter(|o| reference_runtime_ids.contains(&o.id)));
    let plan = SavePlan::build(ordered.into_iter())?;

    // Phase 4: serialize manager chunks.
    let mut manager_blocks = Vec::with_capacity(managers.len());
    for manager in managers {
        let mut chunk = manager.chunk.clone();
        remap_for_save(&mut chunk, &plan, &reference_runtime_ids);
        manager_blocks.push(ManagerBlock {
            guid: manager.guid,
            chunk,
        });
    }

    // Phase 5: serialize object chunks for non-reference objects.
    let mut object_blocks = Vec::with_capacity(objects.len());
    for object in &objects {
        if reference_runtime_ids.contains(&object.id) {
            continue;
        }
        let mut working = (*object).clone();
        if let Some(schema) = schema_registry.schema_for(working.class_id) {
            if let Some(serialize) = &schema.serialize {
                serialize(&mut working).map_err(|e| {
                    NemoError::validation_with_source(working.class_id, "chunk serialize failed", e)
                })?;
            }
        }
        remap_for_save(&mut working.chunk, &plan, &reference_runtime_ids);
        let file_id = plan.file_id_for(object.id);
        object_blocks.push(ObjectBlock {
            file_id: if options.file_version < OBJECT_BLOCK_HAS_FILE_ID_BELOW_VERSION {
                file_id
            } else {
                None
            },
            chunk: working.chunk,
        });
    }

    let data_section = DataSection {
        managers: manager_blocks,
        objects: object_blocks,
    };

    // Phase 6: build the data section buffer.
    let mut data_buf = Vec::new();
    serialize_data_section(&mut data_buf, &data_section, options.file_version)?;
    let data_unpack_size = data_buf.len() as u32;
    let data_bytes = if options.compress {
        deflate(&data_buf, options.compression_level)?
    } else {
        data_buf
    };
    let data_pack_size = data_bytes.len() as u32;

    // Phase 7: build Header1 object descriptors.
    let mut hdr1 = Header1::default();
    for object in &objects {
        let file_id = plan
            .file_id_for(object.id)
            .ok_or_else(|| NemoError::InvalidState(format!("object {} missing from save plan", object.id)))?;
        let file_id = if reference_runtime_ids.contains(&object.id) {
            with_reference_bit(file_id)
        } else {
            file_id
        };
        hdr1.objects.push(ObjectDescriptor {
            file_id,
            class_id: object.class_id,
            name: object.name.clone().unwrap_or_default(),
            file_index: object.file_index,
            flags: object.flags.0,
        });
    }

    // Phase 8: plugin dependency list, deduplicated in first-seen order.
    let mut seen_plugins = HashSet::new();
    for object in &objects {
        if let Some(dep) = options.class_plugins.get(&object.class_id) {
            let key = (dep.category, dep.guid.0, dep.guid.1);
            if seen_plugins.insert(key) {
                hdr1.plugin_deps.push(dep.clone());
            }
        }
    }

    hdr1.included_files = included_files
        .iter()
        .map(|f| crate::header::header1::IncludedFileDesc {
            name: f.name.clone(),
            data_size: f.data.len() as u32,
        })
        .collect();

    // Phase 9: serialize and optionally deflate Header1.
    let mut hdr1_buf = Vec::new();
    serialize_header1(&mut hdr1_buf, &hdr1)?;
    let hdr1_unpack_size = hdr1_buf.len() as u32;
    let hdr1_bytes = if options.compress {
        deflate(&hdr1_buf, options.compression_level)?
    } else {
        hdr1_buf
    };
    let hdr1_pack_size = hdr1_bytes.len() as u32;

    // Phase 10: compute total sizes and max_id_saved.
    let max_id_saved = plan.max_file_id().unwrap_or(0);

    let header = FileHeader {
        crc: 0,
        ck_version: options.ck_version,
        file_version: options.file_version,
        file_version2: options.file_version2,
        file_write_mode: if options.compress {
            COMPRESS_HEADER1 | COMPRESS_DATA
        } else {
            0
        },
        hdr1_pack_size,
        part1: if options.file_version >= PART1_MIN_VERSION {
            Some(Part1 {
                data_pack_size,
                data_unpack_size,
                manager_count: data_section.managers.len() as u32,
                object_count: data_section.objects.len() as u32,
                max_id_saved,
                product_version: options.product_version,
                product_build: options.product_build,
                hdr1_unpack_size,
            })
        } else {
            None
        },
    };

    // Phase 11: emit the header with a placeholder checksum.
    serialize_file_header(io, &header)?;

    // Phase 12: write Header1 bytes, then Data bytes.
    io.write_all(&hdr1_bytes)?;
    io.write_all(&data_bytes)?;

    // Phase 13: compute the checksum and rewrite the header.
    let mut checksum_input = header.checksum_prefix();
    checksum_input.extend_from_slice(&hdr1_bytes);
    checksum_input.extend_from_slice(&data_bytes);
    let crc = adler32(1, &checksum_input);

    let mut final_header = header;
    final_header.crc = crc;
    io.seek(SeekFrom::Start(0))?;
    serialize_file_header(io, &final_header)?;
    io.seek(SeekFrom::End(0))?;

    // Phase 14: post-save manager hooks (logged), then included files.
    debug!("no manager hooks registered, skipping post-save hooks");
    for file in included_files {
        crate::codec::primitives::write_string(io, &file.name)?;
        crate::codec::primitives::write_u32(io, file.data.len() as u32)?;
        io.write_all(&file.data)?;
    }

    Ok(())
}
