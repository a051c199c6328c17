//! The load pipeline: a strict-order sequence of phases turning file
//! bytes into a populated object repository. Each phase's failure mode is
//! documented inline where it differs from the obvious one.

use std::collections::HashSet;
use std::io::Read;

use tracing::{debug, warn};

use crate::chunk::remap_object_ids;
use crate::compression::inflate;
use crate::data::section::parse_data_section;
use crate::error::{NemoError, Result};
use crate::guid::Guid;
use crate::header::file_header::{parse_file_header, FileHeader};
use crate::header::header1::{parse_header1, Header1, REFERENCE_BIT};
use crate::io_port::IoPort;
use crate::object::{Object, ObjectFlags, RuntimeId};
use crate::repository::ObjectRepository;
use crate::resolver::{FinishLoadStats, PendingReference, ReferenceResolver, UnresolvedReference};
use crate::schema::SchemaRegistry;
use crate::finish_load::finish_load;
use crate::session::LoadSession;

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub strict: bool,
    pub resolve_references: bool,
    /// GUIDs of plugins the host considers available. Any plugin
    /// dependency not in this set is logged as missing; under `strict`
    /// that aborts the load instead.
    pub known_plugins: HashSet<Guid>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            strict: false,
            resolve_references: true,
            known_plugins: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IncludedFile {
    pub name: String,
    pub data: Vec<u8>,
}

pub struct LoadReport {
    pub header: FileHeader,
    pub stats: FinishLoadStats,
    pub unresolved: Vec<UnresolvedReference>,
    pub included_files: Vec<IncludedFile>,
    /// Manager blocks read from the Data section, IDs already remapped to
    /// runtime IDs. A caller that intends to save this session back out
    /// passes these straight to `pipeline::save`.
    pub managers: Vec<crate::data::section::ManagerBlock>,
}

fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    match r.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(NemoError::Eof(what.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn load<IO: IoPort>(
    io: &mut IO,
    repository: &mut dyn ObjectRepository,
    schema_registry: &dyn SchemaRegistry,
    options: &LoadOptions,
) -> Result<LoadReport> {
    // Phase 2: parse & validate FileHeader.
    let header = parse_file_header(io)?;
    debug!(file_version = header.file_version, "parsed file header");

    // Phase 3: read + inflate Header1.
    let mut hdr1_bytes = vec![0u8; header.hdr1_pack_size as usize];
    read_exact_or_eof(io, &mut hdr1_bytes, "header1 bytes")?;
    let hdr1_bytes = if header.hdr1_pack_size != header.hdr1_unpack_size() {
        inflate(&hdr1_bytes, header.hdr1_unpack_size() as usize)?
    } else {
        hdr1_bytes
    };
    if hdr1_bytes.len() != header.hdr1_unpack_size() as usize {
        return Err(NemoError::InvalidFormat(
            "header1 length does not match header1_unpack_size".into(),
        ));
    }

    // Phase 4: parse Header1. An empty buffer (the minimal-empty-file
    // scenario: `hdr1_pack_size=0` and no Part1 counts) carries none of
    // the three self-counted lists at all, not a buffer starting with
    // three zero counts — parsing it as such would read past the end
    // and fail with EOF, so it short-circuits to an empty Header1.
    let hdr1 = if hdr1_bytes.is_empty() {
        Header1::default()
    } else {
        parse_header1(&mut std::io::Cursor::new(hdr1_bytes))?
    };
    if hdr1.objects.is_empty() && header.object_count() > 0 {
        return Err(NemoError::InvalidFormat(
            "header1 has no object descriptors but the data section declares objects".into(),
        ));
    }

    // Phase 5: start load session.
    let mut session = LoadSession::start(repository, header.max_id_saved());

    // Phase 6: plugin dependency check.
    for dep in &hdr1.plugin_deps {
        if !options.known_plugins.contains(&dep.guid) {
            warn!(category = dep.category, "missing plugin dependency");
            if options.strict {
                return Err(NemoError::MissingPlugin {
                    category: dep.category,
                    guid: dep.guid,
                });
            }
        }
    }

    // Phase 7: pre-load manager hooks. No manager-hook registry is part
    // of this crate's external contracts (only the per-class schema
    // registry is), so there is nothing to invoke here.
    debug!("no manager hooks registered, skipping pre-load hooks");

    // Phase 8: read + inflate the data section.
    let mut data_bytes = vec![0u8; header.data_pack_size() as usize];
    read_exact_or_eof(io, &mut data_bytes, "data section bytes")?;
    let data_bytes = if header.data_pack_size() != header.data_unpack_size() {
        inflate(&data_bytes, header.data_unpack_size() as usize)?
    } else {
        data_bytes
    };
    if data_bytes.len() != header.data_unpack_size() as usize {
        return Err(NemoError::InvalidFormat(
            "data section length does not match data_unpack_size".into(),
        ));
    }

    // Phase 9: parse manager + object blocks.
    let mut data_section = parse_data_section(
        &mut std::io::Cursor::new(data_bytes),
        header.manager_count(),
        header.object_count(),
        header.file_version,
    )?;

    // Phase 10 + 11: create runtime objects for non-reference
    // descriptors, attach their chunks, and register references for
    // later resolution.
    let mut object_blocks = data_section.objects.into_iter();
    let mut resolver = ReferenceResolver::new();
    let mut runtime_ids: Vec<Option<RuntimeId>> = Vec::with_capacity(hdr1.objects.len());

    for descriptor in &hdr1.objects {
        if descriptor.is_reference() {
            resolver.register(PendingReference {
                file_id: descriptor.file_id & !REFERENCE_BIT,
                class_id: descriptor.class_id,
                name: descriptor.name.clone(),
                type_guid: Guid::ZERO,
                flags: descriptor.flags,
            });
            runtime_ids.push(None);
            continue;
        }

        let block = object_blocks.next().ok_or_else(|| {
            NemoError::InvalidFormat("fewer object blocks than non-reference descriptors".into())
        })?;

        let runtime_id = session.allocate_runtime_id();
        let mut object = Object::new(runtime_id, descriptor.class_id);
        object.name = if descriptor.name.is_empty() {
            None
        } else {
            Some(descriptor.name.clone())
        };
        object.flags = ObjectFlags(descriptor.flags);
        object.file_index = descriptor.file_index;
        object.chunk = block.chunk;
        object.chunk.class_id = descriptor.class_id;

        session.register(descriptor.file_id & !REFERENCE_BIT, runtime_id)?;
        repository.add(object);
        runtime_ids.push(Some(runtime_id));
    }

    // Phase 12 + 13: build the remap table and rewrite every manager and
    // object chunk's ID references.
    let remap_table = session.build_remap_table();
    for manager in data_section.managers.iter_mut() {
        remap_object_ids(&mut manager.chunk, |id| remap_table.get(&id).copied());
    }
    for runtime_id in runtime_ids.iter().flatten() {
        if let Some(object) = repository.by_id_mut(*runtime_id) {
            remap_object_ids(&mut object.chunk, |id| remap_table.get(&id).copied());
        }
    }

    // Phase 14: deserialize objects whose class has a schema.
    for runtime_id in runtime_ids.iter().flatten() {
        let class_id = match repository.by_id(*runtime_id) {
            Some(object) => object.class_id,
            None => continue,
        };
        let Some(schema) = schema_registry.schema_for(class_id) else {
            continue;
        };
        let Some(deserialize) = &schema.deserialize else {
            continue;
        };
        if let Some(object) = repository.by_id_mut(*runtime_id) {
            deserialize(object).map_err(|e| {
                NemoError::validation_with_source(class_id, "chunk deserialize failed", e)
            })?;
        }
    }

    // Phase 15: post-load manager hooks (same gap as phase 7).
    debug!("no manager hooks registered, skipping post-load hooks");

    // Phase 16: read included files. Each is framed on disk as
    // `{u32 name_len, name_len bytes, u32 size, size bytes}` (spec §3
    // item 5) independently of Header1's own descriptor fields, so the
    // name and size travel with the appended bytes, not with `desc`.
    let mut included_files = Vec::with_capacity(hdr1.included_files.len());
    for _ in &hdr1.included_files {
        let mut name_len_buf = [0u8; 4];
        read_exact_or_eof(io, &mut name_len_buf, "included file name length")?;
        let name_len = u32::from_le_bytes(name_len_buf) as usize;
        let mut name_buf = vec![0u8; name_len];
        read_exact_or_eof(io, &mut name_buf, "included file name")?;
        let name = String::from_utf8(name_buf).map_err(|e| {
            NemoError::InvalidFormat(format!("non-utf8 included file name: {e}"))
        })?;

        let mut size_buf = [0u8; 4];
        read_exact_or_eof(io, &mut size_buf, "included file size")?;
        let size = u32::from_le_bytes(size_buf) as usize;
        let mut data = vec![0u8; size];
        read_exact_or_eof(io, &mut data, "included file data")?;

        included_files.push(IncludedFile { name, data });
    }

    // Phase 17: finish-loading.
    let (stats, unresolved) = if options.resolve_references {
        let outcome = finish_load(
            repository,
            schema_registry,
            resolver,
            data_section.managers.iter_mut().map(|m| &mut m.chunk),
        )?;
        (outcome.stats, outcome.unresolved)
    } else {
        (
            FinishLoadStats {
                total: resolver.pending_count(),
                ..Default::default()
            },
            Vec::new(),
        )
    };

    Ok(LoadReport {
        header,
        stats,
        unresolved,
        included_files,
        managers: data_section.managers,
    })
}
