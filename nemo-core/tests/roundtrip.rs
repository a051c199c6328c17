//! Whole-file load/save round trips over in-memory buffers, covering the
//! literal end-to-end scenarios and testable properties.

use std::io::Cursor;

use nemo_core::data::section::ManagerBlock;
use nemo_core::error::NemoError;
use nemo_core::header::file_header::{parse_file_header, serialize_file_header, FileHeader, Part1};
use nemo_core::header::header1::{serialize_header1, Header1, ObjectDescriptor};
use nemo_core::pipeline::{load, save, LoadOptions, SaveOptions};
use nemo_core::{Guid, HashMapSchemaRegistry, InMemoryRepository, Object, ObjectRepository};

fn minimal_part0(file_version: u32) -> FileHeader {
    FileHeader {
        crc: 0,
        ck_version: 0,
        file_version,
        file_version2: 0,
        file_write_mode: 0,
        hdr1_pack_size: 0,
        part1: if file_version >= 5 {
            Some(Part1::default())
        } else {
            None
        },
    }
}

// Scenario 1: minimal empty file.
#[test]
fn minimal_empty_file_loads_and_saves_byte_identically() {
    let header = minimal_part0(8);
    let mut bytes = Vec::new();
    serialize_file_header(&mut bytes, &header).unwrap();

    let mut repo = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let mut cursor = Cursor::new(bytes.clone());
    let report = load(&mut cursor, &mut repo, &registry, &LoadOptions::default()).unwrap();

    assert_eq!(repo.count(), 0);
    assert_eq!(report.header.object_count(), 0);

    let mut out = Cursor::new(Vec::new());
    save(&mut out, &repo, &[], &[], &registry, &SaveOptions::default()).unwrap();
    let saved = out.into_inner();

    // Re-parse and compare everything except the recomputed CRC.
    let mut saved_cursor = Cursor::new(saved);
    let saved_header = parse_file_header(&mut saved_cursor).unwrap();
    assert_eq!(saved_header.file_version, 8);
    assert_eq!(saved_header.object_count(), 0);
    assert_eq!(saved_header.manager_count(), 0);
}

// Scenario 2: single unnamed object.
#[test]
fn single_unnamed_object_round_trips() {
    let mut repo = InMemoryRepository::new();
    let mut obj = Object::new(0, 0x29);
    obj.name = None;
    repo.add(obj);

    let registry = HashMapSchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    save(&mut buf, &repo, &[], &[], &registry, &SaveOptions::default()).unwrap();

    let mut reload = InMemoryRepository::new();
    let base = reload.max_id();
    assert_eq!(base, None);
    buf.set_position(0);
    load(&mut buf, &mut reload, &registry, &LoadOptions::default()).unwrap();

    assert_eq!(reload.count(), 1);
    let loaded = reload.by_index(0).unwrap();
    assert_eq!(loaded.id, 0);
    assert_eq!(loaded.name, None);
}

// Scenario 3: reference round-trip against a preexisting object.
#[test]
fn reference_resolves_against_preexisting_object_on_reload() {
    let mut repo = InMemoryRepository::new();
    let mut target = Object::new(0, 0x29);
    target.name = Some("Camera1".into());
    repo.add(target);

    let mut reference = Object::new(1, 0x29);
    reference.name = Some("Camera1".into());
    reference.save_as_reference = true;
    repo.add(reference);

    let registry = HashMapSchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    save(&mut buf, &repo, &[], &[], &registry, &SaveOptions::default()).unwrap();

    let mut reload = InMemoryRepository::new();
    let mut preexisting = Object::new(0, 0x29);
    preexisting.name = Some("Camera1".into());
    reload.add(preexisting);

    buf.set_position(0);
    let report = load(&mut buf, &mut reload, &registry, &LoadOptions::default()).unwrap();

    assert_eq!(report.stats.resolved, 1);
    assert_eq!(report.stats.unresolved, 0);
    // Only the preexisting object is present; the reference contributed no
    // new ObjectBlock to the data section.
    assert_eq!(reload.count(), 1);
}

// Scenario 4: compressed sections shrink and still round-trip bit-exact
// chunk payloads.
#[test]
fn compressed_sections_round_trip() {
    let mut repo = InMemoryRepository::new();
    for i in 0..30u32 {
        let mut obj = Object::new(i, 0x29);
        obj.name = Some(format!("Object{i}"));
        obj.chunk.writer().write_string(&"filler payload data ".repeat(20));
        repo.add(obj);
    }

    let registry = HashMapSchemaRegistry::new();
    let options = SaveOptions {
        compress: true,
        ..SaveOptions::default()
    };
    let mut buf = Cursor::new(Vec::new());
    save(&mut buf, &repo, &[], &[], &registry, &options).unwrap();
    let saved_len = buf.get_ref().len();

    let mut uncompressed = Cursor::new(Vec::new());
    save(&mut uncompressed, &repo, &[], &[], &registry, &SaveOptions::default()).unwrap();
    assert!(saved_len < uncompressed.get_ref().len());

    let mut reload = InMemoryRepository::new();
    buf.set_position(0);
    let report = load(&mut buf, &mut reload, &registry, &LoadOptions::default()).unwrap();
    assert!(report.header.compresses_header1());
    assert!(report.header.compresses_data());
    assert_eq!(reload.count(), 30);
    for i in 0..30u32 {
        let obj = reload.by_id(i).unwrap();
        let mut r = obj.chunk.reader();
        assert_eq!(r.read_string().unwrap(), "filler payload data ".repeat(20));
    }
}

// Scenario 5: truncated data section aborts at phase 8 with EOF.
#[test]
fn truncated_data_section_is_eof() {
    let header1 = Header1 {
        objects: vec![ObjectDescriptor {
            file_id: 0,
            class_id: 1,
            name: String::new(),
            file_index: 0,
            flags: 0,
        }],
        plugin_deps: vec![],
        included_files: vec![],
    };
    let mut hdr1_bytes = Vec::new();
    serialize_header1(&mut hdr1_bytes, &header1).unwrap();

    let mut object_bytes = Vec::new();
    nemo_core::codec::primitives::write_u32(&mut object_bytes, 0).unwrap(); // chunk_size=0

    let header = FileHeader {
        crc: 0,
        ck_version: 0,
        file_version: 8,
        file_version2: 0,
        file_write_mode: 0,
        hdr1_pack_size: hdr1_bytes.len() as u32,
        part1: Some(Part1 {
            data_pack_size: object_bytes.len() as u32,
            data_unpack_size: object_bytes.len() as u32,
            manager_count: 0,
            object_count: 1,
            max_id_saved: 0,
            product_version: 0,
            product_build: 0,
            hdr1_unpack_size: hdr1_bytes.len() as u32,
        }),
    };

    let mut bytes = Vec::new();
    serialize_file_header(&mut bytes, &header).unwrap();
    bytes.extend_from_slice(&hdr1_bytes);
    bytes.extend_from_slice(&object_bytes);
    bytes.truncate(bytes.len() - 2);

    let mut repo = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let mut cursor = Cursor::new(bytes);
    let err = load(&mut cursor, &mut repo, &registry, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, NemoError::Eof(_)));
    assert_eq!(repo.count(), 0);
}

// Scenario 6: bad signature aborts at phase 2.
#[test]
fn bad_signature_is_invalid_signature() {
    let mut bytes = vec![0u8; 32];
    bytes[..8].copy_from_slice(b"NotNemo\0");
    let mut cursor = Cursor::new(bytes);
    let mut repo = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let err = load(&mut cursor, &mut repo, &registry, &LoadOptions::default()).unwrap_err();
    assert!(matches!(err, NemoError::InvalidSignature));
}

// P8: version gating — v4 has no Part1, v8 requires and consumes it.
#[test]
fn version_gating_controls_part1_presence() {
    let v4 = minimal_part0(4);
    let mut buf = Vec::new();
    serialize_file_header(&mut buf, &v4).unwrap();
    assert_eq!(buf.len(), 32);

    let v8 = minimal_part0(8);
    let mut buf2 = Vec::new();
    serialize_file_header(&mut buf2, &v8).unwrap();
    assert_eq!(buf2.len(), 64);
}

// P3: dense, zero-based file IDs after save, with reference descriptors
// carrying ids above the dense prefix.
#[test]
fn saved_file_ids_are_dense_with_references_above_object_count() {
    let mut repo = InMemoryRepository::new();
    for i in 0..3u32 {
        let mut obj = Object::new(i, 0x29);
        obj.name = Some(format!("Obj{i}"));
        repo.add(obj);
    }
    let mut reference = Object::new(3, 0x29);
    reference.name = Some("Obj0".into());
    reference.save_as_reference = true;
    repo.add(reference);

    let registry = HashMapSchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    save(&mut buf, &repo, &[], &[], &registry, &SaveOptions::default()).unwrap();

    buf.set_position(0);
    let header = parse_file_header(&mut buf).unwrap();
    assert_eq!(header.object_count(), 3);
    assert_eq!(header.max_id_saved(), 3);
}

// Manager blocks survive a load -> save round trip via LoadReport::managers.
#[test]
fn manager_blocks_survive_load_then_save() {
    let mut manager_chunk = nemo_core::chunk::Chunk::new(0);
    manager_chunk.writer().write_dword(0xCAFE);
    let managers = vec![ManagerBlock {
        guid: Guid(1, 2),
        chunk: manager_chunk,
    }];

    let repo = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let mut buf = Cursor::new(Vec::new());
    save(&mut buf, &repo, &managers, &[], &registry, &SaveOptions::default()).unwrap();

    let mut reload = InMemoryRepository::new();
    buf.set_position(0);
    let report = load(&mut buf, &mut reload, &registry, &LoadOptions::default()).unwrap();
    assert_eq!(report.managers.len(), 1);
    assert_eq!(report.managers[0].guid, Guid(1, 2));
    let mut r = report.managers[0].chunk.reader();
    assert_eq!(r.read_dword().unwrap(), 0xCAFE);

    let mut out2 = Cursor::new(Vec::new());
    save(&mut out2, &reload, &report.managers, &[], &registry, &SaveOptions::default()).unwrap();
    out2.set_position(0);
    let mut reload2 = InMemoryRepository::new();
    let report2 = load(&mut out2, &mut reload2, &registry, &LoadOptions::default()).unwrap();
    assert_eq!(report2.managers[0].guid, Guid(1, 2));
}

// Included files travel outside the checksum, after the data section.
#[test]
fn included_files_round_trip_outside_checksum() {
    let repo = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let included = vec![nemo_core::IncludedFile {
        name: "texture.bmp".into(),
        data: vec![1, 2, 3, 4, 5],
    }];
    let mut buf = Cursor::new(Vec::new());
    save(&mut buf, &repo, &[], &included, &registry, &SaveOptions::default()).unwrap();

    let mut reload = InMemoryRepository::new();
    buf.set_position(0);
    let report = load(&mut buf, &mut reload, &registry, &LoadOptions::default()).unwrap();
    assert_eq!(report.included_files.len(), 1);
    assert_eq!(report.included_files[0].name, "texture.bmp");
    assert_eq!(report.included_files[0].data, vec![1, 2, 3, 4, 5]);
}
