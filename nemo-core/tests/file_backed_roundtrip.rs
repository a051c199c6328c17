//! Exercises the pipelines over a real file on disk (not just an
//! in-memory `Cursor`), since `IoPort` is implemented for `std::fs::File`
//! and the save pipeline specifically depends on `seek(0)` working on
//! whatever backs it.

use std::fs::File;

use nemo_core::pipeline::{load, save, LoadOptions, SaveOptions};
use nemo_core::{HashMapSchemaRegistry, InMemoryRepository, Object, ObjectRepository};

#[test]
fn saving_to_and_loading_from_a_real_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.nmo");

    let mut repo = InMemoryRepository::new();
    let mut obj = Object::new(0, 0x29);
    obj.name = Some("Camera1".into());
    obj.chunk.writer().write_dword(123);
    repo.add(obj);

    let registry = HashMapSchemaRegistry::new();
    {
        let mut file = File::create(&path).unwrap();
        save(&mut file, &repo, &[], &[], &registry, &SaveOptions::default()).unwrap();
    }

    let mut reload = InMemoryRepository::new();
    {
        let mut file = File::open(&path).unwrap();
        load(&mut file, &mut reload, &registry, &LoadOptions::default()).unwrap();
    }

    assert_eq!(reload.count(), 1);
    let loaded = reload.by_id(0).unwrap();
    assert_eq!(loaded.name.as_deref(), Some("Camera1"));
}
