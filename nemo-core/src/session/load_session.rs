//! The load session: allocates fresh runtime IDs above whatever the
//! repository already holds, and records the file-ID → runtime-ID mapping
//! used to remap chunk references once every object has been created.

use std::collections::HashMap;

use crate::error::{NemoError, Result};
use crate::object::RuntimeId;
use crate::repository::ObjectRepository;

pub struct LoadSession {
    next_runtime_id: RuntimeId,
    /// `max_id_saved` from the file header being loaded, kept only to
    /// size the entry table up front; carries no other meaning here.
    expected_max_id_saved: u32,
    entries: HashMap<u32, RuntimeId>,
}

impl LoadSession {
    pub fn start(repository: &dyn ObjectRepository, max_id_saved: u32) -> LoadSession {
        let base = repository.max_id().map(|m| m + 1).unwrap_or(0);
        LoadSession {
            next_runtime_id: base,
            expected_max_id_saved: max_id_saved,
            entries: HashMap::with_capacity(max_id_saved as usize + 1),
        }
    }

    pub fn base_runtime_id(&self) -> RuntimeId {
        self.next_runtime_id
    }

    pub fn expected_max_id_saved(&self) -> u32 {
        self.expected_max_id_saved
    }

    /// Allocates the next runtime ID in sequence, for an object about to
    /// be inserted into the repository.
    pub fn allocate_runtime_id(&mut self) -> RuntimeId {
        let id = self.next_runtime_id;
        self.next_runtime_id += 1;
        id
    }

    /// Registers the `(file_id, runtime_id)` pairing for a just-created
    /// object. Fails if `file_id` was already registered in this session.
    pub fn register(&mut self, file_id: u32, runtime_id: RuntimeId) -> Result<()> {
        if self.entries.insert(file_id, runtime_id).is_some() {
            return Err(NemoError::InvalidState(format!(
                "duplicate file_id {file_id} in load session"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the `file_id -> runtime_id` remap table used to rewrite
    /// every chunk's object-ID references.
    pub fn build_remap_table(&self) -> HashMap<u32, RuntimeId> {
        self.entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Object;
    use crate::repository::InMemoryRepository;

    #[test]
    fn allocation_starts_above_existing_repository_objects() {
        let mut repo = InMemoryRepository::new();
        repo.add(Object::new(5, 1));
        let mut session = LoadSession::start(&repo, 0);
        assert_eq!(session.base_runtime_id(), 6);
        assert_eq!(session.allocate_runtime_id(), 6);
        assert_eq!(session.allocate_runtime_id(), 7);
    }

    #[test]
    fn allocation_starts_at_zero_for_empty_repository() {
        let repo = InMemoryRepository::new();
        let session = LoadSession::start(&repo, 0);
        assert_eq!(session.base_runtime_id(), 0);
    }

    #[test]
    fn duplicate_file_id_registration_is_rejected() {
        let repo = InMemoryRepository::new();
        let mut session = LoadSession::start(&repo, 0);
        session.register(0, 100).unwrap();
        assert!(matches!(
            session.register(0, 101),
            Err(NemoError::InvalidState(_))
        ));
    }

    #[test]
    fn remap_table_reflects_registrations() {
        let repo = InMemoryRepository::new();
        let mut session = LoadSession::start(&repo, 0);
        session.register(0, 10).unwrap();
        session.register(1, 11).unwrap();
        let table = session.build_remap_table();
        assert_eq!(table.get(&0), Some(&10));
        assert_eq!(table.get(&1), Some(&11));
    }
}
