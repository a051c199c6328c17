//! The object repository: the collaborator that owns runtime objects
//! across a load/save session. Kept behind a trait so the pipelines don't
//! hard-code storage, mirroring how the rest of this crate treats
//! collaborators it doesn't own as narrow contracts.

use std::collections::HashMap;

use crate::guid::Guid;
use crate::object::{Object, RuntimeId};

pub trait ObjectRepository {
    fn add(&mut self, object: Object) -> RuntimeId;
    fn count(&self) -> usize;
    fn by_index(&self, index: usize) -> Option<&Object>;
    fn by_id(&self, id: RuntimeId) -> Option<&Object>;
    fn by_id_mut(&mut self, id: RuntimeId) -> Option<&mut Object>;
    fn by_class(&self, class_id: u32) -> Vec<&Object>;
    fn by_name(&self, name: &str) -> Vec<&Object>;
    fn by_guid(&self, guid: Guid) -> Vec<&Object>;
    fn iter(&self) -> std::slice::Iter<'_, Object>;
    /// The highest runtime ID currently assigned, or `None` if empty. A
    /// load session uses this as the base for freshly allocated IDs so
    /// they never collide with objects already in the repository.
    fn max_id(&self) -> Option<RuntimeId>;
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    objects: Vec<Object>,
    by_id: HashMap<RuntimeId, usize>,
}

impl InMemoryRepository {
    pub fn new() -> InMemoryRepository {
        InMemoryRepository::default()
    }
}

impl ObjectRepository for InMemoryRepository {
    fn add(&mut self, object: Object) -> RuntimeId {
        let id = object.id;
        let index = self.objects.len();
        self.objects.push(object);
        self.by_id.insert(id, index);
        id
    }

    fn count(&self) -> usize {
        self.objects.len()
    }

    fn by_index(&self, index: usize) -> Option<&Object> {
        self.objects.get(index)
    }

    fn by_id(&self, id: RuntimeId) -> Option<&Object> {
        self.by_id.get(&id).and_then(|&idx| self.objects.get(idx))
    }

    fn by_id_mut(&mut self, id: RuntimeId) -> Option<&mut Object> {
        let idx = *self.by_id.get(&id)?;
        self.objects.get_mut(idx)
    }

    fn by_class(&self, class_id: u32) -> Vec<&Object> {
        self.objects.iter().filter(|o| o.class_id == class_id).collect()
    }

    fn by_name(&self, name: &str) -> Vec<&Object> {
        self.objects
            .iter()
            .filter(|o| o.name.as_deref() == Some(name))
            .collect()
    }

    fn by_guid(&self, guid: Guid) -> Vec<&Object> {
        self.objects.iter().filter(|o| o.type_guid == guid).collect()
    }

    fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.objects.iter()
    }

    fn max_id(&self) -> Option<RuntimeId> {
        self.objects.iter().map(|o| o.id).max()
    }
}
