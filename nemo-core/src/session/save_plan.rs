//! The save plan: assigns a dense, 0-based file-ID to every object in
//! save order, and records the `runtime_id -> file_id` mapping used to
//! rewrite chunk references before serialization.

use std::collections::HashMap;

use crate::error::{NemoError, Result};
use crate::object::{Object, RuntimeId};

pub struct SavePlan {
    file_ids: HashMap<RuntimeId, u32>,
}

impl SavePlan {
    pub fn build<'a>(objects: impl Iterator<Item = &'a Object>) -> Result<SavePlan> {
        let mut file_ids = HashMap::new();
        let mut next_file_id = 0u32;
        for object in objects {
            if file_ids.insert(object.id, next_file_id).is_some() {
                return Err(NemoError::InvalidState(format!(
                    "duplicate runtime_id {} in save plan",
                    object.id
                )));
            }
            next_file_id += 1;
        }
        Ok(SavePlan { file_ids })
    }

    pub fn file_id_for(&self, runtime_id: RuntimeId) -> Option<u32> {
        self.file_ids.get(&runtime_id).copied()
    }

    pub fn object_count(&self) -> usize {
        self.file_ids.len()
    }

    pub fn max_file_id(&self) -> Option<u32> {
        self.file_ids.values().copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ids_are_dense_and_zero_based() {
        let objects = vec![Object::new(100, 1), Object::new(200, 1), Object::new(300, 1)];
        let plan = SavePlan::build(objects.iter()).unwrap();
        assert_eq!(plan.file_id_for(100), Some(0));
        assert_eq!(plan.file_id_for(200), Some(1));
        assert_eq!(plan.file_id_for(300), Some(2));
        assert_eq!(plan.max_file_id(), Some(2));
    }

    #[test]
    fn duplicate_runtime_id_is_rejected() {
        let objects = vec![Object::new(1, 1), Object::new(1, 1)];
        assert!(matches!(
            SavePlan::build(objects.iter()),
            Err(NemoError::InvalidState(_))
        ));
    }
}
