//! The schema registry: the collaborator that knows how to interpret a
//! class's chunk fields. Looked up by `class_id`; a class with no
//! registered schema still loads and saves correctly (its chunk is kept
//! and re-emitted as opaque data), it just skips the deserialize/
//! serialize/finish_load hooks a known class gets.

use std::collections::HashMap;

use crate::error::Result;
use crate::object::Object;
use crate::repository::ObjectRepository;

pub type DeserializeFn = Box<dyn Fn(&mut Object) -> Result<()> + Send + Sync>;
pub type SerializeFn = Box<dyn Fn(&mut Object) -> Result<()> + Send + Sync>;
pub type FinishLoadFn = Box<dyn Fn(&mut Object, &dyn ObjectRepository) -> Result<()> + Send + Sync>;

/// The three optional hooks a known class can register. Each is
/// independent: a class may, for instance, supply `finish_load` to fix up
/// cached references without supplying `deserialize`/`serialize` at all.
#[derive(Default)]
pub struct ClassSchema {
    pub deserialize: Option<DeserializeFn>,
    pub serialize: Option<SerializeFn>,
    pub finish_load: Option<FinishLoadFn>,
}

impl ClassSchema {
    pub fn new() -> ClassSchema {
        ClassSchema::default()
    }

    pub fn with_deserialize(mut self, f: impl Fn(&mut Object) -> Result<()> + Send + Sync + 'static) -> Self {
        self.deserialize = Some(Box::new(f));
        self
    }

    pub fn with_serialize(mut self, f: impl Fn(&mut Object) -> Result<()> + Send + Sync + 'static) -> Self {
        self.serialize = Some(Box::new(f));
        self
    }

    pub fn with_finish_load(
        mut self,
        f: impl Fn(&mut Object, &dyn ObjectRepository) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.finish_load = Some(Box::new(f));
        self
    }
}

pub trait SchemaRegistry {
    fn schema_for(&self, class_id: u32) -> Option<&ClassSchema>;
}

#[derive(Default)]
pub struct HashMapSchemaRegistry {
    schemas: HashMap<u32, ClassSchema>,
}

impl HashMapSchemaRegistry {
    pub fn new() -> HashMapSchemaRegistry {
        HashMapSchemaRegistry::default()
    }

    pub fn register(&mut self, class_id: u32, schema: ClassSchema) {
        self.schemas.insert(class_id, schema);
    }
}

impl SchemaRegistry for HashMapSchemaRegistry {
    fn schema_for(&self, class_id: u32) -> Option<&ClassSchema> {
        self.schemas.get(&class_id)
    }
}
