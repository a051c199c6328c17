//! The finish-loading coordinator: runs reference resolution over the
//! pending reference descriptors gathered during load, rewrites resolved
//! references into every chunk's ID table, and invokes each class's
//! `finish_load` hook.

use std::collections::HashMap;

use crate::chunk::{remap_object_ids, Chunk};
use crate::error::Result;
use crate::object::RuntimeId;
use crate::repository::ObjectRepository;
use crate::resolver::{FinishLoadStats, ReferenceResolver, UnresolvedReference};
use crate::schema::SchemaRegistry;

pub struct FinishLoadOutcome {
    pub stats: FinishLoadStats,
    pub unresolved: Vec<UnresolvedReference>,
}

pub fn finish_load(
    repository: &mut dyn ObjectRepository,
    schema_registry: &dyn SchemaRegistry,
    resolver: ReferenceResolver,
    manager_chunks: impl IntoIterator<Item = &mut Chunk>,
) -> Result<FinishLoadOutcome> {
    let (stats, resolved_pairs, unresolved) = resolver.resolve_all(repository);
    let remap: HashMap<u32, RuntimeId> = resolved_pairs.into_iter().collect();

    for chunk in manager_chunks {
        remap_object_ids(chunk, |id| remap.get(&id).copied());
    }

    let ids: Vec<RuntimeId> = repository.iter().map(|o| o.id).collect();
    for id in &ids {
        if let Some(object) = repository.by_id_mut(*id) {
            remap_object_ids(&mut object.chunk, |file_id| remap.get(&file_id).copied());
        }
    }

    for id in ids {
        let class_id = match repository.by_id(id) {
            Some(object) => object.class_id,
            None => continue,
        };
        let Some(schema) = schema_registry.schema_for(class_id) else {
            continue;
        };
        let Some(hook) = &schema.finish_load else {
            continue;
        };

        let mut snapshot = match repository.by_id(id) {
            Some(object) => object.clone(),
            None => continue,
        };
        hook(&mut snapshot, repository)?;
        if let Some(slot) = repository.by_id_mut(id) {
            *slot = snapshot;
        }
    }

    Ok(FinishLoadOutcome { stats, unresolved })
}
