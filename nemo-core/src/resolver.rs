//! The reference resolver: binds "reference" descriptors collected during
//! load to existing repository objects, trying strategies in a fixed
//! order and classifying the outcome for the finish-loading statistics.

use std::collections::HashMap;

use crate::guid::Guid;
use crate::object::RuntimeId;
use crate::repository::ObjectRepository;

#[derive(Debug, Clone)]
pub struct PendingReference {
    pub file_id: u32,
    pub class_id: u32,
    pub name: String,
    pub type_guid: Guid,
    pub flags: u32,
}

pub type CustomStrategy =
    Box<dyn Fn(&PendingReference, &dyn ObjectRepository) -> Option<RuntimeId> + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishLoadStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub ambiguous: usize,
}

#[derive(Debug, Clone)]
pub struct UnresolvedReference {
    pub file_id: u32,
    pub class_id: u32,
    pub name: String,
    pub type_guid: Guid,
}

#[derive(Default)]
pub struct ReferenceResolver {
    pending: Vec<PendingReference>,
    custom_strategies: HashMap<u32, CustomStrategy>,
}

impl ReferenceResolver {
    pub fn new() -> ReferenceResolver {
        ReferenceResolver::default()
    }

    pub fn register_custom_strategy(&mut self, class_id: u32, strategy: CustomStrategy) {
        self.custom_strategies.insert(class_id, strategy);
    }

    pub fn register(&mut self, reference: PendingReference) {
        self.pending.push(reference);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Tries, in order: a per-class custom strategy, an exact name+class
    /// match, a case-insensitive name+class match, a type_guid match
    /// within the class, and finally a type_guid match across all
    /// classes. Returns the matched runtime ID plus whether the match
    /// came from the fuzzy (case-insensitive) step, the sole source of
    /// "ambiguous" resolutions.
    fn resolve_one(
        &self,
        reference: &PendingReference,
        repository: &dyn ObjectRepository,
    ) -> (Option<RuntimeId>, bool) {
        if let Some(strategy) = self.custom_strategies.get(&reference.class_id) {
            if let Some(id) = strategy(reference, repository) {
                return (Some(id), false);
            }
        }

        let candidates = repository.by_class(reference.class_id);

        if let Some(obj) = candidates
            .iter()
            .find(|o| o.name.as_deref() == Some(reference.name.as_str()))
        {
            return (Some(obj.id), false);
        }

        let needle = reference.name.to_lowercase();
        if let Some(obj) = candidates
            .iter()
            .find(|o| o.name.as_deref().is_some_and(|n| n.to_lowercase() == needle))
        {
            return (Some(obj.id), true);
        }

        if !reference.type_guid.is_zero() {
            if let Some(obj) = candidates.iter().find(|o| o.type_guid == reference.type_guid) {
                return (Some(obj.id), false);
            }
            if let Some(obj) = repository.by_guid(reference.type_guid).into_iter().next() {
                return (Some(obj.id), false);
            }
        }

        (None, false)
    }

    /// Runs every registered reference through the strategy sequence.
    /// Returns aggregate statistics, the `(file_id, runtime_id)` pairs
    /// that resolved (for chunk ID remapping), and the references left
    /// unresolved for the caller to inspect.
    pub fn resolve_all(
        &self,
        repository: &dyn ObjectRepository,
    ) -> (FinishLoadStats, Vec<(u32, RuntimeId)>, Vec<UnresolvedReference>) {
        let mut stats = FinishLoadStats {
            total: self.pending.len(),
            ..Default::default()
        };
        let mut resolved_pairs = Vec::new();
        let mut unresolved = Vec::new();

        for reference in &self.pending {
            match self.resolve_one(reference, repository) {
                (Some(id), true) => {
                    stats.ambiguous += 1;
                    resolved_pairs.push((reference.file_id, id));
                }
                (Some(id), false) => {
                    stats.resolved += 1;
                    resolved_pairs.push((reference.file_id, id));
                }
                (None, _) => {
                    stats.unresolved += 1;
                    unresolved.push(UnresolvedReference {
                        file_id: reference.file_id,
                        class_id: reference.class_id,
                        name: reference.name.clone(),
                        type_guid: reference.type_guid,
                    });
                }
            }
        }

        (stats, resolved_pairs, unresolved)
    }
}
