//! Identity-keyed entity collection backing one store of a graph view

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::diff::{self, DiffResult};
use crate::error::{EngineError, Origin, Result};
use crate::model::{Entity, EntityId, Snapshot};

/// A mutable set of entities, unique by `id`, iterated in insertion order.
///
/// All mutators validate the whole batch first and only then touch the
/// map, so a failing call leaves the collection unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCollection {
    entries: IndexMap<EntityId, Entity>,
}

impl EntityCollection {
    pub fn new() -> Self {
        EntityCollection {
            entries: IndexMap::new(),
        }
    }

    /// Seed a collection from an initial snapshot.
    pub fn from_snapshot(snapshot: &[Entity]) -> Result<Self> {
        let mut collection = EntityCollection::new();
        collection.add(snapshot)?;
        Ok(collection)
    }

    /// Insert entities whose identity is not yet present.
    ///
    /// Never overwrites: a colliding id (with the collection or within the
    /// batch) fails the whole call.
    pub fn add(&mut self, entities: &[Entity]) -> Result<()> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in entities {
            if self.entries.contains_key(&entity.id) {
                return Err(EngineError::DuplicateIdentity {
                    id: entity.id.clone(),
                    origin: Origin::Collection,
                });
            }
            if !seen.insert(&entity.id) {
                return Err(EngineError::DuplicateIdentity {
                    id: entity.id.clone(),
                    origin: Origin::Batch,
                });
            }
        }
        self.insert_unchecked(entities);
        Ok(())
    }

    /// Remove entities matching by identity. Absent ids are ignored.
    pub fn remove(&mut self, entities: &[Entity]) {
        self.remove_ids(entities.iter().map(|e| &e.id));
    }

    /// Remove by id. Absent ids are ignored.
    pub fn remove_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a EntityId>) {
        for id in ids {
            self.entries.shift_remove(id);
        }
    }

    /// Replace the attribute set of existing entities.
    ///
    /// A repeated id within one batch applies last-wins.
    pub fn update(&mut self, entities: &[Entity]) -> Result<()> {
        if let Some(missing) = entities.iter().find(|e| !self.entries.contains_key(&e.id)) {
            return Err(EngineError::UnknownIdentity {
                id: missing.id.clone(),
            });
        }
        self.replace_unchecked(entities);
        Ok(())
    }

    /// Current contents as a fresh sequence.
    pub fn get(&self) -> Snapshot {
        self.entries.values().cloned().collect()
    }

    pub fn by_id(&self, id: &EntityId) -> Option<&Entity> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entries.values()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Diff the live contents against a target snapshot without copying.
    ///
    /// A snapshot identical to the live contents, in the same order,
    /// short-circuits to an empty result.
    pub fn diff_against(&self, new: &[Entity]) -> Result<DiffResult> {
        if self.len() == new.len() && self.iter().zip(new).all(|(live, target)| live == target) {
            return Ok(DiffResult::default());
        }
        diff::partition(self.iter(), |id| self.by_id(id), new)
    }

    pub(crate) fn insert_unchecked(&mut self, entities: &[Entity]) {
        for entity in entities {
            self.entries.insert(entity.id.clone(), entity.clone());
        }
    }

    pub(crate) fn replace_unchecked(&mut self, entities: &[Entity]) {
        for entity in entities {
            if let Some(slot) = self.entries.get_mut(&entity.id) {
                *slot = entity.clone();
            }
        }
    }
}

impl<'a> IntoIterator for &'a EntityCollection {
    type Item = &'a Entity;
    type IntoIter = indexmap::map::Values<'a, EntityId, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}
