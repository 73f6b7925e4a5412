//! Snapshot diff computation for incremental updates

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::collection::EntityCollection;
use crate::error::{EngineError, Origin, Result};
use crate::model::{Entity, EntityId, GraphSnapshot, Snapshot};

/// Identity-keyed partition of the changes between an old and a new
/// snapshot.
///
/// `removed` carries old content, `added` and `changed` carry new content.
/// Entities with the same id and equal content appear in none of the three.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub removed: Snapshot,
    pub added: Snapshot,
    pub changed: Snapshot,
}

impl DiffResult {
    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.changed.is_empty()
    }

    /// Total number of entities touched.
    pub fn len(&self) -> usize {
        self.removed.len() + self.added.len() + self.changed.len()
    }

    pub fn removed_ids(&self) -> Vec<EntityId> {
        self.removed.iter().map(|e| e.id.clone()).collect()
    }

    pub fn added_ids(&self) -> Vec<EntityId> {
        self.added.iter().map(|e| e.id.clone()).collect()
    }

    pub fn changed_ids(&self) -> Vec<EntityId> {
        self.changed.iter().map(|e| e.id.clone()).collect()
    }
}

/// Compare two snapshots by identity.
///
/// Fails with `DuplicateIdentity` if either side repeats an id.
pub fn diff(old: &[Entity], new: &[Entity]) -> Result<DiffResult> {
    let old_by_id = index_by_id(old)?;

    // `old` is known to be duplicate-free here, so a content-equal `new` is too.
    if std::ptr::eq(old, new) || old == new {
        return Ok(DiffResult::default());
    }

    partition(old.iter(), |id| old_by_id.get(id).copied(), new)
}

/// Core of the differ, shared with `EntityCollection::diff_against` so a
/// live collection can be diffed through its own index.
pub(crate) fn partition<'o, I, F>(old: I, lookup: F, new: &[Entity]) -> Result<DiffResult>
where
    I: Iterator<Item = &'o Entity>,
    F: Fn(&EntityId) -> Option<&'o Entity>,
{
    let new_ids = index_ids(new)?;

    let removed = old
        .filter(|entity| !new_ids.contains(&entity.id))
        .cloned()
        .collect();

    let mut added = Vec::new();
    let mut changed = Vec::new();
    for entity in new {
        match lookup(&entity.id) {
            None => added.push(entity.clone()),
            Some(previous) if !previous.same_content(entity) => changed.push(entity.clone()),
            Some(_) => {}
        }
    }

    Ok(DiffResult {
        removed,
        added,
        changed,
    })
}

fn index_by_id(snapshot: &[Entity]) -> Result<HashMap<&EntityId, &Entity>> {
    let mut by_id = HashMap::with_capacity(snapshot.len());
    for entity in snapshot {
        if by_id.insert(&entity.id, entity).is_some() {
            return Err(EngineError::DuplicateIdentity {
                id: entity.id.clone(),
                origin: Origin::Old,
            });
        }
    }
    Ok(by_id)
}

fn index_ids(snapshot: &[Entity]) -> Result<HashSet<&EntityId>> {
    let mut ids = HashSet::with_capacity(snapshot.len());
    for entity in snapshot {
        if !ids.insert(&entity.id) {
            return Err(EngineError::DuplicateIdentity {
                id: entity.id.clone(),
                origin: Origin::New,
            });
        }
    }
    Ok(ids)
}

/// Represents one reconciliation cycle's worth of changes for both stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDiff {
    /// Monotonically increasing diff sequence number.
    pub sequence: u64,
    pub nodes: DiffResult,
    pub edges: DiffResult,
}

impl GraphDiff {
    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Diff state for incremental updates.
#[derive(Debug)]
pub struct DiffEngine {
    sequence: u64,
}

impl DiffEngine {
    pub fn new() -> Self {
        DiffEngine { sequence: 0 }
    }

    /// Compute the difference between the live collections and a target
    /// snapshot. Returns a GraphDiff with the sequence number incremented.
    pub fn compute(
        &mut self,
        nodes: &EntityCollection,
        edges: &EntityCollection,
        target: &GraphSnapshot,
    ) -> Result<GraphDiff> {
        let nodes = nodes.diff_against(&target.nodes)?;
        let edges = edges.diff_against(&target.edges)?;
        Ok(self.stamp(nodes, edges))
    }

    /// Compute the difference between two detached snapshots.
    pub fn compute_snapshots(&mut self, old: &GraphSnapshot, new: &GraphSnapshot) -> Result<GraphDiff> {
        let nodes = diff(&old.nodes, &new.nodes)?;
        let edges = diff(&old.edges, &new.edges)?;
        Ok(self.stamp(nodes, edges))
    }

    fn stamp(&mut self, nodes: DiffResult, edges: DiffResult) -> GraphDiff {
        self.sequence += 1;
        GraphDiff {
            sequence: self.sequence,
            nodes,
            edges,
        }
    }

    /// Get current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}
