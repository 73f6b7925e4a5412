//! Applying diffs to live collections and their rendering surface

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::collection::EntityCollection;
use crate::diff::{DiffResult, GraphDiff};
use crate::error::{EngineError, Origin, Result};
use crate::model::{EntityId, Store};
use crate::surface::RenderSurface;

/// Ids touched in one collection by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionChange {
    pub removed_ids: Vec<EntityId>,
    pub added_ids: Vec<EntityId>,
    pub changed_ids: Vec<EntityId>,
}

impl CollectionChange {
    pub fn is_touched(&self) -> bool {
        !(self.removed_ids.is_empty() && self.added_ids.is_empty() && self.changed_ids.is_empty())
    }
}

/// Outcome of a reconciliation cycle over both stores.
///
/// Callers use the `*_touched` flags to decide whether observers need to
/// hear about this cycle at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub sequence: u64,
    pub nodes: CollectionChange,
    pub edges: CollectionChange,
    pub nodes_touched: bool,
    pub edges_touched: bool,
}

impl AppliedChange {
    pub fn is_empty(&self) -> bool {
        !(self.nodes_touched || self.edges_touched)
    }
}

/// Check that `diff` can be applied to `collection` in remove, add, update
/// order without breaking identity uniqueness.
pub fn validate(collection: &EntityCollection, diff: &DiffResult) -> Result<()> {
    let removed: HashSet<&EntityId> = diff.removed.iter().map(|e| &e.id).collect();
    let live_after_remove = |id: &EntityId| collection.contains(id) && !removed.contains(id);

    let mut added = HashSet::with_capacity(diff.added.len());
    for entity in &diff.added {
        if live_after_remove(&entity.id) {
            return Err(EngineError::DuplicateIdentity {
                id: entity.id.clone(),
                origin: Origin::Collection,
            });
        }
        if !added.insert(&entity.id) {
            return Err(EngineError::DuplicateIdentity {
                id: entity.id.clone(),
                origin: Origin::Batch,
            });
        }
    }

    for entity in &diff.changed {
        if !live_after_remove(&entity.id) && !added.contains(&entity.id) {
            return Err(EngineError::UnknownIdentity {
                id: entity.id.clone(),
            });
        }
    }

    Ok(())
}

/// Apply a diff to a single collection: remove, then add, then update.
///
/// The diff is validated up front; on error the collection is untouched.
pub fn reconcile(collection: &mut EntityCollection, diff: &DiffResult) -> Result<CollectionChange> {
    validate(collection, diff)?;
    Ok(apply(collection, diff, |_, _| {}))
}

/// Apply a graph diff to both collections and mirror every step onto the
/// surface.
///
/// Both diffs are validated before either collection is mutated, so a
/// failure leaves nodes, edges, and surface as they were.
pub fn reconcile_graph<S>(
    nodes: &mut EntityCollection,
    edges: &mut EntityCollection,
    diff: &GraphDiff,
    surface: &mut S,
) -> Result<AppliedChange>
where
    S: RenderSurface + ?Sized,
{
    validate(nodes, &diff.nodes)?;
    validate(edges, &diff.edges)?;

    let nodes_change = apply(nodes, &diff.nodes, |step, part| {
        mirror(surface, Store::Nodes, step, part)
    });
    let edges_change = apply(edges, &diff.edges, |step, part| {
        mirror(surface, Store::Edges, step, part)
    });

    let applied = AppliedChange {
        sequence: diff.sequence,
        nodes_touched: nodes_change.is_touched(),
        edges_touched: edges_change.is_touched(),
        nodes: nodes_change,
        edges: edges_change,
    };

    debug!(
        sequence = applied.sequence,
        nodes_removed = applied.nodes.removed_ids.len(),
        nodes_added = applied.nodes.added_ids.len(),
        nodes_changed = applied.nodes.changed_ids.len(),
        edges_removed = applied.edges.removed_ids.len(),
        edges_added = applied.edges.added_ids.len(),
        edges_changed = applied.edges.changed_ids.len(),
        "Reconciled graph diff"
    );

    Ok(applied)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Remove,
    Add,
    Update,
}

fn apply(
    collection: &mut EntityCollection,
    diff: &DiffResult,
    mut after: impl FnMut(Step, &DiffResult),
) -> CollectionChange {
    collection.remove(&diff.removed);
    after(Step::Remove, diff);
    collection.insert_unchecked(&diff.added);
    after(Step::Add, diff);
    collection.replace_unchecked(&diff.changed);
    after(Step::Update, diff);

    CollectionChange {
        removed_ids: diff.removed_ids(),
        added_ids: diff.added_ids(),
        changed_ids: diff.changed_ids(),
    }
}

fn mirror<S>(surface: &mut S, store: Store, step: Step, diff: &DiffResult)
where
    S: RenderSurface + ?Sized,
{
    match step {
        Step::Remove if !diff.removed.is_empty() => {
            trace!(%store, count = diff.removed.len(), "surface remove");
            surface.remove(store, &diff.removed_ids());
        }
        Step::Add if !diff.added.is_empty() => {
            trace!(%store, count = diff.added.len(), "surface add");
            surface.add(store, &diff.added);
        }
        Step::Update if !diff.changed.is_empty() => {
            trace!(%store, count = diff.changed.len(), "surface update");
            surface.update(store, &diff.changed);
        }
        _ => {}
    }
}
