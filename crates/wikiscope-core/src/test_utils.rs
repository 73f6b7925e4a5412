//! Test utilities for wikiscope-core

use crate::error::SurfaceError;
use crate::model::{Entity, EntityId, Snapshot, Store};
use crate::surface::{EventHandler, RenderSurface};

/// A node with a label attribute.
pub fn node(id: i64, label: &str) -> Entity {
    Entity::new(id).with_attr("label", label)
}

/// A bare node carrying only its id.
pub fn bare(id: i64) -> Entity {
    Entity::new(id)
}

/// An edge with a synthesized `from->to` id.
pub fn edge(from: i64, to: i64) -> Entity {
    Entity::new(format!("{}->{}", from, to))
        .with_attr("from", from)
        .with_attr("to", to)
}

/// Build a snapshot of labelled nodes from `(id, label)` pairs.
pub fn nodes(pairs: &[(i64, &str)]) -> Snapshot {
    pairs.iter().map(|(id, label)| node(*id, label)).collect()
}

/// Store operations seen by a [`RecordingSurface`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Add(Store, Vec<EntityId>),
    Remove(Store, Vec<EntityId>),
    Update(Store, Vec<EntityId>),
}

/// Surface that only records store calls.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub ops: Vec<Op>,
}

impl RenderSurface for RecordingSurface {
    fn add(&mut self, store: Store, entities: &[Entity]) {
        self.ops.push(Op::Add(store, entities.iter().map(|e| e.id.clone()).collect()));
    }

    fn remove(&mut self, store: Store, ids: &[EntityId]) {
        self.ops.push(Op::Remove(store, ids.to_vec()));
    }

    fn update(&mut self, store: Store, entities: &[Entity]) {
        self.ops.push(Op::Update(store, entities.iter().map(|e| e.id.clone()).collect()));
    }

    fn on(&mut self, _event: &str, _handler: EventHandler) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn off(&mut self, _event: &str, _handler: &EventHandler) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_ids_are_synthesized_from_endpoints() {
        let e = edge(1, 2);
        assert_eq!(e.id, EntityId::from("1->2"));
        assert_eq!(e.attr("from"), Some(&serde_json::json!(1)));
    }
}
