//! Turning raw query results into node/edge snapshots

use std::collections::HashSet;

use serde_json::Value;

use crate::error::TransformError;
use crate::model::{Entity, EntityId, GraphSnapshot};

/// Converts one batch of raw query results into the snapshot the differ
/// consumes. Implementations must emit unique ids per store.
pub trait GraphTransform {
    fn transform(&self, raw: &Value) -> Result<GraphSnapshot, TransformError>;
}

impl<F> GraphTransform for F
where
    F: Fn(&Value) -> Result<GraphSnapshot, TransformError>,
{
    fn transform(&self, raw: &Value) -> Result<GraphSnapshot, TransformError> {
        self(raw)
    }
}
/// `"{from}->{to}"` with `\` and `>` escaped inside each label, so a label
/// `"{from}->{to}"` with `\\` and `>` escaped inside each label, so a label
/// containing `->` cannot make two edges share an id.
fn edge_id(from: &str, to: &str) -> String {
    fn escape(label: &str, out: &mut String) {
        for c in label.chars() {
            if matches!(c, '\\' | '>') {
                out.push('\\');
            }
            out.push(c);
        }
    }

    let mut id = String::with_capacity(from.len() + to.len() + 2);
    escape(from, &mut id);
    id.push_str("->");
    escape(to, &mut id);
    id
}

/// Binding names of the three-level "child of child of topic" query.
const LEVELS: [&str; 3] = ["itemLabel", "child1Label", "child2Label"];

/// Builds a hierarchy rooted at the chosen topic from SPARQL JSON results.
///
/// Each row binds up to three labels, each one a child of the previous
/// level (the first a child of the root). Nodes are keyed by label, edges
/// point child to parent and get a synthesized `"{from}->{to}"` id.
#[derive(Debug, Clone)]
pub struct HierarchyTransform {
    pub root_label: String,
    pub relation_label: String,
}

impl HierarchyTransform {
    pub fn new(root_label: impl Into<String>, relation_label: impl Into<String>) -> Self {
        HierarchyTransform {
            root_label: root_label.into(),
            relation_label: relation_label.into(),
        }
    }

    fn group_for(depth: usize) -> &'static str {
        match depth {
            0 => "root",
            1 => "item",
            _ => "child",
        }
    }
}

impl GraphTransform for HierarchyTransform {
    fn transform(&self, raw: &Value) -> Result<GraphSnapshot, TransformError> {
        let bindings = raw
            .pointer("/results/bindings")
            .and_then(Value::as_array)
            .ok_or_else(|| TransformError::Malformed("missing results.bindings array".into()))?;

        let mut snapshot = GraphSnapshot::default();
        let mut seen_nodes = HashSet::new();
        let mut seen_edges = HashSet::new();

        let mut push_node = |snapshot: &mut GraphSnapshot, label: &str, depth: usize| {
            if seen_nodes.insert(label.to_string()) {
                snapshot.nodes.push(
                    Entity::new(label)
                        .with_attr("label", label)
                        .with_attr("group", Self::group_for(depth)),
                );
            }
        };

        push_node(&mut snapshot, &self.root_label, 0);

        for (row_index, row) in bindings.iter().enumerate() {
            let row = row.as_object().ok_or_else(|| {
                TransformError::Malformed(format!("binding {} is not an object", row_index))
            })?;

            let mut parent = self.root_label.as_str();
            for (level, name) in LEVELS.iter().enumerate() {
                let Some(label) = row.get(*name).and_then(|b| b.get("value")).and_then(Value::as_str)
                else {
                    break;
                };

                push_node(&mut snapshot, label, level + 1);

                if seen_edges.insert((label.to_string(), parent.to_string())) {
                    snapshot.edges.push(
                        Entity::new(EntityId::from(edge_id(label, parent)))
                            .with_attr("from", label)
                            .with_attr("to", parent)
                            .with_attr("label", self.relation_label.as_str()),
                    );
                }
                parent = label;
            }
        }

        tracing::debug!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            rows = bindings.len(),
            "Transformed query results"
        );
        Ok(snapshot)
    }
}
