//! Core data structures for graph entities and snapshots

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable identity of a node or edge.
///
/// The rendering surface accepts both numeric and string ids, so both are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(n) => write!(f, "{}", n),
            EntityId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Int(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Str(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Str(s)
    }
}

/// Name of the identity attribute in the flat wire form.
pub const ID_ATTR: &str = "id";

/// A single node or edge record.
///
/// Everything except `id` is opaque pass-through data for the rendering
/// surface (label, group, color hints, `from`/`to` for edges). Attributes
/// are kept sorted so content equality does not depend on insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    #[serde(flatten)]
    attrs: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Entity {
            id: id.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter. Writes to `id` are ignored.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set an attribute, returning the previous value.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if key == ID_ATTR {
            return None;
        }
        self.attrs.insert(key, value.into())
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Convenience accessor for string attributes such as `label`.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    pub fn attrs(&self) -> &BTreeMap<String, Value> {
        &self.attrs
    }

    /// Content equality as the differ sees it: same id and same attributes,
    /// with JSON numbers compared by value so `1` and `1.0` match.
    pub fn same_content(&self, other: &Entity) -> bool {
        self.id == other.id
            && self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .zip(&other.attrs)
                .all(|((ka, va), (kb, vb))| ka == kb && json_eq(va, vb))
    }
}

fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x == y || matches!((x.as_f64(), y.as_f64()), (Some(p), Some(q)) if p == q)
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Ordered target state for one collection at one point in time.
pub type Snapshot = Vec<Entity>;

/// The node and edge snapshots produced by one transform cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Snapshot,
    #[serde(default)]
    pub edges: Snapshot,
}

impl GraphSnapshot {
    pub fn new(nodes: Snapshot, edges: Snapshot) -> Self {
        GraphSnapshot { nodes, edges }
    }
}

/// Which of the two stores an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Nodes,
    Edges,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::Nodes => f.write_str("nodes"),
            Store::Edges => f.write_str("edges"),
        }
    }
}
