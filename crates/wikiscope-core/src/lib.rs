//! wikiscope core: entity model, identity-keyed collections, the snapshot
//! differ and the reconciler

pub mod model;
pub mod error;
pub mod collection;
pub mod diff;
pub mod reconcile;
pub mod surface;
pub mod transform;


#[cfg(test)]
pub mod test_utils;

pub use model::{Entity, EntityId, GraphSnapshot, Snapshot, Store};
pub use error::{EngineError, Origin, SurfaceError, TransformError};
pub use collection::EntityCollection;
pub use diff::{diff, DiffEngine, DiffResult, GraphDiff};
pub use reconcile::{reconcile, reconcile_graph, AppliedChange, CollectionChange};
pub use surface::{EventHandler, HandlerMap, RenderSurface, SurfaceEvent};
pub use transform::{GraphTransform, HierarchyTransform};
