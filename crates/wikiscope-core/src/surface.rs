//! Boundary to the external rendering surface

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SurfaceError;
use crate::model::{Entity, EntityId, Store};

/// An interaction event fired by the surface (`select`, `click`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceEvent {
    pub name: String,
    #[serde(default)]
    pub payload: Value,
}

impl SurfaceEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        SurfaceEvent {
            name: name.into(),
            payload,
        }
    }
}

/// A caller-supplied event callback.
///
/// Handlers are compared by pointer identity: two clones of the same
/// handler are the same handler, two closures with identical bodies are not.
#[derive(Clone)]
pub struct EventHandler(Arc<dyn Fn(&SurfaceEvent) + Send + Sync>);

impl EventHandler {
    pub fn new(f: impl Fn(&SurfaceEvent) + Send + Sync + 'static) -> Self {
        EventHandler(Arc::new(f))
    }

    pub fn call(&self, event: &SurfaceEvent) {
        (self.0)(event)
    }

    pub fn same_as(&self, other: &EventHandler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventHandler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Event name to handler. Sorted so registration order is deterministic.
pub type HandlerMap = BTreeMap<String, EventHandler>;

/// The drawing component the engine keeps in sync.
///
/// Store primitives are identity-keyed and idempotent. The surface owns
/// layout and drawing; it observes the collections only through these calls.
pub trait RenderSurface {
    fn add(&mut self, store: Store, entities: &[Entity]);

    fn remove(&mut self, store: Store, ids: &[EntityId]);

    fn update(&mut self, store: Store, entities: &[Entity]);

    /// Register a handler for an event name.
    fn on(&mut self, event: &str, handler: EventHandler) -> Result<(), SurfaceError>;

    /// Unregister one registration of a handler. Unknown handlers are ignored.
    fn off(&mut self, event: &str, handler: &EventHandler);

    fn set_options(&mut self, _options: &Value) {}

    /// Release drawing resources. Called once on unmount.
    fn destroy(&mut self) {}
}
