//! In-memory rendering surface that records every command it receives

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use wikiscope_core::{
    Entity, EntityId, EventHandler, RenderSurface, Store, SurfaceError, SurfaceEvent,
};

/// Command types sent from the engine to a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceCommand {
    #[serde(rename = "add")]
    Add { store: Store, entities: Vec<Entity> },
    #[serde(rename = "remove")]
    Remove { store: Store, ids: Vec<EntityId> },
    #[serde(rename = "update")]
    Update { store: Store, entities: Vec<Entity> },
    #[serde(rename = "on")]
    On { event: String },
    #[serde(rename = "off")]
    Off { event: String },
    #[serde(rename = "set_options")]
    SetOptions { options: Value },
    #[serde(rename = "destroy")]
    Destroy,
}

/// A headless surface that mirrors node and edge stores in memory and
/// records every command it receives.
#[derive(Debug, Default)]
pub struct MemorySurface {
    nodes: BTreeMap<EntityId, Entity>,
    edges: BTreeMap<EntityId, Entity>,
    handlers: Vec<(String, EventHandler)>,
    commands: Vec<SurfaceCommand>,
    options: Value,
    reject_event: Option<String>,
    destroyed: bool,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `on` fail for the given event name.
    pub fn rejecting(event: impl Into<String>) -> Self {
        MemorySurface {
            reject_event: Some(event.into()),
            ..Self::default()
        }
    }

    fn store_mut(&mut self, store: Store) -> &mut BTreeMap<EntityId, Entity> {
        match store {
            Store::Nodes => &mut self.nodes,
            Store::Edges => &mut self.edges,
        }
    }

    pub fn store(&self, store: Store) -> &BTreeMap<EntityId, Entity> {
        match store {
            Store::Nodes => &self.nodes,
            Store::Edges => &self.edges,
        }
    }

    /// Fire an event at every handler registered under its name.
    /// Returns how many handlers ran.
    pub fn emit(&self, event: &SurfaceEvent) -> usize {
        let mut fired = 0;
        for (name, handler) in &self.handlers {
            if *name == event.name {
                handler.call(event);
                fired += 1;
            }
        }
        fired
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<SurfaceCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

impl RenderSurface for MemorySurface {
    fn add(&mut self, store: Store, entities: &[Entity]) {
        let target = self.store_mut(store);
        for entity in entities {
            target.insert(entity.id.clone(), entity.clone());
        }
        self.commands.push(SurfaceCommand::Add {
            store,
            entities: entities.to_vec(),
        });
    }

    fn remove(&mut self, store: Store, ids: &[EntityId]) {
        let target = self.store_mut(store);
        for id in ids {
            target.remove(id);
        }
        self.commands.push(SurfaceCommand::Remove {
            store,
            ids: ids.to_vec(),
        });
    }

    fn update(&mut self, store: Store, entities: &[Entity]) {
        let target = self.store_mut(store);
        for entity in entities {
            target.insert(entity.id.clone(), entity.clone());
        }
        self.commands.push(SurfaceCommand::Update {
            store,
            entities: entities.to_vec(),
        });
    }

    fn on(&mut self, event: &str, handler: EventHandler) -> Result<(), SurfaceError> {
        if self.destroyed {
            return Err(SurfaceError::Destroyed);
        }
        if self.reject_event.as_deref() == Some(event) {
            return Err(SurfaceError::HandlerRejected {
                event: event.to_string(),
                reason: "rejected by surface".to_string(),
            });
        }
        self.handlers.push((event.to_string(), handler));
        self.commands.push(SurfaceCommand::On {
            event: event.to_string(),
        });
        Ok(())
    }

    /// Removes one registration of `handler` under `event`; a handler
    /// registered several times needs one `off` per `on`.
    fn off(&mut self, event: &str, handler: &EventHandler) {
        let Some(index) = self
            .handlers
            .iter()
            .position(|(name, registered)| name == event && registered.same_as(handler))
        else {
            return;
        };
        self.handlers.remove(index);
        self.commands.push(SurfaceCommand::Off {
            event: event.to_string(),
        });
    }

    fn set_options(&mut self, options: &Value) {
        self.options = options.clone();
        self.commands.push(SurfaceCommand::SetOptions {
            options: options.clone(),
        });
    }

    fn destroy(&mut self) {
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "Destroying memory surface"
        );
        self.handlers.clear();
        self.destroyed = true;
        self.commands.push(SurfaceCommand::Destroy);
    }
}
