//! Graph view: owns the collections and drives the surface through one
//! authoritative mount/unmount lifecycle

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use wikiscope_core::{
    reconcile_graph, AppliedChange, DiffEngine, EntityCollection, GraphSnapshot, HandlerMap,
    RenderSurface, Store,
};

use crate::bridge::SubscriptionBridge;
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::queue::{QueuePolicy, SnapshotQueue};

/// Lifecycle of a graph view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Uninitialized,
    Mounted,
    Reconciling,
    Unmounted,
}

type SurfaceAccessor<S> = Box<dyn FnMut(&S) + Send>;
type CollectionAccessor = Box<dyn FnMut(&EntityCollection) + Send>;

/// Optional caller callbacks, run at mount and after every cycle that
/// touched the matching store.
pub struct Accessors<S> {
    on_surface: Option<SurfaceAccessor<S>>,
    on_nodes: Option<CollectionAccessor>,
    on_edges: Option<CollectionAccessor>,
}

impl<S> Default for Accessors<S> {
    fn default() -> Self {
        Accessors {
            on_surface: None,
            on_nodes: None,
            on_edges: None,
        }
    }
}

impl<S> Accessors<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_surface(mut self, f: impl FnMut(&S) + Send + 'static) -> Self {
        self.on_surface = Some(Box::new(f));
        self
    }

    pub fn on_nodes(mut self, f: impl FnMut(&EntityCollection) + Send + 'static) -> Self {
        self.on_nodes = Some(Box::new(f));
        self
    }

    pub fn on_edges(mut self, f: impl FnMut(&EntityCollection) + Send + 'static) -> Self {
        self.on_edges = Some(Box::new(f));
        self
    }
}

/// One on-screen graph.
///
/// The view exclusively owns its node and edge collections; the surface
/// only sees them through the reconciler's add/remove/update calls.
/// Reconciliation is synchronous and runs under `&mut self`, so two cycles
/// for the same view can never interleave.
pub struct GraphView<S: RenderSurface> {
    state: ViewState,
    surface: Option<S>,
    nodes: EntityCollection,
    edges: EntityCollection,
    bridge: SubscriptionBridge,
    engine: DiffEngine,
    queue: SnapshotQueue,
    options: Value,
    accessors: Accessors<S>,
}

impl<S: RenderSurface> GraphView<S> {
    pub fn new(config: &ViewConfig, accessors: Accessors<S>) -> Self {
        GraphView {
            state: ViewState::Uninitialized,
            surface: None,
            nodes: EntityCollection::new(),
            edges: EntityCollection::new(),
            bridge: SubscriptionBridge::new(),
            engine: DiffEngine::new(),
            queue: SnapshotQueue::new(config.policy),
            options: config.options.clone(),
            accessors,
        }
    }

    /// Seed the collections, push them to the surface, and attach handlers.
    ///
    /// On error the view stays `Uninitialized` and the surface is destroyed.
    pub fn mount(
        &mut self,
        mut surface: S,
        initial: GraphSnapshot,
        handlers: &HandlerMap,
    ) -> Result<(), ViewError> {
        match self.state {
            ViewState::Uninitialized => {}
            ViewState::Unmounted => return Err(ViewError::Unmounted),
            ViewState::Mounted | ViewState::Reconciling => return Err(ViewError::AlreadyMounted),
        }

        let seeded = EntityCollection::from_snapshot(&initial.nodes)
            .and_then(|nodes| Ok((nodes, EntityCollection::from_snapshot(&initial.edges)?)));
        let (nodes, edges) = match seeded {
            Ok(collections) => collections,
            Err(e) => {
                surface.destroy();
                return Err(e.into());
            }
        };

        if !self.options.is_null() {
            surface.set_options(&self.options);
        }
        if !initial.nodes.is_empty() {
            surface.add(Store::Nodes, &initial.nodes);
        }
        if !initial.edges.is_empty() {
            surface.add(Store::Edges, &initial.edges);
        }

        if let Err(e) = self.bridge.replace(&mut surface, handlers) {
            surface.destroy();
            return Err(e.into());
        }

        self.nodes = nodes;
        self.edges = edges;
        self.surface = Some(surface);
        self.state = ViewState::Mounted;

        info!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            handlers = handlers.len(),
            "Graph view mounted"
        );

        self.notify(true, true);
        Ok(())
    }

    /// Queue a snapshot for reconciliation. Returns its production sequence.
    pub fn submit(&mut self, snapshot: GraphSnapshot) -> Result<u64, ViewError> {
        self.ensure_mounted()?;
        Ok(self.queue.push(snapshot))
    }

    /// Reconcile every pending snapshot in production order.
    ///
    /// Stops at the first failing cycle: that snapshot is dropped, the
    /// collections keep their pre-cycle contents, and any later snapshots
    /// stay queued for the next call.
    pub fn process_pending(&mut self) -> Result<Vec<AppliedChange>, ViewError> {
        let mut applied = Vec::with_capacity(self.queue.len());
        while let Some(change) = self.process_next()? {
            applied.push(change);
        }
        Ok(applied)
    }

    /// Reconcile the oldest pending snapshot, if any.
    pub fn process_next(&mut self) -> Result<Option<AppliedChange>, ViewError> {
        self.ensure_mounted()?;

        let Some(pending) = self.queue.pop() else {
            return Ok(None);
        };
        match self.reconcile(&pending.snapshot) {
            Ok(change) => Ok(Some(change)),
            Err(e) => {
                warn!(
                    sequence = pending.sequence,
                    produced_at = %pending.produced_at,
                    error = %e,
                    "Dropping snapshot after failed reconciliation"
                );
                Err(e)
            }
        }
    }

    /// Submit a snapshot and process everything pending.
    ///
    /// Returns the change record of the last cycle run.
    pub fn apply(&mut self, snapshot: GraphSnapshot) -> Result<AppliedChange, ViewError> {
        self.submit(snapshot)?;
        let mut applied = self.process_pending()?;
        Ok(applied.pop().unwrap_or_default())
    }

    fn reconcile(&mut self, target: &GraphSnapshot) -> Result<AppliedChange, ViewError> {
        self.state = ViewState::Reconciling;
        let result = self.reconcile_inner(target);
        self.state = ViewState::Mounted;

        let applied = result?;
        if applied.is_empty() {
            debug!(sequence = applied.sequence, "Snapshot produced no changes");
        } else {
            self.notify(applied.nodes_touched, applied.edges_touched);
        }
        Ok(applied)
    }

    fn reconcile_inner(&mut self, target: &GraphSnapshot) -> Result<AppliedChange, ViewError> {
        let surface = self.surface.as_mut().ok_or(ViewError::NotMounted)?;
        let diff = self.engine.compute(&self.nodes, &self.edges, target)?;
        Ok(reconcile_graph(&mut self.nodes, &mut self.edges, &diff, surface)?)
    }

    fn notify(&mut self, nodes_touched: bool, edges_touched: bool) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        if nodes_touched || edges_touched {
            if let Some(f) = self.accessors.on_surface.as_mut() {
                f(surface);
            }
        }
        if nodes_touched {
            if let Some(f) = self.accessors.on_nodes.as_mut() {
                f(&self.nodes);
            }
        }
        if edges_touched {
            if let Some(f) = self.accessors.on_edges.as_mut() {
                f(&self.edges);
            }
        }
    }

    /// Swap the handler mapping. The previous mapping is fully detached
    /// first, even when handler functions are shared between the two.
    pub fn set_handlers(&mut self, handlers: &HandlerMap) -> Result<(), ViewError> {
        self.ensure_mounted()?;
        let surface = self.surface.as_mut().ok_or(ViewError::NotMounted)?;
        self.bridge.replace(surface, handlers)?;
        Ok(())
    }

    /// Forward new surface options. Unchanged options are not re-sent.
    pub fn set_options(&mut self, options: Value) {
        if options == self.options {
            return;
        }
        if let Some(surface) = self.surface.as_mut() {
            surface.set_options(&options);
        }
        self.options = options;
    }

    /// Detach handlers, destroy the surface, and drop the collections.
    ///
    /// Idempotent: later calls return `None` and do nothing.
    pub fn unmount(&mut self) -> Option<S> {
        if self.state == ViewState::Unmounted {
            return None;
        }

        let surface = self.surface.take().map(|mut surface| {
            self.bridge.detach(&mut surface);
            surface.destroy();
            surface
        });

        self.nodes.clear();
        self.edges.clear();
        self.queue.clear();
        self.state = ViewState::Unmounted;
        if surface.is_some() {
            info!("Graph view unmounted");
        }
        surface
    }

    fn ensure_mounted(&self) -> Result<(), ViewError> {
        match self.state {
            ViewState::Mounted | ViewState::Reconciling => Ok(()),
            ViewState::Uninitialized => Err(ViewError::NotMounted),
            ViewState::Unmounted => Err(ViewError::Unmounted),
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn nodes(&self) -> &EntityCollection {
        &self.nodes
    }

    pub fn edges(&self) -> &EntityCollection {
        &self.edges
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn policy(&self) -> QueuePolicy {
        self.queue.policy()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn superseded(&self) -> u64 {
        self.queue.superseded()
    }

    /// Sequence number of the last computed diff.
    pub fn sequence(&self) -> u64 {
        self.engine.sequence()
    }

    pub fn is_attached(&self) -> bool {
        self.bridge.is_attached()
    }
}

impl<S: RenderSurface> Drop for GraphView<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
