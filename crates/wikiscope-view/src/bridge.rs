//! Symmetric attach/detach of caller event handlers on a surface

use tracing::{debug, warn};
use wikiscope_core::{EventHandler, HandlerMap, RenderSurface, SurfaceError};

/// Handlers registered by one [`attach`] call.
///
/// Holds clones of exactly what was registered so [`Subscription::detach`]
/// can unregister the same handlers under the same names. Detaching
/// consumes the subscription, so it can only happen once.
#[derive(Debug)]
#[must_use = "dropping a subscription leaves its handlers registered"]
pub struct Subscription {
    registered: Vec<(String, EventHandler)>,
}

impl Subscription {
    pub fn detach<S>(self, surface: &mut S)
    where
        S: RenderSurface + ?Sized,
    {
        for (event, handler) in self.registered.iter().rev() {
            surface.off(event, handler);
        }
        debug!(count = self.registered.len(), "Detached event handlers");
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.registered.iter().map(|(event, _)| event.as_str())
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

/// Register every handler in `handlers` against `surface`.
///
/// If the surface rejects one, the handlers registered so far are removed
/// again before the error is returned.
pub fn attach<S>(surface: &mut S, handlers: &HandlerMap) -> Result<Subscription, SurfaceError>
where
    S: RenderSurface + ?Sized,
{
    let mut subscription = Subscription {
        registered: Vec::with_capacity(handlers.len()),
    };

    for (event, handler) in handlers {
        if let Err(e) = surface.on(event, handler.clone()) {
            warn!(event = %event, error = %e, "Handler registration failed, rolling back");
            subscription.detach(surface);
            return Err(e);
        }
        subscription.registered.push((event.clone(), handler.clone()));
    }

    debug!(count = subscription.len(), "Attached event handlers");
    Ok(subscription)
}

/// Holds at most one live subscription per view.
#[derive(Debug, Default)]
pub struct SubscriptionBridge {
    active: Option<Subscription>,
}

impl SubscriptionBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detach the current mapping (if any), then attach `handlers`.
    pub fn replace<S>(&mut self, surface: &mut S, handlers: &HandlerMap) -> Result<(), SurfaceError>
    where
        S: RenderSurface + ?Sized,
    {
        self.detach(surface);
        self.active = Some(attach(surface, handlers)?);
        Ok(())
    }

    /// Detach the current mapping. Safe to call any number of times.
    /// Returns whether anything was attached.
    pub fn detach<S>(&mut self, surface: &mut S) -> bool
    where
        S: RenderSurface + ?Sized,
    {
        match self.active.take() {
            Some(subscription) => {
                subscription.detach(surface);
                true
            }
            None => false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&Subscription> {
        self.active.as_ref()
    }
}
