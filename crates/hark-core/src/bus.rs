//! Lifecycle event bus.
//!
//! The [`EventBus`] is a small synchronous publish/subscribe registry keyed by
//! event type (`"connected"`, `"disconnected"`, or anything a bot script
//! chooses). It is independent of message dispatch.
//!
//! Handlers are identified by pointer identity: subscribing the same
//! [`EventHandler`] twice for one event type is a no-op, and only that exact
//! handler can be unsubscribed.
//!
//! # Failure policy
//!
//! `publish` isolates every handler. A handler that returns an error or
//! panics is logged and the remaining handlers still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{error, trace};

use crate::error::{BusError, BusResult, HandlerError};
use crate::handler::{HandlerResult, IntoHandlerResult, panic_message};

/// Payload passed to lifecycle handlers.
pub type EventData = Value;

type EventFn = dyn Fn(Option<&EventData>) -> HandlerResult + Send + Sync;

/// A lifecycle event handler.
///
/// Cloning is cheap and preserves identity, so a clone can later be passed to
/// [`EventBus::unsubscribe`].
#[derive(Clone)]
pub struct EventHandler(Arc<EventFn>);

impl EventHandler {
    /// Wraps a callback. The callback may return `()` or a `Result`.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(Option<&EventData>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self(Arc::new(move |data: Option<&EventData>| {
            f(data).into_handler_result()
        }))
    }

    /// Returns `true` if both handles refer to the same callback.
    pub fn same(&self, other: &EventHandler) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, data: Option<&EventData>) -> Result<(), HandlerError> {
        match catch_unwind(AssertUnwindSafe(|| (self.0)(data))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(HandlerError::Failed(e)),
            Err(payload) => Err(HandlerError::Panicked(panic_message(payload.as_ref()))),
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventHandler")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Summary of a single [`EventBus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Number of handlers that were called.
    pub invoked: usize,
    /// Number of handlers that failed.
    pub failed: usize,
}

/// Publish/subscribe registry for lifecycle events.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `event_type`.
    ///
    /// Returns `false` if this exact handler was already registered.
    pub fn subscribe(&self, event_type: &str, handler: EventHandler) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let handlers = subscriptions.entry(event_type.to_owned()).or_default();
        if handlers.iter().any(|h| h.same(&handler)) {
            trace!(event_type, "Handler already subscribed");
            return false;
        }
        handlers.push(handler);
        true
    }

    /// Removes `handler` from `event_type`.
    pub fn unsubscribe(&self, event_type: &str, handler: &EventHandler) -> BusResult<()> {
        let mut subscriptions = self.subscriptions.write();
        let position = subscriptions
            .get(event_type)
            .and_then(|handlers| handlers.iter().position(|h| h.same(handler)));

        match position {
            Some(index) => {
                if let Some(handlers) = subscriptions.get_mut(event_type) {
                    handlers.remove(index);
                }
                Ok(())
            }
            None => Err(BusError::SubscriptionNotFound {
                event_type: event_type.to_owned(),
            }),
        }
    }

    /// Invokes every handler for `event_type` in subscription order.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe; changes apply from the next publish.
    pub fn publish(&self, event_type: &str, data: Option<&EventData>) -> PublishOutcome {
        let handlers = self
            .subscriptions
            .read()
            .get(event_type)
            .cloned()
            .unwrap_or_default();

        let mut outcome = PublishOutcome::default();
        for (index, handler) in handlers.iter().enumerate() {
            outcome.invoked += 1;
            if let Err(e) = handler.call(data) {
                outcome.failed += 1;
                error!(event_type, handler_index = index, error = ?e, "Lifecycle handler failed");
            }
        }

        trace!(event_type, invoked = outcome.invoked, failed = outcome.failed, "Event published");
        outcome
    }

    /// Returns the number of handlers registered for `event_type`.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.subscriptions
            .read()
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscriptions = self.subscriptions.read();
        let mut map = f.debug_map();
        for (event_type, handlers) in subscriptions.iter() {
            map.entry(event_type, &handlers.len());
        }
        map.finish()
    }
}
