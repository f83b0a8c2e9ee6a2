//! Process-wide event bus
//!
//! Keeps independent graphs and dialogs in step with state that lives
//! outside any one sync group, such as the persisted marker lists.
//! Handlers are keyed by the concrete event type and run on the
//! publishing thread.

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Anything that can travel over the bus
pub trait Event: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Receives events of the type it was subscribed for
pub trait EventHandler: Send {
    fn handle(&mut self, event: &dyn Event);
}

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

/// Events published by the graph subsystem
pub mod events {
    /// The marker list of a machine changed
    #[derive(Debug, Clone)]
    pub struct MarkersChanged {
        pub machine_id: String,
        pub marker_count: usize,
    }

    /// A graph created a new rendering boundary
    #[derive(Debug, Clone)]
    pub struct GraphCreated {
        pub graph_id: String,
        pub series_count: usize,
    }

    /// A graph tore its rendering boundary down
    #[derive(Debug, Clone)]
    pub struct GraphDestroyed {
        pub graph_id: String,
        pub reason: String,
    }

    /// A group export finished
    #[derive(Debug, Clone)]
    pub struct ExportCompleted {
        pub group_id: String,
        pub row_count: usize,
    }
}

#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<AHashMap<TypeId, Vec<SharedHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events of type `E`
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        self.handlers
            .write()
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Arc::new(Mutex::new(handler)));
    }

    /// Deliver `event` to every handler of its type, in subscription order
    ///
    /// The handler list is copied before dispatch, so a handler may publish
    /// or subscribe. A handler that publishes its own event type is skipped
    /// for the nested delivery.
    pub fn publish<E: Event>(&self, event: E) {
        let targets: Vec<SharedHandler> = match self.handlers.read().get(&TypeId::of::<E>()) {
            Some(list) => list.clone(),
            None => return,
        };
        for handler in targets {
            match handler.try_lock() {
                Some(mut handler) => handler.handle(&event),
                None => tracing::debug!("Skipped re-entrant delivery of {}", std::any::type_name::<E>()),
            }
        }
    }

    /// Number of handlers registered for `E`
    pub fn handler_count<E: Event>(&self) -> usize {
        self.handlers.read().get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers: usize = self.handlers.read().values().map(Vec::len).sum();
        f.debug_struct("EventBus").field("handlers", &handlers).finish()
    }
}

struct FnHandler<F>(F);

impl<F> EventHandler for FnHandler<F>
where
    F: FnMut(&dyn Event) + Send,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.0)(event)
    }
}

/// Handler from a closure over any event
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + 'static,
{
    Box::new(FnHandler(f))
}

/// Handler that only sees events of type `E`
pub fn typed_handler<E, F>(mut f: F) -> Box<dyn EventHandler>
where
    E: Event,
    F: FnMut(&E) + Send + 'static,
{
    handler_from_fn(move |event: &dyn Event| {
        if let Some(event) = event.as_any().downcast_ref::<E>() {
            f(event);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::events::{GraphCreated, MarkersChanged};
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_publish_reaches_typed_subscribers_only() {
        let bus = EventBus::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = seen.clone();
        bus.subscribe::<MarkersChanged>(typed_handler(move |event: &MarkersChanged| {
            counter.fetch_add(event.marker_count, Ordering::SeqCst);
        }));

        bus.publish(MarkersChanged {
            machine_id: "winder2".to_string(),
            marker_count: 3,
        });
        bus.publish(GraphCreated {
            graph_id: "puller".to_string(),
            series_count: 1,
        });

        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(bus.handler_count::<MarkersChanged>(), 1);
        assert_eq!(bus.handler_count::<GraphCreated>(), 0);
    }

    #[test]
    fn test_handler_may_publish_other_events() {
        let bus = Arc::new(EventBus::new());
        let created = Arc::new(AtomicUsize::new(0));

        let counter = created.clone();
        bus.subscribe::<GraphCreated>(typed_handler(move |_: &GraphCreated| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        let relay = Arc::clone(&bus);
        bus.subscribe::<MarkersChanged>(typed_handler(move |e: &MarkersChanged| {
            relay.publish(GraphCreated {
                graph_id: e.machine_id.clone(),
                series_count: 0,
            });
        }));

        bus.publish(MarkersChanged {
            machine_id: "extruder".to_string(),
            marker_count: 1,
        });
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }
}
