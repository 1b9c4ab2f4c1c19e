// ── Event bus ──
//
// Topic-keyed publish/subscribe registry shared by every controller.
// Delivery is synchronous and in registration order. A failing or
// panicking handler is logged and never stops its siblings or reaches
// the publisher.

mod event;
mod log;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::{error, trace, warn};

use crate::error::CoreError;

pub use event::{
    BusEvent, FlyToCommand, SelectionChange, ShowPopupCommand, SidebarRequest, StateChange,
    Topic, ViewChange, ZoomToCommand,
};
pub use log::EventLog;

/// A topic handler. Returning `Err` is logged; it does not affect other
/// handlers.
pub type Handler = Arc<dyn Fn(&BusEvent) -> Result<(), CoreError> + Send + Sync>;

struct Registration {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    topics: DashMap<Topic, Vec<Registration>>,
    next_id: AtomicU64,
}

/// The publish/subscribe registry.
///
/// Cheaply cloneable; clones share one registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`. The handler stays registered until
    /// [`Subscription::unsubscribe`] is called; dropping the token does
    /// not unsubscribe.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BusEvent) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .topics
            .entry(topic)
            .or_default()
            .push(Registration {
                id,
                handler: Arc::new(handler),
            });
        trace!(%topic, id, "subscribed");

        Subscription {
            bus: Arc::downgrade(&self.inner),
            topic,
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Deliver `event` to every handler currently registered for its
    /// topic. Returns the number of handlers invoked.
    pub fn publish(&self, event: &BusEvent) -> usize {
        let topic = event.topic();

        // Snapshot the handlers so none of them runs while the map shard
        // is locked; handlers are free to publish or subscribe.
        let handlers: Vec<Handler> = self
            .inner
            .topics
            .get(&topic)
            .map(|regs| regs.iter().map(|r| Arc::clone(&r.handler)).collect())
            .unwrap_or_default();

        trace!(%topic, handlers = handlers.len(), "publish");

        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(%topic, error = %err, "bus handler failed"),
                Err(_) => error!(%topic, "bus handler panicked"),
            }
        }

        handlers.len()
    }

    /// Number of handlers registered for `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner.topics.get(&topic).map_or(0, |regs| regs.len())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for entry in &self.inner.topics {
            map.entry(&entry.key().as_str(), &entry.value().len());
        }
        map.finish()
    }
}

// ── Subscription ────────────────────────────────────────────────────

/// Token returned by [`EventBus::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<BusInner>,
    topic: Topic,
    id: u64,
    active: AtomicBool,
}

impl Subscription {
    /// Remove the handler. Repeated calls are no-ops.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let Some(inner) = self.bus.upgrade() else {
            return;
        };
        if let Some(mut regs) = inner.topics.get_mut(&self.topic) {
            regs.retain(|r| r.id != self.id);
        }
        trace!(topic = %self.topic, id = self.id, "unsubscribed");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::store::Sidebar;

    fn sidebar_event(sidebar: Sidebar) -> BusEvent {
        BusEvent::UiSidebarRequested(SidebarRequest { sidebar })
    }

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Handler) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let calls = Arc::clone(&calls);
            move |name: &'static str| -> Handler {
                let calls = Arc::clone(&calls);
                Arc::new(move |_: &BusEvent| {
                    calls.lock().unwrap().push(name);
                    Ok(())
                })
            }
        };
        (calls, make)
    }

    #[test]
    fn handlers_run_once_each_in_subscription_order() {
        let bus = EventBus::new();
        let (calls, make) = recorder();
        let first = make("first");
        let second = make("second");
        let _a = bus.subscribe(Topic::UiSidebarRequested, move |e| first(e));
        let _b = bus.subscribe(Topic::UiSidebarRequested, move |e| second(e));

        let invoked = bus.publish(&sidebar_event(Sidebar::List));

        assert_eq!(invoked, 2);
        assert_eq!(*calls.lock().unwrap(), ["first", "second"]);
    }

    #[test]
    fn unsubscribe_excludes_handler_from_later_publishes() {
        let bus = EventBus::new();
        let (calls, make) = recorder();
        let first = make("first");
        let second = make("second");
        let sub = bus.subscribe(Topic::UiSidebarRequested, move |e| first(e));
        let _keep = bus.subscribe(Topic::UiSidebarRequested, move |e| second(e));

        sub.unsubscribe();
        sub.unsubscribe();
        bus.publish(&sidebar_event(Sidebar::Home));
        bus.publish(&sidebar_event(Sidebar::Detail));

        assert!(!sub.is_active());
        assert_eq!(*calls.lock().unwrap(), ["second", "second"]);
        assert_eq!(bus.subscriber_count(Topic::UiSidebarRequested), 1);
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(&BusEvent::MapCloseAllPopups), 0);
    }

    #[test]
    fn topics_are_isolated() {
        let bus = EventBus::new();
        let (calls, make) = recorder();
        let h = make("fullscreen");
        let _s = bus.subscribe(Topic::UiFullscreenToggled, move |e| h(e));

        bus.publish(&BusEvent::MapCloseAllPopups);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_and_panicking_handlers_do_not_stop_siblings() {
        let bus = EventBus::new();
        let (calls, make) = recorder();
        let last = make("last");

        let _err = bus.subscribe(Topic::MapCloseAllPopups, |_| {
            Err(CoreError::Internal("boom".into()))
        });
        let _panic = bus.subscribe(Topic::MapCloseAllPopups, |_| panic!("handler exploded"));
        let _ok = bus.subscribe(Topic::MapCloseAllPopups, move |e| last(e));

        let invoked = bus.publish(&BusEvent::MapCloseAllPopups);

        assert_eq!(invoked, 3);
        assert_eq!(*calls.lock().unwrap(), ["last"]);
    }

    #[test]
    fn late_subscriber_sees_no_replay() {
        let bus = EventBus::new();
        bus.publish(&BusEvent::UiFullscreenToggled);

        let (calls, make) = recorder();
        let h = make("late");
        let _s = bus.subscribe(Topic::UiFullscreenToggled, move |e| h(e));

        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn handlers_may_publish_reentrantly() {
        let bus = EventBus::new();
        let (calls, make) = recorder();
        let inner = make("inner");

        let _inner = bus.subscribe(Topic::MapCloseAllPopups, move |e| inner(e));
        let relay = bus.clone();
        let _outer = bus.subscribe(Topic::UiFullscreenToggled, move |_| {
            relay.publish(&BusEvent::MapCloseAllPopups);
            Ok(())
        });

        bus.publish(&BusEvent::UiFullscreenToggled);
        assert_eq!(*calls.lock().unwrap(), ["inner"]);
    }

    #[test]
    fn unsubscribe_after_bus_dropped_is_harmless() {
        let bus = EventBus::new();
        let sub = bus.subscribe(Topic::UiViewChanged, |_| Ok(()));
        drop(bus);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }
}
