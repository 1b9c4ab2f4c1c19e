// ── Event recorder ──
//
// Subscribes to a set of topics and keeps every delivered event in
// order. Used by the CLI trace output and by tests asserting on
// publish sequences.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{BusEvent, EventBus, Subscription, Topic};

/// Ordered record of bus deliveries.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<BusEvent>>>,
}

impl EventLog {
    /// Record every event published on `topics`.
    pub fn attach(
        bus: &EventBus,
        topics: impl IntoIterator<Item = Topic>,
    ) -> (Self, Vec<Subscription>) {
        let log = Self::default();
        let subs = topics
            .into_iter()
            .map(|topic| {
                let entries = Arc::clone(&log.entries);
                bus.subscribe(topic, move |event| {
                    lock(&entries).push(event.clone());
                    Ok(())
                })
            })
            .collect();
        (log, subs)
    }

    /// Record every topic the bus knows.
    pub fn attach_all(bus: &EventBus) -> (Self, Vec<Subscription>) {
        Self::attach(bus, Topic::all())
    }

    pub fn events(&self) -> Vec<BusEvent> {
        lock(&self.entries).clone()
    }

    pub fn topics(&self) -> Vec<Topic> {
        lock(&self.entries).iter().map(BusEvent::topic).collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }
}

fn lock(entries: &Mutex<Vec<BusEvent>>) -> MutexGuard<'_, Vec<BusEvent>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_only_attached_topics_in_order() {
        let bus = EventBus::new();
        let (log, _subs) = EventLog::attach(
            &bus,
            [Topic::MapCloseAllPopups, Topic::UiFullscreenToggled],
        );

        bus.publish(&BusEvent::UiFullscreenToggled);
        bus.publish(&BusEvent::UiViewChanged(super::super::ViewChange {
            is_mobile: true,
        }));
        bus.publish(&BusEvent::MapCloseAllPopups);

        assert_eq!(
            log.topics(),
            [Topic::UiFullscreenToggled, Topic::MapCloseAllPopups]
        );
        log.clear();
        assert!(log.is_empty());
    }
}
