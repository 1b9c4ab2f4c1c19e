// ── State store ──
//
// Holds the current `ApplicationState` and is its only writer. Every
// transition goes through `dispatch`, which runs the reducer, swaps the
// stored value, then broadcasts on the bus and the watch channel.

mod action;
mod reducer;
mod state;

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::debug;

pub use action::{Action, SelectionPayload, UiPatch};
pub use reducer::reduce;
pub use state::{
    ApplicationState, CacheState, ElementHandle, MapHandle, PopupId, SelectedEntity, Sidebar,
    UiState, WeatherEntry,
};

use crate::bus::{BusEvent, EventBus, SelectionChange, StateChange};
use crate::model::{DetailRecord, EntityId, Feature, WeatherSnapshot};
use crate::stream::StateStream;

/// The application state holder.
///
/// Reads are wait-free snapshots. Writers are serialized; subscribers run
/// after the new value is visible, so a handler that reads the store sees
/// the state it is being told about (or a later one).
pub struct Store {
    state: ArcSwap<ApplicationState>,
    bus: EventBus,
    changes: watch::Sender<Arc<ApplicationState>>,
    write: Mutex<()>,
}

impl Store {
    pub fn new(bus: EventBus) -> Self {
        Self::with_state(bus, ApplicationState::default())
    }

    pub fn with_state(bus: EventBus, initial: ApplicationState) -> Self {
        let initial = Arc::new(initial);
        let (changes, _) = watch::channel(Arc::clone(&initial));
        Self {
            state: ArcSwap::new(initial),
            bus,
            changes,
            write: Mutex::new(()),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Apply `action`. Returns whether the state changed.
    ///
    /// By the time this returns every `state:changed` and
    /// `state:selectionChanged` subscriber has run.
    pub fn dispatch(&self, action: Action) -> bool {
        let (old, new) = {
            let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
            let old = self.state.load_full();
            let new = reduce(&old, &action);
            if Arc::ptr_eq(&old, &new) {
                debug!(action = action.kind(), "dispatch produced no change");
                return false;
            }
            self.state.store(Arc::clone(&new));
            (old, new)
        };

        debug!(action = action.kind(), "dispatch");
        self.changes.send_replace(Arc::clone(&new));

        let selection_changed = action.is_selection_change();
        let selection = new.current_selection.clone();
        self.bus.publish(&BusEvent::StateChanged(StateChange {
            old,
            new,
            action: Arc::new(action),
        }));
        if selection_changed {
            self.bus
                .publish(&BusEvent::StateSelectionChanged(SelectionChange { selection }));
        }
        true
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// Current state by reference.
    pub fn get_state(&self) -> Arc<ApplicationState> {
        self.state.load_full()
    }

    pub fn map(&self) -> Option<MapHandle> {
        self.state.load().map
    }

    pub fn current_selection(&self) -> Option<SelectedEntity> {
        self.state.load().current_selection.clone()
    }

    pub fn current_sidebar(&self) -> Sidebar {
        self.state.load().ui.current_sidebar
    }

    pub fn is_mobile(&self) -> bool {
        self.state.load().ui.is_mobile
    }

    pub fn ui_element(&self, name: &str) -> Option<ElementHandle> {
        self.state.load().ui.elements.get(name).cloned()
    }

    pub fn visible_features(&self) -> Arc<IndexMap<EntityId, Arc<Feature>>> {
        Arc::clone(&self.state.load().cache.visible_features)
    }

    pub fn visible_feature(&self, id: &str) -> Option<Arc<Feature>> {
        self.state.load().cache.visible_features.get(id).cloned()
    }

    pub fn open_popups(&self) -> Arc<Vec<PopupId>> {
        Arc::clone(&self.state.load().ui.open_popups)
    }

    // ── Single-entity lookups ────────────────────────────────────────

    pub fn get_beach_by_id(&self, id: &str) -> Option<Arc<DetailRecord>> {
        self.state.load().cache.beaches.get(id).cloned()
    }

    pub fn get_poi_by_id(&self, id: &str) -> Option<Arc<DetailRecord>> {
        self.state.load().cache.pois.get(id).cloned()
    }

    pub fn weather(&self, id: &str) -> Option<Arc<WeatherSnapshot>> {
        self.state
            .load()
            .cache
            .weather
            .get(id)
            .map(|entry| Arc::clone(&entry.snapshot))
    }

    /// Generation of the cached weather entry for `id`.
    pub fn weather_generation(&self, id: &str) -> Option<u64> {
        self.state.load().cache.weather.get(id).map(|e| e.generation)
    }

    // ── Subscriptions ────────────────────────────────────────────────

    /// Watch the state for async consumers. Intermediate revisions may
    /// be coalesced; use the bus to observe every transition.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.changes.subscribe())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.load())
            .finish_non_exhaustive()
    }
}
