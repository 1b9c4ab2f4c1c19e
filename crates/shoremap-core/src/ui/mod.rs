// ── Sidebar UI ──
//
// Presentation side of the map. `UiController` reacts to bus commands
// and selection changes; the views turn state into view models and hand
// them to a `SidebarSurface`, which owns the actual widgets.

mod detail;
mod list;
mod responsive;

use std::sync::{Arc, Mutex, PoisonError, Weak};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

pub use detail::{DetailView, DetailViewModel};
pub use list::{FeatureListView, ListItem, NO_ITEMS_MESSAGE, PLACEHOLDER_IMAGE, list_action};
pub use responsive::ResponsiveService;

use crate::bus::{BusEvent, Subscription, Topic};
use crate::error::CoreError;
use crate::executor::{ActionController, ExecutionReport, TriggerTarget};
use crate::store::{Action, ElementHandle, SelectedEntity, Sidebar, Store, UiPatch};

// ── Anchors ──────────────────────────────────────────────────────────

/// A named insertion point the page declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub name: &'static str,
    pub selector: &'static str,
}

pub const MAP_CONTAINER: Anchor = Anchor {
    name: "MAP_CONTAINER",
    selector: "#map-container",
};
pub const SIDEBAR_WRAPPER: Anchor = Anchor {
    name: "SIDEBAR_WRAPPER",
    selector: "[sidebar=\"wrapper\"]",
};
pub const SIDEBAR_HOME: Anchor = Anchor {
    name: "SIDEBAR_HOME",
    selector: "[sidebar=\"home\"]",
};
pub const SIDEBAR_BEACH_LIST: Anchor = Anchor {
    name: "SIDEBAR_BEACH_LIST",
    selector: "[sidebar=\"beach-list\"]",
};
pub const SIDEBAR_BEACH: Anchor = Anchor {
    name: "SIDEBAR_BEACH",
    selector: "[sidebar=\"beach\"]",
};
pub const SIDEBAR_MAP: Anchor = Anchor {
    name: "SIDEBAR_MAP",
    selector: "[sidebar=\"map\"]",
};
pub const BEACH_LIST_CONTAINER: Anchor = Anchor {
    name: "BEACH_LIST_CONTAINER",
    selector: ".beach-list_list",
};

/// Every anchor located at startup.
pub const ANCHORS: &[Anchor] = &[
    MAP_CONTAINER,
    SIDEBAR_WRAPPER,
    SIDEBAR_HOME,
    SIDEBAR_BEACH_LIST,
    SIDEBAR_BEACH,
    SIDEBAR_MAP,
    BEACH_LIST_CONTAINER,
];

/// Shown in the map container when the engine cannot be constructed.
pub const MAP_LOAD_ERROR: &str =
    "Failed to load map. Please check your connection and try again.";

// ── Surface ──────────────────────────────────────────────────────────

/// The widget layer the sidebar renders into.
pub trait SidebarSurface: Send + Sync {
    /// Resolve a selector to an element, if the page has one.
    fn locate(&self, selector: &str) -> Option<ElementHandle>;

    fn set_visible(&self, element: &ElementHandle, visible: bool);

    fn is_visible(&self, element: &ElementHandle) -> bool;

    /// Replace the container's children with `items`.
    fn render_list(&self, container: &ElementHandle, items: &[ListItem]);

    /// Replace the container's children with a message.
    fn render_placeholder(&self, container: &ElementHandle, message: &str);

    fn render_detail(&self, panel: &ElementHandle, view: &DetailViewModel);

    /// Replace the element's content with an inline error.
    fn show_error(&self, element: &ElementHandle, message: &str);
}

// ── UiController ─────────────────────────────────────────────────────

/// Coordinates sidebar panels and routes UI triggers to recipes.
#[derive(Clone)]
pub struct UiController {
    inner: Arc<UiInner>,
}

struct UiInner {
    store: Arc<Store>,
    surface: Arc<dyn SidebarSurface>,
    actions: Arc<ActionController>,
    detail: DetailView,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl UiController {
    pub fn new(
        store: Arc<Store>,
        surface: Arc<dyn SidebarSurface>,
        actions: Arc<ActionController>,
    ) -> Self {
        let detail = DetailView::new(Arc::clone(&store), Arc::clone(&surface));
        Self {
            inner: Arc::new(UiInner {
                store,
                surface,
                actions,
                detail,
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Locate anchors and start listening on the bus.
    pub fn init(&self) {
        info!("initializing sidebar");
        self.cache_elements();
        self.subscribe();
    }

    /// Resolve every anchor once and store the handles.
    pub fn cache_elements(&self) {
        let mut elements = IndexMap::new();
        for anchor in ANCHORS {
            match self.inner.surface.locate(anchor.selector) {
                Some(handle) => {
                    elements.insert(anchor.name.to_owned(), handle);
                }
                None => warn!(selector = anchor.selector, "element not found"),
            }
        }
        self.inner
            .store
            .dispatch(Action::SetUiState(UiPatch::elements(elements)));
    }

    fn subscribe(&self) {
        let bus = self.inner.store.bus();
        let weak = Arc::downgrade(&self.inner);
        let subs = vec![
            bus.subscribe(Topic::StateSelectionChanged, handler(&weak, |ui, event| {
                if let BusEvent::StateSelectionChanged(change) = event {
                    ui.on_selection_changed(change.selection.as_ref());
                }
            })),
            bus.subscribe(Topic::UiSidebarRequested, handler(&weak, |ui, event| {
                if let BusEvent::UiSidebarRequested(req) = event {
                    ui.show_sidebar(req.sidebar);
                }
            })),
            bus.subscribe(Topic::UiFullscreenToggled, handler(&weak, |ui, _| {
                ui.toggle_fullscreen();
            })),
            bus.subscribe(Topic::UiViewChanged, handler(&weak, |ui, _| {
                ui.show_sidebar(ui.store.current_sidebar());
            })),
        ];
        lock(&self.inner.subscriptions).extend(subs);
    }

    /// Run the recipe an activated element is bound to.
    pub fn trigger(&self, target: TriggerTarget) -> Option<ExecutionReport> {
        let name = target.action.clone()?;
        debug!(action = %name, "ui trigger");
        Some(
            self.inner
                .actions
                .execute(&name, crate::executor::InteractionContext::for_target(target)),
        )
    }

    pub fn show_sidebar(&self, sidebar: Sidebar) {
        self.inner.show_sidebar(sidebar);
    }

    pub fn toggle_fullscreen(&self) {
        self.inner.toggle_fullscreen();
    }

    pub fn detail(&self) -> &DetailView {
        &self.inner.detail
    }

    /// Re-renders the detail panel while the controller is alive.
    pub(crate) fn detail_refresher(&self) -> impl Fn() + Send + Sync + 'static {
        let weak = Arc::downgrade(&self.inner);
        move || {
            if let Some(ui) = weak.upgrade() {
                ui.detail.update();
            }
        }
    }

    /// Stop reacting to bus events.
    pub fn shutdown(&self) {
        for sub in lock(&self.inner.subscriptions).drain(..) {
            sub.unsubscribe();
        }
    }
}

fn handler(
    weak: &Weak<UiInner>,
    f: impl Fn(&UiInner, &BusEvent) + Send + Sync + 'static,
) -> impl Fn(&BusEvent) -> Result<(), CoreError> + Send + Sync + 'static {
    let weak = Weak::clone(weak);
    move |event| {
        if let Some(ui) = weak.upgrade() {
            f(&ui, event);
        }
        Ok(())
    }
}

fn lock(subs: &Mutex<Vec<Subscription>>) -> std::sync::MutexGuard<'_, Vec<Subscription>> {
    subs.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UiInner {
    fn element(&self, anchor: Anchor) -> Option<ElementHandle> {
        self.store.ui_element(anchor.name)
    }

    fn set_visible(&self, anchor: Anchor, visible: bool) {
        if let Some(el) = self.element(anchor) {
            self.surface.set_visible(&el, visible);
        }
    }

    fn on_selection_changed(&self, selection: Option<&SelectedEntity>) {
        match selection {
            Some(sel) if sel.entity_type.has_detail() => {
                self.detail.update();
            }
            _ => {
                if self.store.current_sidebar() == Sidebar::Detail {
                    self.show_sidebar(Sidebar::List);
                }
            }
        }
    }

    fn show_sidebar(&self, sidebar: Sidebar) {
        debug!(%sidebar, "show sidebar");
        self.store
            .dispatch(Action::SetUiState(UiPatch::sidebar(sidebar)));

        let Some(wrapper) = self.element(SIDEBAR_WRAPPER) else {
            return;
        };
        for panel in [SIDEBAR_HOME, SIDEBAR_BEACH_LIST, SIDEBAR_BEACH] {
            self.set_visible(panel, false);
        }
        let target = match sidebar {
            Sidebar::Home => SIDEBAR_HOME,
            Sidebar::List => SIDEBAR_BEACH_LIST,
            Sidebar::Detail => SIDEBAR_BEACH,
        };
        self.set_visible(target, true);
        self.surface.set_visible(&wrapper, true);

        // On mobile the sidebar covers the map.
        self.set_visible(SIDEBAR_MAP, !self.store.is_mobile());
    }

    fn toggle_fullscreen(&self) {
        let wrapper = self.element(SIDEBAR_WRAPPER);
        if self.store.is_mobile() {
            let map_hidden = self
                .element(SIDEBAR_MAP)
                .is_some_and(|m| !self.surface.is_visible(&m));
            if map_hidden {
                self.set_visible(SIDEBAR_MAP, true);
                if let Some(wrapper) = wrapper {
                    self.surface.set_visible(&wrapper, false);
                }
            } else {
                self.show_sidebar(self.store.current_sidebar());
            }
        } else {
            if let Some(wrapper) = wrapper {
                let visible = self.surface.is_visible(&wrapper);
                self.surface.set_visible(&wrapper, !visible);
            }
            self.set_visible(SIDEBAR_MAP, true);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::bus::EventBus;
    use crate::config::MapSettings;
    use crate::headless::HeadlessSurface;
    use crate::model::{DetailRecord, EntityId, EntityType};
    use crate::recipe::RecipeTable;
    use crate::store::SelectionPayload;

    struct Harness {
        store: Arc<Store>,
        surface: Arc<HeadlessSurface>,
        ui: UiController,
    }

    fn harness(surface: HeadlessSurface) -> Harness {
        let store = Arc::new(Store::new(EventBus::new()));
        let surface = Arc::new(surface);
        let actions = Arc::new(ActionController::new(
            Arc::clone(&store),
            Arc::new(RecipeTable::builtin()),
            MapSettings::default(),
        ));
        let ui = UiController::new(
            Arc::clone(&store),
            Arc::clone(&surface) as Arc<dyn SidebarSurface>,
            actions,
        );
        ui.init();
        Harness { store, surface, ui }
    }

    fn select(store: &Store, id: &str, entity_type: EntityType) {
        store.dispatch(Action::SetSelection(SelectionPayload {
            id: EntityId::new(id),
            entity_type,
            feature: None,
        }));
    }

    #[test]
    fn caches_located_anchors_and_skips_missing() {
        let h = harness(HeadlessSurface::without([SIDEBAR_MAP.selector]));
        let elements = h.store.get_state().ui.elements.clone();
        assert_eq!(elements.len(), ANCHORS.len() - 1);
        assert!(h.store.ui_element("SIDEBAR_MAP").is_none());
        assert!(h.store.ui_element("MAP_CONTAINER").is_some());
    }

    #[test]
    fn sidebar_request_shows_exactly_one_panel() {
        let h = harness(HeadlessSurface::new());
        h.store.bus().publish(&BusEvent::UiSidebarRequested(
            crate::bus::SidebarRequest {
                sidebar: Sidebar::List,
            },
        ));

        assert_eq!(h.store.current_sidebar(), Sidebar::List);
        assert!(h.surface.visible(SIDEBAR_BEACH_LIST.selector));
        assert!(!h.surface.visible(SIDEBAR_HOME.selector));
        assert!(!h.surface.visible(SIDEBAR_BEACH.selector));
        assert!(h.surface.visible(SIDEBAR_WRAPPER.selector));
        assert!(h.surface.visible(SIDEBAR_MAP.selector));
    }

    #[test]
    fn mobile_sidebar_hides_map() {
        let h = harness(HeadlessSurface::new());
        h.store.dispatch(Action::SetUiState(UiPatch::mobile(true)));
        h.ui.show_sidebar(Sidebar::Home);
        assert!(!h.surface.visible(SIDEBAR_MAP.selector));
    }

    #[test]
    fn clearing_selection_leaves_detail_for_list() {
        let h = harness(HeadlessSurface::new());
        h.ui.show_sidebar(Sidebar::Detail);
        select(&h.store, "b-1", EntityType::Beach);
        assert_eq!(h.store.current_sidebar(), Sidebar::Detail);

        h.store.dispatch(Action::ClearSelection);
        assert_eq!(h.store.current_sidebar(), Sidebar::List);
    }

    #[test]
    fn selecting_a_region_leaves_detail_for_list() {
        let h = harness(HeadlessSurface::new());
        h.ui.show_sidebar(Sidebar::Detail);
        select(&h.store, "Los Angeles", EntityType::Region);
        assert_eq!(h.store.current_sidebar(), Sidebar::List);
    }

    #[test]
    fn beach_selection_renders_detail() {
        let h = harness(HeadlessSurface::new());
        let mut fields = Map::new();
        fields.insert("name".into(), json!("Crystal Cove"));
        h.store
            .dispatch(Action::SetAllBeachData(vec![DetailRecord::new("b-1", fields)]));

        select(&h.store, "b-1", EntityType::Beach);

        let view = h.surface.last_detail().unwrap();
        assert_eq!(view.get("title"), Some("Crystal Cove"));
    }

    #[test]
    fn desktop_fullscreen_toggles_wrapper() {
        let h = harness(HeadlessSurface::new());
        h.ui.show_sidebar(Sidebar::Home);
        h.store.bus().publish(&BusEvent::UiFullscreenToggled);
        assert!(!h.surface.visible(SIDEBAR_WRAPPER.selector));
        h.store.bus().publish(&BusEvent::UiFullscreenToggled);
        assert!(h.surface.visible(SIDEBAR_WRAPPER.selector));
    }

    #[test]
    fn mobile_fullscreen_swaps_map_and_sidebar() {
        let h = harness(HeadlessSurface::new());
        h.store.dispatch(Action::SetUiState(UiPatch::mobile(true)));
        h.ui.show_sidebar(Sidebar::List);
        assert!(!h.surface.visible(SIDEBAR_MAP.selector));

        assert!(h.surface.visible(SIDEBAR_WRAPPER.selector));

        h.ui.toggle_fullscreen();
        assert!(h.surface.visible(SIDEBAR_MAP.selector));
        assert!(!h.surface.visible(SIDEBAR_WRAPPER.selector));

        h.ui.toggle_fullscreen();
        assert!(!h.surface.visible(SIDEBAR_MAP.selector));
        assert!(h.surface.visible(SIDEBAR_WRAPPER.selector));
    }

    #[test]
    fn trigger_runs_bound_recipe() {
        let h = harness(HeadlessSurface::new());
        let report = h
            .ui
            .trigger(TriggerTarget {
                action: Some("navigateToList".into()),
                ..TriggerTarget::default()
            })
            .unwrap();
        assert_eq!(report.steps_run, 1);
        assert_eq!(h.store.current_sidebar(), Sidebar::List);
    }

    #[test]
    fn shutdown_stops_reacting() {
        let h = harness(HeadlessSurface::new());
        h.ui.shutdown();
        h.store.bus().publish(&BusEvent::UiSidebarRequested(
            crate::bus::SidebarRequest {
                sidebar: Sidebar::Detail,
            },
        ));
        assert_eq!(h.store.current_sidebar(), Sidebar::Home);
    }
}
