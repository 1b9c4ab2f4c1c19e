// ── Map controller ──
//
// Owns the map engine. Raw interactions (clicks, hovers, camera moves,
// popup clicks) come in through `handle`; camera and popup commands come
// in over the bus. The viewport list is rebuilt from rendered features
// whenever the camera settles while the list panel is showing.

mod cities;
mod engine;
mod popup;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use cities::city_image;
pub use engine::{
    BEACH_LAYER, CALIFORNIA_FILL_LAYER, CameraMove, Cursor, HAWAII_FILL_LAYER, INTERACTIVE_LAYERS,
    MapEngine, MapOptions, POI_LAYER, REGION_LAYER, STATE_LAYER,
};
pub use popup::{PopupButton, PopupContent};

use crate::bus::{BusEvent, ShowPopupCommand, Subscription, Topic};
use crate::config::MapSettings;
use crate::debounce::Debouncer;
use crate::error::CoreError;
use crate::executor::{ActionController, InteractionContext};
use crate::model::{DetailRecord, EntityType, Feature};
use crate::store::{Action, MapHandle, PopupId, Sidebar, Store};
use crate::ui::FeatureListView;

static NEXT_MAP_HANDLE: AtomicU64 = AtomicU64::new(1);

/// A raw interaction reported by the engine binding.
#[derive(Debug, Clone)]
pub enum MapInteraction {
    /// Click on the interactive layers. `features` is topmost first.
    Click { features: Vec<Feature> },
    /// Pointer moved over the interactive layers.
    Hover { features: Vec<Feature> },
    /// Pointer left the interactive layers.
    Leave,
    /// The camera settled after a pan, zoom or flight.
    MoveEnd,
    /// A popup was closed by the user.
    PopupClosed(PopupId),
    /// A popup body was clicked. `on_link` is set when the click hit a
    /// link inside it.
    PopupClicked { popup: PopupId, on_link: bool },
}

/// Recipe and entity type a click on `layer` triggers.
pub fn click_route(layer: &str) -> Option<(&'static str, EntityType)> {
    match layer {
        BEACH_LAYER => Some(("selectBeachFromMap", EntityType::Beach)),
        POI_LAYER => Some(("selectPOIFromMap", EntityType::Poi)),
        REGION_LAYER => Some(("selectRegion", EntityType::Region)),
        STATE_LAYER => Some(("selectState", EntityType::State)),
        _ => None,
    }
}

#[derive(Clone)]
pub struct MapController {
    inner: Arc<MapInner>,
}

struct PopupOrigin {
    feature: Arc<Feature>,
    entity_type: Option<EntityType>,
}

struct MapInner {
    engine: Arc<dyn MapEngine>,
    store: Arc<Store>,
    actions: Arc<ActionController>,
    list: FeatureListView,
    settings: MapSettings,
    hovered: Mutex<Option<Feature>>,
    popups: Mutex<HashMap<PopupId, PopupOrigin>>,
    move_end: Debouncer,
    cancel: CancellationToken,
    subscriptions: Mutex<Vec<Subscription>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MapController {
    /// Construct the engine and the controller around it.
    ///
    /// `build` receives the start options; its failure is reported as
    /// [`CoreError::MapInit`]. The controller stays inert until
    /// [`on_load`](Self::on_load).
    pub fn init<F>(
        store: Arc<Store>,
        actions: Arc<ActionController>,
        list: FeatureListView,
        settings: MapSettings,
        cancel: CancellationToken,
        build: F,
    ) -> Result<Self, CoreError>
    where
        F: FnOnce(&MapOptions) -> Result<Arc<dyn MapEngine>, CoreError>,
    {
        let options = MapOptions {
            center: settings.start_position(store.is_mobile()),
            zoom: settings.default_zoom,
            pitch: settings.start_pitch,
            allow_rotation: settings.allow_rotation,
        };
        let engine = build(&options).map_err(|e| match e {
            CoreError::MapInit { .. } => e,
            other => CoreError::MapInit {
                reason: other.to_string(),
            },
        })?;

        let move_end = Debouncer::new(settings.move_debounce, cancel.child_token());
        Ok(Self {
            inner: Arc::new(MapInner {
                engine,
                store,
                actions,
                list,
                settings,
                hovered: Mutex::new(None),
                popups: Mutex::new(HashMap::new()),
                move_end,
                cancel,
                subscriptions: Mutex::new(Vec::new()),
            }),
        })
    }

    /// The engine finished loading: record it and start listening.
    pub fn on_load(&self) {
        if self.inner.store.map().is_some() {
            return;
        }
        let handle = MapHandle(NEXT_MAP_HANDLE.fetch_add(1, Ordering::Relaxed));
        self.inner.store.dispatch(Action::SetMapInstance(handle));
        self.subscribe();
        info!(map = handle.0, "map initialized");
    }

    fn subscribe(&self) {
        let bus = self.inner.store.bus();
        let weak = Arc::downgrade(&self.inner);
        let subs = vec![
            bus.subscribe(Topic::MapFlyTo, handler(&weak, |map, event| {
                if let BusEvent::MapFlyTo(cmd) = event {
                    map.fly_to(CameraMove {
                        center: cmd.coordinates,
                        zoom: cmd.zoom.unwrap_or(map.settings.detail_zoom),
                        speed: cmd.speed.unwrap_or(map.settings.fly_speed),
                    });
                }
            })),
            bus.subscribe(Topic::MapZoomTo, handler(&weak, |map, event| {
                if let BusEvent::MapZoomTo(cmd) = event {
                    map.zoom_to(cmd.zoom, cmd.speed.unwrap_or(map.settings.zoom_speed));
                }
            })),
            bus.subscribe(Topic::MapShowPopup, {
                let weak = Weak::clone(&weak);
                move |event| {
                    if let BusEvent::MapShowPopup(cmd) = event {
                        schedule_popup(&weak, cmd.clone());
                    }
                    Ok(())
                }
            }),
            bus.subscribe(Topic::MapCloseAllPopups, handler(&weak, |map, _| {
                map.close_all_popups();
            })),
        ];
        lock(&self.inner.subscriptions).extend(subs);
    }

    /// Feed one raw interaction.
    pub fn handle(&self, interaction: MapInteraction) {
        match interaction {
            MapInteraction::Click { features } => self.inner.click(features),
            MapInteraction::Hover { features } => self.inner.hover(features),
            MapInteraction::Leave => self.inner.leave(),
            MapInteraction::MoveEnd => {
                let weak = Arc::downgrade(&self.inner);
                self.inner.move_end.call(move || {
                    if let Some(map) = weak.upgrade() {
                        map.on_move_end();
                    }
                });
            }
            MapInteraction::PopupClosed(popup) => self.inner.popup_closed(popup),
            MapInteraction::PopupClicked { popup, on_link } => {
                self.inner.popup_clicked(popup, on_link);
            }
        }
    }

    /// Rebuild the viewport list now. Returns the number of rows.
    pub fn update_sidebar_list(&self) -> usize {
        self.inner.update_sidebar_list()
    }

    pub fn show_popup(
        &self,
        feature: Arc<Feature>,
        details: Option<&DetailRecord>,
        entity_type: Option<EntityType>,
    ) -> Option<PopupId> {
        self.inner.show_popup(feature, details, entity_type)
    }

    pub fn close_all_popups(&self) {
        self.inner.close_all_popups();
    }

    pub fn engine(&self) -> &Arc<dyn MapEngine> {
        &self.inner.engine
    }

    /// Stop listening and drop pending timers.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.move_end.cancel();
        for sub in lock(&self.inner.subscriptions).drain(..) {
            sub.unsubscribe();
        }
    }
}

fn handler(
    weak: &Weak<MapInner>,
    f: impl Fn(&MapInner, &BusEvent) + Send + Sync + 'static,
) -> impl Fn(&BusEvent) -> Result<(), CoreError> + Send + Sync + 'static {
    let weak = Weak::clone(weak);
    move |event| {
        if let Some(map) = weak.upgrade() {
            f(&map, event);
        }
        Ok(())
    }
}

// A delayed popup opens after the step that requested it returns, so the
// camera flight it accompanies has already started.
fn schedule_popup(weak: &Weak<MapInner>, cmd: ShowPopupCommand) {
    let delay = cmd.delay.unwrap_or(Duration::ZERO);
    let runtime = tokio::runtime::Handle::try_current().ok();
    let (Some(runtime), false) = (runtime, delay.is_zero()) else {
        if let Some(map) = weak.upgrade() {
            map.show_popup(cmd.feature, cmd.details.as_deref(), cmd.entity_type);
        }
        return;
    };

    let Some(cancel) = weak.upgrade().map(|m| m.cancel.clone()) else {
        return;
    };
    let weak = Weak::clone(weak);
    runtime.spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(delay) => {
                if let Some(map) = weak.upgrade() {
                    map.show_popup(cmd.feature, cmd.details.as_deref(), cmd.entity_type);
                }
            }
        }
    });
}

impl MapInner {
    // ── Camera ───────────────────────────────────────────────────────

    fn fly_to(&self, camera: CameraMove) {
        if self.store.map().is_none() {
            debug!("no map instance, ignoring flyTo");
            return;
        }
        debug!(center = %camera.center, zoom = camera.zoom, "fly to");
        self.engine.fly_to(&camera);
    }

    fn zoom_to(&self, zoom: Option<f64>, speed: f64) {
        if self.store.map().is_none() {
            debug!("no map instance, ignoring zoomTo");
            return;
        }
        self.engine.ease_to(zoom, speed);
    }

    // ── Pointer ──────────────────────────────────────────────────────

    fn click(&self, features: Vec<Feature>) {
        let Some(feature) = features.into_iter().next() else {
            return;
        };
        let Some((recipe, entity_type)) = feature.layer.as_deref().and_then(click_route) else {
            debug!(layer = ?feature.layer, "click on non-selectable layer");
            return;
        };
        self.actions.execute(
            recipe,
            InteractionContext::for_feature(Arc::new(feature), entity_type),
        );
    }

    fn hover(&self, features: Vec<Feature>) {
        let Some(feature) = features.into_iter().next() else {
            return;
        };
        self.engine.set_cursor(Cursor::Pointer);

        let mut hovered = lock(&self.hovered);
        if hovered.as_ref().is_some_and(|h| h.id == feature.id) {
            return;
        }
        if let Some(previous) = hovered.take() {
            self.engine.set_feature_state(&previous, false);
        }
        self.engine.set_feature_state(&feature, true);
        *hovered = Some(feature);
    }

    fn leave(&self) {
        if let Some(previous) = lock(&self.hovered).take() {
            self.engine.set_feature_state(&previous, false);
        }
        self.engine.set_cursor(Cursor::Default);
    }

    // ── Viewport list ────────────────────────────────────────────────

    fn on_move_end(&self) {
        let sidebar = self.store.current_sidebar();
        if sidebar != Sidebar::List {
            debug!(%sidebar, "list not showing, skipping refresh");
            return;
        }
        self.update_sidebar_list();
    }

    fn update_sidebar_list(&self) -> usize {
        if self.store.map().is_none() {
            return 0;
        }

        let beaches = self.engine.query_rendered_features(BEACH_LAYER);
        if !beaches.is_empty() {
            debug!(count = beaches.len(), "beaches in view");
            return self.list.render(beaches, EntityType::Beach);
        }

        let pois = self.engine.query_rendered_features(POI_LAYER);
        if !pois.is_empty() {
            debug!(count = pois.len(), "POIs in view");
            return self.list.render(pois, EntityType::Poi);
        }

        let regions = self.engine.query_rendered_features(REGION_LAYER);
        if !regions.is_empty() {
            debug!(count = regions.len(), "regions in view");
            let regions = self.with_cluster_sizes(regions);
            return self.list.render(regions, EntityType::Region);
        }

        let states = self.engine.query_rendered_features(STATE_LAYER);
        if !states.is_empty() {
            debug!(count = states.len(), "states in view");
            return self.list.render(states, EntityType::State);
        }

        debug!("nothing in view, clearing list");
        self.list.render(Vec::new(), EntityType::Beach)
    }

    // Every region row shows how many points it covers and the city's
    // cover image when one is known.
    fn with_cluster_sizes(&self, mut regions: Vec<Feature>) -> Vec<Feature> {
        let source = regions
            .first()
            .and_then(|f| f.source.clone())
            .unwrap_or_default();

        for region in &mut regions {
            let is_cluster = matches!(region.property("cluster"), Some(Value::Bool(true)));
            let count = if is_cluster {
                let cluster_id = region.property("cluster_id").and_then(Value::as_i64);
                match cluster_id.map(|id| self.engine.cluster_leaf_count(&source, id)) {
                    Some(Ok(leaves)) => json!(leaves),
                    Some(Err(e)) => {
                        error!(error = %e, "could not get cluster leaves");
                        abbreviated_count(region)
                    }
                    None => abbreviated_count(region),
                }
            } else {
                json!(1)
            };
            region.properties.insert("point_count".into(), count);

            if let Some(image) = region.text("name").and_then(|n| city_image(&n)) {
                region.properties.insert("Image".into(), Value::String(image));
            }
        }
        regions
    }

    // ── Popups ───────────────────────────────────────────────────────

    fn show_popup(
        &self,
        feature: Arc<Feature>,
        details: Option<&DetailRecord>,
        entity_type: Option<EntityType>,
    ) -> Option<PopupId> {
        let Some(at) = feature.anchor() else {
            warn!("feature has no position, cannot open popup");
            return None;
        };
        let content = PopupContent::build(&feature, details, entity_type);
        let popup = self
            .engine
            .open_popup(&content, at, self.settings.popup_offset);
        lock(&self.popups).insert(popup, PopupOrigin { feature, entity_type });
        self.store.dispatch(Action::AddOpenPopup(popup));
        debug!(%popup, "popup opened");
        Some(popup)
    }

    fn popup_closed(&self, popup: PopupId) {
        lock(&self.popups).remove(&popup);
        self.store.dispatch(Action::RemoveOpenPopup(popup));
    }

    fn popup_clicked(&self, popup: PopupId, on_link: bool) {
        if on_link {
            return;
        }
        let origin = {
            let popups = lock(&self.popups);
            let Some(origin) = popups.get(&popup) else {
                debug!(%popup, "click on unknown popup");
                return;
            };
            if origin.entity_type == Some(EntityType::Poi) {
                return;
            }
            Arc::clone(&origin.feature)
        };
        self.actions.execute(
            "selectBeachFromPopup",
            InteractionContext::for_feature(origin, EntityType::Beach),
        );
        self.engine.remove_popup(popup);
        self.popup_closed(popup);
    }

    fn close_all_popups(&self) {
        for popup in self.store.open_popups().iter() {
            self.engine.remove_popup(*popup);
        }
        lock(&self.popups).clear();
        self.store.dispatch(Action::ClearOpenPopups);
    }
}

fn abbreviated_count(region: &Feature) -> Value {
    region
        .property("point_count_abbreviated")
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| json!(1))
}
