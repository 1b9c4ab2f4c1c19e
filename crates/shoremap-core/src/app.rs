// ── App ──
//
// Wires the store, the recipe executor, the sidebar, the map and the
// data controller together in startup order. A binding (or the CLI)
// owns one `App` for the lifetime of the page.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::bus::{BusEvent, EventBus, Subscription, Topic};
use crate::config::AppConfig;
use crate::data::{CollectionSource, DataController, PrefetchReport};
use crate::error::CoreError;
use crate::executor::{ActionController, ExecutionReport, InteractionContext};
use crate::map::{MapController, MapEngine, MapOptions};
use crate::model::{EntityId, EntityType};
use crate::recipe::RecipeTable;
use crate::store::Store;
use crate::ui::{
    FeatureListView, MAP_CONTAINER, MAP_LOAD_ERROR, ResponsiveService, SidebarSurface,
    UiController,
};

/// Everything `App::start` needs besides the map engine.
pub struct StartOptions<S> {
    pub config: AppConfig,
    pub recipes: RecipeTable,
    pub source: S,
    pub surface: Arc<dyn SidebarSurface>,
    /// Viewport width at startup, in px.
    pub viewport_width: u32,
}

/// The running map application.
///
/// Cheaply cloneable via `Arc<AppInner>`.
pub struct App<S> {
    inner: Arc<AppInner<S>>,
}

impl<S> Clone for App<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct AppInner<S> {
    config: AppConfig,
    cancel: CancellationToken,
    store: Arc<Store>,
    actions: Arc<ActionController>,
    ui: UiController,
    map: MapController,
    responsive: ResponsiveService,
    data: Arc<DataController<S>>,
    prefetch: PrefetchReport,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl<S: CollectionSource + 'static> App<S> {
    /// Bring every component up.
    ///
    /// The sidebar is initialized first so the layout classification
    /// below reaches it, then the map engine is built at the start
    /// position for that layout. A map build failure shows
    /// [`MAP_LOAD_ERROR`] in the map container and stops startup there.
    /// The map is inert until its binding calls
    /// [`MapController::on_load`].
    pub async fn start<F>(options: StartOptions<S>, build_map: F) -> Result<Self, CoreError>
    where
        F: FnOnce(&MapOptions) -> Result<Arc<dyn MapEngine>, CoreError>,
    {
        let StartOptions {
            config,
            recipes,
            source,
            surface,
            viewport_width,
        } = options;
        info!(recipes = recipes.len(), viewport_width, "starting map application");

        let cancel = CancellationToken::new();
        let store = Arc::new(Store::new(EventBus::new()));
        let actions = Arc::new(ActionController::new(
            Arc::clone(&store),
            Arc::new(recipes),
            config.map.clone(),
        ));

        let ui = UiController::new(Arc::clone(&store), Arc::clone(&surface), Arc::clone(&actions));
        ui.init();

        let responsive =
            ResponsiveService::new(Arc::clone(&store), config.map.clone(), cancel.child_token());
        responsive.update_layout(viewport_width);

        let list = FeatureListView::new(Arc::clone(&store), Arc::clone(&surface));
        let map = match MapController::init(
            Arc::clone(&store),
            Arc::clone(&actions),
            list,
            config.map.clone(),
            cancel.child_token(),
            build_map,
        ) {
            Ok(map) => map,
            Err(e) => {
                error!(error = %e, "map initialization failed");
                if let Some(container) = store.ui_element(MAP_CONTAINER.name) {
                    surface.show_error(&container, MAP_LOAD_ERROR);
                }
                ui.shutdown();
                cancel.cancel();
                return Err(e);
            }
        };

        let data = Arc::new(DataController::new(
            source,
            Arc::clone(&store),
            config.cache.clone(),
            cancel.child_token(),
        ));
        let prefetch = data.init().await;

        let weather = subscribe_weather(&store, &data, ui.detail_refresher());

        info!(
            beaches = prefetch.beaches,
            pois = prefetch.pois,
            "map application ready"
        );
        Ok(Self {
            inner: Arc::new(AppInner {
                config,
                cancel,
                store,
                actions,
                ui,
                map,
                responsive,
                data,
                prefetch,
                subscriptions: Mutex::new(vec![weather]),
            }),
        })
    }
}

impl<S> App<S> {
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    pub fn bus(&self) -> &EventBus {
        self.inner.store.bus()
    }

    pub fn actions(&self) -> &Arc<ActionController> {
        &self.inner.actions
    }

    pub fn ui(&self) -> &UiController {
        &self.inner.ui
    }

    pub fn map(&self) -> &MapController {
        &self.inner.map
    }

    pub fn responsive(&self) -> &ResponsiveService {
        &self.inner.responsive
    }

    pub fn data(&self) -> &Arc<DataController<S>> {
        &self.inner.data
    }

    /// What the startup prefetch loaded.
    pub fn prefetch(&self) -> PrefetchReport {
        self.inner.prefetch
    }

    /// Run a recipe by name.
    pub fn execute(&self, recipe: &str, context: InteractionContext) -> ExecutionReport {
        self.inner.actions.execute(recipe, context)
    }

    /// Stop every component: bus handlers, debouncers and pending timers.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.map.shutdown();
        self.inner.ui.shutdown();
        for sub in self
            .inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
        {
            sub.unsubscribe();
        }
        debug!("map application stopped");
    }
}

// Selecting a beach whose readings are not cached fetches them and
// re-renders the panel, provided the beach is still selected by then.
fn subscribe_weather<S: CollectionSource + 'static>(
    store: &Arc<Store>,
    data: &Arc<DataController<S>>,
    refresh_detail: impl Fn() + Send + Sync + 'static,
) -> Subscription {
    let data: Weak<DataController<S>> = Arc::downgrade(data);
    let refresh_detail = Arc::new(refresh_detail);
    store.bus().subscribe(Topic::StateSelectionChanged, move |event| {
        let BusEvent::StateSelectionChanged(change) = event else {
            return Ok(());
        };
        let Some(selection) = &change.selection else {
            return Ok(());
        };
        if selection.entity_type != EntityType::Beach {
            return Ok(());
        }
        let Some(data) = data.upgrade() else {
            return Ok(());
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime, skipping weather fetch");
            return Ok(());
        };

        let id = selection.id.clone();
        let refresh_detail = Arc::clone(&refresh_detail);
        runtime.spawn(async move {
            if data.weather(id.as_str()).await.is_none() {
                return;
            }
            if !still_selected(&data, &id) {
                return;
            }
            refresh_detail();
        });
        Ok(())
    })
}

fn still_selected<S>(data: &DataController<S>, id: &EntityId) -> bool {
    data.store()
        .current_selection()
        .is_some_and(|s| s.is(id, EntityType::Beach))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    use super::*;
    use crate::data::{CannedSource, fallback_beaches, fallback_pois};
    use crate::headless::{HeadlessMap, HeadlessSurface};
    use crate::model::{DetailRecord, Feature, ITEM_ID, LngLat, WeatherSnapshot};
    use crate::store::Sidebar;

    #[derive(Default)]
    struct WeatherSource {
        calls: AtomicUsize,
    }

    impl CollectionSource for WeatherSource {
        async fn beaches(&self) -> Result<Vec<DetailRecord>, CoreError> {
            Ok(fallback_beaches())
        }

        async fn pois(&self) -> Result<Vec<DetailRecord>, CoreError> {
            Ok(fallback_pois())
        }

        async fn weather(&self, _id: &str) -> Result<WeatherSnapshot, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut readings = Map::new();
            readings.insert("humidity".into(), json!(70));
            Ok(WeatherSnapshot(readings))
        }
    }

    fn options<S>(source: S, surface: &Arc<HeadlessSurface>, width: u32) -> StartOptions<S> {
        StartOptions {
            config: AppConfig::default(),
            recipes: RecipeTable::builtin(),
            source,
            surface: Arc::clone(surface) as Arc<dyn SidebarSurface>,
            viewport_width: width,
        }
    }

    fn headless(engine: &Arc<HeadlessMap>) -> impl FnOnce(&MapOptions) -> Result<Arc<dyn MapEngine>, CoreError> {
        let engine = Arc::clone(engine);
        move |_| Ok(engine as Arc<dyn MapEngine>)
    }

    fn beach_feature(id: &str) -> Arc<Feature> {
        let mut props = Map::new();
        props.insert(ITEM_ID.into(), json!(id));
        props.insert("Name".into(), json!("Huntington State Beach"));
        Arc::new(Feature::point(LngLat::new(-117.9878, 33.6389), props).with_layer("beach-labels"))
    }

    #[tokio::test]
    async fn start_wires_every_component() {
        let surface = Arc::new(HeadlessSurface::new());
        let engine = Arc::new(HeadlessMap::new());

        let app = App::start(options(CannedSource, &surface, 1280), headless(&engine))
            .await
            .unwrap();

        assert_eq!(app.prefetch().pois, 3);
        assert!(app.store().ui_element("SIDEBAR_WRAPPER").is_some());
        assert_eq!(app.store().current_sidebar(), Sidebar::Home);
        assert!(!app.store().is_mobile());
        assert!(app.store().map().is_none());

        app.map().on_load();
        assert!(app.store().map().is_some());

        app.execute("navigateToList", InteractionContext::default());
        assert_eq!(app.store().current_sidebar(), Sidebar::List);
        app.shutdown();
    }

    #[tokio::test]
    async fn narrow_viewport_starts_mobile() {
        let surface = Arc::new(HeadlessSurface::new());
        let engine = Arc::new(HeadlessMap::new());
        let built_with = Arc::new(Mutex::new(None));

        let seen = Arc::clone(&built_with);
        let app = App::start(options(CannedSource, &surface, 640), move |opts: &MapOptions| {
            *seen.lock().unwrap() = Some(opts.center);
            Ok(engine as Arc<dyn MapEngine>)
        })
        .await
        .unwrap();

        assert!(app.store().is_mobile());
        let center = built_with.lock().unwrap().take().unwrap();
        assert_eq!(center, app.config().map.mobile_start);
        assert!(!surface.visible("[sidebar=\"map\"]"));
    }

    #[tokio::test]
    async fn map_failure_shows_inline_error() {
        let surface = Arc::new(HeadlessSurface::new());

        let result = App::start(options(CannedSource, &surface, 1280), |_: &MapOptions| {
            Err(CoreError::Internal("no WebGL context".into()))
        })
        .await;

        let Err(err) = result else {
            panic!("start should fail");
        };
        assert!(matches!(err, CoreError::MapInit { .. }));
        assert_eq!(
            surface.errors(),
            vec![(
                crate::store::ElementHandle::new("#map-container"),
                MAP_LOAD_ERROR.to_owned()
            )]
        );
    }

    #[tokio::test]
    async fn beach_selection_fetches_weather_into_the_panel() {
        let surface = Arc::new(HeadlessSurface::new());
        let engine = Arc::new(HeadlessMap::new());
        let app = App::start(
            options(WeatherSource::default(), &surface, 1280),
            headless(&engine),
        )
        .await
        .unwrap();
        app.map().on_load();

        app.execute(
            "selectBeachFromList",
            InteractionContext::for_feature(beach_feature("huntington-state-beach"), EntityType::Beach),
        );
        assert_eq!(surface.last_detail().unwrap().get("humidity"), Some("N/A"));

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(app.store().weather("huntington-state-beach").is_some());
        assert_eq!(app.data().source().calls.load(Ordering::SeqCst), 1);
        assert_eq!(surface.last_detail().unwrap().get("humidity"), Some("70%"));
        app.shutdown();
    }

    #[tokio::test]
    async fn poi_selection_does_not_fetch_weather() {
        let surface = Arc::new(HeadlessSurface::new());
        let engine = Arc::new(HeadlessMap::new());
        let app = App::start(
            options(WeatherSource::default(), &surface, 1280),
            headless(&engine),
        )
        .await
        .unwrap();

        let mut props = Map::new();
        props.insert(ITEM_ID.into(), json!("venice-beach-skate-park"));
        let poi = Arc::new(Feature::point(LngLat::new(-118.4681, 33.985), props));
        app.execute("selectPOIFromList", InteractionContext::for_feature(poi, EntityType::Poi));

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(app.data().source().calls.load(Ordering::SeqCst), 0);
        app.shutdown();
    }
}
