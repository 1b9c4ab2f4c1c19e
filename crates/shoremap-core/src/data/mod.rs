// ── Data controller ──
//
// Prefetches the beach and POI collections into the store at startup and
// serves weather readings through a TTL cache kept in the store itself.
// Remote failures never surface: collections fall back to canned data,
// weather lookups return `None`.

mod fallback;
mod proxy;

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{CacheSettings, WeatherExpiry};
use crate::error::CoreError;
use crate::model::{DetailRecord, EntityId, WeatherSnapshot};
use crate::store::{Action, Store};

pub use fallback::{beaches as fallback_beaches, pois as fallback_pois};

/// Where collections and weather readings come from.
pub trait CollectionSource: Send + Sync {
    fn beaches(&self) -> impl Future<Output = Result<Vec<DetailRecord>, CoreError>> + Send;

    fn pois(&self) -> impl Future<Output = Result<Vec<DetailRecord>, CoreError>> + Send;

    fn weather(&self, id: &str) -> impl Future<Output = Result<WeatherSnapshot, CoreError>> + Send;
}

/// Serves the canned collections and has no weather readings.
#[derive(Debug, Clone, Copy, Default)]
pub struct CannedSource;

impl CollectionSource for CannedSource {
    async fn beaches(&self) -> Result<Vec<DetailRecord>, CoreError> {
        Ok(fallback::beaches())
    }

    async fn pois(&self) -> Result<Vec<DetailRecord>, CoreError> {
        Ok(fallback::pois())
    }

    async fn weather(&self, id: &str) -> Result<WeatherSnapshot, CoreError> {
        Err(CoreError::NotFound {
            entity_type: "weather".into(),
            identifier: id.to_owned(),
        })
    }
}

/// What `init` loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefetchReport {
    pub beaches: usize,
    pub pois: usize,
    /// The beach collection is the canned fallback.
    pub beaches_fallback: bool,
    pub pois_fallback: bool,
}

pub struct DataController<S> {
    source: S,
    store: Arc<Store>,
    cache: CacheSettings,
    cancel: CancellationToken,
    expiries: Mutex<HashMap<EntityId, JoinHandle<()>>>,
}

impl<S> DataController<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

impl<S: CollectionSource> DataController<S> {
    pub fn new(source: S, store: Arc<Store>, cache: CacheSettings, cancel: CancellationToken) -> Self {
        Self {
            source,
            store,
            cache,
            cancel,
            expiries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch both collections concurrently and cache them.
    pub async fn init(&self) -> PrefetchReport {
        info!("prefetching collections");
        let (beaches, pois) = tokio::join!(self.source.beaches(), self.source.pois());
        let (beaches, beaches_fallback) = settle("beaches", beaches, fallback::beaches);
        let (pois, pois_fallback) = settle("pois", pois, fallback::pois);

        let report = PrefetchReport {
            beaches: beaches.len(),
            pois: pois.len(),
            beaches_fallback,
            pois_fallback,
        };
        self.store.dispatch(Action::SetAllBeachData(beaches));
        self.store.dispatch(Action::SetAllPoiData(pois));
        report
    }

    /// Current readings for `id`, from cache when fresh.
    pub async fn weather(&self, id: &str) -> Option<Arc<WeatherSnapshot>> {
        if let Some(hit) = self.store.weather(id) {
            debug!(id, "weather cache hit");
            return Some(hit);
        }
        self.refresh_weather(id).await
    }

    /// Fetch readings for `id` regardless of the cache.
    pub async fn refresh_weather(&self, id: &str) -> Option<Arc<WeatherSnapshot>> {
        let snapshot = match self.source.weather(id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(id, error = %e, "weather unavailable");
                return None;
            }
        };
        debug!(id, "weather fetched");

        let id = EntityId::new(id);
        self.store.dispatch(Action::SetWeatherData {
            id: id.clone(),
            data: snapshot,
        });
        self.schedule_expiry(id.clone());
        self.store.weather(id.as_str())
    }

    // Under `LatestWrite` each write replaces the pending expiry of its
    // entry and only deletes the generation it was scheduled for.
    fn schedule_expiry(&self, id: EntityId) {
        let latest_write = matches!(self.cache.weather_expiry, WeatherExpiry::LatestWrite);
        let generation = if latest_write {
            self.store.weather_generation(id.as_str())
        } else {
            None
        };

        let store = Arc::clone(&self.store);
        let cancel = self.cancel.clone();
        let ttl = self.cache.weather_ttl;
        let key = id.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(ttl) => {
                    debug!(%id, "weather entry expired");
                    store.dispatch(Action::DeleteWeatherData { id, generation });
                }
            }
        });

        let mut expiries = self.expiries.lock().unwrap_or_else(PoisonError::into_inner);
        expiries.retain(|_, handle| !handle.is_finished());
        if let Some(previous) = expiries.insert(key, task) {
            if latest_write {
                previous.abort();
            }
        }
    }
}

impl<S> Drop for DataController<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn settle(
    collection: &'static str,
    result: Result<Vec<DetailRecord>, CoreError>,
    fallback: fn() -> Vec<DetailRecord>,
) -> (Vec<DetailRecord>, bool) {
    match result {
        Ok(records) => {
            info!(collection, count = records.len(), "collection cached");
            (records, false)
        }
        Err(e) => {
            warn!(collection, error = %e, "prefetch failed, using canned data");
            (fallback(), true)
        }
    }
}
