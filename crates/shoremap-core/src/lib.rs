// shoremap-core: State store, event bus and interaction recipes behind the beach map.

pub mod app;
pub mod bus;
pub mod config;
pub mod data;
pub mod debounce;
pub mod error;
pub mod executor;
pub mod headless;
pub mod map;
pub mod model;
pub mod recipe;
pub mod store;
pub mod stream;
pub mod ui;

// ── Primary re-exports ──────────────────────────────────────────────
pub use app::{App, StartOptions};
pub use bus::{BusEvent, EventBus, EventLog, Subscription, Topic};
pub use config::{AppConfig, ApiSettings, CacheSettings, MapSettings, WeatherExpiry};
pub use data::{CannedSource, CollectionSource, DataController, PrefetchReport};
pub use error::CoreError;
pub use executor::{ActionController, ExecutionReport, InteractionContext, TriggerTarget};
pub use headless::{HeadlessMap, HeadlessSurface, MapCall, SurfaceCall};
pub use map::{MapController, MapEngine, MapInteraction, MapOptions};
pub use recipe::{Recipe, RecipeTable, Step, StepSpec, ViewCondition};
pub use store::{Action, ApplicationState, Sidebar, Store};
pub use stream::StateStream;
pub use ui::{SidebarSurface, UiController};

// Re-export model types at the crate root for ergonomics.
pub use model::{DetailRecord, EntityId, EntityType, Feature, FeatureId, Geometry, LngLat, WeatherSnapshot};
