// ── Domain model ──
//
// Entities, GeoJSON features and the records the remote collections
// deliver. Everything here is plain data with serde support.

pub mod entity;
pub mod feature;
pub mod record;

pub use entity::{EntityId, EntityType};
pub use feature::{Feature, FeatureId, Geometry, ITEM_ID, LOCATION_CLUSTER, LngLat};
pub use record::{DetailRecord, WeatherSnapshot};
