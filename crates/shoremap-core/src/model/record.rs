// ── Detail records and weather snapshots ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::EntityId;
use super::feature::{Geometry, LngLat, truthy_text};

/// Full detail record for a beach or POI, as prefetched at startup.
///
/// Field names are whatever the CMS export uses (`"pets-allowed"`,
/// `"formatted-address"`, `"main-image"`, ...); typed accessors cover the
/// handful the core itself needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub id: EntityId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DetailRecord {
    pub fn new(id: impl Into<EntityId>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field rendered as text if it is "truthy".
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields.get(key).and_then(truthy_text)
    }

    /// First truthy field among `keys`.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// Numeric field, accepting numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        value_number(self.fields.get(key)?)
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(Value::Bool(true)))
    }

    pub fn name(&self) -> Option<String> {
        self.first_text(&["name", "Name"])
    }

    /// `url` of a CMS image field (`{ "url": ..., "alt": ... }`).
    pub fn image_url(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .and_then(|v| v.get("url"))
            .and_then(truthy_text)
    }

    /// Record position from explicit coordinates or a point geometry.
    pub fn position(&self) -> Option<LngLat> {
        let explicit = self
            .number("longitude")
            .zip(self.number("latitude"))
            .map(|(lng, lat)| LngLat::new(lng, lat));
        explicit.or_else(|| {
            let geometry: Geometry = serde_json::from_value(self.fields.get("geometry")?.clone()).ok()?;
            geometry.anchor()
        })
    }
}

/// Current readings for a location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherSnapshot(pub Map<String, Value>);

impl WeatherSnapshot {
    pub fn number(&self, key: &str) -> Option<f64> {
        value_number(self.0.get(key)?)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(truthy_text)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
