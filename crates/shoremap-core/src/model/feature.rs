// ── GeoJSON features ──
//
// Features come from two places: the map engine (rendered features with
// a layer id) and the remote collections. Properties are an arbitrary
// bag, so lookups follow the loose truthiness rules of the CMS export:
// empty strings, zero and `false` count as absent.

use std::fmt;

use serde::de::Error as _;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::entity::EntityId;

/// CMS item id property, the most specific identity a feature can carry.
pub const ITEM_ID: &str = "Item ID";
/// Region cluster label.
pub const LOCATION_CLUSTER: &str = "Location Cluster";

/// Property keys consulted, in order, when resolving an entity id.
const ENTITY_ID_PROPERTIES: &[&str] = &[ITEM_ID, LOCATION_CLUSTER, "NAME", "Name", "name"];

// ── LngLat ──────────────────────────────────────────────────────────

/// A `[longitude, latitude]` position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lng, self.lat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl Serialize for LngLat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.lng)?;
        tuple.serialize_element(&self.lat)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for LngLat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Positions may carry a trailing altitude.
        let raw = Vec::<f64>::deserialize(deserializer)?;
        match raw.as_slice() {
            [lng, lat, ..] => Ok(Self::new(*lng, *lat)),
            _ => Err(D::Error::invalid_length(
                raw.len(),
                &"a position with at least two coordinates",
            )),
        }
    }
}

// ── Geometry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: LngLat },
    MultiPoint { coordinates: Vec<LngLat> },
    LineString { coordinates: Vec<LngLat> },
    Polygon { coordinates: Vec<Vec<LngLat>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<LngLat>>> },
}

impl Geometry {
    /// The position a camera or popup should target: the point itself,
    /// or the bounding-box center of any other shape.
    pub fn anchor(&self) -> Option<LngLat> {
        match self {
            Self::Point { coordinates } => Some(*coordinates),
            Self::MultiPoint { coordinates } | Self::LineString { coordinates } => {
                bbox_center(coordinates.iter())
            }
            Self::Polygon { coordinates } => bbox_center(coordinates.iter().flatten()),
            Self::MultiPolygon { coordinates } => {
                bbox_center(coordinates.iter().flatten().flatten())
            }
        }
    }
}

fn bbox_center<'a>(positions: impl Iterator<Item = &'a LngLat>) -> Option<LngLat> {
    let mut bounds: Option<(f64, f64, f64, f64)> = None;
    for p in positions {
        bounds = Some(match bounds {
            None => (p.lng, p.lat, p.lng, p.lat),
            Some((w, s, e, n)) => (w.min(p.lng), s.min(p.lat), e.max(p.lng), n.max(p.lat)),
        });
    }
    bounds.map(|(w, s, e, n)| LngLat::new(f64::midpoint(w, e), f64::midpoint(s, n)))
}

// ── FeatureId ───────────────────────────────────────────────────────

/// A feature's own id: map engines emit integers, collections emit strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ── Feature ─────────────────────────────────────────────────────────

/// A GeoJSON-like feature with a free-form properties bag.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Map<String, Value>,
    /// Layer the feature was rendered on, when it came from the map engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    /// Source backing that layer (used for cluster expansion).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Map<String, Value>, D::Error> {
    Option::<Map<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Feature {
    /// Build a point feature from a properties bag.
    pub fn point(position: LngLat, properties: Map<String, Value>) -> Self {
        Self {
            geometry: Some(Geometry::Point {
                coordinates: position,
            }),
            properties,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: FeatureId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = Some(layer.into());
        self
    }

    /// Raw property lookup.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Property rendered as text if it is "truthy".
    pub fn text(&self, key: &str) -> Option<String> {
        self.properties.get(key).and_then(truthy_text)
    }

    /// First truthy property among `keys`.
    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    pub fn anchor(&self) -> Option<LngLat> {
        self.geometry.as_ref().and_then(Geometry::anchor)
    }

    /// Entity id by the full precedence: item id, cluster label, name,
    /// then the feature's own id.
    pub fn entity_id(&self) -> Option<EntityId> {
        self.first_text(ENTITY_ID_PROPERTIES)
            .or_else(|| self.id.as_ref().map(ToString::to_string))
            .map(EntityId::from)
    }

    /// Id used for selections and detail lookups: the item id, else the
    /// feature's own id.
    pub fn stable_id(&self) -> Option<EntityId> {
        self.text(ITEM_ID)
            .or_else(|| self.id.as_ref().map(ToString::to_string))
            .map(EntityId::from)
    }
}

/// Text form of a JSON value, or `None` for empty / falsy values.
pub(crate) fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64().is_some_and(|f| f.abs() > 0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn feature(value: Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn entity_id_follows_precedence() {
        let f = feature(json!({
            "id": 7,
            "properties": { "Item ID": "item-1", "Location Cluster": "Orange County", "Name": "Beach" }
        }));
        assert_eq!(f.entity_id().unwrap().as_str(), "item-1");

        let f = feature(json!({
            "id": 7,
            "properties": { "Item ID": "", "Location Cluster": "Orange County", "Name": "Beach" }
        }));
        assert_eq!(f.entity_id().unwrap().as_str(), "Orange County");

        let f = feature(json!({ "id": 7, "properties": { "NAME": "California" } }));
        assert_eq!(f.entity_id().unwrap().as_str(), "California");

        let f = feature(json!({ "id": 7, "properties": {} }));
        assert_eq!(f.entity_id().unwrap().as_str(), "7");

        let f = feature(json!({ "properties": null }));
        assert!(f.entity_id().is_none());
    }

    #[test]
    fn stable_id_skips_labels() {
        let f = feature(json!({ "id": "feat-9", "properties": { "Name": "Crystal Cove" } }));
        assert_eq!(f.stable_id().unwrap().as_str(), "feat-9");

        let f = feature(json!({ "id": "feat-9", "properties": { "Item ID": 42 } }));
        assert_eq!(f.stable_id().unwrap().as_str(), "42");
    }

    #[test]
    fn point_anchor_is_the_point() {
        let f = feature(json!({
            "geometry": { "type": "Point", "coordinates": [-118.0052, 33.6553, 12.0] }
        }));
        assert_eq!(f.anchor(), Some(LngLat::new(-118.0052, 33.6553)));
    }

    #[test]
    fn polygon_anchor_is_bbox_center() {
        let geometry: Geometry = serde_json::from_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
        }))
        .unwrap();
        assert_eq!(geometry.anchor(), Some(LngLat::new(2.0, 1.0)));

        let empty = Geometry::LineString {
            coordinates: Vec::new(),
        };
        assert_eq!(empty.anchor(), None);
    }

    #[test]
    fn position_serializes_as_pair() {
        let value = serde_json::to_value(LngLat::new(1.5, -2.0)).unwrap();
        assert_eq!(value, json!([1.5, -2.0]));
        assert!(serde_json::from_value::<LngLat>(json!([1.0])).is_err());
    }

    #[test]
    fn truthiness_matches_cms_semantics() {
        assert_eq!(truthy_text(&json!("x")), Some("x".into()));
        assert_eq!(truthy_text(&json!("")), None);
        assert_eq!(truthy_text(&json!(0)), None);
        assert_eq!(truthy_text(&json!(12)), Some("12".into()));
        assert_eq!(truthy_text(&json!(false)), None);
        assert_eq!(truthy_text(&json!(null)), None);
    }
}
