// ── Detail panel ──
//
// Maps the selected beach or POI onto the panel's bind attributes. The
// panel is declarative: each key below names a `beach-data` attribute in
// the page and the surface fills whatever elements carry it.

use std::sync::Arc;

use chrono::DateTime;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};
use url::Url;

use super::{SIDEBAR_BEACH, SidebarSurface};
use crate::model::{DetailRecord, EntityId, EntityType, WeatherSnapshot};
use crate::store::{ApplicationState, Store};

const NA: &str = "N/A";
const BEACH_IMAGE_FALLBACK: &str = "https://images.unsplash.com/photo-1559827260-dc66d52bef19?w=300";
const POI_IMAGE_FALLBACK: &str = "https://images.unsplash.com/photo-1566073771259-6a8506099945?w=400";

/// Amenity attributes and the record fields they read.
const AMENITIES: &[(&str, &str)] = &[
    ("restrooms", "restrooms"),
    ("showers", "showers"),
    ("pets", "pets-allowed"),
    ("parking", "parking-lot-nearby"),
    ("parking-hours", "parking-hours"),
    ("camping", "camping-offered"),
    ("bonfire", "bonfire-availabiliity"),
    ("fishing", "fishing"),
    ("pier", "pier"),
    ("picnic", "picnic-area-rentals"),
    ("surfing", "surfing-beach"),
];

/// Conditions attributes, all `N/A` for POIs.
const CONDITIONS: &[&str] = &[
    "feels-like",
    "humidity",
    "wind",
    "wind-direction",
    "aqi",
    "rainfall",
    "pressure",
    "pm25",
    "pm10",
    "water-temp",
    "wave-height",
    "ocean-current",
    "uv-index",
    "cloud-cover",
    "sunset",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailViewModel {
    pub entity_type: EntityType,
    pub id: EntityId,
    /// Bind attribute to display value, in panel order.
    pub fields: IndexMap<&'static str, String>,
    /// Whether the website row is shown at all.
    pub website_visible: bool,
}

impl DetailViewModel {
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.fields.get(attribute).map(String::as_str)
    }

    /// Build the view model for the current selection.
    ///
    /// `None` without a beach or POI selection or when its record is not
    /// cached.
    pub fn for_selection(state: &ApplicationState) -> Option<Self> {
        let selection = state.current_selection.as_ref()?;
        if !selection.entity_type.has_detail() {
            return None;
        }
        let Some(record) = state.detail(selection.entity_type, &selection.id) else {
            error!(
                id = %selection.id,
                entity_type = %selection.entity_type,
                "selected record not in cache"
            );
            return None;
        };
        let weather = state
            .cache
            .weather
            .get(selection.id.as_str())
            .map(|entry| Arc::clone(&entry.snapshot));

        Some(match selection.entity_type {
            EntityType::Poi => Self::poi(&record),
            _ => Self::beach(&record, weather.as_deref()),
        })
    }

    pub fn beach(record: &DetailRecord, weather: Option<&WeatherSnapshot>) -> Self {
        let read = Reader { record, weather };
        let mut fields = IndexMap::new();

        fields.insert(
            "image",
            record
                .image_url("main-image")
                .unwrap_or_else(|| BEACH_IMAGE_FALLBACK.to_owned()),
        );
        fields.insert("title", or(record.text("name"), "Beach Name"));
        fields.insert("address-link", or(record.text("google-maps-link"), "#"));
        fields.insert(
            "address-text",
            or(
                record.first_text(&["formatted-address", "formatted-adress"]),
                "Google Maps Link",
            ),
        );
        let website = record.text("beach-website");
        fields.insert("website-text", website_host(website.as_deref()));
        fields.insert("website-link", website.clone().unwrap_or_default());
        fields.insert("phone", or(record.text("phone"), NA));

        for (attribute, key) in AMENITIES {
            fields.insert(*attribute, or(record.text(key), NA));
        }
        fields.insert("recreation", or(record.text("recreation-activities"), NA));

        fields.insert("air-temp", read.rounded("temperature").unwrap_or_default());
        fields.insert("feels-like", or(read.rounded("feels_like").map(|t| format!("{t}°F")), NA));
        fields.insert("humidity", read.suffixed("humidity", "%"));
        fields.insert("wind", read.suffixed("windSpeed", " mph"));
        fields.insert("wind-direction", read.suffixed("windDirection", "°"));
        fields.insert("aqi", or(read.present("aqi"), NA));
        fields.insert("rainfall", read.suffixed("rainfall", " in"));
        fields.insert("pressure", read.suffixed("pressure", " inHg"));
        fields.insert("pm25", read.suffixed("pm25", " µg/m³"));
        fields.insert("pm10", read.suffixed("pm10", " µg/m³"));
        fields.insert("water-temp", or(read.rounded("water_temp").map(|t| format!("{t}°F")), NA));
        fields.insert("wave-height", read.suffixed("wave_height", " ft"));
        fields.insert("ocean-current", or(read.present("ocean_current"), NA));
        fields.insert("uv-index", or(read.present("uv_index"), NA));
        fields.insert("cloud-cover", read.suffixed("cloud_cover", "%"));
        fields.insert(
            "sunset",
            or(read.value("sunset").and_then(clock_time), NA),
        );

        Self {
            entity_type: EntityType::Beach,
            id: record.id.clone(),
            fields,
            website_visible: website.is_some(),
        }
    }

    pub fn poi(record: &DetailRecord) -> Self {
        let mut fields = IndexMap::new();

        fields.insert(
            "image",
            record
                .text("mainImageUrl")
                .or_else(|| record.image_url("main-image"))
                .unwrap_or_else(|| POI_IMAGE_FALLBACK.to_owned()),
        );
        fields.insert(
            "title",
            or(record.first_text(&["name", "Name"]), "Point of Interest"),
        );
        fields.insert(
            "address-link",
            or(record.first_text(&["google-maps-link", "googleMapsUrl"]), "#"),
        );
        fields.insert(
            "address-text",
            or(
                record.first_text(&["address", "formatted-address", "formatted-adress"]),
                "Address not available",
            ),
        );
        let website = record.first_text(&["website", "website-url"]);
        fields.insert("website-text", website_host(website.as_deref()));
        fields.insert("website-link", website.clone().unwrap_or_default());
        fields.insert("phone", or(record.text("phone"), NA));

        for (attribute, _) in AMENITIES {
            fields.insert(*attribute, NA.to_owned());
        }
        fields.insert(
            "recreation",
            or(
                record.first_text(&["categoryName", "category", "type"]),
                "Point of Interest",
            ),
        );
        fields.insert("air-temp", NA.to_owned());
        for attribute in CONDITIONS {
            fields.insert(*attribute, NA.to_owned());
        }

        Self {
            entity_type: EntityType::Poi,
            id: record.id.clone(),
            fields,
            website_visible: website.is_some(),
        }
    }
}

fn or(value: Option<String>, fallback: &str) -> String {
    value.unwrap_or_else(|| fallback.to_owned())
}

fn website_host(website: Option<&str>) -> String {
    website
        .filter(|w| w.starts_with("http"))
        .and_then(|w| Url::parse(w).ok())
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_default()
}

// Sunset arrives as an RFC 3339 string or epoch milliseconds. The time
// is shown in the offset it was delivered in.
fn clock_time(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.format("%H:%M").to_string()),
        Value::Number(n) => DateTime::from_timestamp_millis(n.as_i64()?)
            .map(|t| t.format("%H:%M").to_string()),
        _ => None,
    }
}

// Cached weather readings take precedence over fields baked into the
// record.
struct Reader<'a> {
    record: &'a DetailRecord,
    weather: Option<&'a WeatherSnapshot>,
}

impl Reader<'_> {
    fn value(&self, key: &str) -> Option<&Value> {
        self.weather
            .and_then(|w| w.get(key))
            .filter(|v| !v.is_null())
            .or_else(|| self.record.field(key).filter(|v| !v.is_null()))
    }

    fn text(&self, key: &str) -> Option<String> {
        self.weather
            .and_then(|w| w.text(key))
            .or_else(|| self.record.text(key))
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.weather
            .and_then(|w| w.number(key))
            .or_else(|| self.record.number(key))
    }

    /// Nonzero reading rounded to a whole number.
    fn rounded(&self, key: &str) -> Option<String> {
        self.number(key)
            .filter(|v| v.abs() > 0.0)
            .map(|v| format!("{}", v.round()))
    }

    fn suffixed(&self, key: &str, unit: &str) -> String {
        self.text(key)
            .map_or_else(|| NA.to_owned(), |v| format!("{v}{unit}"))
    }

    /// Any non-null value, zero included.
    fn present(&self, key: &str) -> Option<String> {
        self.value(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Renders the detail panel for the current selection.
pub struct DetailView {
    store: Arc<Store>,
    surface: Arc<dyn SidebarSurface>,
}

impl DetailView {
    pub fn new(store: Arc<Store>, surface: Arc<dyn SidebarSurface>) -> Self {
        Self { store, surface }
    }

    /// Rebuild and render the panel. Returns the rendered view model.
    pub fn update(&self) -> Option<DetailViewModel> {
        let Some(panel) = self.store.ui_element(SIDEBAR_BEACH.name) else {
            debug!("detail panel not on page");
            return None;
        };
        let view = DetailViewModel::for_selection(&self.store.get_state())?;
        debug!(id = %view.id, entity_type = %view.entity_type, "rendering detail");
        self.surface.render_detail(&panel, &view);
        Some(view)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Map, json};

    use super::*;

    fn record(id: &str, value: Value) -> DetailRecord {
        DetailRecord::new(id, value.as_object().unwrap().clone())
    }

    #[test]
    fn beach_fields_map_with_units() {
        let beach = record(
            "b-1",
            json!({
                "name": "Huntington State Beach",
                "main-image": { "url": "https://img.example/hb.jpg" },
                "formatted-adress": "21601 Pacific Coast Hwy",
                "beach-website": "https://www.parks.ca.gov/?page_id=643",
                "pets-allowed": "No",
                "temperature": 71.6,
                "feels_like": 70.2,
                "humidity": 65,
                "windSpeed": 8.5,
                "aqi": 0,
                "water_temp": 64.4,
                "wave_height": 3,
                "sunset": "2026-06-21T20:05:00-07:00"
            }),
        );

        let view = DetailViewModel::beach(&beach, None);

        assert_eq!(view.get("title"), Some("Huntington State Beach"));
        assert_eq!(view.get("image"), Some("https://img.example/hb.jpg"));
        assert_eq!(view.get("address-text"), Some("21601 Pacific Coast Hwy"));
        assert_eq!(view.get("website-text"), Some("www.parks.ca.gov"));
        assert!(view.website_visible);
        assert_eq!(view.get("pets"), Some("No"));
        assert_eq!(view.get("showers"), Some("N/A"));
        assert_eq!(view.get("air-temp"), Some("72"));
        assert_eq!(view.get("feels-like"), Some("70°F"));
        assert_eq!(view.get("humidity"), Some("65%"));
        assert_eq!(view.get("wind"), Some("8.5 mph"));
        assert_eq!(view.get("aqi"), Some("0"));
        assert_eq!(view.get("water-temp"), Some("64°F"));
        assert_eq!(view.get("wave-height"), Some("3 ft"));
        assert_eq!(view.get("pressure"), Some("N/A"));
        assert_eq!(view.get("sunset"), Some("20:05"));
    }

    #[test]
    fn bare_beach_uses_fallbacks() {
        let view = DetailViewModel::beach(&record("b-2", json!({})), None);
        assert_eq!(view.get("title"), Some("Beach Name"));
        assert_eq!(view.get("image"), Some(BEACH_IMAGE_FALLBACK));
        assert_eq!(view.get("address-link"), Some("#"));
        assert_eq!(view.get("address-text"), Some("Google Maps Link"));
        assert_eq!(view.get("air-temp"), Some(""));
        assert_eq!(view.get("website-link"), Some(""));
        assert!(!view.website_visible);
    }

    #[test]
    fn weather_cache_overrides_record_readings() {
        let beach = record("b-1", json!({ "temperature": 60, "humidity": 40 }));
        let mut readings = Map::new();
        readings.insert("temperature".into(), json!(75.4));
        let weather = WeatherSnapshot(readings);

        let view = DetailViewModel::beach(&beach, Some(&weather));
        assert_eq!(view.get("air-temp"), Some("75"));
        assert_eq!(view.get("humidity"), Some("40%"));
    }

    #[test]
    fn poi_view_has_no_conditions() {
        let poi = record(
            "p-1",
            json!({
                "name": "Duke's",
                "categoryName": "Restaurant",
                "website": "https://dukes.example",
                "address": "317 Pacific Coast Hwy"
            }),
        );
        let view = DetailViewModel::poi(&poi);
        assert_eq!(view.entity_type, EntityType::Poi);
        assert_eq!(view.get("recreation"), Some("Restaurant"));
        assert_eq!(view.get("website-text"), Some("dukes.example"));
        assert_eq!(view.get("image"), Some(POI_IMAGE_FALLBACK));
        assert_eq!(view.get("air-temp"), Some("N/A"));
        assert_eq!(view.get("sunset"), Some("N/A"));
        assert_eq!(view.get("restrooms"), Some("N/A"));
    }

    #[test]
    fn non_http_website_has_no_host() {
        let beach = record("b-1", json!({ "beach-website": "www.example.com" }));
        let view = DetailViewModel::beach(&beach, None);
        assert_eq!(view.get("website-text"), Some(""));
        assert!(view.website_visible);
    }

    #[test]
    fn epoch_sunset_formats_in_utc() {
        assert_eq!(clock_time(&json!(0)).as_deref(), Some("00:00"));
        assert_eq!(clock_time(&json!("not a time")), None);
    }
}
