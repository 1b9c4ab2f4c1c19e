// ── Popup content ──
//
// The view model a map popup renders. Cached detail records win; a
// feature without one falls back to its own properties, which use the
// spreadsheet-style column names of the tileset.

use serde::Serialize;
use url::Url;

use crate::model::{DetailRecord, EntityType, Feature};

/// Call to action at the bottom of a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PopupButton {
    /// Opens the detail sidebar when the popup is clicked.
    SeeDetails,
    /// External link configured on a POI.
    Link { href: String, text: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopupContent {
    pub image_url: Option<String>,
    pub name: Option<String>,
    /// Rich text, passed through as delivered.
    pub description: Option<String>,
    pub address: Option<String>,
    pub hours: Option<String>,
    pub paid_partner: bool,
    pub website: Option<String>,
    /// Host part of `website`, used as the link text.
    pub website_host: Option<String>,
    pub phone: Option<String>,
    pub button: Option<PopupButton>,
}

// Field names in detail records and in feature properties, respectively.
struct Keys {
    name: &'static str,
    description: &'static str,
    address: &'static str,
    hours: &'static str,
    paid_partner: &'static str,
    website: &'static str,
    phone: &'static str,
    button_link: &'static str,
    button: &'static str,
    button_text: &'static str,
}

const DETAIL_KEYS: Keys = Keys {
    name: "name",
    description: "richTextContent",
    address: "adress",
    hours: "hours",
    paid_partner: "paid-partner",
    website: "beach-website",
    phone: "phone",
    button_link: "button-link",
    button: "button",
    button_text: "buttonText",
};

const PROPERTY_KEYS: Keys = Keys {
    name: "Name",
    description: "richTextContent",
    address: "Formatted Adress",
    hours: "Hours",
    paid_partner: "Paid Partner",
    website: "Website",
    phone: "Phone",
    button_link: "Button Link",
    button: "button",
    button_text: "buttonText",
};

enum Source<'a> {
    Record(&'a DetailRecord),
    Properties(&'a Feature),
}

impl Source<'_> {
    fn text(&self, key: &str) -> Option<String> {
        match self {
            Self::Record(record) => record.text(key),
            Self::Properties(feature) => feature.text(key),
        }
    }

    fn keys(&self) -> &'static Keys {
        match self {
            Self::Record(_) => &DETAIL_KEYS,
            Self::Properties(_) => &PROPERTY_KEYS,
        }
    }

    fn image_url(&self) -> Option<String> {
        match self {
            Self::Record(record) => record.image_url("main-image"),
            Self::Properties(feature) => feature.text("Main Image"),
        }
    }
}

impl PopupContent {
    pub fn build(
        feature: &Feature,
        details: Option<&DetailRecord>,
        entity_type: Option<EntityType>,
    ) -> Self {
        let source = details.map_or(Source::Properties(feature), Source::Record);
        let keys = source.keys();
        let text = |key: &str| source.text(key);

        let website = text(keys.website);
        let website_host = website
            .as_deref()
            .and_then(|w| Url::parse(w).ok())
            .and_then(|u| u.host_str().map(str::to_owned));

        let button = if entity_type == Some(EntityType::Poi) {
            text(keys.button).map(|_| PopupButton::Link {
                href: text(keys.button_link).unwrap_or_default(),
                text: text(keys.button_text).unwrap_or_default(),
            })
        } else {
            Some(PopupButton::SeeDetails)
        };

        Self {
            image_url: source.image_url(),
            name: text(keys.name),
            description: text(keys.description),
            address: text(keys.address),
            hours: text(keys.hours),
            paid_partner: text(keys.paid_partner).is_some(),
            website,
            website_host,
            phone: text(keys.phone),
            button,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::model::LngLat;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn details_take_precedence_over_properties() {
        let feature = Feature::point(
            LngLat::new(-118.0, 33.6),
            props(json!({ "Name": "From tiles" })),
        );
        let record = DetailRecord::new(
            "b-1",
            props(json!({
                "name": "Huntington State Beach",
                "main-image": { "url": "https://img.example/hb.jpg" },
                "beach-website": "https://www.parks.ca.gov/?page_id=643",
                "paid-partner": true,
                "hours": "6am - 10pm"
            })),
        );

        let content = PopupContent::build(&feature, Some(&record), Some(EntityType::Beach));

        assert_eq!(content.name.as_deref(), Some("Huntington State Beach"));
        assert_eq!(content.image_url.as_deref(), Some("https://img.example/hb.jpg"));
        assert_eq!(content.website_host.as_deref(), Some("www.parks.ca.gov"));
        assert!(content.paid_partner);
        assert_eq!(content.button, Some(PopupButton::SeeDetails));
    }

    #[test]
    fn properties_fill_in_without_details() {
        let feature = Feature::point(
            LngLat::new(-117.0, 32.7),
            props(json!({
                "Name": "Pier Cafe",
                "Formatted Adress": "1 Pier Way",
                "Phone": "555-0100",
                "button": true,
                "Button Link": "https://pier.example/menu",
                "buttonText": "Menu"
            })),
        );

        let content = PopupContent::build(&feature, None, Some(EntityType::Poi));

        assert_eq!(content.name.as_deref(), Some("Pier Cafe"));
        assert_eq!(content.address.as_deref(), Some("1 Pier Way"));
        assert_eq!(
            content.button,
            Some(PopupButton::Link {
                href: "https://pier.example/menu".into(),
                text: "Menu".into()
            })
        );
        assert_eq!(content.website_host, None);
    }

    #[test]
    fn poi_without_button_flag_has_no_button() {
        let feature = Feature::point(LngLat::new(0.0, 0.0), Map::new());
        let content = PopupContent::build(&feature, None, Some(EntityType::Poi));
        assert_eq!(content.button, None);
    }
}
