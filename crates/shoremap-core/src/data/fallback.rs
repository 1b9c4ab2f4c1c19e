// Canned collections substituted when the proxies cannot be reached, so
// the map and lists always have something to show.

use serde_json::{Map, Value, json};

use crate::model::DetailRecord;

fn record(id: &str, value: Value) -> DetailRecord {
    let fields = match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    DetailRecord::new(id, fields)
}

pub fn beaches() -> Vec<DetailRecord> {
    vec![record(
        "huntington-state-beach",
        json!({
            "name": "Huntington State Beach",
            "longitude": -117.9878,
            "latitude": 33.6389,
            "formatted-address": "21601 Pacific Coast Hwy, Huntington Beach, CA 92646",
            "beach-website": "https://www.parks.ca.gov/?page_id=643",
            "restrooms": "Yes",
            "showers": "Yes",
            "pets-allowed": "No",
            "parking-lot-nearby": "Yes",
            "bonfire-availabiliity": "Yes",
            "surfing-beach": "Yes",
            "geometry": { "type": "Point", "coordinates": [-117.9878, 33.6389] }
        }),
    )]
}

pub fn pois() -> Vec<DetailRecord> {
    vec![
        record(
            "huntington-city-beach-lifeguard-tower-1",
            json!({
                "name": "Huntington City Beach Lifeguard Tower 1",
                "slug": "huntington-lifeguard-tower-1",
                "longitude": -118.0052,
                "latitude": 33.6553,
                "categoryName": "Safety & Emergency",
                "customIconName": "lifeguard-tower",
                "mainImageUrl": "https://images.unsplash.com/photo-1566073771259-6a8506099945?w=400",
                "mainImageAlt": "Huntington City Beach Lifeguard Tower 1",
                "richTextContent": "<p>Professional lifeguard station providing safety services and emergency response at Huntington City Beach. Staffed during peak hours with certified lifeguards.</p>",
                "geometry": { "type": "Point", "coordinates": [-118.0052, 33.6553] }
            }),
        ),
        record(
            "santa-monica-pier-info-center",
            json!({
                "name": "Santa Monica Pier Information Center",
                "slug": "santa-monica-pier-info",
                "longitude": -118.4965,
                "latitude": 34.0085,
                "categoryName": "Information & Services",
                "customIconName": "info-center",
                "mainImageUrl": "https://images.unsplash.com/photo-1506905925346-21bda4d32df4?w=400",
                "mainImageAlt": "Santa Monica Pier Information Center",
                "richTextContent": "<p>Visitor information center providing maps, event schedules, and assistance for Santa Monica Pier attractions and activities.</p>",
                "geometry": { "type": "Point", "coordinates": [-118.4965, 34.0085] }
            }),
        ),
        record(
            "venice-beach-skate-park",
            json!({
                "name": "Venice Beach Skate Park",
                "slug": "venice-beach-skate-park",
                "longitude": -118.4681,
                "latitude": 33.985,
                "categoryName": "Recreation & Sports",
                "customIconName": "skate-park",
                "mainImageUrl": "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400",
                "mainImageAlt": "Venice Beach Skate Park",
                "richTextContent": "<p>Famous concrete skate park featuring bowls, ramps, and street course elements. Open to skateboarders, BMX riders, and roller skaters.</p>",
                "geometry": { "type": "Point", "coordinates": [-118.4681, 33.985] }
            }),
        ),
    ]
}
