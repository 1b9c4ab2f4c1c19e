// Wire types returned by the proxy endpoints.
//
// The proxies flatten CMS items into `{ id, ...fieldData }`, so every
// record is an id plus a free-form bag of fields. Domain typing happens
// in shoremap-core.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One flattened CMS item from `/api/beaches` or `/api/pois`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl RawRecord {
    /// Look up a field by name.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Field as a string, if present and textual.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Field as a number. Numeric strings are accepted since the CMS
    /// stores coordinates as text for some collections.
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Body of `/api/weather/{id}`: a flat object of readings.
pub type WeatherPayload = Map<String, Value>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_record_keeps_unknown_fields() {
        let record: RawRecord = serde_json::from_value(json!({
            "id": "b-1",
            "name": "Huntington City Beach",
            "latitude": "33.6553",
            "longitude": -118.0052,
            "pets-allowed": "Yes"
        }))
        .unwrap();

        assert_eq!(record.id, "b-1");
        assert_eq!(record.str_field("name"), Some("Huntington City Beach"));
        assert_eq!(record.f64_field("latitude"), Some(33.6553));
        assert_eq!(record.f64_field("longitude"), Some(-118.0052));
        assert_eq!(record.str_field("pets-allowed"), Some("Yes"));
        assert!(record.field("missing").is_none());
    }

    #[test]
    fn raw_record_requires_id() {
        let result = serde_json::from_value::<RawRecord>(json!({ "name": "nameless" }));
        assert!(result.is_err());
    }
}
