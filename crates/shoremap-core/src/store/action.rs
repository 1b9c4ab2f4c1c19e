// ── Actions ──
//
// The closed set of state transitions. The serde form is the wire shape
// integrators dispatch: `{"type": "SET_SELECTION", "payload": {...}}`.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};
use strum::{IntoStaticStr, VariantNames};
use tracing::debug;

use super::state::{ElementHandle, MapHandle, PopupId, Sidebar};
use crate::model::{DetailRecord, EntityId, EntityType, Feature, WeatherSnapshot};

/// A state transition request.
///
/// Unrecognised `type` tags deserialize to [`Action::Unknown`] whatever
/// their payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, IntoStaticStr, VariantNames)]
#[serde(
    remote = "Self",
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE"
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Record the map instance. Write-once.
    SetMapInstance(MapHandle),
    SetSelection(SelectionPayload),
    ClearSelection,
    /// Replace the viewport list wholesale.
    SetVisibleFeatures(Vec<Feature>),
    ClearVisibleFeatures,
    SetUiState(UiPatch),
    SetWeatherData {
        id: EntityId,
        data: WeatherSnapshot,
    },
    /// Drop a weather entry. With `generation`, only the entry written
    /// by that generation is dropped.
    DeleteWeatherData {
        id: EntityId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        generation: Option<u64>,
    },
    AddOpenPopup(PopupId),
    RemoveOpenPopup(PopupId),
    ClearOpenPopups,
    SetAllBeachData(Vec<DetailRecord>),
    SetAllPoiData(Vec<DetailRecord>),
    /// Any action type this build does not know. Reduces to identity.
    Unknown,
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Action::serialize(self, serializer)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<Value>,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Envelope { kind, payload } = Envelope::deserialize(deserializer)?;
        if kind == Self::Unknown.kind() || !Self::VARIANTS.contains(&kind.as_str()) {
            debug!(%kind, "unrecognised action type");
            return Ok(Self::Unknown);
        }

        let mut wire = Map::new();
        wire.insert("type".into(), Value::String(kind));
        if let Some(payload) = payload {
            wire.insert("payload".into(), payload);
        }
        Action::deserialize(Value::Object(wire)).map_err(de::Error::custom)
    }
}

impl Action {
    /// Wire name of the action type.
    pub fn kind(&self) -> &'static str {
        self.into()
    }

    pub fn is_selection_change(&self) -> bool {
        matches!(self, Self::SetSelection(_) | Self::ClearSelection)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<Arc<Feature>>,
}

/// Partial update of the UI branch; absent fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_sidebar: Option<Sidebar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_mobile: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_loading: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<IndexMap<String, ElementHandle>>,
}

impl UiPatch {
    pub fn sidebar(sidebar: Sidebar) -> Self {
        Self {
            current_sidebar: Some(sidebar),
            ..Self::default()
        }
    }

    pub fn mobile(is_mobile: bool) -> Self {
        Self {
            is_mobile: Some(is_mobile),
            ..Self::default()
        }
    }

    pub fn elements(elements: IndexMap<String, ElementHandle>) -> Self {
        Self {
            elements: Some(elements),
            ..Self::default()
        }
    }
}
