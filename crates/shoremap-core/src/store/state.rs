// ── Application state ──
//
// One immutable value per revision. Branches sit behind `Arc` so a
// reducer step copies only the branch it touches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::model::{DetailRecord, EntityId, EntityType, Feature, WeatherSnapshot};

// ── Handles ──────────────────────────────────────────────────────────

/// Opaque reference to the live map engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapHandle(pub u64);

/// A located UI element, as resolved by the sidebar surface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identity of an open map popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PopupId(pub Uuid);

impl PopupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PopupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ── Selection ────────────────────────────────────────────────────────

/// The active selection. Id and type are always present together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedEntity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<Arc<Feature>>,
}

impl SelectedEntity {
    pub fn is(&self, id: &EntityId, entity_type: EntityType) -> bool {
        self.entity_type == entity_type && &self.id == id
    }
}

// ── Sidebar ──────────────────────────────────────────────────────────

/// The three sidebar panels; exactly one is active.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Sidebar {
    #[default]
    Home,
    List,
    Detail,
}

// ── Branches ─────────────────────────────────────────────────────────

/// A cached weather snapshot and the write that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherEntry {
    pub snapshot: Arc<WeatherSnapshot>,
    /// Monotonic write counter, used to match expiry timers to writes.
    pub generation: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheState {
    pub weather: Arc<HashMap<EntityId, WeatherEntry>>,
    /// Last generation handed out by a weather write.
    pub weather_generation: u64,
    /// Features in the viewport list, in list order.
    pub visible_features: Arc<IndexMap<EntityId, Arc<Feature>>>,
    pub beaches: Arc<HashMap<EntityId, Arc<DetailRecord>>>,
    pub pois: Arc<HashMap<EntityId, Arc<DetailRecord>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiState {
    pub current_sidebar: Sidebar,
    pub is_mobile: bool,
    pub is_loading: bool,
    pub elements: Arc<IndexMap<String, ElementHandle>>,
    pub open_popups: Arc<Vec<PopupId>>,
}

/// The whole application state at one revision.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationState {
    pub map: Option<MapHandle>,
    pub current_selection: Option<SelectedEntity>,
    pub cache: CacheState,
    pub ui: UiState,
}

impl ApplicationState {
    /// Cached detail record for an entity, by type.
    pub fn detail(&self, entity_type: EntityType, id: &EntityId) -> Option<Arc<DetailRecord>> {
        match entity_type {
            EntityType::Beach => self.cache.beaches.get(id).cloned(),
            EntityType::Poi => self.cache.pois.get(id).cloned(),
            EntityType::Region | EntityType::State => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn initial_state_is_home_with_nothing_selected() {
        let state = ApplicationState::default();
        assert_eq!(state.ui.current_sidebar, Sidebar::Home);
        assert!(state.map.is_none());
        assert!(state.current_selection.is_none());
        assert!(state.ui.open_popups.is_empty());
    }

    #[test]
    fn sidebar_round_trips_through_text() {
        assert_eq!(Sidebar::from_str("Detail").unwrap(), Sidebar::Detail);
        assert_eq!(Sidebar::List.to_string(), "list");
    }
}
