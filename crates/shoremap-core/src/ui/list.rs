// ── Feature list ──
//
// Turns the features in the viewport into sidebar list items and keeps
// `cache.visible_features` in sync with what the list shows.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error};

use super::{BEACH_LIST_CONTAINER, SidebarSurface};
use crate::model::{EntityId, EntityType, Feature, ITEM_ID, LOCATION_CLUSTER};
use crate::store::{Action, Store};

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/100";
pub const NO_ITEMS_MESSAGE: &str = "No items in view. Pan or zoom the map to find some.";

/// One row of the sidebar list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub entity_type: EntityType,
    /// Id the row resolves back to through the visible-features cache.
    pub feature_id: Option<EntityId>,
    /// Recipe the row triggers when activated.
    pub action: &'static str,
    pub title: String,
    pub image_url: String,
    /// Secondary line (cluster for beaches, category for POIs).
    pub location: Option<String>,
    /// Trailing label (state for beaches, icon name for POIs).
    pub state: Option<String>,
    /// Separator between `location` and `state`.
    pub show_delimiter: bool,
    /// Points under a region cluster.
    pub count: Option<u64>,
}

/// Recipe a list row of `entity_type` triggers.
pub fn list_action(entity_type: EntityType) -> &'static str {
    match entity_type {
        EntityType::State => "selectState",
        EntityType::Region => "selectRegion",
        EntityType::Beach => "selectBeachFromList",
        EntityType::Poi => "selectPOIFromList",
    }
}

pub struct FeatureListView {
    store: Arc<Store>,
    surface: Arc<dyn SidebarSurface>,
}

impl FeatureListView {
    pub fn new(store: Arc<Store>, surface: Arc<dyn SidebarSurface>) -> Self {
        Self { store, surface }
    }

    /// Render `features` into the list container.
    ///
    /// Returns the number of rows rendered. An empty input clears the
    /// visible-features cache and shows the placeholder, as does a beach
    /// list left empty once rows without an item id are dropped.
    pub fn render(&self, mut features: Vec<Feature>, entity_type: EntityType) -> usize {
        let Some(container) = self.store.ui_element(BEACH_LIST_CONTAINER.name) else {
            error!("list container not found, cannot render features");
            return 0;
        };

        features.sort_by(|a, b| compare_labels(&sort_label(a), &sort_label(b)));
        if entity_type == EntityType::Beach {
            features = dedupe_by_item_id(features);
        }

        if features.is_empty() {
            self.store.dispatch(Action::SetVisibleFeatures(Vec::new()));
            self.surface.render_placeholder(&container, NO_ITEMS_MESSAGE);
            return 0;
        }

        self.store
            .dispatch(Action::SetVisibleFeatures(features.clone()));

        let items: Vec<ListItem> = features
            .iter()
            .map(|f| ListItem::from_feature(f, entity_type))
            .collect();
        debug!(count = items.len(), %entity_type, "rendering list");
        self.surface.render_list(&container, &items);
        items.len()
    }
}

fn sort_label(feature: &Feature) -> String {
    feature
        .first_text(&["Name", "State", LOCATION_CLUSTER])
        .unwrap_or_default()
}

// Case-insensitive first; exact text breaks ties so the order is total.
fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// Vector tiles repeat a point across tile boundaries. Beaches without an
// item id cannot be addressed and are dropped.
fn dedupe_by_item_id(features: Vec<Feature>) -> Vec<Feature> {
    let mut seen = std::collections::HashSet::new();
    features
        .into_iter()
        .filter(|f| f.text(ITEM_ID).is_some_and(|id| seen.insert(id)))
        .collect()
}

impl ListItem {
    pub fn from_feature(feature: &Feature, entity_type: EntityType) -> Self {
        let image = |keys: &[&str]| {
            feature
                .first_text(keys)
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_owned())
        };
        let title = |keys: &[&str], fallback: &str| {
            feature
                .first_text(keys)
                .unwrap_or_else(|| fallback.to_owned())
        };

        let mut item = Self {
            entity_type,
            feature_id: feature.entity_id(),
            action: list_action(entity_type),
            title: String::new(),
            image_url: String::new(),
            location: None,
            state: None,
            show_delimiter: false,
            count: None,
        };

        match entity_type {
            EntityType::State => {
                item.image_url = image(&["IMAGE"]);
                item.title = title(&["NAME"], "Unnamed State");
            }
            EntityType::Region => {
                item.image_url = image(&["Image"]);
                item.title = title(&["name"], "Unnamed Region");
                item.count = feature.property("point_count").and_then(serde_json::Value::as_u64);
            }
            EntityType::Beach => {
                item.image_url = image(&["Main Image"]);
                item.title = title(&["Name"], "Beach Title");
                item.location = feature.text(LOCATION_CLUSTER);
                item.state = feature.text("State");
                item.show_delimiter = true;
            }
            EntityType::Poi => {
                item.image_url = image(&["mainImageUrl", "Main Image", "imageUrl"]);
                item.title = title(&["name", "Name"], "Point of Interest");
                item.location = Some(title(&["categoryName", "category", "type"], "POI"));
                item.state = feature.first_text(&["customIconName", "Custom Icon", "State", "state"]);
            }
        }
        item
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::bus::EventBus;
    use crate::headless::{HeadlessSurface, SurfaceCall};
    use crate::model::LngLat;
    use crate::store::UiPatch;
    use crate::ui::ANCHORS;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn beach(item_id: &str, name: &str) -> Feature {
        Feature::point(
            LngLat::new(-118.0, 33.6),
            props(json!({ "Item ID": item_id, "Name": name, "Location Cluster": "Orange County", "State": "CA" })),
        )
    }

    fn view() -> (Arc<Store>, Arc<HeadlessSurface>, FeatureListView) {
        let store = Arc::new(Store::new(EventBus::new()));
        let surface = Arc::new(HeadlessSurface::new());
        let elements = ANCHORS
            .iter()
            .map(|a| (a.name.to_owned(), surface.locate(a.selector).unwrap()))
            .collect();
        store.dispatch(Action::SetUiState(UiPatch::elements(elements)));
        let view = FeatureListView::new(Arc::clone(&store), Arc::clone(&surface) as Arc<dyn SidebarSurface>);
        (store, surface, view)
    }

    #[test]
    fn beaches_sort_case_insensitively_and_dedupe() {
        let (store, surface, view) = view();
        let rendered = view.render(
            vec![
                beach("b-2", "zuma"),
                beach("b-1", "Bolsa Chica"),
                beach("b-2", "zuma"),
                beach("b-3", "Aliso"),
            ],
            EntityType::Beach,
        );

        assert_eq!(rendered, 3);
        let titles: Vec<String> = surface.last_list().iter().map(|i| i.title.clone()).collect();
        assert_eq!(titles, ["Aliso", "Bolsa Chica", "zuma"]);
        let ids: Vec<String> = store
            .visible_features()
            .keys()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, ["b-3", "b-1", "b-2"]);
    }

    #[test]
    fn beach_rows_carry_cluster_state_and_action() {
        let item = ListItem::from_feature(&beach("b-1", "Crystal Cove"), EntityType::Beach);
        assert_eq!(item.action, "selectBeachFromList");
        assert_eq!(item.location.as_deref(), Some("Orange County"));
        assert_eq!(item.state.as_deref(), Some("CA"));
        assert!(item.show_delimiter);
        assert_eq!(item.image_url, PLACEHOLDER_IMAGE);
        assert_eq!(item.feature_id.unwrap().as_str(), "b-1");
    }

    #[test]
    fn empty_input_clears_cache_and_shows_placeholder() {
        let (store, surface, view) = view();
        view.render(vec![beach("b-1", "Aliso")], EntityType::Beach);
        assert_eq!(store.visible_features().len(), 1);

        assert_eq!(view.render(Vec::new(), EntityType::Beach), 0);
        assert!(store.visible_features().is_empty());
        assert_eq!(surface.last_placeholder().as_deref(), Some(NO_ITEMS_MESSAGE));
    }

    #[test]
    fn beaches_without_item_ids_show_placeholder() {
        let (store, surface, view) = view();
        let unnamed = Feature::point(
            LngLat::new(-117.9, 33.6),
            props(json!({ "Name": "Bolsa Chica" })),
        );

        assert_eq!(view.render(vec![unnamed], EntityType::Beach), 0);
        assert!(store.visible_features().is_empty());
        assert_eq!(surface.last_placeholder().as_deref(), Some(NO_ITEMS_MESSAGE));
        assert!(
            !surface
                .calls()
                .iter()
                .any(|c| matches!(c, SurfaceCall::List { .. }))
        );
    }

    #[test]
    fn missing_container_renders_nothing() {
        let store = Arc::new(Store::new(EventBus::new()));
        let surface = Arc::new(HeadlessSurface::new());
        let view = FeatureListView::new(Arc::clone(&store), surface as Arc<dyn SidebarSurface>);
        assert_eq!(view.render(vec![beach("b-1", "Aliso")], EntityType::Beach), 0);
        assert!(store.visible_features().is_empty());
    }

    #[test]
    fn fallbacks_per_type() {
        let bare = Feature::point(LngLat::new(0.0, 0.0), Map::new());
        assert_eq!(ListItem::from_feature(&bare, EntityType::State).title, "Unnamed State");
        assert_eq!(ListItem::from_feature(&bare, EntityType::Region).title, "Unnamed Region");
        let poi = ListItem::from_feature(&bare, EntityType::Poi);
        assert_eq!(poi.title, "Point of Interest");
        assert_eq!(poi.location.as_deref(), Some("POI"));
        assert_eq!(poi.action, "selectPOIFromList");
    }

    #[test]
    fn region_rows_show_cluster_size() {
        let region = Feature::point(
            LngLat::new(-118.2, 34.0),
            props(json!({ "name": "Los Angeles", "point_count": 42, "Image": "https://img/la.jpg" })),
        );
        let item = ListItem::from_feature(&region, EntityType::Region);
        assert_eq!(item.count, Some(42));
        assert_eq!(item.image_url, "https://img/la.jpg");
        assert_eq!(item.action, "selectRegion");
    }
}
