// ── Reducer ──
//
// Pure `(state, action) -> state`. Returning the input `Arc` unchanged
// means "no transition"; the store broadcasts nothing in that case.

use std::sync::Arc;

use tracing::{debug, warn};

use super::action::{Action, SelectionPayload, UiPatch};
use super::state::{ApplicationState, SelectedEntity, WeatherEntry};

/// Compute the state that follows `action`.
pub fn reduce(state: &Arc<ApplicationState>, action: &Action) -> Arc<ApplicationState> {
    match action {
        Action::SetMapInstance(handle) => {
            if state.map.is_some() {
                warn!(?handle, "map instance already set, ignoring");
                return Arc::clone(state);
            }
            next(state, |s| s.map = Some(*handle))
        }

        Action::SetSelection(SelectionPayload {
            id,
            entity_type,
            feature,
        }) => {
            let unchanged = state
                .current_selection
                .as_ref()
                .is_some_and(|sel| sel.is(id, *entity_type));
            if unchanged {
                return Arc::clone(state);
            }
            next(state, |s| {
                s.current_selection = Some(SelectedEntity {
                    id: id.clone(),
                    entity_type: *entity_type,
                    feature: feature.clone(),
                });
            })
        }

        Action::ClearSelection => next(state, |s| s.current_selection = None),

        Action::SetVisibleFeatures(features) => next(state, |s| {
            let visible = Arc::make_mut(&mut s.cache.visible_features);
            visible.clear();
            for feature in features {
                match feature.entity_id() {
                    Some(id) => {
                        visible.insert(id, Arc::new(feature.clone()));
                    }
                    None => debug!("visible feature without an entity id, skipped"),
                }
            }
        }),

        Action::ClearVisibleFeatures => next(state, |s| {
            s.cache.visible_features = Arc::default();
        }),

        Action::SetUiState(patch) => next(state, |s| apply_ui_patch(s, patch)),

        Action::SetWeatherData { id, data } => next(state, |s| {
            s.cache.weather_generation += 1;
            let generation = s.cache.weather_generation;
            Arc::make_mut(&mut s.cache.weather).insert(
                id.clone(),
                WeatherEntry {
                    snapshot: Arc::new(data.clone()),
                    generation,
                },
            );
        }),

        Action::DeleteWeatherData { id, generation } => {
            let Some(entry) = state.cache.weather.get(id) else {
                return Arc::clone(state);
            };
            if generation.is_some_and(|g| g != entry.generation) {
                debug!(%id, "weather entry rewritten since expiry was armed, keeping it");
                return Arc::clone(state);
            }
            next(state, |s| {
                Arc::make_mut(&mut s.cache.weather).remove(id);
            })
        }

        Action::AddOpenPopup(popup) => {
            if state.ui.open_popups.contains(popup) {
                return Arc::clone(state);
            }
            next(state, |s| Arc::make_mut(&mut s.ui.open_popups).push(*popup))
        }

        Action::RemoveOpenPopup(popup) => {
            if !state.ui.open_popups.contains(popup) {
                return Arc::clone(state);
            }
            next(state, |s| {
                Arc::make_mut(&mut s.ui.open_popups).retain(|p| p != popup);
            })
        }

        Action::ClearOpenPopups => next(state, |s| s.ui.open_popups = Arc::default()),

        Action::SetAllBeachData(records) => next(state, |s| {
            s.cache.beaches = Arc::new(
                records
                    .iter()
                    .map(|r| (r.id.clone(), Arc::new(r.clone())))
                    .collect(),
            );
        }),

        Action::SetAllPoiData(records) => next(state, |s| {
            s.cache.pois = Arc::new(
                records
                    .iter()
                    .map(|r| (r.id.clone(), Arc::new(r.clone())))
                    .collect(),
            );
        }),

        Action::Unknown => {
            warn!("unknown action type, state unchanged");
            Arc::clone(state)
        }
    }
}

fn next(
    state: &Arc<ApplicationState>,
    update: impl FnOnce(&mut ApplicationState),
) -> Arc<ApplicationState> {
    let mut value = ApplicationState::clone(state);
    update(&mut value);
    Arc::new(value)
}

fn apply_ui_patch(state: &mut ApplicationState, patch: &UiPatch) {
    if let Some(sidebar) = patch.current_sidebar {
        state.ui.current_sidebar = sidebar;
    }
    if let Some(is_mobile) = patch.is_mobile {
        state.ui.is_mobile = is_mobile;
    }
    if let Some(is_loading) = patch.is_loading {
        state.ui.is_loading = is_loading;
    }
    if let Some(elements) = &patch.elements {
        state.ui.elements = Arc::new(elements.clone());
    }
}
