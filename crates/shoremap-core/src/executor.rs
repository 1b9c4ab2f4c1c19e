// ── Recipe executor ──
//
// Runs a named recipe against the store and the bus. Steps run strictly
// in order on the caller's thread, so a step sees every state change an
// earlier step made. Nothing here fails hard: an unknown recipe, a step
// kind this build does not implement, or a step whose inputs are missing
// is logged and skipped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bus::{BusEvent, FlyToCommand, ShowPopupCommand, SidebarRequest, ZoomToCommand};
use crate::config::MapSettings;
use crate::model::{EntityId, EntityType, Feature};
use crate::recipe::{RecipeTable, Step};
use crate::store::{Action, SelectionPayload, Store};

/// Data attributes carried by an activated UI element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerTarget {
    pub entity_type: Option<EntityType>,
    pub feature_id: Option<EntityId>,
    /// Recipe name the element is bound to.
    pub action: Option<String>,
}

/// What an interaction is about.
#[derive(Debug, Clone, Default)]
pub struct InteractionContext {
    pub feature: Option<Arc<Feature>>,
    pub entity_type: Option<EntityType>,
    pub target: Option<TriggerTarget>,
}

impl InteractionContext {
    pub fn for_feature(feature: Arc<Feature>, entity_type: EntityType) -> Self {
        Self {
            feature: Some(feature),
            entity_type: Some(entity_type),
            target: None,
        }
    }

    pub fn for_target(target: TriggerTarget) -> Self {
        Self {
            target: Some(target),
            ..Self::default()
        }
    }
}

/// Outcome of one `execute` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Whether the recipe exists.
    pub found: bool,
    /// Steps that published a command or dispatched an action.
    pub steps_run: usize,
    /// Steps that needed a feature or entity type the context lacked.
    pub steps_idle: usize,
    /// Steps whose `when` guard did not hold.
    pub steps_skipped: usize,
    pub steps_unsupported: usize,
}

/// Interprets the recipe table.
pub struct ActionController {
    store: Arc<Store>,
    recipes: Arc<RecipeTable>,
    map: MapSettings,
}

impl ActionController {
    pub fn new(store: Arc<Store>, recipes: Arc<RecipeTable>, map: MapSettings) -> Self {
        Self {
            store,
            recipes,
            map,
        }
    }

    pub fn recipes(&self) -> &RecipeTable {
        &self.recipes
    }

    /// Run the recipe called `name`.
    pub fn execute(&self, name: &str, mut context: InteractionContext) -> ExecutionReport {
        let Some(recipe) = self.recipes.get(name) else {
            warn!(recipe = name, "no recipe configured");
            return ExecutionReport::default();
        };

        if context.feature.is_none() {
            self.resolve_target(&mut context);
        }

        info!(
            recipe = name,
            entity_type = ?context.entity_type,
            has_feature = context.feature.is_some(),
            "executing recipe"
        );

        let mut report = ExecutionReport {
            found: true,
            ..ExecutionReport::default()
        };
        for spec in &recipe.steps {
            // Guards read the live flag: an earlier step may have changed it.
            if !spec.applies(self.store.is_mobile()) {
                debug!(recipe = name, step = spec.step.kind(), "guard not met, skipping");
                report.steps_skipped += 1;
                continue;
            }
            if let Step::Unsupported { kind } = &spec.step {
                warn!(recipe = name, step = %kind, "unknown step type");
                report.steps_unsupported += 1;
                continue;
            }
            if self.run_step(&spec.step, &context) {
                report.steps_run += 1;
            } else {
                report.steps_idle += 1;
            }
        }
        report
    }

    // A UI element names its entity; look the feature up in the
    // viewport list. A miss leaves the feature empty and the
    // feature-dependent steps no-op.
    fn resolve_target(&self, context: &mut InteractionContext) {
        let Some(TriggerTarget {
            entity_type: Some(entity_type),
            feature_id: Some(feature_id),
            ..
        }) = &context.target
        else {
            return;
        };
        context.feature = self.store.visible_feature(feature_id.as_str());
        context.entity_type = Some(*entity_type);
        if context.feature.is_none() {
            debug!(%feature_id, "trigger target not in the viewport list");
        }
    }

    // Returns whether the step had an effect.
    fn run_step(&self, step: &Step, context: &InteractionContext) -> bool {
        let bus = self.store.bus();
        let feature = context.feature.as_ref();

        match step {
            Step::FlyTo { zoom, speed } => {
                let Some(coordinates) = feature.and_then(|f| f.anchor()) else {
                    return false;
                };
                bus.publish(&BusEvent::MapFlyTo(FlyToCommand {
                    coordinates,
                    zoom: *zoom,
                    speed: *speed,
                }));
            }

            Step::FlyToDefault => {
                let is_mobile = self.store.is_mobile();
                bus.publish(&BusEvent::MapFlyTo(FlyToCommand {
                    coordinates: self.map.start_position(is_mobile),
                    zoom: Some(self.map.default_zoom),
                    speed: None,
                }));
            }

            Step::UpdateSelection => {
                let (Some(feature), Some(entity_type)) = (feature, context.entity_type) else {
                    return false;
                };
                let Some(id) = feature.stable_id() else {
                    debug!("feature has no stable id, selection unchanged");
                    return false;
                };
                self.store.dispatch(Action::SetSelection(SelectionPayload {
                    id,
                    entity_type,
                    feature: Some(Arc::clone(feature)),
                }));
            }

            Step::ShowSidebar { sidebar } => {
                bus.publish(&BusEvent::UiSidebarRequested(SidebarRequest {
                    sidebar: *sidebar,
                }));
            }

            Step::ShowPopup { delay } => {
                let Some(feature) = feature else {
                    return false;
                };
                let details = feature.stable_id().and_then(|id| match context.entity_type {
                    Some(EntityType::Poi) => self.store.get_poi_by_id(id.as_str()),
                    _ => self.store.get_beach_by_id(id.as_str()),
                });
                bus.publish(&BusEvent::MapShowPopup(ShowPopupCommand {
                    feature: Arc::clone(feature),
                    details,
                    delay: *delay,
                    entity_type: context.entity_type,
                }));
            }

            Step::CloseAllPopups => {
                bus.publish(&BusEvent::MapCloseAllPopups);
            }

            Step::ZoomTo { zoom, speed } => {
                bus.publish(&BusEvent::MapZoomTo(ZoomToCommand {
                    zoom: *zoom,
                    speed: *speed,
                }));
            }

            Step::ToggleFullscreen => {
                bus.publish(&BusEvent::UiFullscreenToggled);
            }

            Step::Unsupported { .. } => return false,
        }
        true
    }
}
