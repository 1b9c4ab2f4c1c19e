//! Replay a recipe against a headless map and report what it caused.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tabled::Tabled;

use shoremap_core::map::{BEACH_LAYER, POI_LAYER, click_route};
use shoremap_core::model::ITEM_ID;
use shoremap_core::store::SelectedEntity;
use shoremap_core::{
    App, CannedSource, CollectionSource, CoreError, EntityType, EventLog, ExecutionReport, Feature,
    HeadlessMap, HeadlessSurface, InteractionContext, MapCall, MapEngine, MapOptions,
    MapSettings, Sidebar, SidebarSurface, StartOptions, Store,
};

use crate::cli::{EntityKind, OutputFormat, SimulateArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

const PHONE_WIDTH: u32 = 375;
const DESKTOP_WIDTH: u32 = 1280;
/// Wait past the longest popup delay so deferred popups land.
const SETTLE: Duration = Duration::from_millis(50);

// ── Report types ────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Simulation {
    recipe: String,
    viewport_width: u32,
    mobile: bool,
    execution: ExecutionReport,
    events: Vec<TracedEvent>,
    map_calls: Vec<MapCall>,
    sidebar: Sidebar,
    selection: Option<SelectedEntity>,
}

#[derive(Debug, Serialize, Tabled)]
struct TracedEvent {
    #[tabled(rename = "#")]
    seq: usize,
    #[tabled(rename = "Topic")]
    topic: &'static str,
    #[tabled(rename = "Summary")]
    summary: String,
}

#[derive(Tabled)]
struct CallRow {
    #[tabled(rename = "#")]
    seq: usize,
    #[tabled(rename = "Call")]
    call: String,
    #[tabled(rename = "Args")]
    args: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SimulateArgs, resolved: &Resolved) -> Result<(), CliError> {
    if args.live {
        let client = super::proxy_client(resolved)?;
        run(client, &args, resolved).await
    } else {
        run(CannedSource, &args, resolved).await
    }
}

async fn run<S: CollectionSource + 'static>(
    source: S,
    args: &SimulateArgs,
    resolved: &Resolved,
) -> Result<(), CliError> {
    let recipe = resolved
        .recipes
        .get(&args.recipe)
        .ok_or_else(|| CoreError::RecipeNotFound {
            name: args.recipe.clone(),
        })?;
    let settle = recipe.max_popup_delay() + SETTLE;
    let viewport_width = viewport_width(&resolved.app.map, args.mobile);

    let surface = Arc::new(HeadlessSurface::new());
    let engine = Arc::new(HeadlessMap::new());
    let options = StartOptions {
        config: resolved.app.clone(),
        recipes: resolved.recipes.clone(),
        source,
        surface: Arc::clone(&surface) as Arc<dyn SidebarSurface>,
        viewport_width,
    };
    let built = Arc::clone(&engine);
    let app = App::start(options, move |_: &MapOptions| Ok(built as Arc<dyn MapEngine>)).await?;
    app.map().on_load();

    let context = interaction(args, app.store()).inspect_err(|_| app.shutdown())?;

    let (log, subscriptions) = EventLog::attach_all(app.bus());
    engine.clear_calls();
    let execution = app.execute(&args.recipe, context);
    tokio::time::sleep(settle).await;
    for sub in subscriptions {
        sub.unsubscribe();
    }

    let store = app.store();
    let simulation = Simulation {
        recipe: args.recipe.clone(),
        viewport_width,
        mobile: store.is_mobile(),
        execution,
        events: log
            .events()
            .iter()
            .enumerate()
            .map(|(i, event)| TracedEvent {
                seq: i + 1,
                topic: event.topic().as_str(),
                summary: event.to_string(),
            })
            .collect(),
        map_calls: engine.calls(),
        sidebar: store.current_sidebar(),
        selection: store.current_selection(),
    };
    app.shutdown();

    let out = render(resolved.format, &simulation, resolved.color);
    output::print_output(&out, resolved.quiet);
    Ok(())
}

fn viewport_width(map: &MapSettings, mobile: bool) -> u32 {
    if mobile {
        PHONE_WIDTH.min(map.mobile_breakpoint)
    } else {
        DESKTOP_WIDTH.max(map.mobile_breakpoint.saturating_add(1))
    }
}

// ── Interaction ─────────────────────────────────────────────────────

fn interaction(args: &SimulateArgs, store: &Store) -> Result<InteractionContext, CliError> {
    let hint = args.entity_type.map(entity_type);

    if let Some(ref path) = args.feature_file {
        let text = std::fs::read_to_string(path)?;
        let feature: Feature = serde_json::from_str(&text)?;
        let kind = hint.or_else(|| {
            feature
                .layer
                .as_deref()
                .and_then(click_route)
                .map(|(_, kind)| kind)
        });
        return Ok(match kind {
            Some(kind) => InteractionContext::for_feature(Arc::new(feature), kind),
            None => InteractionContext {
                feature: Some(Arc::new(feature)),
                ..InteractionContext::default()
            },
        });
    }

    if let Some(ref id) = args.feature_id {
        let (feature, kind) = cached_feature(store, id, hint)?;
        return Ok(InteractionContext::for_feature(feature, kind));
    }

    Ok(InteractionContext {
        entity_type: hint,
        ..InteractionContext::default()
    })
}

// A point feature built from a prefetched record, as the label layers
// would render it.
fn cached_feature(
    store: &Store,
    id: &str,
    hint: Option<EntityType>,
) -> Result<(Arc<Feature>, EntityType), CliError> {
    let beach = || {
        store
            .get_beach_by_id(id)
            .map(|r| (r, EntityType::Beach, BEACH_LAYER))
    };
    let poi = || store.get_poi_by_id(id).map(|r| (r, EntityType::Poi, POI_LAYER));

    let found = match hint {
        Some(EntityType::Beach) => beach(),
        Some(EntityType::Poi) => poi(),
        Some(other) => {
            return Err(CliError::Validation {
                field: "--entity-type".into(),
                reason: format!("{other} entities have no cached records, use --feature-file"),
            });
        }
        None => beach().or_else(poi),
    };
    let (record, kind, layer) = found.ok_or_else(|| CliError::NotFound {
        resource_type: "feature".into(),
        identifier: id.to_owned(),
        list_command: "prefetch".into(),
    })?;
    let position = record.position().ok_or_else(|| CliError::Validation {
        field: "--feature-id".into(),
        reason: format!("{id} has no coordinates"),
    })?;

    let mut properties = record.fields.clone();
    properties.insert(ITEM_ID.into(), json!(record.id.as_str()));
    if let Some(name) = record.name() {
        properties.entry("Name").or_insert_with(|| json!(name));
    }
    let feature = Feature::point(position, properties).with_layer(layer);
    Ok((Arc::new(feature), kind))
}

fn entity_type(kind: EntityKind) -> EntityType {
    match kind {
        EntityKind::Beach => EntityType::Beach,
        EntityKind::Poi => EntityType::Poi,
        EntityKind::Region => EntityType::Region,
        EntityKind::State => EntityType::State,
    }
}

// ── Rendering ───────────────────────────────────────────────────────

fn render(format: OutputFormat, simulation: &Simulation, color: bool) -> String {
    output::render_single(
        format,
        simulation,
        |s| detail(s, color),
        |s| {
            s.events
                .iter()
                .map(|e| e.topic)
                .collect::<Vec<_>>()
                .join("\n")
        },
    )
}

fn detail(simulation: &Simulation, color: bool) -> String {
    let layout = if simulation.mobile { "mobile" } else { "desktop" };
    let report = simulation.execution;
    let mut lines = vec![
        output::heading(
            &format!(
                "{} ({layout}, {}px)",
                simulation.recipe, simulation.viewport_width
            ),
            color,
        ),
        output::field(
            "steps",
            &format!(
                "{} run, {} idle, {} skipped, {} unsupported",
                report.steps_run,
                report.steps_idle,
                report.steps_skipped,
                report.steps_unsupported
            ),
            color,
        ),
        String::new(),
        output::heading("Events", color),
        output::render_table(&simulation.events),
        String::new(),
        output::heading("Map calls", color),
        output::render_table(&call_rows(&simulation.map_calls)),
        String::new(),
        output::field("sidebar", &simulation.sidebar.to_string(), color),
    ];
    let selection = simulation
        .selection
        .as_ref()
        .map_or_else(|| "none".to_owned(), |s| format!("{} {}", s.entity_type, s.id));
    lines.push(output::field("selection", &selection, color));
    lines.join("\n")
}

fn call_rows(calls: &[MapCall]) -> Vec<CallRow> {
    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            let (name, args) = match serde_json::to_value(call) {
                Ok(Value::Object(fields)) => {
                    let name = fields
                        .get("call")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned();
                    let args: Map<String, Value> =
                        fields.into_iter().filter(|(k, _)| k != "call").collect();
                    (name, Value::Object(args).to_string())
                }
                _ => (String::new(), String::new()),
            };
            CallRow {
                seq: i + 1,
                call: name,
                args,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shoremap_core::{EventBus, Action};
    use shoremap_core::data::{fallback_beaches, fallback_pois};

    use super::*;

    fn store() -> Store {
        let store = Store::new(EventBus::new());
        store.dispatch(Action::SetAllBeachData(fallback_beaches()));
        store.dispatch(Action::SetAllPoiData(fallback_pois()));
        store
    }

    #[test]
    fn cached_beach_becomes_a_label_feature() {
        let (feature, kind) = cached_feature(&store(), "huntington-state-beach", None).unwrap();
        assert_eq!(kind, EntityType::Beach);
        assert_eq!(feature.layer.as_deref(), Some(BEACH_LAYER));
        assert_eq!(
            feature.stable_id().unwrap().as_str(),
            "huntington-state-beach"
        );
        assert!(feature.anchor().is_some());
    }

    #[test]
    fn lookup_falls_through_to_pois() {
        let (_, kind) = cached_feature(&store(), "santa-monica-pier-info-center", None).unwrap();
        assert_eq!(kind, EntityType::Poi);
    }

    #[test]
    fn hint_restricts_the_lookup() {
        let err = cached_feature(
            &store(),
            "huntington-state-beach",
            Some(EntityType::Poi),
        )
        .unwrap_err();
        assert!(matches!(err, CliError::NotFound { .. }));
    }

    #[test]
    fn regions_need_a_feature_file() {
        let err = cached_feature(&store(), "Malibu", Some(EntityType::Region)).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
    }

    #[test]
    fn viewport_respects_the_breakpoint() {
        let mut map = MapSettings::default();
        assert_eq!(viewport_width(&map, true), PHONE_WIDTH);
        assert_eq!(viewport_width(&map, false), DESKTOP_WIDTH);

        map.mobile_breakpoint = 1400;
        assert_eq!(viewport_width(&map, false), 1401);
    }
}
