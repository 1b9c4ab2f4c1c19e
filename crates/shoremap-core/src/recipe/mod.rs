// ── Interaction recipes ──
//
// A recipe is a named, ordered list of steps. Tables are plain data:
// the built-in one lives in `builtin.rs`, and configuration can override
// or extend it. Step kinds form a closed enum; a table entry naming a
// kind this build does not know is kept as `Step::Unsupported` so the
// executor can warn and move past it.

mod builtin;

use std::str::FromStr;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, IntoStaticStr};

use crate::error::CoreError;
use crate::store::Sidebar;

// ── Step ─────────────────────────────────────────────────────────────

/// One unit of work within a recipe.
#[derive(Debug, Clone, PartialEq, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum Step {
    /// Fly the camera to the interacted feature.
    FlyTo {
        zoom: Option<f64>,
        speed: Option<f64>,
    },
    /// Fly back to the start position for the current layout.
    FlyToDefault,
    /// Make the interacted feature the current selection.
    UpdateSelection,
    ShowSidebar { sidebar: Sidebar },
    /// Open the popup for the interacted feature.
    ShowPopup { delay: Option<Duration> },
    CloseAllPopups,
    ZoomTo {
        zoom: Option<f64>,
        speed: Option<f64>,
    },
    ToggleFullscreen,
    /// A step kind this build does not implement.
    Unsupported { kind: String },
}

impl Step {
    /// Wire name of the step kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::Unsupported { kind } => kind,
            other => other.into(),
        }
    }
}

/// Layout guard on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ViewCondition {
    IsMobile,
    IsDesktop,
}

impl ViewCondition {
    pub fn holds(self, is_mobile: bool) -> bool {
        match self {
            Self::IsMobile => is_mobile,
            Self::IsDesktop => !is_mobile,
        }
    }
}

/// A step plus its optional guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStep", into = "RawStep")]
pub struct StepSpec {
    pub step: Step,
    pub when: Option<ViewCondition>,
}

impl StepSpec {
    pub fn always(step: Step) -> Self {
        Self { step, when: None }
    }

    pub fn when(step: Step, condition: ViewCondition) -> Self {
        Self {
            step,
            when: Some(condition),
        }
    }

    /// Whether the guard allows this step under the given layout.
    pub fn applies(&self, is_mobile: bool) -> bool {
        self.when.is_none_or(|c| c.holds(is_mobile))
    }
}

// ── Wire form ────────────────────────────────────────────────────────

// `{ type = "fly-to", zoom = 14.5, speed = 2, when = "isMobile" }`.
// Legacy names (`FLY_TO`, `UPDATE_APP_STATE`, `zoomLevel`,
// `when = { context = "isMobile" }`) are accepted on input.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    when: Option<RawCondition>,
    #[serde(flatten)]
    params: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Plain(ViewCondition),
    Context { context: ViewCondition },
}

impl RawCondition {
    fn condition(self) -> ViewCondition {
        match self {
            Self::Plain(c) | Self::Context { context: c } => c,
        }
    }
}

impl TryFrom<RawStep> for StepSpec {
    type Error = CoreError;

    fn try_from(raw: RawStep) -> Result<Self, Self::Error> {
        let params = &raw.params;
        let step = match normalize_kind(&raw.kind).as_str() {
            "fly-to" => Step::FlyTo {
                zoom: number(params, &["zoom", "zoomLevel"])?,
                speed: number(params, &["speed"])?,
            },
            "fly-to-default" | "fly-to-default-position" => Step::FlyToDefault,
            "update-selection" | "update-app-state" => Step::UpdateSelection,
            "show-sidebar" => {
                let name = params
                    .get("sidebar")
                    .and_then(Value::as_str)
                    .ok_or_else(|| invalid("show-sidebar needs a `sidebar` name"))?;
                let sidebar = Sidebar::from_str(name)
                    .map_err(|_| invalid(format!("unknown sidebar '{name}'")))?;
                Step::ShowSidebar { sidebar }
            }
            "show-popup" => Step::ShowPopup {
                delay: number(params, &["delay"])?.map(millis),
            },
            "close-all-popups" => Step::CloseAllPopups,
            "zoom-to" => Step::ZoomTo {
                zoom: number(params, &["zoom", "zoomLevel"])?,
                speed: number(params, &["speed"])?,
            },
            "toggle-fullscreen" => Step::ToggleFullscreen,
            _ => Step::Unsupported { kind: raw.kind },
        };

        Ok(Self {
            step,
            when: raw.when.map(RawCondition::condition),
        })
    }
}

impl From<StepSpec> for RawStep {
    fn from(spec: StepSpec) -> Self {
        let mut params = Map::new();
        match &spec.step {
            Step::FlyTo { zoom, speed } | Step::ZoomTo { zoom, speed } => {
                put_number(&mut params, "zoom", *zoom);
                put_number(&mut params, "speed", *speed);
            }
            Step::ShowPopup { delay: Some(delay) } => {
                let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                params.insert("delay".into(), Value::from(ms));
            }
            Step::ShowSidebar { sidebar } => {
                params.insert("sidebar".into(), Value::from(sidebar.to_string()));
            }
            _ => {}
        }
        Self {
            kind: spec.step.kind().to_owned(),
            when: spec.when.map(RawCondition::Plain),
            params,
        }
    }
}

fn put_number(params: &mut Map<String, Value>, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        params.insert(key.into(), Value::from(v));
    }
}

fn normalize_kind(kind: &str) -> String {
    kind.trim().to_ascii_lowercase().replace('_', "-")
}

fn number(params: &Map<String, Value>, keys: &[&str]) -> Result<Option<f64>, CoreError> {
    for key in keys {
        match params.get(*key) {
            None | Some(Value::Null) => {}
            Some(value) => {
                return value
                    .as_f64()
                    .map(Some)
                    .ok_or_else(|| invalid(format!("`{key}` must be a number, got {value}")));
            }
        }
    }
    Ok(None)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn millis(ms: f64) -> Duration {
    Duration::from_millis(ms.max(0.0) as u64)
}

fn invalid(reason: impl Into<String>) -> CoreError {
    CoreError::InvalidStep {
        reason: reason.into(),
    }
}

// ── Recipe & table ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
}

impl Recipe {
    pub fn new(description: impl Into<String>, steps: Vec<StepSpec>) -> Self {
        Self {
            description: description.into(),
            steps,
        }
    }

    /// Longest popup delay among the recipe's steps.
    pub fn max_popup_delay(&self) -> Duration {
        self.steps
            .iter()
            .filter_map(|s| match s.step {
                Step::ShowPopup { delay } => delay,
                _ => None,
            })
            .max()
            .unwrap_or_default()
    }
}

/// Recipes by name, in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeTable(IndexMap<String, Recipe>);

impl RecipeTable {
    /// The recipes every integration binds to.
    pub fn builtin() -> Self {
        builtin::table()
    }

    pub fn get(&self, name: &str) -> Option<&Recipe> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, recipe: Recipe) -> Option<Recipe> {
        self.0.insert(name.into(), recipe)
    }

    /// Add `overrides`, replacing recipes with the same name.
    pub fn extend(&mut self, overrides: impl IntoIterator<Item = (String, Recipe)>) {
        self.0.extend(overrides);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Recipe)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Recipe)> for RecipeTable {
    fn from_iter<I: IntoIterator<Item = (String, Recipe)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
