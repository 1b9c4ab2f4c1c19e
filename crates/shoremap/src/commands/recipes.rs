//! Recipe table inspection.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use shoremap_core::{Recipe, RecipeTable, StepSpec};

use crate::cli::{RecipesArgs, RecipesCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

// ── Row types ───────────────────────────────────────────────────────

/// Where a recipe in the active table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Origin {
    Builtin,
    Config,
    /// A config entry replacing a built-in recipe.
    Override,
}

impl Origin {
    fn as_str(self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Config => "config",
            Self::Override => "override",
        }
    }
}

#[derive(Debug, Serialize)]
struct RecipeEntry<'a> {
    name: &'a str,
    origin: Origin,
    description: &'a str,
    steps: &'a [StepSpec],
}

#[derive(Tabled)]
struct RecipeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Steps")]
    steps: usize,
    #[tabled(rename = "Source")]
    origin: &'static str,
    #[tabled(rename = "Description")]
    description: String,
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Params")]
    params: String,
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: RecipesArgs, resolved: &Resolved) -> Result<(), CliError> {
    let builtin = RecipeTable::builtin();
    let origin = |name: &str| match (
        builtin.get(name).is_some(),
        resolved.config.recipes.contains_key(name),
    ) {
        (true, true) => Origin::Override,
        (false, true) => Origin::Config,
        _ => Origin::Builtin,
    };

    match args.command {
        RecipesCommand::List => {
            let entries: Vec<RecipeEntry<'_>> = resolved
                .recipes
                .iter()
                .map(|(name, recipe)| entry(name, recipe, origin(name)))
                .collect();
            let out = output::render_list(
                resolved.format,
                &entries,
                |e| RecipeRow {
                    name: e.name.to_owned(),
                    steps: e.steps.len(),
                    origin: e.origin.as_str(),
                    description: e.description.to_owned(),
                },
                |e| e.name.to_owned(),
            );
            output::print_output(&out, resolved.quiet);
        }

        RecipesCommand::Show { name } => {
            let recipe = resolved
                .recipes
                .get(&name)
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "recipe".into(),
                    identifier: name.clone(),
                    list_command: "recipes list".into(),
                })?;
            let shown = entry(&name, recipe, origin(&name));
            let color = resolved.color;
            let out = output::render_single(
                resolved.format,
                &shown,
                |e| detail(e, color),
                |e| {
                    e.steps
                        .iter()
                        .map(|s| s.step.kind().to_owned())
                        .collect::<Vec<_>>()
                        .join("\n")
                },
            );
            output::print_output(&out, resolved.quiet);
        }
    }
    Ok(())
}

fn entry<'a>(name: &'a str, recipe: &'a Recipe, origin: Origin) -> RecipeEntry<'a> {
    RecipeEntry {
        name,
        origin,
        description: &recipe.description,
        steps: &recipe.steps,
    }
}

fn detail(entry: &RecipeEntry<'_>, color: bool) -> String {
    let rows: Vec<StepRow> = entry
        .steps
        .iter()
        .enumerate()
        .map(|(i, spec)| StepRow {
            index: i + 1,
            kind: spec.step.kind().to_owned(),
            when: spec.when.as_ref().map(ToString::to_string).unwrap_or_default(),
            params: step_params(spec),
        })
        .collect();

    let mut lines = vec![
        output::heading(entry.name, color),
        output::field("source", entry.origin.as_str(), color),
    ];
    if !entry.description.is_empty() {
        lines.push(output::field("description", entry.description, color));
    }
    lines.push(output::render_table(&rows));
    lines.join("\n")
}

// `zoom=14.5 speed=2` from the step's wire form, minus type and guard.
fn step_params(spec: &StepSpec) -> String {
    let Ok(Value::Object(params)) = serde_json::to_value(spec) else {
        return String::new();
    };
    params
        .iter()
        .filter(|(k, _)| !matches!(k.as_str(), "type" | "when"))
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use shoremap_core::{Step, ViewCondition};

    use super::*;

    #[test]
    fn params_skip_type_and_guard() {
        let spec = StepSpec::when(
            Step::FlyTo {
                zoom: Some(14.5),
                speed: None,
            },
            ViewCondition::IsMobile,
        );
        assert_eq!(step_params(&spec), "zoom=14.5");
    }

    #[test]
    fn sidebar_param_is_unquoted() {
        let spec = StepSpec::always(Step::ShowSidebar {
            sidebar: shoremap_core::Sidebar::Detail,
        });
        assert_eq!(step_params(&spec), "sidebar=detail");
    }
}
