//! Current weather readings for one beach.

use serde_json::Value;
use tabled::Tabled;

use shoremap_core::{CollectionSource, CoreError, WeatherSnapshot};

use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Reading")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub async fn handle(location: &str, resolved: &Resolved) -> Result<(), CliError> {
    let client = super::proxy_client(resolved)?;
    let snapshot = client.weather(location).await.map_err(|e| match e {
        CoreError::NotFound { .. } => CliError::NotFound {
            resource_type: "weather location".into(),
            identifier: location.to_owned(),
            list_command: "prefetch".into(),
        },
        other => CliError::from(other),
    })?;

    let out = output::render_single(
        resolved.format,
        &snapshot,
        |s| output::render_table(&rows(s)),
        |s| {
            rows(s)
                .into_iter()
                .map(|r| format!("{}={}", r.key, r.value))
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, resolved.quiet);
    Ok(())
}

fn rows(snapshot: &WeatherSnapshot) -> Vec<ReadingRow> {
    snapshot
        .0
        .iter()
        .map(|(key, value)| ReadingRow {
            key: key.clone(),
            value: match value {
                Value::String(s) => s.clone(),
                Value::Null => "N/A".into(),
                other => other.to_string(),
            },
        })
        .collect()
}
