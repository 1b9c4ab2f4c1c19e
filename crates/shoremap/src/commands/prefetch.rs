//! Startup prefetch against the configured proxies.

use std::sync::Arc;

use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use shoremap_core::{DataController, EventBus, PrefetchReport, Store};

use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Tabled)]
struct CollectionRow {
    #[tabled(rename = "Collection")]
    collection: &'static str,
    #[tabled(rename = "Records")]
    records: usize,
    #[tabled(rename = "Source")]
    source: String,
}

pub async fn handle(resolved: &Resolved) -> Result<(), CliError> {
    let client = super::proxy_client(resolved)?;
    let store = Arc::new(Store::new(EventBus::new()));
    let cancel = CancellationToken::new();
    let data = DataController::new(
        client,
        Arc::clone(&store),
        resolved.app.cache.clone(),
        cancel.clone(),
    );

    let report = data.init().await;
    cancel.cancel();
    tracing::info!(?report, "prefetch finished");

    let color = resolved.color;
    let out = output::render_single(
        resolved.format,
        &report,
        |r| detail(r, color),
        |r| format!("beaches {}\npois {}", r.beaches, r.pois),
    );
    output::print_output(&out, resolved.quiet);
    Ok(())
}

fn rows(report: &PrefetchReport, color: bool) -> Vec<CollectionRow> {
    let source = |fallback: bool| {
        if fallback {
            output::caution("fallback", color)
        } else {
            "proxy".to_owned()
        }
    };
    vec![
        CollectionRow {
            collection: "beaches",
            records: report.beaches,
            source: source(report.beaches_fallback),
        },
        CollectionRow {
            collection: "pois",
            records: report.pois,
            source: source(report.pois_fallback),
        },
    ]
}

fn detail(report: &PrefetchReport, color: bool) -> String {
    output::render_table(&rows(report, color))
}
