// ── Core error types ──
//
// User-facing errors from shoremap-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<shoremap_api::Error>`
// impl translates transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Initialization ───────────────────────────────────────────────
    #[error("Map failed to initialize: {reason}")]
    MapInit { reason: String },

    // ── Remote data ──────────────────────────────────────────────────
    #[error("Cannot reach data proxy at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Data proxy timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Lookups ──────────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    #[error("No recipe named '{name}'")]
    RecipeNotFound { name: String },

    // ── Recipes ──────────────────────────────────────────────────────
    #[error("Invalid recipe step: {reason}")]
    InvalidStep { reason: String },

    // ── Bus ──────────────────────────────────────────────────────────
    #[error("Handler for {topic} failed: {message}")]
    Handler { topic: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<shoremap_api::Error> for CoreError {
    fn from(err: shoremap_api::Error) -> Self {
        match err {
            shoremap_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            shoremap_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            shoremap_api::Error::CannotBeABase(url) => CoreError::Config {
                message: format!("Base URL cannot carry a path: {url}"),
            },
            shoremap_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            shoremap_api::Error::Status { status: 404, url, .. } => CoreError::NotFound {
                entity_type: "resource".into(),
                identifier: url,
            },
            shoremap_api::Error::Status {
                status,
                url,
                message,
            } => CoreError::Api {
                message: format!("{url}: {message}"),
                status: Some(status),
            },
            shoremap_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_404_maps_to_not_found() {
        let err = CoreError::from(shoremap_api::Error::Status {
            status: 404,
            url: "http://localhost:3000/api/weather/x".into(),
            message: String::new(),
        });
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn server_errors_keep_their_status() {
        let err = CoreError::from(shoremap_api::Error::Status {
            status: 502,
            url: "http://localhost:3000/api/pois".into(),
            message: "bad gateway".into(),
        });
        assert!(matches!(err, CoreError::Api { status: Some(502), .. }));
    }
}
