// Proxy HTTP client
//
// Wraps `reqwest::Client` with URL construction under the configured base
// and uniform status / body handling. The proxies paginate the CMS
// internally, so every collection arrives in a single response.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{RawRecord, WeatherPayload};
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Read-only client for the beach, POI and weather proxy endpoints.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl ProxyClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the site root serving `/api/*` (e.g.
    /// `http://localhost:3000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout_secs: 0,
        }
    }

    /// The proxy base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /api/beaches`: every beach record.
    pub async fn list_beaches(&self) -> Result<Vec<RawRecord>, Error> {
        let url = self.api_url(&["beaches"])?;
        self.get_json(url).await
    }

    /// `GET /api/pois`: every point-of-interest record.
    pub async fn list_pois(&self) -> Result<Vec<RawRecord>, Error> {
        let url = self.api_url(&["pois"])?;
        self.get_json(url).await
    }

    /// `GET /api/weather/{location_id}`: current readings for a location.
    pub async fn get_weather(&self, location_id: &str) -> Result<WeatherPayload, Error> {
        let url = self.api_url(&["weather", location_id])?;
        self.get_json(url).await
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/api/{segments...}`, percent-encoding each segment.
    pub(crate) fn api_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::CannotBeABase(self.base_url.to_string()))?;
            path.pop_if_empty().push("api");
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_secs: self.timeout_secs,
                }
            } else {
                Error::Transport(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// Leading slice of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
