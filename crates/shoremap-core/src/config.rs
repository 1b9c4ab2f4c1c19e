// ── Runtime configuration ──
//
// These types describe how the map behaves and where data comes from.
// They never touch disk: shoremap-config (or a test) builds an
// `AppConfig` and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::model::LngLat;

/// Start position of the legacy full-page map, offset west so the
/// sidebar does not cover the coast.
pub const DEFAULT_START_POSITION: LngLat = LngLat::new(-144.811_259_12, 33.689_366_7);

/// Proxy served by the bundled dev server.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Top-level runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub map: MapSettings,
    pub cache: CacheSettings,
    pub api: ApiSettings,
}

// ── Map ──────────────────────────────────────────────────────────────

/// Camera, layout and interaction tuning for the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub desktop_start: LngLat,
    pub mobile_start: LngLat,
    pub default_zoom: f64,
    pub start_pitch: f64,
    /// Zoom used by `map:flyTo` when the command carries none.
    pub detail_zoom: f64,
    /// Fly animation speed used when the command carries none.
    pub fly_speed: f64,
    /// Ease animation speed used by `map:zoomTo` when the command carries none.
    pub zoom_speed: f64,
    /// Viewports at or below this width (px) are mobile.
    pub mobile_breakpoint: u32,
    pub allow_rotation: bool,
    pub move_debounce: Duration,
    pub resize_debounce: Duration,
    pub popup_offset: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            desktop_start: DEFAULT_START_POSITION,
            mobile_start: DEFAULT_START_POSITION,
            default_zoom: 3.0,
            start_pitch: 0.0,
            detail_zoom: 18.0,
            fly_speed: 1.5,
            zoom_speed: 1.2,
            mobile_breakpoint: 991,
            allow_rotation: false,
            move_debounce: Duration::from_millis(250),
            resize_debounce: Duration::from_millis(250),
            popup_offset: 32,
        }
    }
}

impl MapSettings {
    pub fn start_position(&self, is_mobile: bool) -> LngLat {
        if is_mobile {
            self.mobile_start
        } else {
            self.desktop_start
        }
    }

    pub fn is_mobile_width(&self, viewport_width: u32) -> bool {
        viewport_width <= self.mobile_breakpoint
    }
}

// ── Cache ────────────────────────────────────────────────────────────

/// What a scheduled weather expiry does when the entry was rewritten
/// after the timer was armed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WeatherExpiry {
    /// Only the timer armed by the latest write may delete the entry.
    #[default]
    LatestWrite,
    /// Every timer deletes the entry when it fires, even if a newer
    /// write replaced it in the meantime.
    ExpireRegardless,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    pub weather_ttl: Duration,
    pub weather_expiry: WeatherExpiry,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            weather_ttl: Duration::from_secs(5 * 60),
            weather_expiry: WeatherExpiry::LatestWrite,
        }
    }
}

// ── API ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub base_url: Url,
    pub timeout: Duration,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: Duration::from_secs(30),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_API_BASE_URL).expect("default API base URL is valid")
}
