//! Shared configuration for the shoremap tools.
//!
//! A TOML file in the platform config dir, layered under `SHOREMAP_`
//! environment overrides, translated into `shoremap_core::AppConfig`.
//! The file can also override or extend the built-in recipe table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shoremap_core::{
    ApiSettings, AppConfig, CacheSettings, LngLat, MapSettings, Recipe, RecipeTable, WeatherExpiry,
};

/// Environment prefix; nested keys are separated by `__`
/// (`SHOREMAP_CACHE__WEATHER_TTL=10m`).
pub const ENV_PREFIX: &str = "SHOREMAP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// CLI presentation defaults.
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub map: MapSection,

    #[serde(default)]
    pub cache: CacheSection,

    /// Recipes added to, or replacing, the built-in table.
    #[serde(default)]
    pub recipes: IndexMap<String, Recipe>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// Where the data proxies live.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiSection {
    /// Base URL serving `/api/beaches`, `/api/pois` and `/api/weather/{id}`.
    pub url: String,

    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl Default for ApiSection {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            url: api.base_url.to_string(),
            timeout: api.timeout,
        }
    }
}

/// Camera and layout tuning. Unset keys keep the shipped values.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MapSection {
    pub desktop_start: LngLat,
    pub mobile_start: LngLat,
    pub default_zoom: f64,
    pub start_pitch: f64,
    pub detail_zoom: f64,
    pub fly_speed: f64,
    pub zoom_speed: f64,
    pub mobile_breakpoint: u32,
    pub allow_rotation: bool,
    #[serde(with = "human_duration")]
    pub move_debounce: Duration,
    #[serde(with = "human_duration")]
    pub resize_debounce: Duration,
    pub popup_offset: u32,
}

impl Default for MapSection {
    fn default() -> Self {
        let map = MapSettings::default();
        Self {
            desktop_start: map.desktop_start,
            mobile_start: map.mobile_start,
            default_zoom: map.default_zoom,
            start_pitch: map.start_pitch,
            detail_zoom: map.detail_zoom,
            fly_speed: map.fly_speed,
            zoom_speed: map.zoom_speed,
            mobile_breakpoint: map.mobile_breakpoint,
            allow_rotation: map.allow_rotation,
            move_debounce: map.move_debounce,
            resize_debounce: map.resize_debounce,
            popup_offset: map.popup_offset,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSection {
    #[serde(with = "human_duration")]
    pub weather_ttl: Duration,
    pub weather_expiry: WeatherExpiry,
}

impl Default for CacheSection {
    fn default() -> Self {
        let cache = CacheSettings::default();
        Self {
            weather_ttl: cache.weather_ttl,
            weather_expiry: cache.weather_expiry,
        }
    }
}

// Durations are written the way people say them: "5m", "250ms", "30s".
mod human_duration {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(text.trim()).map_err(D::Error::custom)
    }
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the runtime configuration.
    pub fn to_app_config(&self) -> Result<AppConfig, ConfigError> {
        let base_url: url::Url = self.api.url.parse().map_err(|_| ConfigError::Validation {
            field: "api.url".into(),
            reason: format!("invalid URL: {}", self.api.url),
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api.url".into(),
                reason: format!("expected an http(s) URL, got '{}'", self.api.url),
            });
        }
        require_nonzero("api.timeout", self.api.timeout)?;
        require_nonzero("cache.weather_ttl", self.cache.weather_ttl)?;
        require_positive("map.fly_speed", self.map.fly_speed)?;
        require_positive("map.zoom_speed", self.map.zoom_speed)?;

        let map = &self.map;
        Ok(AppConfig {
            map: MapSettings {
                desktop_start: map.desktop_start,
                mobile_start: map.mobile_start,
                default_zoom: map.default_zoom,
                start_pitch: map.start_pitch,
                detail_zoom: map.detail_zoom,
                fly_speed: map.fly_speed,
                zoom_speed: map.zoom_speed,
                mobile_breakpoint: map.mobile_breakpoint,
                allow_rotation: map.allow_rotation,
                move_debounce: map.move_debounce,
                resize_debounce: map.resize_debounce,
                popup_offset: map.popup_offset,
            },
            cache: CacheSettings {
                weather_ttl: self.cache.weather_ttl,
                weather_expiry: self.cache.weather_expiry,
            },
            api: ApiSettings {
                base_url,
                timeout: self.api.timeout,
            },
        })
    }

    /// The built-in recipes with this file's overrides applied.
    pub fn recipe_table(&self) -> RecipeTable {
        let mut table = RecipeTable::builtin();
        table.extend(self.recipes.clone());
        table
    }
}

fn require_nonzero(field: &str, value: Duration) -> Result<(), ConfigError> {
    if value.is_zero() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(())
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "shoremap", "shoremap").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("shoremap");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing is fine) layered under the environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use figment::Jail;
    use pretty_assertions::assert_eq;
    use shoremap_core::{Step, StepSpec, ViewCondition};

    use super::*;

    #[test]
    fn defaults_translate_to_shipped_settings() {
        let app = Config::default().to_app_config().unwrap();
        let shipped = AppConfig::default();

        assert_eq!(app.map, shipped.map);
        assert_eq!(app.cache, shipped.cache);
        assert_eq!(app.api, shipped.api);
    }

    // Loading reads the process environment, so every test that loads
    // runs inside a jail.
    fn jailed(toml: &str, check: impl FnOnce(Result<Config, ConfigError>)) {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", toml)?;
            check(load_config_from(Path::new("config.toml")));
            Ok(())
        });
    }

    #[test]
    fn file_overrides_durations_and_recipes() {
        let toml = r#"
[api]
url = "https://beaches.example.com"
timeout = "10s"

[map]
mobile_breakpoint = 767
move_debounce = "400ms"
mobile_start = [-118.25, 34.05]

[cache]
weather_ttl = "10m"
weather_expiry = "expire-regardless"

[recipes.selectState]
description = "Zoom in further on states."
steps = [
    { type = "fly-to", zoom = 6, speed = 1.5 },
    { type = "update-selection" },
    { type = "show-sidebar", sidebar = "list" },
]

[recipes.peekBeach]
steps = [{ type = "show-popup", delay = 0, when = "isDesktop" }]
"#;
        jailed(toml, |loaded| {
            let cfg = loaded.unwrap();
            let app = cfg.to_app_config().unwrap();

            assert_eq!(app.api.base_url.as_str(), "https://beaches.example.com/");
            assert_eq!(app.api.timeout, Duration::from_secs(10));
            assert_eq!(app.map.mobile_breakpoint, 767);
            assert_eq!(app.map.move_debounce, Duration::from_millis(400));
            assert_eq!(app.map.mobile_start, LngLat::new(-118.25, 34.05));
            assert_eq!(app.cache.weather_ttl, Duration::from_secs(600));
            assert_eq!(app.cache.weather_expiry, WeatherExpiry::ExpireRegardless);

            let table = cfg.recipe_table();
            assert_eq!(table.len(), RecipeTable::builtin().len() + 1);
            let state = table.get("selectState").unwrap();
            assert_eq!(state.description, "Zoom in further on states.");
            assert_eq!(
                state.steps[0],
                StepSpec::always(Step::FlyTo {
                    zoom: Some(6.0),
                    speed: Some(1.5)
                })
            );
            assert_eq!(
                table.get("peekBeach").unwrap().steps[0].when,
                Some(ViewCondition::IsDesktop)
            );
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        Jail::expect_with(|_| {
            let cfg = load_config_from(Path::new("absent.toml")).unwrap();

            assert_eq!(cfg.defaults.output, "table");
            assert!(cfg.recipes.is_empty());
            assert_eq!(cfg.recipe_table(), RecipeTable::builtin());
            Ok(())
        });
    }

    #[test]
    fn environment_overrides_the_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[api]
url = "https://file.example.com"

[cache]
weather_ttl = "10m"
"#,
            )?;
            jail.set_env("SHOREMAP_API__URL", "http://127.0.0.1:8787");
            jail.set_env("SHOREMAP_CACHE__WEATHER_TTL", "90s");

            let cfg = load_config_from(Path::new("config.toml")).unwrap();

            assert_eq!(cfg.api.url, "http://127.0.0.1:8787");
            assert_eq!(cfg.cache.weather_ttl, Duration::from_secs(90));
            Ok(())
        });
    }

    #[test]
    fn bad_duration_is_a_load_error() {
        jailed("[cache]\nweather_ttl = \"soon\"\n", |loaded| {
            assert!(matches!(loaded, Err(ConfigError::Figment(_))));
        });
    }

    #[test]
    fn unknown_step_type_loads_as_unsupported() {
        jailed("[recipes.wave]\nsteps = [{ type = \"confetti\" }]\n", |loaded| {
            let table = loaded.unwrap().recipe_table();
            assert_eq!(
                table.get("wave").unwrap().steps[0].step,
                Step::Unsupported {
                    kind: "confetti".into()
                }
            );
        });
    }

    #[test]
    fn invalid_url_fails_validation() {
        let mut cfg = Config::default();
        cfg.api.url = "ftp://beaches.example.com".into();

        let err = cfg.to_app_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "api.url"));
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let mut cfg = Config::default();
        cfg.cache.weather_ttl = Duration::ZERO;

        assert!(matches!(
            cfg.to_app_config(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.api.url = "https://saved.example.com/".into();
        cfg.cache.weather_ttl = Duration::from_secs(120);

        save_config_to(&cfg, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("weather_ttl = \"2m\""));

        Jail::expect_with(|_| {
            let loaded = load_config_from(&path).unwrap();
            assert_eq!(loaded.api.url, "https://saved.example.com/");
            assert_eq!(loaded.cache.weather_ttl, Duration::from_secs(120));
            Ok(())
        });
    }
}
