use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

pub const DEFAULT_CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
pub const DEFAULT_FORECAST_URL: &str = "https://api.openweathermap.org/data/2.5/onecall";
pub const DEFAULT_ICON_BASE_URL: &str = "http://openweathermap.org/img/wn/";
pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json";
pub const DEFAULT_POSTAL_CODE: &str = "22093";
pub const DEFAULT_SWIPE_THRESHOLD: f32 = 80.0;

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "WEATHERLIFY_API_KEY";

/// Where the startup coordinates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    #[default]
    Ip,
    Fixed,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub mode: LocationMode,
    /// Used when `mode = "fixed"`.
    pub latitude: f64,
    pub longitude: f64,
    /// Used when `mode = "ip"`.
    pub lookup_url: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            mode: LocationMode::default(),
            latitude: 0.0,
            longitude: 0.0,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// default_postal_code = "10001"
///
/// [location]
/// mode = "fixed"
/// latitude = 40.75
/// longitude = -73.99
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub default_postal_code: String,
    pub current_url: String,
    pub forecast_url: String,
    pub icon_base_url: String,
    pub show_debug_json: bool,
    pub swipe_threshold: f32,
    pub location: LocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            default_postal_code: DEFAULT_POSTAL_CODE.to_string(),
            current_url: DEFAULT_CURRENT_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            show_debug_json: true,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config directory and apply the
    /// environment override. A missing file yields the defaults and is
    /// written out for later editing.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        if !path.exists() {
            // First run: leave an editable template behind.
            match cfg.save_to(&path) {
                Ok(()) => tracing::info!("Wrote default config to {}", path.display()),
                Err(e) => tracing::warn!("{:#}", e),
            }
        }
        cfg.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!("Loaded config from {}", path.display());
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherlify", "weatherlify")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Non-empty values replace the configured key.
    pub fn apply_api_key_override(&mut self, value: Option<String>) {
        if let Some(key) = value.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// The API key sent as `appid`. Empty when none is configured, in which
    /// case the provider answers with a non-200 `cod`.
    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }
}
