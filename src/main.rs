mod app;
mod components;
mod config;
mod error;
mod gesture;
mod icons;
mod location;
mod tabs;
mod view;
mod weather;

use anyhow::Result;
use app::WeatherApp;
use config::Config;
use iced::{Application, Settings};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load()?;
    if config.api_key.is_none() {
        tracing::warn!(
            "No API key configured; set {} or add api_key to {}",
            config::API_KEY_ENV,
            Config::config_file_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "config.toml".to_string())
        );
    }

    WeatherApp::run(Settings::with_flags(config))?;
    Ok(())
}
