use crate::config::Config;
use crate::error::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const UNITS: &str = "imperial";
pub const CURRENT_EXCLUDE: [&str; 4] = ["minutely", "hourly", "daily", "alerts"];
pub const FORECAST_EXCLUDE: [&str; 4] = ["current", "minutely", "hourly", "alerts"];

/// Weather for one point in time, normalized from either upstream shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub description: String,
    pub temp: f64,
    pub temp_max: f64,
    pub temp_min: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub icon: String,
    pub observed_at: Option<DateTime<Utc>>,
}

/// State of the current-conditions slot.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CurrentSlot {
    #[default]
    Pending,
    /// The provider answered with an application status other than 200.
    Unavailable { code: Option<i64> },
    Ready(WeatherSnapshot),
}

impl CurrentSlot {
    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            CurrentSlot::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

// Upstream payloads

/// `cod` is a number on success and frequently a string on errors. Only the
/// number 200 is success; string codes are kept for logging.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StatusCode {
    Number(i64),
    Text(String),
}

impl StatusCode {
    fn value(&self) -> Option<i64> {
        match self {
            StatusCode::Number(n) => Some(*n),
            StatusCode::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    cod: Option<StatusCode>,
}

#[derive(Debug, Clone, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    temp_max: f64,
    temp_min: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: CurrentMain,
    wind: CurrentWind,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DailyTemp {
    day: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct DailyEntry {
    dt: Option<i64>,
    temp: DailyTemp,
    humidity: f64,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    daily: Vec<DailyEntry>,
}

fn first_condition(conditions: &[Condition]) -> (String, String) {
    conditions
        .first()
        .map(|c| (c.description.clone(), c.icon.clone()))
        .unwrap_or_default()
}

fn timestamp(dt: Option<i64>) -> Option<DateTime<Utc>> {
    dt.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
}

impl From<CurrentResponse> for WeatherSnapshot {
    fn from(resp: CurrentResponse) -> Self {
        let (description, icon) = first_condition(&resp.weather);
        Self {
            description,
            temp: resp.main.temp,
            temp_max: resp.main.temp_max,
            temp_min: resp.main.temp_min,
            humidity: resp.main.humidity,
            wind_speed: resp.wind.speed,
            icon,
            observed_at: timestamp(resp.dt),
        }
    }
}

impl From<DailyEntry> for WeatherSnapshot {
    fn from(entry: DailyEntry) -> Self {
        let (description, icon) = first_condition(&entry.weather);
        Self {
            description,
            temp: entry.temp.day,
            temp_max: entry.temp.max,
            temp_min: entry.temp.min,
            humidity: entry.humidity,
            wind_speed: entry.wind_speed,
            icon,
            observed_at: timestamp(entry.dt),
        }
    }
}

/// Decode a current-weather body. Application status gates the full parse,
/// since error bodies carry only `cod` and `message`.
pub fn parse_current(body: &str) -> Result<CurrentSlot, FetchError> {
    let envelope: StatusEnvelope = serde_json::from_str(body)?;
    if !matches!(envelope.cod, Some(StatusCode::Number(200))) {
        let code = envelope.cod.as_ref().and_then(StatusCode::value);
        return Ok(CurrentSlot::Unavailable { code });
    }

    let parsed: CurrentResponse = serde_json::from_str(body)?;
    Ok(CurrentSlot::Ready(parsed.into()))
}

pub fn parse_forecast(body: &str) -> Result<Vec<WeatherSnapshot>, FetchError> {
    let parsed: ForecastResponse = serde_json::from_str(body)?;
    Ok(parsed.daily.into_iter().map(WeatherSnapshot::from).collect())
}

/// Client for the two weather endpoints.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    api_key: String,
    current_url: String,
    forecast_url: String,
}

impl WeatherClient {
    pub fn new(api_key: &str, current_url: &str, forecast_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            current_url: current_url.to_string(),
            forecast_url: forecast_url.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_key(), &config.current_url, &config.forecast_url)
    }

    pub fn current_query(&self, postal_code: &str) -> Vec<(&'static str, String)> {
        vec![
            ("appid", self.api_key.clone()),
            ("zip", postal_code.to_string()),
            ("units", UNITS.to_string()),
            ("exclude", CURRENT_EXCLUDE.join(",")),
        ]
    }

    pub fn forecast_query(&self, latitude: f64, longitude: f64) -> Vec<(&'static str, String)> {
        vec![
            ("appid", self.api_key.clone()),
            ("lat", latitude.to_string()),
            ("lon", longitude.to_string()),
            ("units", UNITS.to_string()),
            ("exclude", FORECAST_EXCLUDE.join(",")),
        ]
    }

    /// Fetch current conditions for a postal code.
    ///
    /// The transport status is not inspected; success is decided by the
    /// `cod` field of the body.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(&self, postal_code: &str) -> Result<CurrentSlot, FetchError> {
        let response = self
            .http
            .get(&self.current_url)
            .query(&self.current_query(postal_code))
            .send()
            .await?;
        tracing::debug!("Current weather responded with HTTP {}", response.status());

        let body = response.text().await?;
        let slot = parse_current(&body)?;
        if let CurrentSlot::Unavailable { code } = &slot {
            tracing::info!("Current weather unavailable, cod = {:?}", code);
        }
        Ok(slot)
    }

    /// Fetch the daily forecast for a coordinate pair.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<WeatherSnapshot>, FetchError> {
        let response = self
            .http
            .get(&self.forecast_url)
            .query(&self.forecast_query(latitude, longitude))
            .send()
            .await?;
        tracing::debug!("Forecast responded with HTTP {}", response.status());

        let body = response.text().await?;
        let days = parse_forecast(&body)?;
        tracing::info!("Forecast returned {} days", days.len());
        Ok(days)
    }
}
