use crate::config::{LocationConfig, LocationMode};
use crate::error::LocationError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The pair used to key weather requests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub postal_code: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(postal_code: &str) -> Self {
        Self {
            postal_code: postal_code.to_string(),
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    /// Stored verbatim, no format check.
    pub fn set_postal_code(&mut self, postal_code: String) {
        self.postal_code = postal_code;
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.latitude = coordinates.latitude;
        self.longitude = coordinates.longitude;
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// A one-shot source of the device's approximate position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Approximates the position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    http: Client,
    lookup_url: String,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

impl IpGeolocator {
    pub fn new(lookup_url: &str) -> Result<Self, LocationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            lookup_url: lookup_url.to_string(),
        })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self.http.get(&self.lookup_url).send().await?;

        if !response.status().is_success() {
            return Err(LocationError::Lookup(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response.json().await?;
        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(latitude), Some(longitude)) => Ok(Coordinates {
                latitude,
                longitude,
            }),
            _ => Err(LocationError::Lookup(
                body.message.unwrap_or_else(|| format!("status {}", body.status)),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeolocator;

#[async_trait]
impl Geolocator for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable)
    }
}

/// Build the geolocator selected by configuration. An IP geolocator whose
/// HTTP client cannot be built degrades to the disabled one.
pub fn geolocator_from_config(config: &LocationConfig) -> Arc<dyn Geolocator> {
    match config.mode {
        LocationMode::Ip => match IpGeolocator::new(&config.lookup_url) {
            Ok(geolocator) => Arc::new(geolocator),
            Err(e) => {
                tracing::warn!("Failed to create location client: {}", e);
                Arc::new(DisabledGeolocator)
            }
        },
        LocationMode::Fixed => Arc::new(FixedGeolocator(Coordinates {
            latitude: config.latitude,
            longitude: config.longitude,
        })),
        LocationMode::Disabled => Arc::new(DisabledGeolocator),
    }
}

/// Run the lookup once. Failures are logged and reported as `None`, so the
/// caller keeps its default coordinates.
pub async fn resolve_coordinates(geolocator: Arc<dyn Geolocator>) -> Option<Coordinates> {
    match geolocator.locate().await {
        Ok(coordinates) => {
            tracing::info!(
                "Resolved location to {:.4}, {:.4}",
                coordinates.latitude,
                coordinates.longitude
            );
            Some(coordinates)
        }
        Err(e) => {
            tracing::warn!("Location unavailable, keeping default coordinates: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn new_location_defaults_to_origin() {
        let location = Location::new("22093");
        assert_eq!(location.postal_code, "22093");
        assert_eq!(location.latitude, 0.0);
        assert_eq!(location.longitude, 0.0);
    }

    #[test]
    fn postal_code_is_not_validated() {
        let mut location = Location::new("22093");
        location.set_postal_code("not a zip!".into());
        assert_eq!(location.postal_code, "not a zip!");
    }

    #[tokio::test]
    async fn ip_lookup_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "city": "Centreville",
                "lat": 38.84,
                "lon": -77.43
            })))
            .mount(&mock_server)
            .await;

        let geolocator = IpGeolocator::new(&mock_server.uri()).unwrap();
        let coords = geolocator.locate().await.unwrap();

        assert_eq!(coords.latitude, 38.84);
        assert_eq!(coords.longitude, -77.43);
    }

    #[tokio::test]
    async fn ip_lookup_fail_status_carries_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "reserved range"
            })))
            .mount(&mock_server)
            .await;

        let geolocator = IpGeolocator::new(&mock_server.uri()).unwrap();
        let err = geolocator.locate().await.unwrap_err();

        assert_eq!(err, LocationError::Lookup("reserved range".into()));
    }

    #[tokio::test]
    async fn ip_lookup_malformed_body_is_lookup_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let geolocator = IpGeolocator::new(&mock_server.uri()).unwrap();
        let err = geolocator.locate().await.unwrap_err();

        assert!(matches!(err, LocationError::Lookup(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn resolve_keeps_defaults_when_disabled() {
        assert_eq!(resolve_coordinates(Arc::new(DisabledGeolocator)).await, None);
    }

    #[tokio::test]
    async fn fixed_mode_uses_configured_coordinates() {
        let config = LocationConfig {
            mode: LocationMode::Fixed,
            latitude: 47.6,
            longitude: -122.3,
            ..LocationConfig::default()
        };

        let coords = resolve_coordinates(geolocator_from_config(&config)).await;
        assert_eq!(
            coords,
            Some(Coordinates {
                latitude: 47.6,
                longitude: -122.3
            })
        );
    }
}
