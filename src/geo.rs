use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geolocation transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("geolocation provider unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current device position. `Ok(None)` means the provider answered but had
/// no usable fix, which callers treat the same as a failure.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn get_location(&self) -> Result<Option<Coordinates>, GeoError>;
}

#[derive(Debug, Deserialize)]
struct LocationBody {
    #[serde(default)]
    latitude: Option<f64>,
    #[serde(default)]
    longitude: Option<f64>,
}

/// Geolocation over HTTP: GETs a configured endpoint returning
/// `{latitude, longitude}`.
pub struct HttpGeolocator {
    client: reqwest::Client,
    url: String,
}

impl HttpGeolocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Geolocator for HttpGeolocator {
    async fn get_location(&self) -> Result<Option<Coordinates>, GeoError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("location endpoint returned {}", status);
            return Ok(None);
        }
        let body = match response.json::<LocationBody>().await {
            Ok(body) => body,
            Err(e) => {
                warn!("undecodable location body: {}", e);
                return Ok(None);
            }
        };
        match (body.latitude, body.longitude) {
            (Some(latitude), Some(longitude))
                if latitude.is_finite() && longitude.is_finite() =>
            {
                Ok(Some(Coordinates {
                    latitude,
                    longitude,
                }))
            }
            _ => Ok(None),
        }
    }
}
