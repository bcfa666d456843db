// src/services/ip_locator.rs
// DOCUMENTATION: IP geolocation client
// PURPOSE: Last-resort coarse position when the device cannot provide one

use crate::models::Coordinate;
use crate::services::geolocation::{GeolocationError, IpLocator, Position, PositionSourceKind};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Response from ipapi.co (only the fields we use)
#[derive(Debug, Deserialize)]
pub struct IpApiResponse {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub city: Option<String>,
    pub region: Option<String>,
    /// Set when the service refuses the lookup
    #[serde(default)]
    pub error: bool,
    pub reason: Option<String>,
}

impl IpApiResponse {
    pub fn into_position(self) -> Result<Position, GeolocationError> {
        if self.error {
            return Err(GeolocationError::PositionUnavailable(
                self.reason.unwrap_or_else(|| "IP lookup refused".to_string()),
            ));
        }

        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => {
                let coordinate = Coordinate::new(lon, lat);
                if !coordinate.is_valid() {
                    return Err(GeolocationError::PositionUnavailable(
                        "IP lookup returned invalid coordinates".to_string(),
                    ));
                }
                Ok(Position {
                    coordinate,
                    accuracy: None,
                    source: PositionSourceKind::IpLookup,
                })
            }
            _ => Err(GeolocationError::PositionUnavailable(
                "IP lookup returned no coordinates".to_string(),
            )),
        }
    }
}

pub struct IpApiLocator {
    client: Client,
    url: String,
}

impl IpApiLocator {
    pub fn new() -> Self {
        Self::with_url("https://ipapi.co/json/")
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

impl Default for IpApiLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpLocator for IpApiLocator {
    async fn locate(&self) -> Result<Position, GeolocationError> {
        log::debug!("IP geolocation lookup: {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            log::error!("IP geolocation request failed: {}", e);
            GeolocationError::PositionUnavailable(format!("Request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(GeolocationError::PositionUnavailable(format!(
                "IP lookup status {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| GeolocationError::PositionUnavailable(format!("Parse error: {}", e)))?;

        if let (Some(city), Some(region)) = (&body.city, &body.region) {
            log::debug!("IP geolocation resolved near {}, {}", city, region);
        }

        body.into_position()
    }
}
