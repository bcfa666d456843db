// src/services/geocoding_client.rs
// DOCUMENTATION: Geocoding API client
// PURPOSE: Forward geocoding, reverse geocoding and autocomplete suggestions
// against the Mapbox Geocoding API

use crate::errors::TowError;
use crate::models::{AddressSuggestion, Coordinate};
use crate::services::cache::{GeocodeCache, LookupKind};
use async_trait::async_trait;
use geojson::{Feature, FeatureCollection};
use reqwest::{Client, StatusCode, Url};
use std::sync::Arc;

/// Address lookup service
/// DOCUMENTATION: Abstracts the external geocoder so resolution logic and
/// handlers can be exercised without network access
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Single best match; `Ok(None)` for blank input or no candidate
    async fn forward(&self, address: &str) -> Result<Option<AddressSuggestion>, TowError>;

    /// Candidates in the service's ranking order, at most `limit`
    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<AddressSuggestion>, TowError>;

    /// Address label for a coordinate
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, TowError>;
}

/// Mapbox Geocoding v5 client
pub struct MapboxGeocoder {
    client: Client,
    access_token: String,
    base_url: String,
    /// Results near this point rank higher
    proximity: Option<Coordinate>,
    country: String,
    cache: Option<Arc<GeocodeCache>>,
}

impl MapboxGeocoder {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            base_url: "https://api.mapbox.com/geocoding/v5".to_string(),
            proximity: None,
            country: "us".to_string(),
            cache: None,
        }
    }

    /// Create client with shared cache
    pub fn new_with_cache(access_token: String, cache: Arc<GeocodeCache>) -> Self {
        Self {
            cache: Some(cache),
            ..Self::new(access_token)
        }
    }

    pub fn with_proximity(mut self, proximity: Coordinate) -> Self {
        self.proximity = Some(proximity);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, search_text: &str) -> Result<Url, TowError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TowError::ConfigurationError(format!("Invalid geocoder URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| TowError::ConfigurationError("Geocoder URL cannot be a base".to_string()))?
            .push("mapbox.places")
            .push(&format!("{}.json", search_text));
        Ok(url)
    }

    /// Perform one geocoding request
    async fn search(
        &self,
        search_text: &str,
        mut params: Vec<(&'static str, String)>,
    ) -> Result<Vec<AddressSuggestion>, TowError> {
        if self.access_token.is_empty() {
            return Err(TowError::ConfigurationError(
                "MAPBOX_ACCESS_TOKEN not configured".to_string(),
            ));
        }

        params.push(("access_token", self.access_token.clone()));
        let url = self.endpoint(search_text)?;

        log::debug!("Geocoder request: text={:?}", search_text);

        let response = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                log::error!("Geocoder request failed: {}", e);
                TowError::ExternalApiError(format!("Request failed: {}", e))
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            log::error!("Geocoder quota exceeded");
            return Err(TowError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("Geocoder error {}: {}", status, body);
            return Err(TowError::ExternalApiError(format!("API error {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            TowError::ExternalApiError(format!("Failed to read response: {}", e))
        })?;

        let results = parse_features(&body)?;
        log::debug!("Geocoder returned {} results", results.len());
        Ok(results)
    }

    fn base_params(&self, limit: usize, autocomplete: bool) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", limit.to_string()),
            ("country", self.country.clone()),
            ("autocomplete", autocomplete.to_string()),
        ];
        if let Some(p) = self.proximity {
            params.push(("proximity", format!("{},{}", p.longitude, p.latitude)));
        }
        params
    }

    async fn cached(&self, key: &str) -> Option<Vec<AddressSuggestion>> {
        let cache = self.cache.as_ref()?;
        let raw = cache.get(key).await?;
        serde_json::from_str(&raw).ok()
    }

    async fn store(&self, key: String, results: &[AddressSuggestion]) {
        if let Some(cache) = &self.cache {
            if let Ok(raw) = serde_json::to_string(results) {
                cache.set(key, raw).await;
            }
        }
    }

    async fn search_cached(
        &self,
        key: String,
        search_text: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<AddressSuggestion>, TowError> {
        if let Some(hit) = self.cached(&key).await {
            return Ok(hit);
        }
        let results = self.search(search_text, params).await?;
        self.store(key, &results).await;
        Ok(results)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn forward(&self, address: &str) -> Result<Option<AddressSuggestion>, TowError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let key = GeocodeCache::generate_key(LookupKind::Forward, address);
        let params = self.base_params(1, false);
        let results = self.search_cached(key, address, params).await?;
        Ok(results.into_iter().next())
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<AddressSuggestion>, TowError> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let key = GeocodeCache::generate_key(LookupKind::Suggest, &format!("{}#{}", query, limit));
        let params = self.base_params(limit, true);
        let mut results = self.search_cached(key, query, params).await?;
        results.truncate(limit);
        Ok(results)
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, TowError> {
        if !coordinate.is_valid() {
            return Err(TowError::InvalidInput("Coordinate out of range".to_string()));
        }

        let key = GeocodeCache::reverse_key(coordinate.longitude, coordinate.latitude);
        let search_text = format!("{},{}", coordinate.longitude, coordinate.latitude);
        let params = vec![("limit", "1".to_string()), ("types", "address,poi,place".to_string())];
        let results = self.search_cached(key, &search_text, params).await?;
        Ok(results.into_iter().next().map(|s| s.label))
    }
}

/// Convert a GeoJSON FeatureCollection into suggestions, preserving order
pub fn parse_features(body: &str) -> Result<Vec<AddressSuggestion>, TowError> {
    let collection: FeatureCollection = serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse geocoder response: {}", e);
        TowError::ExternalApiError(format!("Parse error: {}", e))
    })?;

    Ok(collection.features.iter().filter_map(feature_to_suggestion).collect())
}

fn feature_to_suggestion(feature: &Feature) -> Option<AddressSuggestion> {
    let coordinate = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Point(position)) => Coordinate::from_position(position),
        _ => foreign_member(feature, "center")
            .and_then(|v| v.as_array())
            .and_then(|arr| {
                let position: Vec<f64> = arr.iter().filter_map(|n| n.as_f64()).collect();
                Coordinate::from_position(&position)
            }),
    }?;

    let label = foreign_member(feature, "place_name")
        .and_then(|v| v.as_str())
        .or_else(|| {
            feature
                .properties
                .as_ref()
                .and_then(|p| p.get("full_address").or_else(|| p.get("name")))
                .and_then(|v| v.as_str())
        })?
        .to_string();

    Some(AddressSuggestion { label, coordinate })
}

fn foreign_member<'a>(feature: &'a Feature, key: &str) -> Option<&'a serde_json::Value> {
    feature.foreign_members.as_ref().and_then(|m| m.get(key))
}
