// src/models/location.rs
// DOCUMENTATION: Geographic data structures
// PURPOSE: Coordinates, address suggestions and the pickup/drop-off state

use geo_types::Point;
use serde::{Deserialize, Serialize};

/// Coordinate in decimal degrees, longitude first
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Coordinate {
            longitude,
            latitude,
        }
    }

    /// Build from a GeoJSON style `[lon, lat]` position
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Coordinate::new(*lon, *lat)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Link that opens the point in Google Maps
    pub fn google_maps_link(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.longitude, c.latitude)
    }
}

impl From<Point<f64>> for Coordinate {
    fn from(p: Point<f64>) -> Self {
        Coordinate::new(p.x(), p.y())
    }
}

/// Candidate address returned by the geocoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSuggestion {
    /// Display string, also the value written into the text field on selection
    pub label: String,
    pub coordinate: Coordinate,
}

/// Pickup / drop-off state of the estimate form
/// DOCUMENTATION: `miles` is only written by the explicit distance
/// calculation; editing an address never recomputes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub from_address: String,
    pub to_address: String,
    pub from_selected: Option<AddressSuggestion>,
    pub to_selected: Option<AddressSuggestion>,
    /// Decimal string, empty until calculated
    pub miles: String,
    pub current_coords: Option<Coordinate>,
}

/// Which end of the trip a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Pickup,
    Dropoff,
}

impl Endpoint {
    pub fn field_name(&self) -> &'static str {
        match self {
            Endpoint::Pickup => "fromAddress",
            Endpoint::Dropoff => "toAddress",
        }
    }
}

impl LocationInfo {
    /// Record a suggestion picked from the dropdown
    pub fn select(&mut self, endpoint: Endpoint, suggestion: AddressSuggestion) {
        match endpoint {
            Endpoint::Pickup => {
                self.from_address = suggestion.label.clone();
                self.from_selected = Some(suggestion);
            }
            Endpoint::Dropoff => {
                self.to_address = suggestion.label.clone();
                self.to_selected = Some(suggestion);
            }
        }
    }

    /// Free typing keeps the previous selection; it is ignored at
    /// resolution time once the label no longer matches
    pub fn set_text(&mut self, endpoint: Endpoint, text: &str) {
        match endpoint {
            Endpoint::Pickup => self.from_address = text.to_string(),
            Endpoint::Dropoff => self.to_address = text.to_string(),
        }
    }

    /// Use the device position as pickup
    pub fn use_current_location(&mut self, coordinate: Coordinate, label: Option<String>) {
        self.current_coords = Some(coordinate);
        let label =
            label.unwrap_or_else(|| format!("{}, {}", coordinate.latitude, coordinate.longitude));
        self.select(
            Endpoint::Pickup,
            AddressSuggestion {
                label,
                coordinate,
            },
        );
    }

    pub fn text(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Pickup => &self.from_address,
            Endpoint::Dropoff => &self.to_address,
        }
    }

    pub fn selected(&self, endpoint: Endpoint) -> Option<&AddressSuggestion> {
        match endpoint {
            Endpoint::Pickup => self.from_selected.as_ref(),
            Endpoint::Dropoff => self.to_selected.as_ref(),
        }
    }
}

/// Query string for GET /api/geocode
#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub address: String,
}

/// Query string for GET /api/suggest
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

/// Query string for GET /api/reverse
#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lon: f64,
}

/// Request body for POST /api/distance
#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceRequest {
    pub from: Coordinate,
    pub to: Coordinate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub miles: String,
}
