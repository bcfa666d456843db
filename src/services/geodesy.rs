// src/services/geodesy.rs
// DOCUMENTATION: Great-circle distance helpers
// PURPOSE: Haversine distance in miles between two coordinates

use geo_types::Point;

/// Mean Earth radius in statute miles
pub const EARTH_RADIUS_MILES: f64 = 3958.7613;

pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

pub fn rad_to_deg(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

/// Calculate distance between two points in miles
/// Uses Haversine formula; points are (x = longitude, y = latitude)
pub fn haversine_miles<A, B>(from: A, to: B) -> f64
where
    A: Into<Point<f64>>,
    B: Into<Point<f64>>,
{
    let from = from.into();
    let to = to.into();

    let lat1 = deg_to_rad(from.y());
    let lat2 = deg_to_rad(to.y());
    let d_lat = deg_to_rad(to.y() - from.y());
    let d_lon = deg_to_rad(to.x() - from.x());

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // sqrt(h) can drift past 1.0 for near-antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_MILES * c
}

/// Render miles as a decimal string without extra rounding
pub fn format_miles(miles: f64) -> String {
    miles.to_string()
}
