//! Coordinate helpers

use haversine::{Location as HaversineLocation, Units, distance};

use crate::models::GeoPoint;

/// Normalize a compass direction into [0, 360)
#[must_use]
pub fn normalize_direction(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 { 0.0 } else { normalized }
}

/// Convert a meteorological wind direction (degrees the wind blows FROM,
/// clockwise from north) into a mathematical heading in radians
/// (0 = east, counter-clockwise positive).
#[must_use]
pub fn meteorological_to_heading_rad(direction_degrees: f64) -> f64 {
    (270.0 - direction_degrees).to_radians()
}

/// Convert an east-west offset in degrees of latitude into degrees of
/// longitude at the given latitude.
///
/// Unguarded near the poles: at ±90° the cosine is ~0 and the result blows up.
#[must_use]
pub fn longitude_offset(east_offset_deg: f64, latitude: f64) -> f64 {
    east_offset_deg / latitude.to_radians().cos()
}

/// Rotate a point around the origin by `angle_rad`
#[must_use]
pub fn rotate(x: f64, y: f64, angle_rad: f64) -> (f64, f64) {
    let (sin, cos) = angle_rad.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}

/// Great-circle distance between two points in kilometers
#[must_use]
pub fn haversine_km(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let from = HaversineLocation {
        latitude: from.latitude,
        longitude: from.longitude,
    };
    let to = HaversineLocation {
        latitude: to.latitude,
        longitude: to.longitude,
    };
    distance(from, to, Units::Kilometers)
}
