// 🌐 Geospatial Primitives
// Coordinate value type + great-circle (haversine) distance
//
// Everything downstream (history index, matcher, report) measures proximity
// through this one function, so it uses a fixed mean Earth radius for
// reproducible output across runs.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers (IUGG mean radius, rounded)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// ============================================================================
// COORDINATE
// ============================================================================

/// A WGS-84 position in degrees. No altitude.
///
/// Values are NOT range-checked here; the load boundary is responsible for
/// rejecting malformed records. Out-of-range degrees do not panic in the
/// distance math, they just produce meaningless distances.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinate { lat, lon }
    }
}

// ============================================================================
// HAVERSINE DISTANCE
// ============================================================================

/// Great-circle distance between two coordinates, in kilometers.
///
/// Haversine formula over a sphere of radius [`EARTH_RADIUS_KM`].
/// Identical inputs yield exactly 0.0, never NaN.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    // clamp guards against rounding pushing the haversine term past 1.0
    // for near-antipodal points
    let h = ((d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2))
    .clamp(0.0, 1.0);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

// ============================================================================
// TESTS
// ============================================================================
