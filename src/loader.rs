// 📂 Location History Loader
// Strict parsing of the Google Takeout location-history export
//
// Export shape:
//   {"locations": [{"timestampMs": "1624241116000",
//                   "latitudeE7": -368759904, "longitudeE7": 1747639883, ...}]}
//
// Timestamps arrive as millisecond-epoch strings, positions as degrees
// scaled by 1e7. Every record is validated here; a malformed record is a
// fatal load error, not a silently dropped row.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::geo::Coordinate;
use crate::history::HistoryPoint;

// ============================================================================
// RAW EXPORT RECORDS (wire shape)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawHistoryFile {
    locations: Vec<RawHistoryRecord>,
}

#[derive(Debug, Deserialize)]
struct RawHistoryRecord {
    /// Millisecond epoch, as a decimal string in the export
    #[serde(rename = "timestampMs")]
    timestamp_ms: String,

    /// Degrees latitude scaled by 1e7
    #[serde(rename = "latitudeE7")]
    latitude_e7: i64,

    /// Degrees longitude scaled by 1e7
    #[serde(rename = "longitudeE7")]
    longitude_e7: i64,
}

// ============================================================================
// LOADING
// ============================================================================

/// Load and validate a location-history export.
///
/// `since` drops records older than the cutoff before they reach the index;
/// exports accumulate years of data and the published exposure windows only
/// cover recent weeks. `None` keeps everything.
pub fn load_location_history(path: &Path, since: Option<DateTime<Utc>>) -> Result<Vec<HistoryPoint>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open location history file {}", path.display()))?;

    let raw: RawHistoryFile = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse location history JSON from {}", path.display()))?;

    if raw.locations.is_empty() {
        bail!("Location history file {} contains no records", path.display());
    }

    let total = raw.locations.len();
    let mut points = Vec::with_capacity(total);
    for (i, record) in raw.locations.into_iter().enumerate() {
        let point = validate_record(record)
            .with_context(|| format!("Invalid location history record at index {i}"))?;
        if let Some(cutoff) = since {
            if point.time < cutoff {
                continue;
            }
        }
        points.push(point);
    }

    if points.is_empty() {
        // `since` is the only way to get here, total > 0 was checked above
        bail!(
            "All {total} location history records fall before the --since cutoff; \
             nothing left to match against"
        );
    }

    Ok(points)
}

/// Strict raw → validated construction for one record.
fn validate_record(record: RawHistoryRecord) -> Result<HistoryPoint> {
    let ms: i64 = record
        .timestamp_ms
        .parse()
        .with_context(|| format!("timestampMs {:?} is not an integer", record.timestamp_ms))?;
    let time = Utc
        .timestamp_millis_opt(ms)
        .single()
        .with_context(|| format!("timestampMs {ms} is out of representable range"))?;

    let lat = record.latitude_e7 as f64 * 1e-7;
    let lon = record.longitude_e7 as f64 * 1e-7;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("Coordinate out of range: lat={lat}, lon={lon}");
    }

    Ok(HistoryPoint::new(time, Coordinate::new(lat, lon)))
}

// ============================================================================
// DEMO HISTORY
// ============================================================================

/// Central Auckland, used as the anchor for the synthetic trajectory
const DEMO_CENTER: Coordinate = Coordinate {
    lat: -36.8760,
    lon: 174.7640,
};

/// Generate a synthetic location history for running the tool without a
/// real export: one point per minute starting at `start`, jittered around
/// central Auckland. Seeded, so repeated runs produce identical data.
pub fn demo_location_history(start: DateTime<Utc>, count: usize) -> Vec<HistoryPoint> {
    let mut rng = StdRng::seed_from_u64(123);

    (0..count)
        .map(|i| {
            let time = start + Duration::minutes(i as i64);
            let coord = Coordinate::new(
                DEMO_CENTER.lat + rng.random_range(-0.02..0.02),
                DEMO_CENTER.lon + rng.random_range(-0.02..0.02),
            );
            HistoryPoint::new(time, coord)
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
