// 📍 Locations of Interest
// Validated exposure-event records + strict GeoJSON feed loading
//
// The published feed (NZ Ministry of Health layout) is a GeoJSON
// FeatureCollection: Point geometry as [lon, lat], properties carrying the
// event name, place description and a local-time exposure window formatted
// like "11/08/2021, 9:30 am". Every record is validated here, at the load
// boundary — nothing loosely-typed reaches the matcher.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::geo::Coordinate;

/// Time format used by the published feed, e.g. "11/08/2021, 9:30 am"
const FEED_TIME_FORMAT: &str = "%d/%m/%Y, %I:%M %p";

// ============================================================================
// LOCATION OF INTEREST
// ============================================================================

/// One published exposure event: a place plus the time window a confirmed
/// case was present there. Immutable after loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationOfInterest {
    /// Event name from the feed, e.g. "Countdown Birkenhead"
    pub event: String,

    /// Place description, e.g. the street address
    pub place: String,

    /// Published position of the venue
    pub coord: Coordinate,

    /// Exposure window start (UTC)
    pub start: DateTime<Utc>,

    /// Exposure window end (UTC)
    pub end: DateTime<Utc>,

    /// Source record id, when the feed provides one
    pub loi_id: Option<String>,
}

impl LocationOfInterest {
    /// Midpoint of the exposure window — the representative query time used
    /// by the matcher. Chosen over start/end because it minimizes the
    /// worst-case gap to any instant inside the window.
    pub fn window_midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }

    pub fn window_duration(&self) -> Duration {
        self.end - self.start
    }
}

// ============================================================================
// RAW FEED RECORDS (GeoJSON wire shape)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawFeatureCollection {
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    geometry: RawGeometry,
    properties: RawProperties,
}

#[derive(Debug, Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,

    /// GeoJSON order: [lon, lat]
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct RawProperties {
    #[serde(rename = "Event")]
    event: String,

    #[serde(rename = "Location")]
    location: String,

    #[serde(rename = "Start")]
    start: String,

    #[serde(rename = "End")]
    end: String,

    #[serde(rename = "id", default)]
    id: Option<String>,
}

// ============================================================================
// LOADING
// ============================================================================

/// Load and validate a locations-of-interest GeoJSON file.
///
/// `feed_offset` is the fixed UTC offset the feed's local wall-clock times
/// are interpreted in (the NZ feed publishes local times with no zone
/// marker). Any malformed record aborts the load — a partially-parsed feed
/// would silently under-report exposure.
pub fn load_locations_of_interest(
    path: &Path,
    feed_offset: FixedOffset,
) -> Result<Vec<LocationOfInterest>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open locations-of-interest file {}", path.display()))?;

    let raw: RawFeatureCollection = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON from {}", path.display()))?;

    if raw.features.is_empty() {
        bail!(
            "Locations-of-interest file {} contains no features",
            path.display()
        );
    }

    let mut locations = Vec::with_capacity(raw.features.len());
    for (i, feature) in raw.features.into_iter().enumerate() {
        let loi = validate_feature(feature, feed_offset)
            .with_context(|| format!("Invalid location-of-interest record at feature index {i}"))?;
        locations.push(loi);
    }

    Ok(locations)
}

/// Strict raw → validated construction for one feature.
fn validate_feature(feature: RawFeature, feed_offset: FixedOffset) -> Result<LocationOfInterest> {
    if feature.geometry.kind != "Point" {
        bail!("Expected Point geometry, found {:?}", feature.geometry.kind);
    }
    let (lon, lat) = match feature.geometry.coordinates[..] {
        [lon, lat] => (lon, lat),
        _ => bail!(
            "Expected [lon, lat] coordinate pair, found {} values",
            feature.geometry.coordinates.len()
        ),
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("Coordinate out of range: lat={lat}, lon={lon}");
    }

    let start = parse_feed_time(&feature.properties.start, feed_offset)
        .with_context(|| format!("Bad window start {:?}", feature.properties.start))?;
    let end = parse_feed_time(&feature.properties.end, feed_offset)
        .with_context(|| format!("Bad window end {:?}", feature.properties.end))?;
    if end < start {
        bail!("Window ends before it starts ({start} .. {end})");
    }

    Ok(LocationOfInterest {
        event: feature.properties.event,
        place: feature.properties.location,
        coord: Coordinate::new(lat, lon),
        start,
        end,
        loi_id: feature.properties.id,
    })
}

/// Parse a feed wall-clock time like "11/08/2021, 9:30 am" into UTC.
fn parse_feed_time(s: &str, feed_offset: FixedOffset) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s, FEED_TIME_FORMAT)
        .with_context(|| format!("Time {s:?} does not match format {FEED_TIME_FORMAT:?}"))?;
    let local = naive
        .and_local_timezone(feed_offset)
        .single()
        .with_context(|| format!("Time {s:?} is not a valid instant at offset {feed_offset}"))?;
    Ok(local.with_timezone(&Utc))
}

// ============================================================================
// TESTS
// ============================================================================
