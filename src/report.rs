// 📊 Report Assembler
// Ranks match results and shapes them for the external writers
//
// Three outputs from one ranked pass:
//   1. CSV table — one row per location of interest, ascending by distance,
//      unknown distances last (treated as "cannot rule out")
//   2. GeoJSON plot document — venue markers, matched-position markers and
//      connecting segments for the top-K closest pairs
//   3. Run summary — matched/unmatched counts and the single closest venue
//
// Nothing here touches the wall clock, so identical inputs produce
// byte-identical reports.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::cmp::Ordering;
use std::path::Path;

use crate::matcher::MatchResult;

/// Connecting segments drawn on the plot, default
pub const DEFAULT_TOP_K: usize = 10;

// ============================================================================
// RANKING
// ============================================================================

/// Sort results ascending by distance, unknowns last.
///
/// Stable: results tied on distance (and all the unknowns) keep the
/// matcher's input order.
pub fn rank_by_distance(mut results: Vec<MatchResult>) -> Vec<MatchResult> {
    results.sort_by(|a, b| match (a.distance_km, b.distance_km) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    results
}

// ============================================================================
// CSV REPORT
// ============================================================================

/// One row of the tabular report
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Event")]
    pub event: String,

    #[serde(rename = "Location")]
    pub place: String,

    #[serde(rename = "Start")]
    pub start: DateTime<Utc>,

    #[serde(rename = "End")]
    pub end: DateTime<Utc>,

    #[serde(rename = "Matched_Time")]
    pub matched_time: Option<DateTime<Utc>>,

    #[serde(rename = "Personal_Lat")]
    pub personal_lat: Option<f64>,

    #[serde(rename = "Personal_Lon")]
    pub personal_lon: Option<f64>,

    /// Empty field = unknown (no history data near the window)
    #[serde(rename = "Distance_km")]
    pub distance_km: Option<f64>,

    #[serde(rename = "Comment")]
    pub comment: String,
}

impl ReportRow {
    fn from_result(result: &MatchResult) -> Self {
        let comment = match &result.matched {
            Some(point) => {
                let gap = (result.loi.window_midpoint() - point.time).abs();
                format!("Nearest record {} min from window midpoint", gap.num_minutes())
            }
            None => "No matching records found in location history".to_string(),
        };

        ReportRow {
            event: result.loi.event.clone(),
            place: result.loi.place.clone(),
            start: result.loi.start,
            end: result.loi.end,
            matched_time: result.matched.map(|p| p.time),
            personal_lat: result.matched.map(|p| p.coord.lat),
            personal_lon: result.matched.map(|p| p.coord.lon),
            distance_km: result.distance_km.map(round_km),
            comment,
        }
    }
}

/// Report distances to meter-ish precision; full precision stays in the
/// in-memory results.
fn round_km(d: f64) -> f64 {
    (d * 1000.0).round() / 1000.0
}

/// Write the ranked results as CSV. Expects input already ranked by
/// [`rank_by_distance`]; rows are written in the order given.
pub fn write_csv(ranked: &[MatchResult], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output CSV {}", path.display()))?;

    for result in ranked {
        writer
            .serialize(ReportRow::from_result(result))
            .context("Failed to write report row")?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush output CSV {}", path.display()))?;
    Ok(())
}

// ============================================================================
// PLOT DOCUMENT (GeoJSON)
// ============================================================================

/// Build the GeoJSON FeatureCollection the map renderer consumes: one Point
/// per venue, one Point per matched personal position, and a LineString
/// joining venue to position for the `top_k` closest matched pairs.
pub fn build_plot_document(ranked: &[MatchResult], top_k: usize) -> serde_json::Value {
    let mut features = Vec::new();

    for result in ranked {
        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [result.loi.coord.lon, result.loi.coord.lat],
            },
            "properties": {
                "kind": "location_of_interest",
                "event": result.loi.event,
                "location": result.loi.place,
                "start": result.loi.start,
                "end": result.loi.end,
                "distance_km": result.distance_km,
            },
        }));

        if let Some(point) = &result.matched {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "Point",
                    "coordinates": [point.coord.lon, point.coord.lat],
                },
                "properties": {
                    "kind": "history",
                    "time": point.time,
                },
            }));
        }
    }

    // Ranked input → the first K matched results are the K closest
    for result in ranked.iter().filter(|r| r.matched.is_some()).take(top_k) {
        let point = result.matched.as_ref().unwrap();
        features.push(json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": [
                    [result.loi.coord.lon, result.loi.coord.lat],
                    [point.coord.lon, point.coord.lat],
                ],
            },
            "properties": {
                "kind": "link",
                "event": result.loi.event,
                "distance_km": result.distance_km,
            },
        }));
    }

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

/// Write the plot document to disk, pretty-printed.
pub fn write_plot_document(ranked: &[MatchResult], top_k: usize, path: &Path) -> Result<()> {
    let doc = build_plot_document(ranked, top_k);
    let pretty = serde_json::to_string_pretty(&doc).context("Failed to encode plot document")?;
    std::fs::write(path, pretty)
        .with_context(|| format!("Failed to write plot document {}", path.display()))?;
    Ok(())
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// Headline numbers for the operator: how much of the feed could be checked,
/// and what came closest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,

    /// (event name, distance_km) of the closest matched venue
    pub closest: Option<(String, f64)>,
}

impl RunSummary {
    pub fn from_results(results: &[MatchResult]) -> Self {
        let total = results.len();
        let matched = results.iter().filter(|r| r.is_matched()).count();

        let closest = results
            .iter()
            .filter_map(|r| r.distance_km.map(|d| (r.loi.event.clone(), d)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        RunSummary {
            total,
            matched,
            unmatched: total - matched,
            closest,
        }
    }

    pub fn has_gaps(&self) -> bool {
        self.unmatched > 0
    }
}

// ============================================================================
// TESTS
// ============================================================================
