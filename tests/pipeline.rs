// End-to-end pipeline tests: real temp files in, CSV + plot document out.

use chrono::{FixedOffset, TimeZone, Utc};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use loi_checker::{
    load_location_history, load_locations_of_interest, rank_by_distance, write_csv,
    write_plot_document, HistoryIndex, Matcher, RunSummary,
};

fn nzst() -> FixedOffset {
    FixedOffset::east_opt(12 * 3600).unwrap()
}

/// Two history points around central Auckland on the morning of
/// 11 August 2021 NZST (2021-08-10 UTC evening).
/// 1628629200000 ms = 2021-08-10T21:00:00Z = 11/08/2021 9:00 am NZST.
const HISTORY: &str = r#"{
    "locations": [
        {"timestampMs": "1628629200000", "latitudeE7": -368485000, "longitudeE7": 1747633000},
        {"timestampMs": "1628632800000", "latitudeE7": -369000000, "longitudeE7": 1748000000}
    ]
}"#;

/// Two venues: one with a window overlapping the history, one a week later
/// with no nearby history data.
const FEED: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [174.7633, -36.8485] },
            "properties": {
                "Event": "Cafe on Quay St",
                "Location": "Auckland CBD",
                "Start": "11/08/2021, 8:45 am",
                "End": "11/08/2021, 9:15 am"
            }
        },
        {
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [174.7756, -41.2866] },
            "properties": {
                "Event": "Wellington Supermarket",
                "Location": "Wellington",
                "Start": "18/08/2021, 2:00 pm",
                "End": "18/08/2021, 3:00 pm"
            }
        }
    ]
}"#;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn run_pipeline(out_dir: &TempDir) -> (String, String) {
    let history_file = write_temp(HISTORY);
    let feed_file = write_temp(FEED);

    let points = load_location_history(history_file.path(), None).unwrap();
    let locations = load_locations_of_interest(feed_file.path(), nzst()).unwrap();

    let index = HistoryIndex::new(points);
    let matcher = Matcher::new(locations, Some(chrono::Duration::hours(2)));
    let ranked = rank_by_distance(matcher.run(&index));

    let csv_path = out_dir.path().join("report.csv");
    let plot_path = out_dir.path().join("plot.geojson");
    write_csv(&ranked, &csv_path).unwrap();
    write_plot_document(&ranked, 10, &plot_path).unwrap();

    (
        std::fs::read_to_string(csv_path).unwrap(),
        std::fs::read_to_string(plot_path).unwrap(),
    )
}

#[test]
fn full_pipeline_ranks_and_reports() {
    let out = TempDir::new().unwrap();
    let (csv, plot) = run_pipeline(&out);

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3, "header + one row per venue:\n{csv}");

    // The cafe window (8:45-9:15 NZST, midpoint 9:00) lands exactly on the
    // first history point, which sits at the venue itself.
    assert!(lines[1].starts_with("Cafe on Quay St,"));
    assert!(lines[1].contains("2021-08-10T21:00:00"));
    assert!(lines[1].contains(",0.0,") || lines[1].contains(",0,"));

    // The Wellington venue is a week outside the history; unknown, last.
    assert!(lines[2].starts_with("Wellington Supermarket,"));
    assert!(lines[2].contains("No matching records found"));

    // Plot document: 2 venues, 1 matched position, 1 link.
    let doc: serde_json::Value = serde_json::from_str(&plot).unwrap();
    let features = doc["features"].as_array().unwrap();
    let count = |kind: &str| {
        features
            .iter()
            .filter(|f| f["properties"]["kind"] == kind)
            .count()
    };
    assert_eq!(count("location_of_interest"), 2);
    assert_eq!(count("history"), 1);
    assert_eq!(count("link"), 1);
}

#[test]
fn pipeline_is_idempotent() {
    let out_a = TempDir::new().unwrap();
    let out_b = TempDir::new().unwrap();

    assert_eq!(run_pipeline(&out_a), run_pipeline(&out_b));
}

#[test]
fn summary_reflects_matches_and_gaps() {
    let history_file = write_temp(HISTORY);
    let feed_file = write_temp(FEED);

    let index = HistoryIndex::new(load_location_history(history_file.path(), None).unwrap());
    let matcher = Matcher::new(
        load_locations_of_interest(feed_file.path(), nzst()).unwrap(),
        Some(chrono::Duration::hours(2)),
    );
    let summary = RunSummary::from_results(&matcher.run(&index));

    assert_eq!(summary.total, 2);
    assert_eq!(summary.matched, 1);
    assert_eq!(summary.unmatched, 1);
    assert!(summary.has_gaps());

    let (event, distance) = summary.closest.unwrap();
    assert_eq!(event, "Cafe on Quay St");
    assert!(distance < 0.01, "matched point sits on the venue, got {distance}");
}

#[test]
fn unreadable_or_malformed_input_fails_before_matching() {
    let missing = std::path::Path::new("/definitely/not/here.json");
    assert!(load_location_history(missing, None).is_err());
    assert!(load_locations_of_interest(missing, nzst()).is_err());

    let garbage = write_temp("{ not json at all");
    assert!(load_location_history(garbage.path(), None).is_err());
    assert!(load_locations_of_interest(garbage.path(), nzst()).is_err());
}

#[test]
fn matched_time_respects_since_cutoff() {
    let history_file = write_temp(HISTORY);
    let cutoff = Some(Utc.timestamp_millis_opt(1628630000000).unwrap());

    let points = load_location_history(history_file.path(), cutoff).unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(
        points[0].time,
        Utc.timestamp_millis_opt(1628632800000).unwrap()
    );
}
