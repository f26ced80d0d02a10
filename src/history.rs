// ⏰ History Index
// Time-ordered personal trajectory + nearest-in-time lookup
//
// The index answers one question: "where was the user, near time T?"
// It is built once from the loaded export, sorted, and then only queried.
// Lookups are binary search — the history set can hold tens of thousands of
// points while the interest list stays small, so repeated linear scans are
// the wrong shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

// ============================================================================
// HISTORY POINT
// ============================================================================

/// One recorded position from the user's location history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// When the position was recorded
    pub time: DateTime<Utc>,

    /// Where the user was
    pub coord: Coordinate,
}

impl HistoryPoint {
    pub fn new(time: DateTime<Utc>, coord: Coordinate) -> Self {
        HistoryPoint { time, coord }
    }
}

// ============================================================================
// HISTORY INDEX
// ============================================================================

/// Read-only index over the full trajectory, sorted ascending by timestamp.
///
/// Constructed once at startup and threaded through the matcher explicitly;
/// nothing mutates it afterwards, so a shared reference can be queried from
/// anywhere.
#[derive(Debug, Clone)]
pub struct HistoryIndex {
    /// Invariant: ascending by `time` (stable-sorted on construction)
    points: Vec<HistoryPoint>,
}

impl HistoryIndex {
    /// Build the index from an unsorted sequence of points.
    ///
    /// Source order is not trusted: exports are usually chronological but the
    /// format does not guarantee it. The sort is stable so records carrying
    /// the same timestamp keep their export order.
    pub fn new(mut points: Vec<HistoryPoint>) -> Self {
        points.sort_by_key(|p| p.time);
        HistoryIndex { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Earliest and latest recorded timestamps, if any data was loaded.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// Find the point whose timestamp is closest to `target` by absolute
    /// difference.
    ///
    /// Returns `None` when the index is empty or when no point lies within
    /// `tolerance` of the target (`None` tolerance = unbounded). Callers can
    /// therefore tell "nearest found" apart from "no data near this time".
    ///
    /// Tie-break: when two points are exactly equidistant from the target,
    /// the earlier one wins.
    pub fn lookup(
        &self,
        target: DateTime<Utc>,
        tolerance: Option<Duration>,
    ) -> Option<&HistoryPoint> {
        if self.points.is_empty() {
            return None;
        }

        // First point at-or-after the target
        let idx = self.points.partition_point(|p| p.time < target);

        let after = self.points.get(idx);
        let before = if idx > 0 {
            self.points.get(idx - 1)
        } else {
            None
        };

        let nearest = match (before, after) {
            (Some(b), Some(a)) => {
                let gap_before = target - b.time;
                let gap_after = a.time - target;
                // <= prefers the earlier point on an exact tie
                if gap_before <= gap_after {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => unreachable!("index checked non-empty above"),
        };

        if let Some(max_gap) = tolerance {
            let gap = (target - nearest.time).abs();
            if gap > max_gap {
                return None;
            }
        }

        Some(nearest)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn point(secs: i64, lat: f64, lon: f64) -> HistoryPoint {
        HistoryPoint::new(at(secs), Coordinate::new(lat, lon))
    }

    #[test]
    fn test_sorts_unsorted_input() {
        let index = HistoryIndex::new(vec![
            point(300, 3.0, 0.0),
            point(100, 1.0, 0.0),
            point(200, 2.0, 0.0),
        ]);

        assert_eq!(index.time_span(), Some((at(100), at(300))));
        assert_eq!(index.lookup(at(100), None).unwrap().coord.lat, 1.0);
        assert_eq!(index.lookup(at(300), None).unwrap().coord.lat, 3.0);
    }

    #[test]
    fn test_lookup_nearest_in_time() {
        let index = HistoryIndex::new(vec![
            point(100, 1.0, 0.0),
            point(200, 2.0, 0.0),
            point(300, 3.0, 0.0),
        ]);

        // 140 is closer to 100 than to 200
        assert_eq!(index.lookup(at(140), None).unwrap().time, at(100));
        // 260 is closer to 300
        assert_eq!(index.lookup(at(260), None).unwrap().time, at(300));
        // exact hit
        assert_eq!(index.lookup(at(200), None).unwrap().time, at(200));
    }

    #[test]
    fn test_exact_tie_prefers_earlier_point() {
        let index = HistoryIndex::new(vec![point(100, 1.0, 0.0), point(200, 2.0, 0.0)]);

        // 150 is exactly equidistant from 100 and 200
        let hit = index.lookup(at(150), None).unwrap();
        assert_eq!(hit.time, at(100));
    }

    #[test]
    fn test_lookup_before_and_after_range() {
        let index = HistoryIndex::new(vec![point(100, 1.0, 0.0), point(200, 2.0, 0.0)]);

        assert_eq!(index.lookup(at(0), None).unwrap().time, at(100));
        assert_eq!(index.lookup(at(9999), None).unwrap().time, at(200));
    }

    #[test]
    fn test_tolerance_rejects_distant_match() {
        let index = HistoryIndex::new(vec![point(100, 1.0, 0.0), point(200, 2.0, 0.0)]);

        // Nearest point to t=500 is t=200, 300s away
        assert!(index
            .lookup(at(500), Some(Duration::seconds(60)))
            .is_none());
        assert!(index
            .lookup(at(500), Some(Duration::seconds(300)))
            .is_some());
    }

    #[test]
    fn test_empty_index_never_matches() {
        let index = HistoryIndex::new(Vec::new());

        assert!(index.is_empty());
        assert!(index.time_span().is_none());
        assert!(index.lookup(at(100), None).is_none());
        assert!(index.lookup(at(100), Some(Duration::days(999))).is_none());
    }
}
