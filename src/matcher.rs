// 🔗 Matcher
// Pairs each location of interest with the temporally-closest history point
//
// Query policy: the representative time for an exposure window is its
// midpoint. The history index returns the nearest recorded position to that
// instant (within tolerance), and the haversine distance to the venue is
// attached. A window with no nearby history data produces a result with no
// distance — one gap in the export must not abort the whole batch.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::geo;
use crate::history::{HistoryIndex, HistoryPoint};
use crate::interest::LocationOfInterest;

// ============================================================================
// MATCH RESULT
// ============================================================================

/// Outcome for one location of interest. Immutable once created; the report
/// assembler consumes it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub loi: LocationOfInterest,

    /// Closest-in-time recorded position, when one exists within tolerance
    pub matched: Option<HistoryPoint>,

    /// Great-circle distance from the matched position to the venue, km.
    /// `None` means "no history data near this window" — unknown, not zero.
    pub distance_km: Option<f64>,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// Owns the loaded locations of interest and drives the matching pass.
pub struct Matcher {
    locations: Vec<LocationOfInterest>,

    /// Maximum time gap between a window midpoint and the matched history
    /// point. `None` = unbounded (always match the nearest point).
    tolerance: Option<Duration>,
}

impl Matcher {
    pub fn new(locations: Vec<LocationOfInterest>, tolerance: Option<Duration>) -> Self {
        Matcher {
            locations,
            tolerance,
        }
    }

    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Produce exactly one `MatchResult` per location of interest, in input
    /// order. Ranking happens later, in the report assembler.
    pub fn run(&self, index: &HistoryIndex) -> Vec<MatchResult> {
        self.locations
            .iter()
            .map(|loi| self.match_one(loi, index))
            .collect()
    }

    fn match_one(&self, loi: &LocationOfInterest, index: &HistoryIndex) -> MatchResult {
        let matched = index.lookup(loi.window_midpoint(), self.tolerance).copied();
        let distance_km = matched.map(|point| geo::distance_km(point.coord, loi.coord));

        MatchResult {
            loi: loi.clone(),
            matched,
            distance_km,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
