// Locations of Interest Checker - Core Library
// Compares an exported personal location history against published COVID
// locations of interest and ranks exposure risk by proximity.
//
// Pipeline: load → index → match → assemble → write. Single-threaded batch
// over immutable snapshots; both inputs are loaded and validated once, then
// only read.

pub mod geo;
pub mod history;
pub mod interest;
pub mod loader;
pub mod matcher;
pub mod report;

// Re-export commonly used types
pub use geo::{distance_km, Coordinate, EARTH_RADIUS_KM};
pub use history::{HistoryIndex, HistoryPoint};
pub use interest::{load_locations_of_interest, LocationOfInterest};
pub use loader::{demo_location_history, load_location_history};
pub use matcher::{MatchResult, Matcher};
pub use report::{
    build_plot_document, rank_by_distance, write_csv, write_plot_document, ReportRow, RunSummary,
    DEFAULT_TOP_K,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
