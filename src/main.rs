use anyhow::{Context, Result};
use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use clap::Parser;
use std::path::PathBuf;

use loi_checker::{
    demo_location_history, load_location_history, load_locations_of_interest, rank_by_distance,
    write_csv, write_plot_document, HistoryIndex, Matcher, RunSummary, DEFAULT_TOP_K,
};

/// Compare an exported location history against published COVID locations
/// of interest and rank exposure risk by proximity.
#[derive(Parser, Debug)]
#[command(name = "loi-checker", version, about)]
struct Args {
    /// Path to the exported location history JSON (Google Takeout format)
    history_file: PathBuf,

    /// Path the output CSV report is written to
    output_csv: PathBuf,

    /// Path to the locations-of-interest GeoJSON feed file
    #[arg(short, long)]
    locations: PathBuf,

    /// Maximum minutes between a window midpoint and the matched history
    /// point; omit for unbounded
    #[arg(short, long)]
    tolerance: Option<i64>,

    /// Also write a GeoJSON plot document to this path
    #[arg(short, long)]
    plot: Option<PathBuf>,

    /// Number of closest pairs joined by segments in the plot document
    #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Ignore history records before this instant (RFC 3339,
    /// e.g. 2021-06-21T00:00:00Z)
    #[arg(long)]
    since: Option<DateTime<Utc>>,

    /// UTC offset, in hours, the feed's local times are interpreted in
    /// (default: New Zealand Standard Time)
    #[arg(long, default_value_t = 12)]
    utc_offset: i32,

    /// Use a deterministic synthetic history instead of reading the export
    #[arg(long)]
    demo: bool,
}

/// Points generated for --demo: one per minute from the demo start
const DEMO_POINT_COUNT: usize = 100_000;

fn main() -> Result<()> {
    let args = Args::parse();

    let feed_offset = FixedOffset::east_opt(args.utc_offset * 3600)
        .with_context(|| format!("--utc-offset {} is out of range", args.utc_offset))?;

    // 1. Load the locations-of-interest feed
    println!("📍 Loading locations of interest from {}", args.locations.display());
    let locations = load_locations_of_interest(&args.locations, feed_offset)?;
    println!("✓ Loaded {} locations of interest", locations.len());

    // 2. Load (or synthesize) the location history
    let points = if args.demo {
        println!("\n🎲 Generating synthetic demo history");
        let start = Utc
            .timestamp_opt(1_624_241_116, 0)
            .single()
            .context("Demo start epoch out of range")?;
        demo_location_history(start, DEMO_POINT_COUNT)
    } else {
        println!("\n📂 Loading location history from {}", args.history_file.display());
        load_location_history(&args.history_file, args.since)?
    };
    println!("✓ Loaded {} history points", points.len());

    // 3. Build the index
    let index = HistoryIndex::new(points);
    if let Some((first, last)) = index.time_span() {
        println!("✓ History spans {first} .. {last}");
    }

    // 4. Match
    println!("\n🔗 Matching locations of interest against history...");
    let tolerance = args.tolerance.map(Duration::minutes);
    let matcher = Matcher::new(locations, tolerance);
    let results = matcher.run(&index);

    // 5. Rank and write reports
    let ranked = rank_by_distance(results);
    write_csv(&ranked, &args.output_csv)?;
    println!("✓ Report written to {}", args.output_csv.display());

    if let Some(plot_path) = &args.plot {
        write_plot_document(&ranked, args.top_k, plot_path)?;
        println!("✓ Plot document written to {}", plot_path.display());
    }

    // 6. Summary
    let summary = RunSummary::from_results(&ranked);
    println!(
        "\nMatched {} of {} locations of interest to location history.",
        summary.matched, summary.total
    );
    if summary.has_gaps() {
        println!(
            "⚠️  No personal location data near {} locations of interest - check those manually!",
            summary.unmatched
        );
    }
    if let Some((event, distance)) = &summary.closest {
        println!("\nClosest location of interest: {event}");
        println!("You were {distance:.2} km away.");
        if *distance < 0.1 {
            println!("⚠️  Under 100 m - consider getting tested and self-isolating.");
        }
    }

    Ok(())
}
