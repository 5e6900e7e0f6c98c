//! Quickstart example demonstrating basic usage of transit-search.
//!
//! Run with: cargo run --example quickstart

use transit_search::preprocess::preprocess;
use transit_search::simulate::LightCurveGenerator;
use transit_search::{DetectionConfig, TransitDetector};

fn main() {
    println!("=== transit-search Quickstart ===\n");

    // 1. Simulate 30 days of photometry with a 3.5 day, 2 % deep transit
    let series = LightCurveGenerator::new()
        .with_span(30.0, 0.05)
        .with_transit(3.5, 0.02, 0.15)
        .generate();
    println!(
        "Generated {} samples over {:.1} days",
        series.len(),
        series.span()
    );

    // 2. Look at the preprocessing step on its own
    let config = DetectionConfig::default();
    let cleaned = preprocess(&series, &config).unwrap();
    println!(
        "After preprocessing: {} usable samples, cadence {:.3} d",
        cleaned.usable_count(),
        cleaned.cadence()
    );

    // 3. Run the full pipeline
    println!("\n--- Detection ---");
    let detector = TransitDetector::new(config).unwrap();
    let report = detector.detect_report(&series).unwrap();

    println!(
        "{} search windows, {} confirmed candidates",
        report.windows.len(),
        report.result.len()
    );
    println!(
        "{:>4} {:>10} {:>10} {:>10} {:>12} {:>8}",
        "#", "Period", "Depth", "Duration", "Significance", "Conf %"
    );
    println!("{:-<59}", "");
    for (i, c) in report.result.candidates().iter().enumerate() {
        println!(
            "{:>4} {:>10.4} {:>10.5} {:>10.4} {:>12.2} {:>8.2}",
            i + 1,
            c.period,
            c.depth,
            c.duration,
            c.significance,
            c.confidence
        );
    }

    // 4. Presentation summary
    println!("\n--- Summary ---");
    let summary = report.result.summary();
    println!("Transit detected: {}", summary.transit_detected);
    println!("Confidence: {:.1}%", summary.confidence);
    println!("Orbital period: {:.3} days", summary.orbital_period);
    println!("Planet radius: {:.2} Earth radii", summary.planet_radius);
    println!("Transit depth: {:.3}%", summary.transit_depth);
    println!("Transits observed: {}", summary.transit_count);
}
