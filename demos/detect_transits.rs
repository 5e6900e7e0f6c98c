//! Transit detection CLI tool.
//!
//! Reads a light curve and prints the detection summary as JSON.
//!
//! Usage:
//!   # CSV file with time,brightness[,flag] columns
//!   cargo run --example detect_transits -- --csv lightcurve.csv
//!
//!   # JSON array of {"time", "brightness", "flag"} samples
//!   cargo run --example detect_transits -- --json samples.json
//!
//!   # Synthetic light curve
//!   cargo run --example detect_transits -- --test --period 3.5 --depth 0.02
//!
//!   # Custom configuration and full candidate list
//!   cargo run --example detect_transits -- --test --config config.json --all
//!
//! Set RUST_LOG=debug for per-stage progress.

use std::env;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use transit_search::core::Series;
use transit_search::io::{read_csv, series_from_json};
use transit_search::simulate::{LightCurveGenerator, NoiseModel};
use transit_search::{DetectionConfig, TransitDetector};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    let config = match get_arg(&args, "--config") {
        Some(path) => DetectionConfig::from_json_file(Path::new(&path)),
        None => Ok(DetectionConfig::default()),
    };
    let config = config.unwrap_or_else(|e| fail(&e.to_string()));

    let series = load_series(&args).unwrap_or_else(|e| fail(&e));
    let detector = TransitDetector::new(config).unwrap_or_else(|e| fail(&e.to_string()));
    let result = detector
        .detect(&series)
        .unwrap_or_else(|e| fail(&e.to_string()));

    let output = if args.contains(&"--all".to_string()) {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string_pretty(&result.summary())
    };
    match output {
        Ok(json) => println!("{}", json),
        Err(e) => fail(&e.to_string()),
    }
}

fn load_series(args: &[String]) -> Result<Series, String> {
    if let Some(path) = get_arg(args, "--csv") {
        let file = File::open(&path).map_err(|e| format!("{}: {}", path, e))?;
        return read_csv(BufReader::new(file)).map_err(|e| e.to_string());
    }
    if let Some(path) = get_arg(args, "--json") {
        let text = fs::read_to_string(&path).map_err(|e| format!("{}: {}", path, e))?;
        return series_from_json(&text).map_err(|e| e.to_string());
    }
    if args.contains(&"--test".to_string()) {
        return Ok(synthetic_series(args));
    }
    Err("no input given; use --csv, --json or --test".to_string())
}

fn synthetic_series(args: &[String]) -> Series {
    let parse = |name: &str, default: f64| {
        get_arg(args, name)
            .and_then(|s| s.parse().ok())
            .unwrap_or(default)
    };
    let seed = get_arg(args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    LightCurveGenerator::new()
        .with_span(parse("--span", 30.0), parse("--cadence", 0.05))
        .with_transit(
            parse("--period", 3.5),
            parse("--depth", 0.02),
            parse("--duration", 0.15),
        )
        .with_noise(NoiseModel::Gaussian {
            sigma: parse("--noise", 0.002),
        })
        .with_seed(seed)
        .generate()
}

fn get_arg(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1).cloned())
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}
