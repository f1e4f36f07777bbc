//! Command-line interface for roadrisk.
//!
//! Detects accident hotspots from a JSON or CSV file, evaluates a position
//! against a saved hotspot set, and lists hotspots around a point.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use clap::{Parser, Subcommand};

use roadrisk_algorithms::{
    detect_hotspots, high_risk_hotspots, hotspots_within, AlertConfig, AlertEngine,
    DetectionConfig,
};
use roadrisk_core::{
    parse_timestamp, BoundingBox, Coordinate, RiskLevel, Severity, SeverityDistribution,
    UserContext, ValidationError,
};
use roadrisk_io::{read_accidents, read_hotspots, read_json, write_json};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    RoadriskIo(#[from] roadrisk_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] roadrisk_core::Error),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accident hotspot detection and proximity risk alerts.
#[derive(Parser)]
#[command(name = "roadrisk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster accident records into hotspots
    Detect {
        /// Input accident file (.json or .csv)
        input: PathBuf,

        /// Output hotspot file (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Detection parameters as JSON; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Neighborhood radius in radians
        #[arg(long, conflicts_with = "radius_km")]
        eps: Option<f64>,

        /// Neighborhood radius in kilometers
        #[arg(long)]
        radius_km: Option<f64>,

        /// Minimum neighborhood size for a core point, itself included
        #[arg(long)]
        min_samples: Option<usize>,

        /// Bounding box padding in degrees
        #[arg(long)]
        padding: Option<f64>,
    },

    /// Evaluate a position against a hotspot file and emit alerts
    Evaluate {
        /// Hotspot file written by `detect`
        hotspots: PathBuf,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Local time of the position, e.g. 2024-05-06T08:15:00 (default: now)
        #[arg(long)]
        time: Option<String>,

        /// Current weather description
        #[arg(long)]
        weather: Option<String>,

        /// Alert parameters as JSON; flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Alert radius in kilometers
        #[arg(long)]
        radius_km: Option<f64>,

        /// Write alerts here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List hotspots around a point, nearest first
    Nearby {
        /// Hotspot file written by `detect`
        hotspots: PathBuf,

        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Search radius in kilometers
        #[arg(long, default_value = "1.0")]
        radius_km: f64,

        /// Only list high-risk hotspots
        #[arg(long)]
        high_risk: bool,
    },

    /// Show information about an accident file
    Info {
        /// Input accident file (.json or .csv)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Detect {
            input,
            output,
            config,
            eps,
            radius_km,
            min_samples,
            padding,
        } => {
            let mut config: DetectionConfig = load_config(config.as_deref())?;
            if let Some(eps) = eps {
                config.clustering.epsilon = eps;
            }
            if let Some(radius_km) = radius_km {
                config.clustering = config.clustering.with_radius_km(radius_km);
            }
            if let Some(min_samples) = min_samples {
                config.clustering.min_points = min_samples;
            }
            if let Some(padding) = padding {
                config.profile.bbox_padding = padding;
            }
            log::debug!("detection config: {:?}", config);

            let start = Instant::now();
            let parsed = read_accidents(&input)?;
            let mut detection = detect_hotspots(&parsed.records, &config)?;
            let mut rejected = parsed.rejected;
            rejected.append(&mut detection.rejected);
            detection.rejected = rejected;
            let elapsed = start.elapsed();

            write_json(&output, &detection)?;

            println!(
                "Processed {} in {:.2}s",
                input.display(),
                elapsed.as_secs_f64()
            );
            println!("Hotspots: {}", detection.hotspots.len());
            println!(
                "High risk: {}",
                high_risk_hotspots(&detection.hotspots).count()
            );
            println!("Noise: {}", detection.noise_count);
            println!("Rejected: {}", detection.rejected.len());
            println!("Wrote {}", output.display());
        }

        Commands::Evaluate {
            hotspots,
            lat,
            lng,
            time,
            weather,
            config,
            radius_km,
            output,
        } => {
            let mut config: AlertConfig = load_config(config.as_deref())?;
            if let Some(radius_km) = radius_km {
                config.alert_radius_km = radius_km;
            }

            let loaded = read_hotspots(&hotspots)?;
            let mut context = UserContext::at(lat, lng);
            if let Some(time) = time {
                context = context.with_time(parse_timestamp(&time, "time")?);
            }
            if let Some(weather) = weather {
                context = context.with_weather(weather);
            }

            let engine = AlertEngine::new(config);
            log::debug!("alert config: {:?}", engine.config());
            let alerts = engine.evaluate(&context, &loaded.hotspots)?;
            if let Some(notice) = skipped_notice(loaded.skipped) {
                eprintln!("{}", notice);
            }

            match output {
                Some(path) => {
                    write_json(&path, &alerts)?;
                    println!("{} alerts written to {}", alerts.len(), path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&alerts)?),
            }
        }

        Commands::Nearby {
            hotspots,
            lat,
            lng,
            radius_km,
            high_risk,
        } => {
            let loaded = read_hotspots(&hotspots)?;
            if let Some(notice) = skipped_notice(loaded.skipped) {
                eprintln!("{}", notice);
            }
            let center = Coordinate::new(lat, lng)?;
            let nearby = hotspots_within(center, radius_km, &loaded.hotspots)?;

            println!(
                "{:<8} | {:<13} | {:<6} | {:<9} | {:<10}",
                "Cluster", "Distance (km)", "Risk", "Accidents", "Risk score"
            );
            println!("{:-<58}", "");
            for entry in nearby
                .iter()
                .filter(|entry| !high_risk || entry.hotspot.risk_level == RiskLevel::High)
            {
                let hotspot = entry.hotspot;
                println!(
                    "{:<8} | {:<13.3} | {:<6} | {:<9} | {:<10.2}",
                    hotspot.cluster_id,
                    entry.distance_km,
                    hotspot.risk_level,
                    hotspot.total_accidents,
                    hotspot.risk_score
                );
            }
        }

        Commands::Info { input } => {
            let parsed = read_accidents(&input)?;
            println!("File: {}", input.display());
            println!("Records: {}", parsed.records.len());
            println!("Rejected rows: {}", parsed.rejected.len());

            let valid: Vec<Coordinate> = parsed
                .records
                .iter()
                .filter_map(|record| record.coordinate().ok())
                .collect();
            println!("Valid positions: {}", valid.len());

            if let Some(extent) = BoundingBox::around(valid, 0.0) {
                println!("Latitude range: {:.5} - {:.5}", extent.south, extent.north);
                println!("Longitude range: {:.5} - {:.5}", extent.west, extent.east);
            }

            let mix =
                SeverityDistribution::from_severities(parsed.records.iter().map(|r| r.severity));
            for severity in Severity::ALL {
                println!("{:<10} {}", severity, mix.count(severity));
            }

            let timed = parsed
                .records
                .iter()
                .filter(|record| record.accident_time.is_some())
                .count();
            println!("With timestamp: {}", timed);
        }
    }

    Ok(())
}

/// Loads a config from a JSON file, or the defaults when none is given.
fn load_config<T>(path: Option<&Path>) -> Result<T>
where
    T: Default + serde::de::DeserializeOwned,
{
    match path {
        Some(path) => {
            log::debug!("loading config from {}", path.display());
            Ok(read_json(path)?)
        }
        None => Ok(T::default()),
    }
}

/// Line reporting hotspot entries that failed to load, if any.
fn skipped_notice(skipped: usize) -> Option<String> {
    (skipped > 0).then(|| format!("Skipped {} malformed hotspot entries", skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_notice() {
        assert_eq!(skipped_notice(0), None);
        assert_eq!(
            skipped_notice(3).as_deref(),
            Some("Skipped 3 malformed hotspot entries")
        );
    }

    #[test]
    fn test_cli_parses_evaluate_without_weather() {
        let cli = Cli::try_parse_from([
            "roadrisk", "evaluate", "hotspots.json", "--lat", "-33.9", "--lng", "18.4",
        ])
        .unwrap();
        match cli.command {
            Commands::Evaluate { lat, weather, .. } => {
                assert!((lat + 33.9).abs() < 1e-12);
                assert!(weather.is_none());
            }
            _ => panic!("expected evaluate"),
        }
    }
}
