//! roadrisk-algorithms: Hotspot detection and risk evaluation.
//!
//! This crate provides the three stages of the engine:
//! - **DBSCAN** - Density-based clustering over haversine distance
//! - **Profiler** - Per-cluster geometry, severity, time and weather statistics
//! - **Alert engine** - Proximity and risk-pattern matching for a traveler
//!
#![warn(missing_docs)]

mod alerts;
mod area;
mod dbscan;
mod processing;
mod profile;
pub mod spatial;

pub use alerts::{
    compose_message, proximity_descriptor, weather_matches, AlertConfig, AlertEngine, RiskMatch,
    MESSAGE_SEPARATOR,
};
pub use area::{high_risk_hotspots, hotspots_within, NearbyHotspot};
pub use dbscan::{DbscanClustering, DbscanConfig, DbscanState, NOISE};
pub use processing::{detect_hotspots, Detection, DetectionConfig};
pub use profile::{
    analyze_time_patterns, analyze_weather_patterns, generate_recommendations, is_night_hour,
    mentions_rain, HotspotProfiler, ProfileConfig, NIGHT_END_HOUR, NIGHT_SHARE_THRESHOLD,
    NIGHT_START_HOUR, PEAK_HOUR_COUNT,
};
pub use spatial::LatitudeIndex;
