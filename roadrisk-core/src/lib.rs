//! roadrisk-core: Core types for accident hotspot detection and alerting.
//!
//! This crate provides the value types shared by the clustering engine,
//! hotspot profiler and alert engine, together with the great-circle
//! distance and the severity-weighted risk rules.
//!

pub mod accident;
pub mod alert;
pub mod error;
pub mod geo;
pub mod hotspot;

pub use accident::{parse_timestamp, AccidentRecord, Rejection, Severity};
pub use alert::{Alert, AlertKind, RecommendedAction, UserContext};
pub use error::{Error, Result, ValidationError};
pub use geo::{haversine_km, haversine_radians, BoundingBox, Coordinate, EARTH_RADIUS_KM};
pub use hotspot::{
    Hotspot, RiskLevel, SeverityDistribution, TimePatterns, WeatherPatterns, HIGH_RISK_THRESHOLD,
    MEDIUM_RISK_THRESHOLD,
};
