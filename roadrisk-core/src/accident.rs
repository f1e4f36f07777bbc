//! Accident records and severity classes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::ValidationError;
use crate::geo::Coordinate;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Severity class of a recorded accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Property damage or light injuries.
    Minor,
    /// Serious injuries.
    Major,
    /// Fatal or life-threatening.
    Dangerous,
}

impl Severity {
    /// All classes, lowest first.
    pub const ALL: [Severity; 3] = [Severity::Minor, Severity::Major, Severity::Dangerous];

    /// Weight used by the hotspot risk score.
    #[inline]
    #[must_use]
    pub fn weight(self) -> u32 {
        match self {
            Severity::Minor => 1,
            Severity::Major => 3,
            Severity::Dangerous => 5,
        }
    }

    /// Lowercase tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Dangerous => "dangerous",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Severity::Minor),
            "major" => Ok(Severity::Major),
            "dangerous" => Ok(Severity::Dangerous),
            _ => Err(ValidationError::InvalidField {
                field: "severity".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// One geotagged accident.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccidentRecord {
    /// Caller-assigned identifier.
    pub id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Severity class.
    pub severity: Severity,
    /// Local wall-clock time of the accident, if known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub accident_time: Option<NaiveDateTime>,
    /// Free-form weather description as recorded (e.g. "Light Rain").
    #[cfg_attr(feature = "serde", serde(default))]
    pub weather_condition: Option<String>,
}

impl AccidentRecord {
    /// Creates a record with no timestamp or weather.
    pub fn new(id: impl Into<String>, latitude: f64, longitude: f64, severity: Severity) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            severity,
            accident_time: None,
            weather_condition: None,
        }
    }

    /// Sets the accident time.
    #[must_use]
    pub fn with_time(mut self, time: NaiveDateTime) -> Self {
        self.accident_time = Some(time);
        self
    }

    /// Sets the weather condition.
    #[must_use]
    pub fn with_weather(mut self, weather: impl Into<String>) -> Self {
        self.weather_condition = Some(weather.into());
        self
    }

    /// Validated position of this record.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for missing ids or bad coordinates.
    pub fn coordinate(&self) -> Result<Coordinate, ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Weather string if present and non-blank.
    #[must_use]
    pub fn weather(&self) -> Option<&str> {
        self.weather_condition
            .as_deref()
            .filter(|w| !w.trim().is_empty())
    }
}

/// A record dropped during detection, with the reason.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Rejection {
    /// Identifier of the offending record (or its position if it had none).
    pub record_id: String,
    /// Why it was rejected.
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_reason"))]
    pub reason: ValidationError,
}

#[cfg(feature = "serde")]
fn serialize_reason<S: serde::Serializer>(
    reason: &ValidationError,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_str(reason)
}

/// Parses an ISO-8601 style timestamp into local wall-clock time.
///
/// Accepts RFC 3339 (the offset is dropped, keeping the wall clock as
/// written), `YYYY-MM-DDTHH:MM:SS[.f]`, the same with a space separator,
/// and a bare date (midnight).
///
/// # Errors
///
/// Returns [`ValidationError::InvalidField`] naming `field` when nothing
/// matches.
pub fn parse_timestamp(value: &str, field: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ValidationError::InvalidField {
            field: field.to_string(),
            value: value.to_string(),
        })
}
