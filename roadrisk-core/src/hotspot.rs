//! Hotspot data set produced by one detection run.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, Weekday};

use crate::accident::Severity;
use crate::error::ValidationError;
use crate::geo::{BoundingBox, Coordinate};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Score at or above which a hotspot is high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 4.0;
/// Score at or above which a hotspot is medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 2.5;

/// Risk classification of a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RiskLevel {
    /// Score below 2.5.
    Low,
    /// Score in [2.5, 4).
    Medium,
    /// Score of 4 or more.
    High,
}

impl RiskLevel {
    /// Classifies a severity-weighted risk score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Lowercase tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Accident counts per severity class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeverityDistribution {
    /// Minor accidents.
    pub minor: usize,
    /// Major accidents.
    pub major: usize,
    /// Dangerous accidents.
    pub dangerous: usize,
}

impl SeverityDistribution {
    /// Counts the given severities.
    pub fn from_severities<I>(severities: I) -> Self
    where
        I: IntoIterator<Item = Severity>,
    {
        let mut dist = Self::default();
        for severity in severities {
            dist.record(severity);
        }
        dist
    }

    /// Adds one accident of the given class.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Minor => self.minor += 1,
            Severity::Major => self.major += 1,
            Severity::Dangerous => self.dangerous += 1,
        }
    }

    /// Count for one class.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        match severity {
            Severity::Minor => self.minor,
            Severity::Major => self.major,
            Severity::Dangerous => self.dangerous,
        }
    }

    /// Sum over all classes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.minor + self.major + self.dangerous
    }

    /// Severity-weighted mean: `(minor*1 + major*3 + dangerous*5) / total`.
    ///
    /// Zero for an empty distribution.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn risk_score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = Severity::ALL
            .iter()
            .map(|&s| self.count(s) * s.weight() as usize)
            .sum();
        weighted as f64 / total as f64
    }
}

/// When accidents happen inside a hotspot.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimePatterns {
    /// Up to three busiest hours of the day, busiest first.
    pub peak_hours: Vec<u8>,
    /// Accident count per hour of the day (only hours that occur).
    pub hourly_distribution: BTreeMap<u8, usize>,
    /// Day of week with the most accidents, if any timestamps exist.
    pub busiest_day: Option<Weekday>,
    /// More than half of the accidents fall in the 18:00-06:59 window.
    pub is_night_hotspot: bool,
}

/// Weather conditions recorded inside a hotspot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherPatterns {
    /// Modal weather string, case as stored.
    pub most_common_weather: String,
    /// Percentage (0-100) of accidents whose weather mentions rain.
    pub rainy_percentage: f64,
}

/// A spatial cluster of accidents with its risk profile.
///
/// `cluster_id` is only meaningful within the detection run that produced
/// it; successive runs renumber freely.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Hotspot {
    /// Run-local cluster label.
    pub cluster_id: u32,
    /// Arithmetic mean of member coordinates.
    pub center: Coordinate,
    /// Member extent, padded.
    pub bounding_box: BoundingBox,
    /// Number of member accidents.
    pub total_accidents: usize,
    /// Member counts per severity.
    pub severity_distribution: SeverityDistribution,
    /// Severity-weighted mean in [1, 5].
    pub risk_score: f64,
    /// Classification of `risk_score`.
    pub risk_level: RiskLevel,
    /// Temporal profile.
    pub time_patterns: TimePatterns,
    /// Weather profile; absent when no member carries weather data.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weather_patterns: Option<WeatherPatterns>,
    /// Most recent member timestamp.
    #[cfg_attr(feature = "serde", serde(default))]
    pub last_accident: Option<NaiveDateTime>,
    /// Human-readable mitigation suggestions.
    #[cfg_attr(feature = "serde", serde(default))]
    pub recommendations: Vec<String>,
}

impl Hotspot {
    /// Checks the fields the alert engine relies on.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for an invalid center or an empty
    /// hotspot.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.center.validate()?;
        if self.total_accidents == 0 {
            return Err(ValidationError::MissingField("total_accidents".to_string()));
        }
        Ok(())
    }

    /// Most common weather string, if the hotspot has a weather profile.
    #[must_use]
    pub fn most_common_weather(&self) -> Option<&str> {
        self.weather_patterns
            .as_ref()
            .map(|w| w.most_common_weather.as_str())
    }
}
