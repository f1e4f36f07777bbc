//! Alerts and the traveler context they are evaluated against.

use chrono::NaiveDateTime;

use crate::error::ValidationError;
use crate::geo::Coordinate;
use crate::hotspot::RiskLevel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind tag carried by every alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlertKind {
    /// Traveler is close to a hotspot whose risk pattern matches now.
    RiskAlert,
}

/// Action suggested to the traveler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecommendedAction {
    /// Slow down and keep distance.
    ReduceSpeed,
}

/// A proximity warning for one hotspot.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Alert {
    /// Always [`AlertKind::RiskAlert`].
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: AlertKind,
    /// Risk level of the hotspot that triggered the alert.
    pub severity: RiskLevel,
    /// Display text, phrases joined by `" | "`.
    pub message: String,
    /// `cluster_id` of the triggering hotspot.
    pub hotspot_id: u32,
    /// Distance to the hotspot center, truncated to whole meters.
    pub distance_meters: u32,
    /// Composite score of matched risk factors, 0-5.
    pub risk_score: u8,
    /// Always [`RecommendedAction::ReduceSpeed`].
    pub recommended_action: RecommendedAction,
    /// Advisory expiry for caller-side caching.
    pub valid_until: NaiveDateTime,
}

/// Where, when and in what weather a traveler is.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UserContext {
    /// Traveler latitude in degrees.
    pub latitude: f64,
    /// Traveler longitude in degrees.
    pub longitude: f64,
    /// Local time to evaluate at; defaults to the evaluation clock.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timestamp: Option<NaiveDateTime>,
    /// Current weather description.
    #[cfg_attr(feature = "serde", serde(default))]
    pub weather: Option<String>,
}

impl UserContext {
    /// Context at a position, with no explicit time or weather.
    #[must_use]
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: None,
            weather: None,
        }
    }

    /// Sets the evaluation time.
    #[must_use]
    pub fn with_time(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Sets the current weather.
    #[must_use]
    pub fn with_weather(mut self, weather: impl Into<String>) -> Self {
        self.weather = Some(weather.into());
        self
    }

    /// Validated traveler position.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for out-of-range or non-finite values.
    pub fn coordinate(&self) -> Result<Coordinate, ValidationError> {
        Coordinate::new(self.latitude, self.longitude)
    }
}
