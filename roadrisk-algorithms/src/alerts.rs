//! Proximity risk evaluation against a hotspot set.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use rayon::prelude::*;
use roadrisk_core::{
    Alert, AlertKind, Coordinate, Error, Hotspot, RecommendedAction, Result, RiskLevel,
    UserContext,
};

use crate::profile::{mentions_rain, NIGHT_START_HOUR};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Separator between message phrases.
pub const MESSAGE_SEPARATOR: &str = " | ";

/// Alert engine parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AlertConfig {
    /// Hotspots whose center is farther than this are ignored.
    pub alert_radius_km: f64,
    /// Composite score needed to raise an alert.
    pub min_alert_score: u8,
    /// How long an alert stays valid after evaluation.
    pub validity_minutes: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            alert_radius_km: 0.5,
            min_alert_score: 2,
            validity_minutes: 10,
        }
    }
}

impl AlertConfig {
    /// Sets the candidate radius in kilometers.
    #[must_use]
    pub fn with_alert_radius_km(mut self, radius_km: f64) -> Self {
        self.alert_radius_km = radius_km;
        self
    }

    /// Sets the score threshold.
    #[must_use]
    pub fn with_min_alert_score(mut self, score: u8) -> Self {
        self.min_alert_score = score;
        self
    }

    /// Sets the validity window.
    #[must_use]
    pub fn with_validity_minutes(mut self, minutes: i64) -> Self {
        self.validity_minutes = minutes;
        self
    }

    /// Rejects a negative or non-finite radius or a negative validity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`].
    pub fn validate(&self) -> Result<()> {
        if !self.alert_radius_km.is_finite() || self.alert_radius_km < 0.0 {
            return Err(Error::Config(format!(
                "alert_radius_km must be a non-negative number, got {}",
                self.alert_radius_km
            )));
        }
        if self.validity_minutes < 0 {
            return Err(Error::Config(format!(
                "validity_minutes must not be negative, got {}",
                self.validity_minutes
            )));
        }
        Ok(())
    }
}

/// Which of a hotspot's risk patterns match the current conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskMatch {
    /// Current hour is one of the hotspot's peak hours.
    pub is_peak_hour: bool,
    /// Night hotspot and it is evening (hour 18 or later).
    pub is_night_risk: bool,
    /// Current weather resembles the hotspot's usual weather.
    pub is_weather_match: bool,
}

impl RiskMatch {
    /// Matches `hotspot` against the hour of day and current weather.
    #[must_use]
    pub fn evaluate(hotspot: &Hotspot, hour: u8, weather: Option<&str>) -> Self {
        let patterns = &hotspot.time_patterns;
        Self {
            is_peak_hour: patterns.peak_hours.contains(&hour),
            is_night_risk: patterns.is_night_hotspot && hour >= NIGHT_START_HOUR,
            is_weather_match: weather_matches(weather, hotspot.most_common_weather()),
        }
    }

    /// Composite score: 2 for peak hour, 1 for night, 2 for weather.
    #[must_use]
    pub fn score(&self) -> u8 {
        2 * u8::from(self.is_peak_hour)
            + u8::from(self.is_night_risk)
            + 2 * u8::from(self.is_weather_match)
    }

    /// Phrases for the factors that matched, in fixed order.
    #[must_use]
    pub fn factor_phrases(&self) -> Vec<&'static str> {
        let mut factors = Vec::new();
        if self.is_peak_hour {
            factors.push("peak accident hour");
        }
        if self.is_night_risk {
            factors.push("nighttime risk area");
        }
        if self.is_weather_match {
            factors.push("current weather conditions match historical accident patterns");
        }
        factors
    }
}

/// Current weather resembles a hotspot's modal weather.
///
/// True when both mention rain, or when the current description is a
/// substring of the hotspot's, ignoring case. A missing value on either
/// side reads as the empty string, so unknown current weather matches every
/// hotspot.
#[must_use]
pub fn weather_matches(current: Option<&str>, hotspot: Option<&str>) -> bool {
    let current = current.unwrap_or_default().trim().to_lowercase();
    let hotspot = hotspot.unwrap_or_default().to_lowercase();
    (mentions_rain(&hotspot) && mentions_rain(&current)) || hotspot.contains(&current)
}

/// Word describing how close the traveler is.
///
/// Under 100 m and from 300 m on both read "Approaching"; only the
/// 100-299 m band reads "Near". Clients key off these exact strings.
#[allow(clippy::match_same_arms)]
#[must_use]
pub fn proximity_descriptor(distance_m: u32) -> &'static str {
    match distance_m {
        0..=99 => "Approaching",
        100..=299 => "Near",
        _ => "Approaching",
    }
}

/// Assembles the alert text for `hotspot`.
#[must_use]
pub fn compose_message(hotspot: &Hotspot, risk: &RiskMatch, distance_m: u32) -> String {
    let mut parts = vec![format!(
        "{} high-risk accident zone ({distance_m}m ahead)",
        proximity_descriptor(distance_m)
    )];

    let factors = risk.factor_phrases();
    if !factors.is_empty() {
        parts.push(format!("High risk due to: {}", factors.join(", ")));
    }

    let mut stats = Vec::new();
    if hotspot.total_accidents > 10 {
        stats.push(format!("{} previous accidents", hotspot.total_accidents));
    }
    let dangerous = hotspot.severity_distribution.dangerous;
    if dangerous > 0 {
        stats.push(format!("{dangerous} dangerous accidents recorded"));
    }
    if !stats.is_empty() {
        parts.push(format!("Location history: {}", stats.join(", ")));
    }

    parts.push("Safety recommendation: Reduce speed, increase following distance".to_string());

    if hotspot.risk_level == RiskLevel::High {
        parts.push("⚠️ EXTREME CAUTION REQUIRED ⚠️".to_string());
    }

    parts.join(MESSAGE_SEPARATOR)
}

/// Evaluates a traveler's context against hotspots.
///
/// Holds only configuration and an optional ambient weather; every call is
/// independent.
#[derive(Clone, Debug, Default)]
pub struct AlertEngine {
    config: AlertConfig,
    default_weather: Option<String>,
}

impl AlertEngine {
    /// Create with a custom configuration.
    #[must_use]
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            default_weather: None,
        }
    }

    /// Weather used when a context carries none.
    #[must_use]
    pub fn with_default_weather(mut self, weather: impl Into<String>) -> Self {
        self.default_weather = Some(weather.into());
        self
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Evaluates at the local wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`AlertEngine::evaluate_at`].
    pub fn evaluate(&self, context: &UserContext, hotspots: &[Hotspot]) -> Result<Vec<Alert>> {
        self.evaluate_at(context, hotspots, Local::now().naive_local())
    }

    /// Evaluates with `now` as the evaluation clock.
    ///
    /// `now` stands in for a missing context timestamp and anchors
    /// `valid_until`. Alerts come back in hotspot order. Hotspots that fail
    /// [`Hotspot::validate`] are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid traveler position and
    /// [`Error::Config`] for an invalid configuration.
    pub fn evaluate_at(
        &self,
        context: &UserContext,
        hotspots: &[Hotspot],
        now: NaiveDateTime,
    ) -> Result<Vec<Alert>> {
        self.config.validate()?;
        let user = context.coordinate()?;
        let hour = context.timestamp.unwrap_or(now).hour() as u8;
        let weather = context
            .weather
            .as_deref()
            .or(self.default_weather.as_deref());
        let valid_until = Duration::try_minutes(self.config.validity_minutes)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                Error::Config(format!(
                    "validity window of {} minutes is out of range",
                    self.config.validity_minutes
                ))
            })?;

        let alerts: Vec<Alert> = hotspots
            .par_iter()
            .filter_map(|hotspot| self.check_hotspot(&user, hotspot, hour, weather, valid_until))
            .collect();

        log::debug!(
            "evaluated {} hotspots at ({:.5}, {:.5}): {} alerts",
            hotspots.len(),
            user.lat,
            user.lng,
            alerts.len()
        );
        Ok(alerts)
    }

    fn check_hotspot(
        &self,
        user: &Coordinate,
        hotspot: &Hotspot,
        hour: u8,
        weather: Option<&str>,
        valid_until: NaiveDateTime,
    ) -> Option<Alert> {
        if let Err(err) = hotspot.validate() {
            log::warn!("skipping hotspot {}: {err}", hotspot.cluster_id);
            return None;
        }

        let distance_km = user.distance_km(&hotspot.center);
        if distance_km > self.config.alert_radius_km {
            return None;
        }

        let risk = RiskMatch::evaluate(hotspot, hour, weather);
        let risk_score = risk.score();
        if risk_score < self.config.min_alert_score {
            return None;
        }

        let distance_meters = (distance_km * 1000.0) as u32;
        Some(Alert {
            kind: AlertKind::RiskAlert,
            severity: hotspot.risk_level,
            message: compose_message(hotspot, &risk, distance_meters),
            hotspot_id: hotspot.cluster_id,
            distance_meters,
            risk_score,
            recommended_action: RecommendedAction::ReduceSpeed,
            valid_until,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proximity_bands() {
        assert_eq!(proximity_descriptor(0), "Approaching");
        assert_eq!(proximity_descriptor(99), "Approaching");
        assert_eq!(proximity_descriptor(100), "Near");
        assert_eq!(proximity_descriptor(299), "Near");
        assert_eq!(proximity_descriptor(300), "Approaching");
        assert_eq!(proximity_descriptor(500), "Approaching");
    }

    #[test]
    fn test_weather_matching() {
        assert!(weather_matches(Some("Heavy RAIN"), Some("Light Rain")));
        assert!(weather_matches(Some("fog"), Some("Dense Fog")));
        assert!(!weather_matches(Some("Clear"), Some("Dense Fog")));
        assert!(!weather_matches(Some("Rain"), Some("Clear")));
        assert!(weather_matches(None, Some("Clear")));
        assert!(weather_matches(Some("  "), Some("Clear")));
        assert!(weather_matches(None, None));
        assert!(!weather_matches(Some("Clear"), None));
        assert!(!weather_matches(Some("rain"), None));
    }

    #[test]
    fn test_score_weights() {
        let all = RiskMatch {
            is_peak_hour: true,
            is_night_risk: true,
            is_weather_match: true,
        };
        assert_eq!(all.score(), 5);
        assert_eq!(RiskMatch::default().score(), 0);
        let night_only = RiskMatch {
            is_night_risk: true,
            ..RiskMatch::default()
        };
        assert_eq!(night_only.score(), 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(AlertConfig::default().validate().is_ok());
        assert!(AlertConfig::default()
            .with_alert_radius_km(-1.0)
            .validate()
            .is_err());
        assert!(AlertConfig::default()
            .with_validity_minutes(-5)
            .validate()
            .is_err());
    }
}
