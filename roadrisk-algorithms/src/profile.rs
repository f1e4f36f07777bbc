//! Per-cluster statistics: geometry, severity, time and weather profiles.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Timelike, Weekday};
use rayon::prelude::*;
use roadrisk_core::{
    AccidentRecord, BoundingBox, Coordinate, Error, Hotspot, Result, RiskLevel,
    SeverityDistribution, TimePatterns, WeatherPatterns,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of hours reported in `peak_hours`.
pub const PEAK_HOUR_COUNT: usize = 3;
/// First hour of the evening part of the night window.
pub const NIGHT_START_HOUR: u8 = 18;
/// Last hour of the morning part of the night window.
pub const NIGHT_END_HOUR: u8 = 6;
/// Share of night accidents above which a hotspot counts as a night hotspot.
pub const NIGHT_SHARE_THRESHOLD: f64 = 0.5;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Profiler parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProfileConfig {
    /// Degrees added on each side of the member extent.
    pub bbox_padding: f64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            bbox_padding: 0.001,
        }
    }
}

impl ProfileConfig {
    /// Sets the bounding-box padding in degrees.
    #[must_use]
    pub fn with_bbox_padding(mut self, padding: f64) -> Self {
        self.bbox_padding = padding;
        self
    }

    /// Rejects a negative or non-finite padding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`].
    pub fn validate(&self) -> Result<()> {
        if !self.bbox_padding.is_finite() || self.bbox_padding < 0.0 {
            return Err(Error::Config(format!(
                "bbox_padding must be a non-negative number of degrees, got {}",
                self.bbox_padding
            )));
        }
        Ok(())
    }
}

/// Builds one [`Hotspot`] per cluster.
#[derive(Clone, Debug, Default)]
pub struct HotspotProfiler {
    config: ProfileConfig,
}

impl HotspotProfiler {
    /// Create with a custom configuration.
    #[must_use]
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Profiles every non-noise cluster in `labels`.
    ///
    /// `labels[i]` is the cluster of `records[i]`; negative labels are noise
    /// and skipped. Hotspots come back in ascending cluster id order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Clustering`] when the slices differ in length and
    /// [`Error::Config`] for an invalid padding.
    pub fn profile<R>(&self, records: &[R], labels: &[i32]) -> Result<Vec<Hotspot>>
    where
        R: Borrow<AccidentRecord>,
    {
        self.config.validate()?;
        if records.len() != labels.len() {
            return Err(Error::Clustering(format!(
                "{} labels for {} records",
                labels.len(),
                records.len()
            )));
        }

        let mut clusters: BTreeMap<u32, Vec<&AccidentRecord>> = BTreeMap::new();
        for (record, &label) in records.iter().zip(labels) {
            if let Ok(cluster_id) = u32::try_from(label) {
                clusters
                    .entry(cluster_id)
                    .or_default()
                    .push(Borrow::<AccidentRecord>::borrow(record));
            }
        }

        let clusters: Vec<(u32, Vec<&AccidentRecord>)> = clusters.into_iter().collect();
        Ok(clusters
            .par_iter()
            .filter_map(|(cluster_id, members)| self.profile_cluster(*cluster_id, members))
            .collect())
    }

    /// Profiles a single cluster; `None` when `members` is empty.
    #[must_use]
    pub fn profile_cluster(
        &self,
        cluster_id: u32,
        members: &[&AccidentRecord],
    ) -> Option<Hotspot> {
        if members.is_empty() {
            return None;
        }
        let total = members.len();

        let positions = members.iter().map(|r| Coordinate {
            lat: r.latitude,
            lng: r.longitude,
        });
        let center = Coordinate {
            lat: members.iter().map(|r| r.latitude).sum::<f64>() / total as f64,
            lng: members.iter().map(|r| r.longitude).sum::<f64>() / total as f64,
        };
        let bounding_box = BoundingBox::around(positions, self.config.bbox_padding)?;

        let severity_distribution =
            SeverityDistribution::from_severities(members.iter().map(|r| r.severity));
        let risk_score = severity_distribution.risk_score();
        let risk_level = RiskLevel::from_score(risk_score);

        let time_patterns = analyze_time_patterns(members);
        let weather_patterns = analyze_weather_patterns(members);
        let last_accident = members.iter().filter_map(|r| r.accident_time).max();
        let recommendations = generate_recommendations(risk_level, &time_patterns);

        Some(Hotspot {
            cluster_id,
            center,
            bounding_box,
            total_accidents: total,
            severity_distribution,
            risk_score,
            risk_level,
            time_patterns,
            weather_patterns,
            last_accident,
            recommendations,
        })
    }
}

/// Hour falls in the wrap-around night window 18:00-23:59 or 00:00-06:59.
#[inline]
#[must_use]
pub fn is_night_hour(hour: u8) -> bool {
    (NIGHT_START_HOUR..=23).contains(&hour) || (0..=NIGHT_END_HOUR).contains(&hour)
}

/// Hour histogram, peak hours, busiest weekday and the night flag.
///
/// Members without a timestamp count toward the cluster total used by the
/// night share but contribute no hour or weekday.
#[must_use]
pub fn analyze_time_patterns(members: &[&AccidentRecord]) -> TimePatterns {
    let mut hourly_distribution: BTreeMap<u8, usize> = BTreeMap::new();
    let mut weekday_counts = [0usize; 7];
    let mut night_count = 0usize;
    let mut timed = 0usize;

    for time in members.iter().filter_map(|r| r.accident_time) {
        let hour = time.hour() as u8;
        *hourly_distribution.entry(hour).or_default() += 1;
        weekday_counts[time.weekday().num_days_from_monday() as usize] += 1;
        if is_night_hour(hour) {
            night_count += 1;
        }
        timed += 1;
    }

    // Ascending hour order from the BTreeMap survives the stable sort, so
    // equal counts are ordered by hour.
    let mut by_count: Vec<(u8, usize)> =
        hourly_distribution.iter().map(|(&h, &c)| (h, c)).collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1));
    let peak_hours = by_count
        .into_iter()
        .take(PEAK_HOUR_COUNT)
        .map(|(hour, _)| hour)
        .collect();

    let busiest_day = if timed == 0 {
        None
    } else {
        let mut best = 0;
        for (day, &count) in weekday_counts.iter().enumerate() {
            if count > weekday_counts[best] {
                best = day;
            }
        }
        Some(WEEKDAYS[best])
    };

    let is_night_hotspot = night_count as f64 > members.len() as f64 * NIGHT_SHARE_THRESHOLD;

    TimePatterns {
        peak_hours,
        hourly_distribution,
        busiest_day,
        is_night_hotspot,
    }
}

/// Modal weather and rain share; `None` when no member has weather data.
///
/// The rain share is taken over all members, so members without weather
/// count as dry. Ties for the modal string go to the one seen first.
#[must_use]
pub fn analyze_weather_patterns(members: &[&AccidentRecord]) -> Option<WeatherPatterns> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut rainy = 0usize;

    for weather in members.iter().filter_map(|r| r.weather()) {
        let count = counts.entry(weather).or_insert_with(|| {
            order.push(weather);
            0
        });
        *count += 1;
        if mentions_rain(weather) {
            rainy += 1;
        }
    }

    let mut most_common: Option<(&str, usize)> = None;
    for weather in order {
        let count = counts[weather];
        if most_common.is_none_or(|(_, best)| count > best) {
            most_common = Some((weather, count));
        }
    }

    most_common.map(|(weather, _)| WeatherPatterns {
        most_common_weather: weather.to_string(),
        rainy_percentage: rainy as f64 / members.len() as f64 * 100.0,
    })
}

/// Case-insensitive test for "rain" in a weather description.
#[inline]
#[must_use]
pub fn mentions_rain(weather: &str) -> bool {
    weather.to_lowercase().contains("rain")
}

/// Mitigation suggestions derived from the risk level and time profile.
#[must_use]
pub fn generate_recommendations(
    risk_level: RiskLevel,
    time_patterns: &TimePatterns,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if risk_level == RiskLevel::High {
        recommendations.push("Immediate safety audit required".to_string());
        recommendations.push("Consider traffic calming measures".to_string());
    }

    if time_patterns.is_night_hotspot {
        recommendations.push("Improve street lighting".to_string());
        recommendations.push("Add reflective road markings".to_string());
    }

    if !time_patterns.peak_hours.is_empty() {
        let hours: Vec<String> = time_patterns.peak_hours.iter().map(u8::to_string).collect();
        recommendations.push(format!(
            "Increase police patrols during hours: {}",
            hours.join(", ")
        ));
    }

    recommendations
}
