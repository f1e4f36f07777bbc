//! Area queries over a hotspot set.

use roadrisk_core::{Coordinate, Hotspot, Result, RiskLevel, ValidationError};

#[cfg(feature = "serde")]
use serde::Serialize;

/// A hotspot paired with its distance from the query point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct NearbyHotspot<'a> {
    /// The matching hotspot.
    pub hotspot: &'a Hotspot,
    /// Great-circle distance from the query point to its center.
    pub distance_km: f64,
}

/// Hotspots whose center lies within `radius_km` of `center`, nearest first.
///
/// Equal distances keep input order. Hotspots with an invalid center are
/// skipped.
///
/// # Errors
///
/// Returns [`roadrisk_core::Error::Validation`] for an invalid center or a
/// negative or non-finite radius.
pub fn hotspots_within(
    center: Coordinate,
    radius_km: f64,
    hotspots: &[Hotspot],
) -> Result<Vec<NearbyHotspot<'_>>> {
    center.validate()?;
    if !radius_km.is_finite() || radius_km < 0.0 {
        return Err(ValidationError::InvalidRadius(radius_km).into());
    }

    let mut nearby: Vec<NearbyHotspot<'_>> = hotspots
        .iter()
        .filter(|hotspot| match hotspot.center.validate() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("skipping hotspot {}: {err}", hotspot.cluster_id);
                false
            }
        })
        .map(|hotspot| NearbyHotspot {
            hotspot,
            distance_km: center.distance_km(&hotspot.center),
        })
        .filter(|n| n.distance_km <= radius_km)
        .collect();

    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    Ok(nearby)
}

/// High-risk hotspots in input order.
pub fn high_risk_hotspots(hotspots: &[Hotspot]) -> impl Iterator<Item = &Hotspot> {
    hotspots
        .iter()
        .filter(|hotspot| hotspot.risk_level == RiskLevel::High)
}
