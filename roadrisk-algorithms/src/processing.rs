//! High-level pipeline: validate, cluster, then profile.

use roadrisk_core::{AccidentRecord, Coordinate, Hotspot, Rejection, Result};

use crate::{DbscanClustering, DbscanConfig, HotspotProfiler, ProfileConfig, NOISE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters for one detection run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectionConfig {
    /// Clustering parameters.
    pub clustering: DbscanConfig,
    /// Profiling parameters.
    pub profile: ProfileConfig,
}

impl DetectionConfig {
    /// Sets the clustering parameters.
    #[must_use]
    pub fn with_clustering(mut self, clustering: DbscanConfig) -> Self {
        self.clustering = clustering;
        self
    }

    /// Sets the profiling parameters.
    #[must_use]
    pub fn with_profile(mut self, profile: ProfileConfig) -> Self {
        self.profile = profile;
        self
    }
}

/// Output of one detection run.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Detection {
    /// One hotspot per cluster, by ascending cluster id.
    pub hotspots: Vec<Hotspot>,
    /// Records dropped before clustering.
    pub rejected: Vec<Rejection>,
    /// Valid records that joined no cluster.
    pub noise_count: usize,
}

/// Detects hotspots in `records`.
///
/// Records with a missing id or bad coordinates are set aside as
/// [`Rejection`]s and the rest of the run proceeds without them.
///
/// # Errors
///
/// Returns [`roadrisk_core::Error::Config`] for invalid parameters.
pub fn detect_hotspots(records: &[AccidentRecord], config: &DetectionConfig) -> Result<Detection> {
    config.clustering.validate()?;
    config.profile.validate()?;

    let mut accepted: Vec<&AccidentRecord> = Vec::with_capacity(records.len());
    let mut points: Vec<Coordinate> = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for (position, record) in records.iter().enumerate() {
        match record.coordinate() {
            Ok(point) => {
                accepted.push(record);
                points.push(point);
            }
            Err(reason) => {
                let record_id = if record.id.trim().is_empty() {
                    format!("#{position}")
                } else {
                    record.id.clone()
                };
                log::warn!("rejecting accident record {record_id}: {reason}");
                rejected.push(Rejection { record_id, reason });
            }
        }
    }

    let clustering = DbscanClustering::new(config.clustering.clone());
    let (labels, num_clusters) = clustering.cluster_labels(&points)?;
    let noise_count = labels.iter().filter(|&&label| label == NOISE).count();

    let hotspots = HotspotProfiler::new(config.profile.clone()).profile(&accepted, &labels)?;

    log::debug!(
        "detection: {} records, {} rejected, {} clusters, {} noise (radius {:.3} km)",
        records.len(),
        rejected.len(),
        num_clusters,
        noise_count,
        clustering.config().radius_km()
    );

    Ok(Detection {
        hotspots,
        rejected,
        noise_count,
    })
}
