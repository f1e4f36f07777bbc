//! DBSCAN clustering over great-circle distance.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use roadrisk_core::{haversine_radians, Coordinate, Error, Result, EARTH_RADIUS_KM};

use crate::spatial::LatitudeIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Label assigned to points that belong to no cluster.
pub const NOISE: i32 = -1;

/// DBSCAN parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DbscanConfig {
    /// Neighborhood radius as a central angle in radians.
    pub epsilon: f64,
    /// Points (including the point itself) needed within `epsilon` for a
    /// core point.
    pub min_points: usize,
}

impl Default for DbscanConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            min_points: 3,
        }
    }
}

impl DbscanConfig {
    /// Sets the neighborhood radius in radians.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the neighborhood radius as a ground distance in kilometers.
    #[must_use]
    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.epsilon = radius_km / EARTH_RADIUS_KM;
        self
    }

    /// Sets the core-point threshold.
    #[must_use]
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Neighborhood radius as a ground distance in kilometers.
    #[must_use]
    pub fn radius_km(&self) -> f64 {
        self.epsilon * EARTH_RADIUS_KM
    }

    /// Rejects parameters the algorithm cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a non-positive or non-finite epsilon or
    /// a zero `min_points`.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(Error::Config(format!(
                "epsilon must be a positive number of radians, got {}",
                self.epsilon
            )));
        }
        if self.min_points == 0 {
            return Err(Error::Config("min_points must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Density-based clustering of coordinates.
#[derive(Clone, Debug, Default)]
pub struct DbscanClustering {
    config: DbscanConfig,
}

/// Reusable scratch buffers for [`DbscanClustering::cluster`].
#[derive(Default)]
pub struct DbscanState {
    visited: Vec<bool>,
    neighbors: Vec<usize>,
    seeds: Vec<usize>,
}

struct DbscanContext<'a> {
    points: &'a [Coordinate],
    index: LatitudeIndex<usize>,
    epsilon: f64,
}

impl DbscanClustering {
    /// Creates a clustering engine with the given parameters.
    #[must_use]
    pub fn new(config: DbscanConfig) -> Self {
        Self { config }
    }

    /// Current parameters.
    #[must_use]
    pub fn config(&self) -> &DbscanConfig {
        &self.config
    }

    /// Fresh scratch state.
    #[must_use]
    pub fn create_state(&self) -> DbscanState {
        DbscanState::default()
    }

    /// Labels every point with a cluster id (0, 1, ...) or [`NOISE`].
    ///
    /// Points are visited in slice order and neighbors in ascending index
    /// order, so the same input always yields the same labels. A border
    /// point reachable from several clusters keeps the first one that
    /// reached it.
    ///
    /// Returns the number of clusters found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid parameters and
    /// [`Error::Clustering`] when `labels` and `points` differ in length.
    pub fn cluster(
        &self,
        points: &[Coordinate],
        state: &mut DbscanState,
        labels: &mut [i32],
    ) -> Result<usize> {
        self.config.validate()?;
        if labels.len() != points.len() {
            return Err(Error::Clustering(format!(
                "label buffer holds {} entries for {} points",
                labels.len(),
                points.len()
            )));
        }

        labels.fill(NOISE);
        let n = points.len();
        if n == 0 {
            return Ok(0);
        }

        let ctx = DbscanContext {
            points,
            index: LatitudeIndex::from_points(points, self.config.epsilon),
            epsilon: self.config.epsilon,
        };

        state.visited.clear();
        state.visited.resize(n, false);

        let mut current_cluster_id: i32 = 0;

        for i in 0..n {
            if state.visited[i] {
                continue;
            }
            state.visited[i] = true;

            region_query_into(&ctx, i, &mut state.neighbors);
            if state.neighbors.len() < self.config.min_points {
                // Stays noise unless a later cluster reaches it as a border point.
                continue;
            }

            labels[i] = current_cluster_id;
            state.seeds.clear();
            claim_neighbors(
                &state.neighbors,
                current_cluster_id,
                labels,
                &state.visited,
                &mut state.seeds,
            );
            self.expand_cluster(&ctx, current_cluster_id, labels, state);
            current_cluster_id += 1;
        }

        let num_clusters = current_cluster_id as usize;
        log::debug!(
            "dbscan: {} points, {} clusters, {} noise (eps={:.6} rad, min_points={})",
            n,
            num_clusters,
            labels.iter().filter(|&&l| l == NOISE).count(),
            self.config.epsilon,
            self.config.min_points
        );
        Ok(num_clusters)
    }

    /// Convenience wrapper allocating the label vector and scratch state.
    ///
    /// # Errors
    ///
    /// See [`DbscanClustering::cluster`].
    pub fn cluster_labels(&self, points: &[Coordinate]) -> Result<(Vec<i32>, usize)> {
        let mut labels = vec![NOISE; points.len()];
        let mut state = self.create_state();
        let count = self.cluster(points, &mut state, &mut labels)?;
        Ok((labels, count))
    }

    fn expand_cluster(
        &self,
        ctx: &DbscanContext,
        cluster_id: i32,
        labels: &mut [i32],
        state: &mut DbscanState,
    ) {
        let mut next = 0;
        while next < state.seeds.len() {
            let current = state.seeds[next];
            next += 1;

            if state.visited[current] {
                continue;
            }
            state.visited[current] = true;

            region_query_into(ctx, current, &mut state.neighbors);
            if state.neighbors.len() >= self.config.min_points {
                claim_neighbors(
                    &state.neighbors,
                    cluster_id,
                    labels,
                    &state.visited,
                    &mut state.seeds,
                );
            }
        }
    }
}

/// Assigns unlabeled neighbors to `cluster_id`; unvisited ones are queued
/// for expansion.
fn claim_neighbors(
    neighbors: &[usize],
    cluster_id: i32,
    labels: &mut [i32],
    visited: &[bool],
    seeds: &mut Vec<usize>,
) {
    for &q in neighbors {
        if labels[q] == NOISE {
            labels[q] = cluster_id;
            if !visited[q] {
                seeds.push(q);
            }
        }
    }
}

/// Indices within `epsilon` of `points[idx]`, itself included, ascending.
fn region_query_into(ctx: &DbscanContext, idx: usize, neighbors: &mut Vec<usize>) {
    let p = ctx.points[idx];
    neighbors.clear();
    neighbors.extend(ctx.index.query_neighborhood(p.lat).filter(|&j| {
        let q = ctx.points[j];
        j == idx || haversine_radians(p.lat, p.lng, q.lat, q.lng) <= ctx.epsilon
    }));
    neighbors.sort_unstable();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(points: &[(f64, f64)]) -> Vec<Coordinate> {
        points
            .iter()
            .map(|&(lat, lng)| Coordinate { lat, lng })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let algo = DbscanClustering::default();
        let (labels, n) = algo.cluster_labels(&[]).unwrap();
        assert!(labels.is_empty());
        assert_eq!(n, 0);
    }

    #[test]
    fn test_fewer_points_than_min_points_is_noise() {
        let algo = DbscanClustering::new(DbscanConfig::default().with_min_points(3));
        let (labels, n) = algo
            .cluster_labels(&coords(&[(10.0, 20.0), (10.0, 20.0)]))
            .unwrap();
        assert_eq!(n, 0);
        assert_eq!(labels, vec![NOISE, NOISE]);
    }

    #[test]
    fn test_min_points_counts_the_point_itself() {
        let algo = DbscanClustering::new(
            DbscanConfig::default()
                .with_radius_km(0.1)
                .with_min_points(2),
        );
        let (labels, n) = algo
            .cluster_labels(&coords(&[(10.0, 20.0), (10.0003, 20.0)]))
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(labels, vec![0, 0]);
    }

    #[test]
    fn test_border_point_joins_cluster() {
        // Three tight points form a core; the fourth is within eps of only
        // the last of them, so it is a border point, not a core.
        let algo = DbscanClustering::new(
            DbscanConfig::default()
                .with_radius_km(0.1)
                .with_min_points(3),
        );
        let points = coords(&[
            (0.0, 0.0),
            (0.0, 0.0005),
            (0.0, 0.0008),
            (0.0, 0.0016),
        ]);
        let (labels, n) = algo.cluster_labels(&points).unwrap();
        assert_eq!(n, 1);
        assert_eq!(labels, vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_shared_border_point_keeps_first_cluster() {
        // Points on the equator in steps of about 11 m. The middle point is
        // within 100 m of both cores at +-89 m but of nothing else, so it is
        // a border point of both clusters.
        let algo = DbscanClustering::new(
            DbscanConfig::default()
                .with_radius_km(0.1)
                .with_min_points(4),
        );
        let steps = [-8.0, -10.0, -11.0, -12.0, 0.0, 8.0, 10.0, 11.0, 12.0];
        let points: Vec<Coordinate> = steps
            .iter()
            .map(|&step| Coordinate {
                lat: 0.0,
                lng: step * 1e-4,
            })
            .collect();
        let (labels, n) = algo.cluster_labels(&points).unwrap();
        assert_eq!(n, 2);
        assert_eq!(labels, vec![0, 0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_tiny_epsilon_clusters_only_coincident_points() {
        let algo = DbscanClustering::new(
            DbscanConfig::default()
                .with_epsilon(1e-20)
                .with_min_points(1),
        );
        let (labels, n) = algo
            .cluster_labels(&coords(&[(10.0, 20.0), (10.5, 20.0)]))
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let algo = DbscanClustering::new(DbscanConfig::default().with_min_points(0));
        assert!(matches!(algo.cluster_labels(&[]), Err(Error::Config(_))));

        let algo = DbscanClustering::new(DbscanConfig::default().with_epsilon(f64::NAN));
        assert!(matches!(algo.cluster_labels(&[]), Err(Error::Config(_))));
    }

    #[test]
    fn test_label_length_mismatch() {
        let algo = DbscanClustering::default();
        let mut state = algo.create_state();
        let mut labels = vec![0; 1];
        let result = algo.cluster(&coords(&[(0.0, 0.0), (1.0, 1.0)]), &mut state, &mut labels);
        assert!(matches!(result, Err(Error::Clustering(_))));
    }

    #[test]
    fn test_radius_km_round_trip() {
        let config = DbscanConfig::default().with_radius_km(0.5);
        assert!((config.radius_km() - 0.5).abs() < 1e-12);
    }
}
