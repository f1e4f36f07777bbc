//! Latitude-band spatial index for neighbor lookup on the sphere.
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;

use roadrisk_core::Coordinate;

/// Relative slack added to the band height so points exactly `eps` apart
/// never land two bands away through rounding.
const BAND_SLACK: f64 = 1e-9;

/// Buckets values by latitude band.
///
/// Great-circle distance is never smaller than the latitude difference, so
/// every point within `eps` radians of a query lies in the query's band or
/// one of its two neighbors when bands are `eps` tall. Longitude is not
/// indexed: meridians converge, so a fixed longitude cell would be wrong
/// near the poles.
#[derive(Debug, Default)]
pub struct LatitudeIndex<T> {
    band_height_deg: f64,
    bands: HashMap<i64, Vec<T>>,
}

impl<T: Copy> LatitudeIndex<T> {
    /// Create an empty index whose bands cover `eps_radians` of latitude.
    pub fn new(eps_radians: f64) -> Self {
        Self {
            band_height_deg: eps_radians.to_degrees() * (1.0 + BAND_SLACK),
            bands: HashMap::new(),
        }
    }

    /// Insert a value at the given latitude.
    pub fn insert(&mut self, lat: f64, value: T) {
        self.bands.entry(self.band(lat)).or_default().push(value);
    }

    /// Values in the band containing `lat` and the two adjacent bands.
    pub fn query_neighborhood(&self, lat: f64) -> impl Iterator<Item = T> + '_ {
        let band = self.band(lat);
        (band.saturating_sub(1)..=band.saturating_add(1))
            .filter_map(move |b| self.bands.get(&b))
            .flat_map(|values| values.iter().copied())
    }

    // Saturates for extreme ratios of latitude to band height.
    fn band(&self, lat: f64) -> i64 {
        (lat / self.band_height_deg).floor() as i64
    }
}

impl LatitudeIndex<usize> {
    /// Index `points` by position in the slice.
    pub fn from_points(points: &[Coordinate], eps_radians: f64) -> Self {
        let mut index = Self::new(eps_radians);
        for (i, p) in points.iter().enumerate() {
            index.insert(p.lat, i);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_index() {
        // 0.001 rad is about 0.0573 degrees.
        let mut index: LatitudeIndex<usize> = LatitudeIndex::new(0.001);
        index.insert(10.0, 0);
        index.insert(10.05, 1);
        index.insert(10.5, 2);
        index.insert(-10.0, 3);

        let neighbors: Vec<usize> = index.query_neighborhood(10.0).collect();
        assert!(neighbors.contains(&0));
        assert!(neighbors.contains(&1));
        assert!(!neighbors.contains(&2));
        assert!(!neighbors.contains(&3));
    }

    #[test]
    fn test_tiny_band_height_saturates() {
        let mut index: LatitudeIndex<usize> = LatitudeIndex::new(1e-20);
        index.insert(10.0, 0);
        index.insert(-10.0, 1);
        assert_eq!(index.query_neighborhood(10.0).collect::<Vec<_>>(), vec![0]);
        assert_eq!(index.query_neighborhood(-10.0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_from_points_covers_band_edges() {
        let eps: f64 = 0.002;
        let step = eps.to_degrees();
        let points = [
            Coordinate { lat: 0.0, lng: 0.0 },
            Coordinate { lat: step, lng: 0.0 },
            Coordinate { lat: -step, lng: 0.0 },
        ];
        let index = LatitudeIndex::from_points(&points, eps);
        let mut neighbors: Vec<usize> = index.query_neighborhood(0.0).collect();
        neighbors.sort_unstable();
        assert_eq!(neighbors, vec![0, 1, 2]);
    }
}
