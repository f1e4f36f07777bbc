//! Geographic coordinates and great-circle distance.

use crate::error::ValidationError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for all ground distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A validated latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Coordinate {
    /// Latitude in degrees, within [-90, 90].
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180].
    pub lng: f64,
}

impl Coordinate {
    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLatitude`] or
    /// [`ValidationError::InvalidLongitude`].
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let coord = Self { lat, lng };
        coord.validate()?;
        Ok(coord)
    }

    /// Checks that both components are finite and in range.
    ///
    /// # Errors
    ///
    /// Returns the first offending component.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(ValidationError::InvalidLatitude(self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(ValidationError::InvalidLongitude(self.lng));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in kilometers.
    #[inline]
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Central angle between two points in radians (haversine on the unit sphere).
#[must_use]
pub fn haversine_radians(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let half_dlat = (lat2_rad - lat1_rad) / 2.0;
    let half_dlng = (lng2 - lng1).to_radians() / 2.0;

    let a = half_dlat.sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * half_dlng.sin().powi(2);
    2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt())
}

/// Great-circle distance in kilometers between two points given in degrees.
#[inline]
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    EARTH_RADIUS_KM * haversine_radians(lat1, lng1, lat2, lng2)
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Maximum latitude.
    pub north: f64,
    /// Minimum latitude.
    pub south: f64,
    /// Maximum longitude.
    pub east: f64,
    /// Minimum longitude.
    pub west: f64,
}

impl BoundingBox {
    /// Tightest box around `points`, grown by `padding` degrees on every side.
    ///
    /// Returns `None` for an empty iterator.
    pub fn around<I>(points: I, padding: f64) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bbox = Self {
            north: first.lat,
            south: first.lat,
            east: first.lng,
            west: first.lng,
        };
        for p in iter {
            bbox.north = bbox.north.max(p.lat);
            bbox.south = bbox.south.min(p.lat);
            bbox.east = bbox.east.max(p.lng);
            bbox.west = bbox.west.min(p.lng);
        }
        bbox.north += padding;
        bbox.east += padding;
        bbox.south -= padding;
        bbox.west -= padding;
        Some(bbox)
    }

    /// Returns true if `point` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(45.0, -122.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert_eq!(
            Coordinate::new(90.5, 0.0),
            Err(ValidationError::InvalidLatitude(90.5))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.1),
            Err(ValidationError::InvalidLongitude(-180.1))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        assert_eq!(haversine_km(10.0, 20.0, 10.0, 20.0), 0.0);
    }

    #[test]
    fn test_haversine_symmetric() {
        let pairs = [
            ((10.0, 20.0), (10.1, 20.0)),
            ((-33.86, 151.2), (51.5, -0.12)),
            ((89.9, 0.0), (-89.9, 179.9)),
        ];
        for ((a_lat, a_lng), (b_lat, b_lng)) in pairs {
            assert_relative_eq!(
                haversine_km(a_lat, a_lng, b_lat, b_lng),
                haversine_km(b_lat, b_lng, a_lat, a_lng),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_haversine_one_tenth_degree_latitude() {
        let d = haversine_km(10.0, 20.0, 10.1, 20.0);
        assert_relative_eq!(d, 11.119, epsilon = 0.01);
    }

    #[test]
    fn test_bounding_box_padding() {
        let points = [
            Coordinate { lat: 1.0, lng: 2.0 },
            Coordinate { lat: 1.5, lng: 1.0 },
        ];
        let bbox = BoundingBox::around(points, 0.001).unwrap();
        assert_relative_eq!(bbox.north, 1.501, epsilon = 1e-12);
        assert_relative_eq!(bbox.south, 0.999, epsilon = 1e-12);
        assert_relative_eq!(bbox.east, 2.001, epsilon = 1e-12);
        assert_relative_eq!(bbox.west, 0.999, epsilon = 1e-12);
        assert!(bbox.contains(&Coordinate { lat: 1.2, lng: 1.5 }));
        assert!(BoundingBox::around(std::iter::empty(), 0.001).is_none());
    }
}
