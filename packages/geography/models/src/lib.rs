#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic region types.
//!
//! These types describe the area a map is focused on: a US state plus a
//! longitude/latitude bounding box used to trim nationwide query results
//! down to the region.

pub mod fips;

use serde::{Deserialize, Serialize};

/// A rectangular longitude/latitude bound in WGS84 degrees.
///
/// Serialized as `[west, south, east, north]`, the same order `GeoJSON`
/// uses for `bbox` members.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Bounds {
    /// Western edge (minimum longitude).
    pub min_lng: f64,
    /// Southern edge (minimum latitude).
    pub min_lat: f64,
    /// Eastern edge (maximum longitude).
    pub max_lng: f64,
    /// Northern edge (maximum latitude).
    pub max_lat: f64,
}

impl Bounds {
    /// Creates a bound from its four edges.
    #[must_use]
    pub const fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Returns a copy grown by `degrees` on every side, clamped to valid
    /// longitude/latitude ranges.
    #[must_use]
    pub fn padded(&self, degrees: f64) -> Self {
        Self {
            min_lng: (self.min_lng - degrees).max(-180.0),
            min_lat: (self.min_lat - degrees).max(-90.0),
            max_lng: (self.max_lng + degrees).min(180.0),
            max_lat: (self.max_lat + degrees).min(90.0),
        }
    }

    /// Whether the edges are finite and correctly ordered.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
            .iter()
            .all(|v| v.is_finite())
            && self.min_lng <= self.max_lng
            && self.min_lat <= self.max_lat
    }
}

impl From<[f64; 4]> for Bounds {
    fn from([min_lng, min_lat, max_lng, max_lat]: [f64; 4]) -> Self {
        Self::new(min_lng, min_lat, max_lng, max_lat)
    }
}

impl From<Bounds> for [f64; 4] {
    fn from(b: Bounds) -> Self {
        [b.min_lng, b.min_lat, b.max_lng, b.max_lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORADO: Bounds = Bounds::new(-109.06, 36.99, -102.04, 41.01);

    #[test]
    fn padding_grows_every_edge() {
        let padded = COLORADO.padded(0.5);
        assert!((padded.min_lng - -109.56).abs() < 1e-9);
        assert!((padded.max_lat - 41.51).abs() < 1e-9);
        assert!((padded.max_lng - -101.54).abs() < 1e-9);
        assert!((padded.min_lat - 36.49).abs() < 1e-9);
    }

    #[test]
    fn padding_clamps_to_world() {
        let world = Bounds::new(-179.9, -89.9, 179.9, 89.9).padded(1.0);
        assert!((world.min_lng - -180.0).abs() < f64::EPSILON);
        assert!((world.max_lat - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserializes_from_array() {
        let bounds: Bounds = serde_json::from_str("[-109.06, 36.99, -102.04, 41.01]").unwrap();
        assert_eq!(bounds, COLORADO);
        assert!(bounds.is_valid());
    }

    #[test]
    fn rejects_inverted_edges() {
        assert!(!Bounds::new(10.0, 0.0, -10.0, 5.0).is_valid());
        assert!(!Bounds::new(f64::NAN, 0.0, 1.0, 1.0).is_valid());
    }
}
