#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client-side bounding-box filtering for `GeoJSON` feature collections.
//!
//! Used when a layer had to be queried without a server-side geographic
//! constraint (a `1=1` query) and the result needs trimming to the map's
//! region. Each feature's geometry is reduced to its own bounding rectangle
//! and kept when that rectangle intersects the region. Testing the whole
//! extent rather than sampled vertices means a feature that touches the
//! region is never dropped; features near the edge may be kept even if only
//! their extent overlaps.

use geo::{Intersects, Rect, coord};
use geojson::{Feature, FeatureCollection, Value};
use lihtc_map_geography_models::Bounds;

/// Converts region bounds into a `geo` rectangle.
#[must_use]
pub fn bounds_rect(bounds: &Bounds) -> Rect<f64> {
    Rect::new(
        coord! { x: bounds.min_lng, y: bounds.min_lat },
        coord! { x: bounds.max_lng, y: bounds.max_lat },
    )
}

/// Computes the bounding rectangle of every position in a geometry.
///
/// Returns `None` for empty geometries and for geometries whose positions
/// all lack a longitude/latitude pair.
#[must_use]
pub fn geometry_extent(value: &Value) -> Option<Rect<f64>> {
    let mut extent = Extent::default();
    extent.visit(value);
    extent.into_rect()
}

/// Whether a feature's geometry extent intersects `region`.
///
/// Features without geometry never match.
#[must_use]
pub fn feature_intersects(feature: &Feature, region: &Rect<f64>) -> bool {
    feature
        .geometry
        .as_ref()
        .and_then(|g| geometry_extent(&g.value))
        .is_some_and(|extent| extent.intersects(region))
}

/// Keeps only the features whose geometry falls at least partly within
/// `bounds`, preserving their order.
///
/// The collection-level `bbox` member is cleared since it no longer
/// describes the remaining features.
#[must_use]
pub fn filter_to_bounds(collection: FeatureCollection, bounds: &Bounds) -> FeatureCollection {
    let region = bounds_rect(bounds);
    let before = collection.features.len();

    let features: Vec<Feature> = collection
        .features
        .into_iter()
        .filter(|f| feature_intersects(f, &region))
        .collect();

    log::debug!(
        "Bounding-box filter kept {} of {before} features",
        features.len()
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: collection.foreign_members,
    }
}

/// Running min/max accumulator over geometry positions.
#[derive(Default)]
struct Extent {
    min: Option<(f64, f64)>,
    max: Option<(f64, f64)>,
}

impl Extent {
    fn visit(&mut self, value: &Value) {
        match value {
            Value::Point(p) => self.add(p),
            Value::MultiPoint(points) | Value::LineString(points) => {
                points.iter().for_each(|p| self.add(p));
            }
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                lines.iter().flatten().for_each(|p| self.add(p));
            }
            Value::MultiPolygon(polygons) => {
                polygons.iter().flatten().flatten().for_each(|p| self.add(p));
            }
            Value::GeometryCollection(geometries) => {
                for g in geometries {
                    self.visit(&g.value);
                }
            }
        }
    }

    fn add(&mut self, position: &[f64]) {
        let [x, y, ..] = position else {
            return;
        };
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min = Some(self.min.map_or((*x, *y), |(mx, my)| (mx.min(*x), my.min(*y))));
        self.max = Some(self.max.map_or((*x, *y), |(mx, my)| (mx.max(*x), my.max(*y))));
    }

    fn into_rect(self) -> Option<Rect<f64>> {
        let ((min_x, min_y), (max_x, max_y)) = (self.min?, self.max?);
        Some(Rect::new(
            coord! { x: min_x, y: min_y },
            coord! { x: max_x, y: max_y },
        ))
    }
}
