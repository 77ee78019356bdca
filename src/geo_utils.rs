//! # Geographic Utilities
//!
//! Geographic computations used by the viewport clusterer.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`compute_bounds`] | Bounding box of a set of points |
//! | [`compute_center`] | Arithmetic centroid of a set of points |
//! | [`median`] | Median of a list of values |
//!
//! ## Example
//!
//! ```rust
//! use segment_viewport::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(51.5074, -0.1278),  // London
//!     GpsPoint::new(51.5080, -0.1290),
//!     GpsPoint::new(51.5090, -0.1300),
//! ];
//!
//! let bounds = geo_utils::compute_bounds(&track).unwrap();
//! println!("Bounds: {:.4}N to {:.4}N", bounds.min_lat, bounds.max_lat);
//!
//! let dist = geo_utils::haversine_distance(&track[0], &track[2]);
//! println!("Start to end: {:.0}m", dist);
//! ```
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).
//! Centroids are plain coordinate means, which is fine for the city-sized
//! areas a segment list covers but not for sets crossing the antimeridian.

use geo::{BoundingRect, Centroid, MultiPoint, Point};

use crate::{Bounds, GpsPoint};

/// Earth radius used for all distance calculations, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters on a sphere of radius [`EARTH_RADIUS_METERS`].
///
/// # Example
///
/// ```rust
/// use segment_viewport::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let b = GpsPoint::new(0.0, 1.0);
///
/// let distance = geo_utils::haversine_distance(&a, &b);
/// assert!((distance - 111_195.0).abs() < 100.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_METERS * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Minimum distance from any of `points` to `target`, in meters.
///
/// Returns `None` for an empty slice.
pub fn min_distance_to(points: &[GpsPoint], target: &GpsPoint) -> Option<f64> {
    points
        .iter()
        .map(|p| haversine_distance(p, target))
        .min_by(|a, b| a.total_cmp(b))
}

// =============================================================================
// Bounding Box / Center Functions
// =============================================================================

fn to_multi_point<'a>(points: impl IntoIterator<Item = &'a GpsPoint>) -> MultiPoint<f64> {
    points
        .into_iter()
        .map(|p| Point::new(p.longitude, p.latitude))
        .collect()
}

/// Compute the bounding box of a set of points.
///
/// Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use segment_viewport::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.5000, -0.1300),
///     GpsPoint::new(51.5100, -0.1200),
///     GpsPoint::new(51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lat, 51.5100);
/// assert_eq!(bounds.min_lng, -0.1300);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    compute_bounds_iter(points)
}

/// Bounding box over any iterator of points (e.g. several routes chained together).
pub fn compute_bounds_iter<'a>(points: impl IntoIterator<Item = &'a GpsPoint>) -> Option<Bounds> {
    let rect = to_multi_point(points).bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Compute the arithmetic centroid of a set of points.
///
/// Every point has equal weight. Returns `None` for empty input.
///
/// # Example
///
/// ```rust
/// use segment_viewport::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.50, -0.10),
///     GpsPoint::new(51.52, -0.12),
/// ];
///
/// let center = geo_utils::compute_center(&track).unwrap();
/// assert!((center.latitude - 51.51).abs() < 0.001);
/// assert!((center.longitude - (-0.11)).abs() < 0.001);
/// ```
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    compute_center_iter(points)
}

/// Centroid over any iterator of points.
pub fn compute_center_iter<'a>(points: impl IntoIterator<Item = &'a GpsPoint>) -> Option<GpsPoint> {
    let centroid = to_multi_point(points).centroid()?;
    Some(GpsPoint::new(centroid.y(), centroid.x()))
}

// =============================================================================
// Statistics
// =============================================================================

/// Median of a list of values.
///
/// Even counts average the two middle values. Returns `None` for empty input.
///
/// ```rust
/// use segment_viewport::geo_utils::median;
///
/// assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
/// assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
