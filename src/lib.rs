//! # Segment Viewport
//!
//! Outlier-robust map centering for a list of GPS segments.
//!
//! This library provides:
//! - Encoded polyline decoding for segment geometries
//! - Median-threshold outlier rejection over a set of routes
//! - A viewport (bounding box, or fallback center + zoom) for the main cluster
//! - A thin adapter that keeps a map widget in sync with the visible segment list
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel decoding and scoring with rayon
//! - **`serde`** - Serialize/deserialize public types and configuration
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use segment_viewport::{compute_viewport, ClusterResult, GpsPoint, Route, ViewportConfig};
//!
//! let routes = vec![
//!     Route::new("home-loop", vec![GpsPoint::new(50.00, 4.00), GpsPoint::new(50.01, 4.01)]),
//!     Route::new("park-climb", vec![GpsPoint::new(50.02, 4.02), GpsPoint::new(50.03, 4.01)]),
//!     Route::new("holiday", vec![GpsPoint::new(10.0, 10.0)]),
//! ];
//!
//! match compute_viewport(&routes, &ViewportConfig::default()) {
//!     ClusterResult::Fit { bounds } => println!("fit {:?}", bounds),
//!     ClusterResult::Center { center, zoom } => println!("center {:?} @ {}", center, zoom),
//!     ClusterResult::NoViewport => println!("nothing to show"),
//! }
//! ```

pub mod geo_utils;

pub mod polyline;
pub use polyline::{decode_polyline, decode_route, decode_routes, encode_polyline, EncodedRoute, PolylineError};

pub mod cluster;
pub use cluster::{
    analyze_routes, classify_scores, compute_viewport, ClusterAnalysis, ClusterResult, RouteDecision,
    ScoreClassification, ViewportConfig,
};

pub mod segment_map;
pub use segment_map::{MapEvent, MapSettings, MapWidget, SegmentMap, SegmentRow, SegmentStyle};

#[cfg(feature = "ffi")]
pub mod ffi;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("SegmentViewportRust"),
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use segment_viewport::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box over a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from GPS points.
    pub fn from_points(points: &[GpsPoint]) -> Option<Self> {
        geo_utils::compute_bounds(points)
    }

    /// South-west corner.
    pub fn southwest(&self) -> GpsPoint {
        GpsPoint::new(self.min_lat, self.min_lng)
    }

    /// North-east corner.
    pub fn northeast(&self) -> GpsPoint {
        GpsPoint::new(self.max_lat, self.max_lng)
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// True if the point lies inside (or on the edge of) the bounds.
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
            && point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
    }
}

/// A decoded route: one or more sub-paths attributed to a single caller id.
///
/// The id is opaque and only used to map clustering decisions back to the
/// caller's rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Caller identifier (e.g. segment id)
    pub id: String,
    /// Sub-paths; a single-part route has exactly one
    pub parts: Vec<Vec<GpsPoint>>,
}

impl Route {
    /// Create a single-part route.
    pub fn new(id: impl Into<String>, points: Vec<GpsPoint>) -> Self {
        Self {
            id: id.into(),
            parts: vec![points],
        }
    }

    /// Create a route from several disjoint sub-paths.
    pub fn multi_part(id: impl Into<String>, parts: Vec<Vec<GpsPoint>>) -> Self {
        Self { id: id.into(), parts }
    }

    /// All valid points across every sub-path, in order.
    ///
    /// Invalid coordinates (non-finite or out of range) are dropped.
    pub fn flattened_points(&self) -> Vec<GpsPoint> {
        self.parts
            .iter()
            .flatten()
            .filter(|p| p.is_valid())
            .copied()
            .collect()
    }

    /// True if the route contributes no valid points.
    pub fn is_empty(&self) -> bool {
        !self.parts.iter().flatten().any(|p| p.is_valid())
    }
}

// ============================================================================
// Tests
// ============================================================================
