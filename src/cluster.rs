//! # Route Centroid Clustering
//!
//! Picks the viewport for a set of routes while ignoring outliers, e.g. one
//! segment ridden on holiday hundreds of kilometres from all the others.
//!
//! ## Algorithm
//! 1. Flatten every route (all sub-paths) into one point list per route
//! 2. Centroid = mean of every point of every route (equal per-point weight)
//! 3. Score each route by its closest approach to the centroid (haversine)
//! 4. Threshold = median score * `outlier_factor`
//! 5. Routes scoring at or below the threshold are inliers; the viewport is
//!    the bounding box of their points
//! 6. If no route qualifies, fall back to the centroid at a fixed zoom
//!
//! A route that only passes near the centroid still counts as close even if
//! most of it is far away.

use log::{debug, info};

use crate::geo_utils::{compute_bounds, compute_bounds_iter, compute_center_iter, median, min_distance_to};
use crate::{Bounds, GpsPoint, Route};

/// Configuration for viewport selection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ViewportConfig {
    /// Multiplier applied to the median route score to get the inlier threshold.
    /// Default: 2.0
    pub outlier_factor: f64,

    /// Maximum zoom when fitting the map to a bounding box.
    /// Default: 14 (avoids over-zooming on tightly clustered segments)
    pub fit_max_zoom: u8,

    /// Zoom used when falling back to the centroid.
    /// Default: 13
    pub fallback_zoom: u8,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            outlier_factor: 2.0,
            fit_max_zoom: 14,
            fallback_zoom: 13,
        }
    }
}

/// The viewport chosen for a set of routes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusterResult {
    /// Nothing to show; the caller should leave the map untouched.
    NoViewport,
    /// Fit the map to these bounds (capped at `fit_max_zoom`).
    Fit { bounds: Bounds },
    /// Center the map on a point at a fixed zoom.
    Center { center: GpsPoint, zoom: u8 },
}

impl ClusterResult {
    /// True if there is nothing to fit.
    pub fn is_no_viewport(&self) -> bool {
        matches!(self, ClusterResult::NoViewport)
    }

    /// The bounds to fit, if the result is a bounding box.
    pub fn bounds(&self) -> Option<&Bounds> {
        match self {
            ClusterResult::Fit { bounds } => Some(bounds),
            _ => None,
        }
    }
}

/// Clustering decision for a single route.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteDecision {
    /// Caller identifier of the route
    pub id: String,
    /// Closest approach to the centroid in meters; `None` for routes without points
    pub score: Option<f64>,
    /// Whether the route is part of the main cluster
    pub inlier: bool,
}

/// Intermediate values of a clustering run, for callers that want to
/// highlight outliers rather than just fit the map.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusterAnalysis {
    /// Mean of every point across every route
    pub centroid: GpsPoint,
    /// One decision per input route, in input order
    pub decisions: Vec<RouteDecision>,
    /// Median route score in meters
    pub median: f64,
    /// Inlier threshold in meters
    pub threshold: f64,
}

impl ClusterAnalysis {
    /// Ids of routes in the main cluster.
    pub fn inlier_ids(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| d.inlier)
            .map(|d| d.id.as_str())
            .collect()
    }

    /// Ids of routes left out of the viewport (including routes without points).
    pub fn outlier_ids(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| !d.inlier)
            .map(|d| d.id.as_str())
            .collect()
    }
}

/// Median and threshold over a list of route scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreClassification {
    pub median: f64,
    pub threshold: f64,
    /// `inliers[i]` is true iff `scores[i] <= threshold`
    pub inliers: Vec<bool>,
}

/// Classify route scores against `median * factor`.
///
/// Returns `None` for an empty score list.
///
/// ```
/// use segment_viewport::classify_scores;
///
/// let c = classify_scores(&[100.0, 120.0, 150.0, 90_000.0], 2.0).unwrap();
/// assert_eq!(c.median, 135.0);
/// assert_eq!(c.inliers, vec![true, true, true, false]);
/// ```
pub fn classify_scores(scores: &[f64], factor: f64) -> Option<ScoreClassification> {
    let median = median(scores)?;
    let threshold = median * factor;
    let inliers = scores.iter().map(|&s| s <= threshold).collect();
    Some(ScoreClassification { median, threshold, inliers })
}

#[cfg(feature = "parallel")]
fn route_scores(flattened: &[Vec<GpsPoint>], centroid: &GpsPoint) -> Vec<Option<f64>> {
    use rayon::prelude::*;

    flattened
        .par_iter()
        .map(|points| min_distance_to(points, centroid))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn route_scores(flattened: &[Vec<GpsPoint>], centroid: &GpsPoint) -> Vec<Option<f64>> {
    flattened
        .iter()
        .map(|points| min_distance_to(points, centroid))
        .collect()
}

fn analyze_flattened(
    routes: &[Route],
    flattened: &[Vec<GpsPoint>],
    config: &ViewportConfig,
) -> Option<ClusterAnalysis> {
    let centroid = compute_center_iter(flattened.iter().flatten())?;
    let scores = route_scores(flattened, &centroid);

    // Routes without points have no score and cannot be inliers.
    let scored: Vec<f64> = scores.iter().flatten().copied().collect();
    let classification = classify_scores(&scored, config.outlier_factor)?;

    let mut verdicts = classification.inliers.iter();
    let decisions = routes
        .iter()
        .zip(&scores)
        .map(|(route, score)| RouteDecision {
            id: route.id.clone(),
            score: *score,
            inlier: score.is_some() && verdicts.next().copied().unwrap_or(false),
        })
        .collect();

    Some(ClusterAnalysis {
        centroid,
        decisions,
        median: classification.median,
        threshold: classification.threshold,
    })
}

/// Run the outlier analysis on a set of routes.
///
/// Returns `None` when the routes contain no points at all. Unlike
/// [`compute_viewport`], a single route is analyzed too (it is always its own
/// inlier).
pub fn analyze_routes(routes: &[Route], config: &ViewportConfig) -> Option<ClusterAnalysis> {
    let flattened: Vec<Vec<GpsPoint>> = routes.iter().map(Route::flattened_points).collect();
    analyze_flattened(routes, &flattened, config)
}

/// Compute the viewport for a set of routes.
///
/// - no routes, or no points at all: [`ClusterResult::NoViewport`]
/// - one route: its bounding box
/// - several routes: bounding box of the inlier routes, or the centroid at
///   `fallback_zoom` when no route is an inlier
///
/// # Example
/// ```
/// use segment_viewport::{compute_viewport, ClusterResult, GpsPoint, Route, ViewportConfig};
///
/// let routes = vec![Route::new("a", vec![GpsPoint::new(50.0, 4.0), GpsPoint::new(50.1, 4.2)])];
/// let result = compute_viewport(&routes, &ViewportConfig::default());
/// let bounds = result.bounds().unwrap();
/// assert_eq!(bounds.min_lat, 50.0);
/// assert_eq!(bounds.max_lng, 4.2);
/// ```
pub fn compute_viewport(routes: &[Route], config: &ViewportConfig) -> ClusterResult {
    match routes {
        [] => {
            debug!("[SegmentViewport] No routes, no viewport");
            ClusterResult::NoViewport
        }
        [route] => match compute_bounds(&route.flattened_points()) {
            Some(bounds) => ClusterResult::Fit { bounds },
            None => ClusterResult::NoViewport,
        },
        _ => {
            let flattened: Vec<Vec<GpsPoint>> = routes.iter().map(Route::flattened_points).collect();

            let Some(analysis) = analyze_flattened(routes, &flattened, config) else {
                debug!("[SegmentViewport] {} routes without points, no viewport", routes.len());
                return ClusterResult::NoViewport;
            };

            let inlier_points = analysis
                .decisions
                .iter()
                .zip(&flattened)
                .filter(|(decision, _)| decision.inlier)
                .flat_map(|(_, points)| points);

            match compute_bounds_iter(inlier_points) {
                Some(bounds) => {
                    info!(
                        "[SegmentViewport] {} of {} routes in main cluster (median {:.0}m, threshold {:.0}m)",
                        analysis.inlier_ids().len(),
                        routes.len(),
                        analysis.median,
                        analysis.threshold
                    );
                    ClusterResult::Fit { bounds }
                }
                None => {
                    info!(
                        "[SegmentViewport] No route within {:.0}m, centering on centroid",
                        analysis.threshold
                    );
                    ClusterResult::Center {
                        center: analysis.centroid,
                        zoom: config.fallback_zoom,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn cluster(id: &str, lat: f64, lng: f64) -> Route {
        Route::new(
            id,
            vec![
                GpsPoint::new(lat, lng),
                GpsPoint::new(lat + 0.01, lng + 0.01),
                GpsPoint::new(lat + 0.02, lng),
            ],
        )
    }

    #[test]
    fn test_empty_routes_no_viewport() {
        assert_eq!(compute_viewport(&[], &ViewportConfig::default()), ClusterResult::NoViewport);
    }

    #[test]
    fn test_single_route_exact_bounds() {
        let route = Route::new(
            "only",
            vec![GpsPoint::new(50.0, 4.5), GpsPoint::new(50.3, 4.1), GpsPoint::new(49.9, 4.2)],
        );
        let result = compute_viewport(&[route], &ViewportConfig::default());
        assert_eq!(
            result,
            ClusterResult::Fit {
                bounds: Bounds { min_lat: 49.9, max_lat: 50.3, min_lng: 4.1, max_lng: 4.5 }
            }
        );
    }

    #[test]
    fn test_single_empty_route_no_viewport() {
        let route = Route::new("empty", vec![]);
        assert!(compute_viewport(&[route], &ViewportConfig::default()).is_no_viewport());
    }

    #[test]
    fn test_all_routes_empty_no_viewport() {
        let routes = vec![Route::new("a", vec![]), Route::new("b", vec![])];
        assert!(compute_viewport(&routes, &ViewportConfig::default()).is_no_viewport());
        assert!(analyze_routes(&routes, &ViewportConfig::default()).is_none());
    }

    #[test]
    fn test_far_route_excluded() {
        let routes = vec![
            cluster("a", 50.0, 4.0),
            cluster("a2", 50.1, 4.1),
            cluster("b", 51.0, 5.0),
            cluster("b2", 50.9, 4.9),
            cluster("c", 10.0, 10.0),
        ];
        let result = compute_viewport(&routes, &ViewportConfig::default());
        let bounds = result.bounds().unwrap();
        assert_eq!(bounds.min_lat, 50.0);
        assert!(approx_eq(bounds.max_lat, 51.02, 1e-9));
        assert_eq!(bounds.min_lng, 4.0);
        assert!(approx_eq(bounds.max_lng, 5.01, 1e-9));

        let analysis = analyze_routes(&routes, &ViewportConfig::default()).unwrap();
        assert_eq!(analysis.outlier_ids(), vec!["c"]);
    }

    #[test]
    fn test_centroid_is_per_point_mean() {
        let routes = vec![
            Route::new("a", vec![GpsPoint::new(0.0, 0.0)]),
            Route::new("b", vec![GpsPoint::new(10.0, 0.0); 3]),
        ];
        let analysis = analyze_routes(&routes, &ViewportConfig::default()).unwrap();
        assert!(approx_eq(analysis.centroid.latitude, 7.5, 1e-9));
        assert!(approx_eq(analysis.centroid.longitude, 0.0, 1e-9));
    }

    #[test]
    fn test_closest_approach_score() {
        // Long route whose far end is 1000km away but passes through the centroid.
        let routes = vec![
            Route::new("long", vec![GpsPoint::new(0.0, 0.0), GpsPoint::new(0.0, 9.0)]),
            Route::new("near", vec![GpsPoint::new(0.0, 1.0)]),
            Route::new("near2", vec![GpsPoint::new(0.0, 2.0)]),
        ];
        let analysis = analyze_routes(&routes, &ViewportConfig::default()).unwrap();
        // centroid lng = (0 + 9 + 1 + 2) / 4 = 3
        assert!(approx_eq(analysis.centroid.longitude, 3.0, 1e-9));
        let long = &analysis.decisions[0];
        assert!(long.inlier);
        assert!(approx_eq(long.score.unwrap(), 3.0 * 111_195.0, 3.0 * 1_112.0));
    }

    #[test]
    fn test_median_classification() {
        let even = classify_scores(&[1.0, 2.0, 3.0, 4.0], 2.0).unwrap();
        assert_eq!(even.median, 2.5);
        assert_eq!(even.threshold, 5.0);
        assert_eq!(even.inliers, vec![true; 4]);

        let odd = classify_scores(&[3.0, 1.0, 2.0], 2.0).unwrap();
        assert_eq!(odd.median, 2.0);
        assert!(classify_scores(&[], 2.0).is_none());
    }

    #[test]
    fn test_minimum_score_always_inlier() {
        let c = classify_scores(&[0.0, 500.0, 800.0, 1_000_000.0], 2.0).unwrap();
        assert!(c.inliers[0]);
        assert!(!c.inliers[3]);
    }

    #[test]
    fn test_poisoned_scores_have_no_inliers() {
        let c = classify_scores(&[f64::NAN, f64::NAN, f64::NAN], 2.0).unwrap();
        assert!(c.inliers.iter().all(|inlier| !inlier));
    }

    #[test]
    fn test_no_inliers_falls_back_to_centroid() {
        let config = ViewportConfig { outlier_factor: 0.0, ..ViewportConfig::default() };
        let routes = vec![
            Route::new("west", vec![GpsPoint::new(0.0, 0.0)]),
            Route::new("east", vec![GpsPoint::new(0.0, 2.0)]),
        ];
        match compute_viewport(&routes, &config) {
            ClusterResult::Center { center, zoom } => {
                assert!(approx_eq(center.latitude, 0.0, 1e-9));
                assert!(approx_eq(center.longitude, 1.0, 1e-9));
                assert_eq!(zoom, 13);
            }
            other => panic!("expected fallback center, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_route_among_others_is_outlier() {
        let routes = vec![
            cluster("a", 50.0, 4.0),
            Route::new("empty", vec![]),
            cluster("b", 50.05, 4.05),
        ];
        let analysis = analyze_routes(&routes, &ViewportConfig::default()).unwrap();
        assert_eq!(analysis.decisions[1].score, None);
        assert!(!analysis.decisions[1].inlier);
        assert_eq!(analysis.inlier_ids(), vec!["a", "b"]);

        let bounds = *compute_viewport(&routes, &ViewportConfig::default()).bounds().unwrap();
        assert_eq!(bounds.min_lat, 50.0);
        assert!(approx_eq(bounds.max_lat, 50.07, 1e-9));
    }

    #[test]
    fn test_multi_part_route_flattened() {
        let routes = vec![
            Route::multi_part(
                "split",
                vec![vec![GpsPoint::new(50.0, 4.0)], vec![GpsPoint::new(50.2, 4.2)]],
            ),
            cluster("b", 50.1, 4.1),
        ];
        let bounds = *compute_viewport(&routes, &ViewportConfig::default()).bounds().unwrap();
        assert_eq!(bounds.min_lat, 50.0);
        assert_eq!(bounds.max_lat, 50.2);
        assert_eq!(bounds.max_lng, 4.2);
    }

    #[test]
    fn test_compute_viewport_is_idempotent() {
        let routes = vec![cluster("a", 50.0, 4.0), cluster("b", 51.0, 5.0), cluster("c", 10.0, 10.0)];
        let config = ViewportConfig::default();
        assert_eq!(compute_viewport(&routes, &config), compute_viewport(&routes, &config));
    }
}
