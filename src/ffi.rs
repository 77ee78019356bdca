//! FFI bindings for mobile platforms (iOS/Android).
//!
//! UniFFI exports of the viewport core. All FFI functions are prefixed with
//! `ffi_` to avoid naming conflicts with the internal API.

use log::{info, warn};

use crate::{
    analyze_routes, compute_viewport, decode_polyline, init_logging, ClusterAnalysis, ClusterResult, GpsPoint, Route,
    ViewportConfig,
};

/// Compute the viewport for a set of decoded routes.
#[uniffi::export]
pub fn ffi_compute_viewport(routes: Vec<Route>, config: ViewportConfig) -> ClusterResult {
    init_logging();
    info!("[SegmentViewport] compute_viewport called with {} routes", routes.len());

    let start = std::time::Instant::now();
    let result = compute_viewport(&routes, &config);
    info!("[SegmentViewport] Viewport {:?} in {:?}", result, start.elapsed());

    result
}

/// Run the outlier analysis, for hosts that highlight excluded segments.
#[uniffi::export]
pub fn ffi_analyze_routes(routes: Vec<Route>, config: ViewportConfig) -> Option<ClusterAnalysis> {
    init_logging();
    analyze_routes(&routes, &config)
}

/// Decode an encoded polyline. Returns `None` if the string is malformed.
#[uniffi::export]
pub fn ffi_decode_polyline(encoded: String) -> Option<Vec<GpsPoint>> {
    init_logging();
    match decode_polyline(&encoded) {
        Ok(points) => Some(points),
        Err(e) => {
            warn!("[SegmentViewport] Failed to decode polyline: {}", e);
            None
        }
    }
}

/// Get default configuration.
#[uniffi::export]
pub fn ffi_default_viewport_config() -> ViewportConfig {
    init_logging();
    ViewportConfig::default()
}
