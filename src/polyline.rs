//! Encoded polyline codec.
//!
//! Segment rows store their geometry in the Google encoded-polyline format
//! (precision 5). Each coordinate is stored as a zig-zag encoded delta from
//! the previous one, split into 5-bit chunks offset by 63 so the result is
//! printable ASCII.

use log::debug;
use thiserror::Error;

use crate::{GpsPoint, Route};

const PRECISION: f64 = 1e5;
const CHUNK_BITS: u32 = 5;
const CHUNK_MASK: i64 = 0x1f;
const CONTINUATION: i64 = 0x20;
const ASCII_OFFSET: u8 = 63;
// Values are 32-bit before zig-zag; seven chunks carry 35 bits.
const MAX_SHIFT: u32 = 30;

/// Errors produced while decoding an encoded polyline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid character {character:?} at position {position}")]
    InvalidCharacter { position: usize, character: char },

    #[error("polyline truncated at position {position}")]
    Truncated { position: usize },

    #[error("coordinate value overflows at position {position}")]
    Overflow { position: usize },
}

/// An encoded route as it arrives from the segment list: an id plus one
/// encoded string per sub-path.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodedRoute {
    pub id: String,
    pub parts: Vec<String>,
}

impl EncodedRoute {
    /// A single-part encoded route.
    pub fn new(id: impl Into<String>, encoded: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parts: vec![encoded.into()],
        }
    }

    /// Decode every part into a [`Route`].
    pub fn decode(&self) -> Result<Route, PolylineError> {
        let parts = self
            .parts
            .iter()
            .map(|p| decode_polyline(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Route::multi_part(self.id.clone(), parts))
    }
}

fn next_value(encoded: &str, index: &mut usize) -> Result<i64, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let position = *index;
        let byte = *bytes.get(position).ok_or(PolylineError::Truncated { position })?;
        if !(ASCII_OFFSET..=b'~').contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                position,
                character: encoded.get(position..).and_then(|rest| rest.chars().next()).unwrap_or(byte as char),
            });
        }
        if shift > MAX_SHIFT {
            return Err(PolylineError::Overflow { position });
        }

        let chunk = i64::from(byte - ASCII_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += CHUNK_BITS;
        *index += 1;

        if chunk < CONTINUATION {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}

/// Decode an encoded polyline into GPS points.
///
/// An empty string decodes to an empty point list.
///
/// # Example
/// ```
/// use segment_viewport::polyline::decode_polyline;
///
/// let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
/// assert_eq!(points.len(), 3);
/// assert!((points[0].latitude - 38.5).abs() < 1e-9);
/// assert!((points[2].longitude - (-126.453)).abs() < 1e-9);
/// ```
pub fn decode_polyline(encoded: &str) -> Result<Vec<GpsPoint>, PolylineError> {
    let len = encoded.len();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut points = Vec::with_capacity(len / 4);

    while index < len {
        lat += next_value(encoded, &mut index)?;
        lng += next_value(encoded, &mut index)?;
        points.push(GpsPoint::new(lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(points)
}

fn push_value(out: &mut String, value: i64) {
    let mut v = value << 1;
    if value < 0 {
        v = !v;
    }
    while v >= CONTINUATION {
        out.push(char::from((CONTINUATION | (v & CHUNK_MASK)) as u8 + ASCII_OFFSET));
        v >>= CHUNK_BITS;
    }
    out.push(char::from(v as u8 + ASCII_OFFSET));
}

/// Encode GPS points as a polyline string (precision 5).
pub fn encode_polyline(points: &[GpsPoint]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for p in points {
        let lat = (p.latitude * PRECISION).round() as i64;
        let lng = (p.longitude * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

/// Decode a multi-part route from its encoded sub-paths.
pub fn decode_route(id: &str, parts: &[&str]) -> Result<Route, PolylineError> {
    let decoded = parts
        .iter()
        .map(|p| decode_polyline(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Route::multi_part(id, decoded))
}

/// Decode many encoded routes. Output order matches input order.
#[cfg(feature = "parallel")]
pub fn decode_routes(routes: &[EncodedRoute]) -> Vec<Result<Route, PolylineError>> {
    use rayon::prelude::*;

    debug!("[SegmentViewport] Decoding {} routes in parallel", routes.len());
    routes.par_iter().map(EncodedRoute::decode).collect()
}

/// Decode many encoded routes. Output order matches input order.
#[cfg(not(feature = "parallel"))]
pub fn decode_routes(routes: &[EncodedRoute]) -> Vec<Result<Route, PolylineError>> {
    debug!("[SegmentViewport] Decoding {} routes", routes.len());
    routes.iter().map(EncodedRoute::decode).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_reference_polyline() {
        let points = decode_polyline(REFERENCE).unwrap();
        let expected = [(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
        assert_eq!(points.len(), expected.len());
        for (p, (lat, lng)) in points.iter().zip(expected) {
            assert!(approx_eq(p.latitude, lat));
            assert!(approx_eq(p.longitude, lng));
        }
    }

    #[test]
    fn test_encode_reference_polyline() {
        let points = vec![
            GpsPoint::new(38.5, -120.2),
            GpsPoint::new(40.7, -120.95),
            GpsPoint::new(43.252, -126.453),
        ];
        assert_eq!(encode_polyline(&points), REFERENCE);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode_polyline("").unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid_character() {
        let err = decode_polyline("_p~i F").unwrap_err();
        assert_eq!(err, PolylineError::InvalidCharacter { position: 4, character: ' ' });
    }

    #[test]
    fn test_decode_reports_non_ascii_character() {
        let err = decode_polyline("_p~é").unwrap_err();
        assert_eq!(err, PolylineError::InvalidCharacter { position: 3, character: 'é' });
        assert!(err.to_string().contains("'é'"));
    }

    #[test]
    fn test_decode_truncated_inside_value() {
        // '_' has the continuation bit set, so the value never ends.
        let err = decode_polyline("_").unwrap_err();
        assert_eq!(err, PolylineError::Truncated { position: 1 });
    }

    #[test]
    fn test_decode_missing_longitude() {
        // "_p~iF" is a complete latitude with no longitude after it.
        let err = decode_polyline("_p~iF").unwrap_err();
        assert_eq!(err, PolylineError::Truncated { position: 5 });
    }

    #[test]
    fn test_decode_overflow() {
        let err = decode_polyline("~~~~~~~~?").unwrap_err();
        assert!(matches!(err, PolylineError::Overflow { .. }));
    }

    #[test]
    fn test_decode_route_multi_part() {
        let route = decode_route("seg-1", &[REFERENCE, "_p~iF~ps|U"]).unwrap();
        assert_eq!(route.id, "seg-1");
        assert_eq!(route.parts.len(), 2);
        assert_eq!(route.flattened_points().len(), 4);
    }

    #[test]
    fn test_decode_routes_keeps_order_and_errors() {
        let routes = vec![
            EncodedRoute::new("a", REFERENCE),
            EncodedRoute::new("b", "_"),
            EncodedRoute::new("c", "_p~iF~ps|U"),
        ];
        let decoded = decode_routes(&routes);
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].as_ref().unwrap().id, "a");
        assert!(decoded[1].is_err());
        assert_eq!(decoded[2].as_ref().unwrap().id, "c");
    }
}
