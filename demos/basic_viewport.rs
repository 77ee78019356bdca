//! Centering a map over a segment list with one far-away segment.
//!
//! Run with: cargo run --example basic_viewport

use segment_viewport::{
    analyze_routes, encode_polyline, Bounds, GpsPoint, MapSettings, MapWidget, SegmentMap, SegmentRow,
    SegmentStyle, ViewportConfig,
};

/// Prints what a real map widget would be asked to do.
struct ConsoleWidget;

impl MapWidget for ConsoleWidget {
    fn configure(&mut self, settings: &MapSettings) {
        println!("map: tiles={} zoom {}..{}", settings.tile_layer, settings.min_zoom, settings.max_zoom);
    }

    fn clear_routes(&mut self) {
        println!("map: clear");
    }

    fn add_route(&mut self, segment_id: &str, parts: &[Vec<GpsPoint>], style: &SegmentStyle) {
        let points: usize = parts.iter().map(Vec::len).sum();
        println!("map: draw {} ({} points, {} w{})", segment_id, points, style.color, style.weight);
    }

    fn fit_bounds(&mut self, bounds: &Bounds, max_zoom: u8) {
        println!(
            "map: fit [{:.4}, {:.4}] - [{:.4}, {:.4}] (max zoom {})",
            bounds.min_lat, bounds.min_lng, bounds.max_lat, bounds.max_lng, max_zoom
        );
    }

    fn set_view(&mut self, center: &GpsPoint, zoom: u8) {
        println!("map: center {:.4}, {:.4} @ {}", center.latitude, center.longitude, zoom);
    }
}

fn segment(id: &str, start: (f64, f64), favorite: bool, kom: bool) -> SegmentRow {
    let points: Vec<GpsPoint> = (0..8)
        .map(|i| GpsPoint::new(start.0 + i as f64 * 0.002, start.1 + i as f64 * 0.001))
        .collect();
    SegmentRow {
        segment_id: id.to_string(),
        polyline: Some(encode_polyline(&points)),
        favorite,
        kom,
    }
}

fn main() {
    // Ghent area, plus one segment ridden on holiday in the Alps
    let rows = vec![
        segment("kapelmuur", (51.05, 3.72), true, false),
        segment("koppenberg", (51.07, 3.70), false, true),
        segment("oude-kwaremont", (51.03, 3.75), false, false),
        segment("alpe-dhuez", (45.05, 6.05), false, false),
    ];

    let mut map = SegmentMap::new(ConsoleWidget, &MapSettings::default());
    let result = map.render(&rows);
    println!("\nresult: {:?}\n", result);

    let routes: Vec<_> = rows
        .iter()
        .filter_map(|r| {
            let encoded = segment_viewport::EncodedRoute::new(r.segment_id.clone(), r.polyline.clone()?);
            encoded.decode().ok()
        })
        .collect();

    if let Some(analysis) = analyze_routes(&routes, &ViewportConfig::default()) {
        println!("median {:.0}m, threshold {:.0}m", analysis.median, analysis.threshold);
        for decision in &analysis.decisions {
            println!(
                "  {:<16} {:>10.0}m  {}",
                decision.id,
                decision.score.unwrap_or(f64::NAN),
                if decision.inlier { "in" } else { "OUT" }
            );
        }
    }
}
