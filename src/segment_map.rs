//! Segment list map adapter.
//!
//! Keeps a map widget in sync with the segments currently visible in a list
//! view. The widget itself (tiles, layers, zoom) lives behind [`MapWidget`];
//! this module only decides what to draw and where to point the camera.
//!
//! The host calls [`SegmentMap::handle_event`] whenever the visible rows may
//! have changed (page load, list re-render, segment modal opened).

use log::{debug, info, warn};

use crate::cluster::{compute_viewport, ClusterResult, ViewportConfig};
use crate::polyline::{decode_routes, EncodedRoute};
use crate::{Bounds, GpsPoint, Route};

const FAVORITE_COLOR: &str = "#FFD700";
const KOM_COLOR: &str = "#fc6719";
const DEFAULT_COLOR: &str = "#3388ff";
const SEGMENT_MODAL_PREFIX: &str = "segment/segment";

/// Line style for a drawn segment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentStyle {
    pub color: String,
    pub weight: u8,
    pub opacity: f64,
}

impl SegmentStyle {
    /// Favorites win over KOMs; everything else gets the default blue.
    pub fn for_segment(favorite: bool, kom: bool) -> Self {
        let (color, weight) = if favorite {
            (FAVORITE_COLOR, 5)
        } else if kom {
            (KOM_COLOR, 4)
        } else {
            (DEFAULT_COLOR, 2)
        };
        Self {
            color: color.to_string(),
            weight,
            opacity: 0.9,
        }
    }
}

/// One visible row of the segment list.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentRow {
    pub segment_id: String,
    /// Encoded polyline; rows without one (or with an empty one) are not drawn
    pub polyline: Option<String>,
    pub favorite: bool,
    pub kom: bool,
}

impl SegmentRow {
    pub fn new(segment_id: impl Into<String>, polyline: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
            polyline: Some(polyline.into()),
            favorite: false,
            kom: false,
        }
    }

    pub fn style(&self) -> SegmentStyle {
        SegmentStyle::for_segment(self.favorite, self.kom)
    }
}

/// Static map settings, applied once when the adapter is built.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MapSettings {
    /// Tile URL template.
    /// Default: OpenStreetMap
    pub tile_layer: String,
    /// Default: 10
    pub min_zoom: u8,
    /// Default: 18
    pub max_zoom: u8,
    /// Default: false (the map sits inside a scrolling page)
    pub scroll_wheel_zoom: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            tile_layer: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            min_zoom: 10,
            max_zoom: 18,
            scroll_wheel_zoom: false,
        }
    }
}

/// Events after which the visible segment set may have changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapEvent {
    PageLoaded,
    /// The virtualized list swapped the rows it renders.
    ClusterChanged,
    /// A modal was opened; only segment modals carry a map.
    ModalLoaded { modal_id: String },
}

impl MapEvent {
    fn triggers_render(&self) -> bool {
        match self {
            MapEvent::PageLoaded | MapEvent::ClusterChanged => true,
            MapEvent::ModalLoaded { modal_id } => modal_id.contains(SEGMENT_MODAL_PREFIX),
        }
    }
}

/// The map widget the adapter drives.
pub trait MapWidget {
    /// Called once, before anything is drawn.
    fn configure(&mut self, settings: &MapSettings);

    /// Remove every segment layer drawn so far.
    fn clear_routes(&mut self);

    /// Draw one segment.
    fn add_route(&mut self, segment_id: &str, parts: &[Vec<GpsPoint>], style: &SegmentStyle);

    /// Fit the view to `bounds`, never zooming in past `max_zoom`.
    fn fit_bounds(&mut self, bounds: &Bounds, max_zoom: u8);

    fn set_view(&mut self, center: &GpsPoint, zoom: u8);
}

/// Adapter between the segment list and a map widget.
pub struct SegmentMap<W: MapWidget> {
    widget: W,
    config: ViewportConfig,
    /// Segment id per drawn layer, in draw order
    drawn: Vec<String>,
}

impl<W: MapWidget> SegmentMap<W> {
    pub fn new(widget: W, settings: &MapSettings) -> Self {
        Self::with_config(widget, settings, ViewportConfig::default())
    }

    pub fn with_config(mut widget: W, settings: &MapSettings, config: ViewportConfig) -> Self {
        widget.configure(settings);
        Self {
            widget,
            config,
            drawn: Vec::new(),
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn into_widget(self) -> W {
        self.widget
    }

    /// Segment id of the `index`-th drawn layer (for click-to-highlight).
    pub fn segment_for_route(&self, index: usize) -> Option<&str> {
        self.drawn.get(index).map(String::as_str)
    }

    /// Number of segments drawn by the last render.
    pub fn drawn_count(&self) -> usize {
        self.drawn.len()
    }

    /// Re-render if `event` concerns the segment map.
    ///
    /// Returns `None` when the event was ignored.
    pub fn handle_event(&mut self, event: &MapEvent, rows: &[SegmentRow]) -> Option<ClusterResult> {
        if !event.triggers_render() {
            debug!("[SegmentViewport] Ignoring {:?}", event);
            return None;
        }
        info!("[SegmentViewport] {:?} event, {} visible rows", event, rows.len());
        Some(self.render(rows))
    }

    /// Redraw `rows` and move the camera to the main cluster.
    pub fn render(&mut self, rows: &[SegmentRow]) -> ClusterResult {
        self.widget.clear_routes();
        self.drawn.clear();

        let visible: Vec<(&SegmentRow, EncodedRoute)> = rows
            .iter()
            .filter_map(|row| {
                let polyline = row.polyline.as_deref().filter(|p| !p.is_empty())?;
                Some((row, EncodedRoute::new(row.segment_id.clone(), polyline)))
            })
            .collect();

        let encoded: Vec<EncodedRoute> = visible.iter().map(|(_, e)| e.clone()).collect();
        let mut routes: Vec<Route> = Vec::with_capacity(encoded.len());

        for ((row, _), decoded) in visible.iter().zip(decode_routes(&encoded)) {
            match decoded {
                Ok(route) => {
                    self.widget.add_route(&row.segment_id, &route.parts, &row.style());
                    self.drawn.push(row.segment_id.clone());
                    routes.push(route);
                }
                Err(e) => warn!("[SegmentViewport] Skipping segment {}: {}", row.segment_id, e),
            }
        }

        let result = compute_viewport(&routes, &self.config);
        match &result {
            ClusterResult::Fit { bounds } => self.widget.fit_bounds(bounds, self.config.fit_max_zoom),
            ClusterResult::Center { center, zoom } => self.widget.set_view(center, *zoom),
            ClusterResult::NoViewport => debug!("[SegmentViewport] Nothing to fit, keeping current view"),
        }
        result
    }
}
