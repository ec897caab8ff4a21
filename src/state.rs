//! Per-parse state machine for GPX ingestion.
//!
//! [`DocumentBuilder`] consumes element-start, text and element-end events in
//! document order and accumulates waypoints and tracks. It knows nothing about
//! XML syntax, so it can be driven by synthetic events as well as by the
//! quick-xml driver in [`crate::parser`].
//!
//! Text under `<name>` is routed to the open track when a `<trk>` is open and
//! to the current waypoint otherwise. This is a scope flag, not an ancestor
//! path: a `<name>` nested in any other element inside a `<trk>` is attributed
//! to the track as well.

use log::debug;

use crate::model::{GeoPoint, ParsedDocument, Track, Waypoint};
use crate::options::ParseOptions;

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    accept_desc: bool,
    drop_out_of_range: bool,
    document: ParsedDocument,

    current_element: Option<String>,
    // Raw fragments of the text node currently being read; trimmed once on flush.
    text: String,

    waypoint_name: Option<String>,
    waypoint_description: Option<String>,

    track_open: bool,
    track_name: Option<String>,
    track_coordinates: Vec<GeoPoint>,

    pending: Option<GeoPoint>,

    dropped_points: usize,
}

impl DocumentBuilder {
    pub fn new(options: &ParseOptions) -> Self {
        Self {
            accept_desc: options.accept_desc,
            drop_out_of_range: options.drop_out_of_range,
            ..Default::default()
        }
    }

    /// An element opened. `attributes` are `(local name, value)` pairs.
    pub fn on_start(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.flush_text();
        self.current_element = Some(name.to_string());

        match name {
            "wpt" => {
                self.waypoint_name = None;
                self.waypoint_description = None;
                self.pending = self.point_from_attributes(name, attributes);
            }
            "trk" => {
                self.track_open = true;
                self.track_name = None;
                self.track_coordinates.clear();
            }
            "trkpt" => {
                self.pending = self.point_from_attributes(name, attributes);
            }
            _ => {}
        }
    }

    /// Character data for the innermost open element. May be called several
    /// times for one text node; fragments are joined in arrival order.
    pub fn on_text(&mut self, text: &str) {
        if self.routes_text() {
            self.text.push_str(text);
        }
    }

    /// An element closed.
    pub fn on_end(&mut self, name: &str) {
        self.flush_text();

        match name {
            "wpt" => match self.pending.take() {
                Some(coordinate) => self.document.waypoints.push(Waypoint {
                    coordinate,
                    name: self.waypoint_name.take(),
                    description: self.waypoint_description.take(),
                }),
                None => {
                    self.dropped_points += 1;
                    self.waypoint_name = None;
                    self.waypoint_description = None;
                }
            },
            "trkpt" => match self.pending.take() {
                Some(point) => self.track_coordinates.push(point),
                None => self.dropped_points += 1,
            },
            "trk" => {
                self.track_open = false;
                self.document.tracks.push(Track {
                    coordinates: std::mem::take(&mut self.track_coordinates),
                    name: self.track_name.take(),
                });
            }
            _ => {}
        }

        self.current_element = None;
    }

    /// Number of `wpt`/`trkpt` elements discarded so far for lack of usable coordinates.
    pub fn dropped_points(&self) -> usize {
        self.dropped_points
    }

    pub fn finish(self) -> ParsedDocument {
        self.document
    }

    fn routes_text(&self) -> bool {
        matches!(
            self.current_element.as_deref(),
            Some("name") | Some("description")
        ) || (self.accept_desc && self.current_element.as_deref() == Some("desc"))
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let raw = std::mem::take(&mut self.text);
        let trimmed = raw.trim();

        let target = match self.current_element.as_deref() {
            Some("name") if self.track_open => &mut self.track_name,
            Some("name") => &mut self.waypoint_name,
            _ => &mut self.waypoint_description,
        };
        target.get_or_insert_with(String::new).push_str(trimmed);
    }

    fn point_from_attributes(&self, element: &str, attributes: &[(&str, &str)]) -> Option<GeoPoint> {
        let lat = coordinate_attribute(attributes, "lat");
        let lon = coordinate_attribute(attributes, "lon");

        let (Some(latitude), Some(longitude)) = (lat, lon) else {
            debug!("Dropping <{element}>: missing or non-numeric lat/lon");
            return None;
        };

        let point = GeoPoint::new(latitude, longitude);
        if self.drop_out_of_range && !point.in_range() {
            debug!("Dropping <{element}>: ({latitude}, {longitude}) outside WGS84 bounds");
            return None;
        }
        Some(point)
    }
}

fn coordinate_attribute(attributes: &[(&str, &str)], key: &str) -> Option<f64> {
    attributes
        .iter()
        .find(|(name, _)| *name == key)
        .and_then(|(_, value)| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}
