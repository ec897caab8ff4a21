use serde::Serialize;

/// Span of the initial map viewport, in meters along each axis.
pub const DEFAULT_VIEWPORT_SPAN_METERS: f64 = 1000.0;

/// A WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A named point of interest (`<wpt>`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub coordinate: GeoPoint,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// One `<trk>`; coordinates are in document order and form a path.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Track {
    pub coordinates: Vec<GeoPoint>,
    pub name: Option<String>,
}

/// Everything ingested from one GPX document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedDocument {
    pub waypoints: Vec<Waypoint>,
    pub tracks: Vec<Track>,
}

/// Initial region a map should show for a document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub center: GeoPoint,
    pub span_meters: f64,
}

impl ParsedDocument {
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty() && self.tracks.is_empty()
    }

    /// First coordinate of the first track, if that track has any.
    pub fn first_track_coordinate(&self) -> Option<GeoPoint> {
        self.tracks
            .first()
            .and_then(|track| track.coordinates.first())
            .copied()
    }

    /// Viewport centered on the first track's first coordinate.
    pub fn initial_viewport(&self) -> Option<Viewport> {
        self.first_track_coordinate().map(|center| Viewport {
            center,
            span_meters: DEFAULT_VIEWPORT_SPAN_METERS,
        })
    }
}
