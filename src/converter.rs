use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::{Map, Value as JsonValue, json};

use crate::error::Result;
use crate::model::*;
use crate::options::{ExportOptions, GpxElementType};
use crate::parser::parse_str;

/// Parse a GPX string with `opts.parse` and convert it in one step.
pub fn gpx_str_to_feature_collection(xml: &str, opts: &ExportOptions) -> Result<FeatureCollection> {
    let doc = parse_str(xml, &opts.parse)?;
    Ok(to_feature_collection(&doc, opts))
}

/// Convert a parsed document to a GeoJSON FeatureCollection: one marker per
/// waypoint and one path per track.
pub fn to_feature_collection(doc: &ParsedDocument, opts: &ExportOptions) -> FeatureCollection {
    let mut features = Vec::new();

    if opts.should_include(GpxElementType::Waypoint) {
        for wpt in &doc.waypoints {
            features.push(waypoint_to_feature(wpt, opts));
        }
    }

    if opts.should_include(GpxElementType::Track) {
        for trk in &doc.tracks {
            if let Some(feature) = track_to_feature(trk, opts) {
                features.push(feature);
            }
        }
    }

    let foreign_members = if opts.include_viewport {
        doc.initial_viewport().map(viewport_member)
    } else {
        None
    };

    FeatureCollection {
        bbox: None,
        features,
        foreign_members,
    }
}

fn waypoint_to_feature(wpt: &Waypoint, opts: &ExportOptions) -> Feature {
    let geometry = Geometry::new(Value::Point(position(&wpt.coordinate)));

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("waypoint".to_string()),
    );

    if opts.include_metadata {
        insert_optional(&mut props, "name", &wpt.name);
        insert_optional(&mut props, "description", &wpt.description);
    }

    feature(geometry, props)
}

/// A track of one point becomes a Point; an empty track produces nothing.
fn track_to_feature(trk: &Track, opts: &ExportOptions) -> Option<Feature> {
    let value = match trk.coordinates.as_slice() {
        [] => return None,
        [single] => Value::Point(position(single)),
        points => Value::LineString(points.iter().map(position).collect()),
    };

    let mut props = Map::new();
    props.insert(
        "gpxType".to_string(),
        JsonValue::String("track".to_string()),
    );

    if opts.include_metadata {
        insert_optional(&mut props, "name", &trk.name);
    }

    Some(feature(Geometry::new(value), props))
}

fn feature(geometry: Geometry, props: Map<String, JsonValue>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// GeoJSON positions are [lon, lat].
fn position(point: &GeoPoint) -> Vec<f64> {
    vec![point.longitude, point.latitude]
}

fn viewport_member(viewport: Viewport) -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "viewport".to_string(),
        json!({
            "center": position(&viewport.center),
            "spanMeters": viewport.span_meters,
        }),
    );
    members
}

fn insert_optional(props: &mut Map<String, JsonValue>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), JsonValue::String(v.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_gpx;

    #[test]
    fn test_waypoint_marker() {
        let xml = r#"<gpx>
  <wpt lat="35.6762" lon="139.6503">
    <name>Tokyo</name>
    <description>Capital</description>
  </wpt>
</gpx>"#;
        let doc = parse_gpx(xml).unwrap();
        let fc = to_feature_collection(&doc, &ExportOptions::default());

        assert_eq!(fc.features.len(), 1);
        let f = &fc.features[0];
        let geom = f.geometry.as_ref().unwrap();

        // Check [lon, lat] order
        if let Value::Point(coords) = &geom.value {
            assert!((coords[0] - 139.6503).abs() < 1e-10);
            assert!((coords[1] - 35.6762).abs() < 1e-10);
        } else {
            panic!("Expected Point geometry");
        }

        let props = f.properties.as_ref().unwrap();
        assert_eq!(props["gpxType"], "waypoint");
        assert_eq!(props["name"], "Tokyo");
        assert_eq!(props["description"], "Capital");
        // No track, no viewport
        assert!(fc.foreign_members.is_none());
    }

    #[test]
    fn test_track_path_and_viewport() {
        let xml = r#"<gpx>
  <trk>
    <name>Run</name>
    <trkseg>
      <trkpt lat="35.0" lon="139.0"/>
      <trkpt lat="35.001" lon="139.001"/>
    </trkseg>
  </trk>
</gpx>"#;
        let doc = parse_gpx(xml).unwrap();
        let fc = to_feature_collection(&doc, &ExportOptions::default());

        assert_eq!(fc.features.len(), 1);
        let geom = fc.features[0].geometry.as_ref().unwrap();
        match &geom.value {
            Value::LineString(coords) => assert_eq!(coords.len(), 2),
            _ => panic!("Expected LineString"),
        }

        let viewport = &fc.foreign_members.as_ref().unwrap()["viewport"];
        assert_eq!(viewport["center"], json!([139.0, 35.0]));
        assert_eq!(viewport["spanMeters"], 1000.0);
    }

    #[test]
    fn test_single_point_and_empty_tracks() {
        let xml = r#"<gpx>
  <trk><name>Single</name><trkpt lat="35.0" lon="139.0"/></trk>
  <trk><name>Empty</name></trk>
</gpx>"#;
        let doc = parse_gpx(xml).unwrap();
        assert_eq!(doc.tracks.len(), 2);

        let fc = to_feature_collection(&doc, &ExportOptions::default());
        assert_eq!(fc.features.len(), 1);
        let geom = fc.features[0].geometry.as_ref().unwrap();
        assert!(matches!(&geom.value, Value::Point(_)));
    }

    #[test]
    fn test_type_filter_and_no_metadata() {
        let xml = r#"<gpx>
  <wpt lat="35.0" lon="139.0"><name>W</name></wpt>
  <trk><name>T</name><trkpt lat="35.0" lon="139.0"/><trkpt lat="36.0" lon="140.0"/></trk>
</gpx>"#;
        let doc = parse_gpx(xml).unwrap();
        let opts = ExportOptions {
            include_metadata: false,
            types: Some(vec![GpxElementType::Waypoint]),
            include_viewport: false,
            ..Default::default()
        };
        let fc = to_feature_collection(&doc, &opts);

        assert_eq!(fc.features.len(), 1);
        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["gpxType"], "waypoint");
        assert!(props.get("name").is_none());
        assert!(fc.foreign_members.is_none());
    }

    #[test]
    fn test_export_honors_parse_options() {
        let xml = r#"<gpx>
  <wpt lat="35.0" lon="139.0"><name>W</name><desc>Short</desc></wpt>
  <wpt lat="95.0" lon="139.0"><name>Off the globe</name></wpt>
</gpx>"#;
        let fc = gpx_str_to_feature_collection(xml, &ExportOptions::default()).unwrap();
        assert_eq!(fc.features.len(), 1);
        assert!(fc.features[0].properties.as_ref().unwrap().get("description").is_none());

        let mut opts = ExportOptions::default();
        opts.parse.accept_desc = true;
        opts.parse.drop_out_of_range = false;
        let fc = gpx_str_to_feature_collection(xml, &opts).unwrap();
        assert_eq!(fc.features.len(), 2);
        assert_eq!(fc.features[0].properties.as_ref().unwrap()["description"], "Short");
    }
}
