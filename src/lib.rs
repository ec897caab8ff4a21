//! GPX ingestion: waypoints and tracks from GPX XML into a plain geographic model.
//!
//! `<description>` is the only element read as a waypoint description unless
//! [`ParseOptions::accept_desc`] is set, in which case `<desc>` is read too.

pub mod cancel;
pub mod converter;
pub mod error;
pub mod model;
pub mod options;
pub mod parser;
pub mod state;

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

pub use crate::cancel::{CancelToken, Cancellation, Deadline, Never};
pub use crate::error::ParseError;
pub use crate::model::{GeoPoint, ParsedDocument, Track, Viewport, Waypoint};
pub use crate::options::{ExportOptions, GpxElementType, ParseOptions};
pub use crate::parser::{
    GpxSource, parse, parse_cancellable, parse_file, parse_gpx, parse_reader, parse_str,
};

/// Parse a GPX string, returned as a JS object `{ waypoints, tracks }`.
/// With `timeout_ms`, the parse is abandoned once that many milliseconds elapse.
#[wasm_bindgen(js_name = parseGpx)]
pub fn parse_gpx_js(
    gpx_string: &str,
    options: JsValue,
    timeout_ms: Option<f64>,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ParseOptions = parse_options(options)?;
    let doc = match timeout_ms {
        Some(ms) => parse_cancellable(
            GpxSource::Str(gpx_string),
            &opts,
            &JsDeadline::after(ms),
        )?,
        None => parse_str(gpx_string, &opts)?,
    };
    serde_wasm_bindgen::to_value(&doc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert GPX string to GeoJSON, returned as a JS object.
/// Input handling is configured through the nested `parse` options object.
#[wasm_bindgen(js_name = gpxToGeoJson)]
pub fn gpx_to_geojson(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ExportOptions = parse_options(options)?;
    let fc = converter::gpx_str_to_feature_collection(gpx_string, &opts)?;
    serde_wasm_bindgen::to_value(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert GPX string to GeoJSON, returned as a JSON string.
#[wasm_bindgen(js_name = gpxToGeoJsonString)]
pub fn gpx_to_geojson_string(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts: ExportOptions = parse_options(options)?;
    let fc = converter::gpx_str_to_feature_collection(gpx_string, &opts)?;
    serde_json::to_string(&fc).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options<T: DeserializeOwned + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

/// Wall-clock deadline for the wasm surface, where `std::time::Instant` is unavailable.
struct JsDeadline {
    until_ms: f64,
}

impl JsDeadline {
    fn after(timeout_ms: f64) -> Self {
        Self {
            until_ms: js_sys::Date::now() + timeout_ms,
        }
    }
}

impl Cancellation for JsDeadline {
    fn is_cancelled(&self) -> bool {
        js_sys::Date::now() >= self.until_ms
    }
}
