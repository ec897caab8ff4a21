use serde::Deserialize;

/// Options controlling how GPX input is interpreted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseOptions {
    /// Also treat `<desc>` as a waypoint description (default: false, only `<description>`)
    #[serde(default)]
    pub accept_desc: bool,

    /// Drop points whose coordinates fall outside WGS84 bounds (default: true)
    #[serde(default = "default_true")]
    pub drop_out_of_range: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            accept_desc: false,
            drop_out_of_range: true,
        }
    }
}

/// Options for exporting a parsed document as GeoJSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Include name/description in properties (default: true)
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    /// Which GPX element types to export (default: all)
    #[serde(default)]
    pub types: Option<Vec<GpxElementType>>,

    /// Attach the initial viewport as a `viewport` member (default: true)
    #[serde(default = "default_true")]
    pub include_viewport: bool,

    /// How the GPX input is read before export
    #[serde(default)]
    pub parse: ParseOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            types: None,
            include_viewport: true,
            parse: ParseOptions::default(),
        }
    }
}

impl ExportOptions {
    pub fn should_include(&self, element_type: GpxElementType) -> bool {
        match &self.types {
            None => true,
            Some(types) => types.contains(&element_type),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpxElementType {
    Waypoint,
    Track,
}

fn default_true() -> bool {
    true
}
