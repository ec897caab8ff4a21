use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesRef, BytesStart, Event};

use crate::cancel::{Cancellation, Never};
use crate::error::{ParseError, Result};
use crate::model::ParsedDocument;
use crate::options::ParseOptions;
use crate::state::DocumentBuilder;

/// Where GPX input comes from.
#[derive(Debug, Clone, Copy)]
pub enum GpxSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
    Str(&'a str),
}

impl<'a> From<&'a str> for GpxSource<'a> {
    fn from(s: &'a str) -> Self {
        Self::Str(s)
    }
}

impl<'a> From<&'a [u8]> for GpxSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Path> for GpxSource<'a> {
    fn from(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

/// Parse a GPX string with default options.
pub fn parse_gpx(xml: &str) -> Result<ParsedDocument> {
    parse_str(xml, &ParseOptions::default())
}

pub fn parse_str(xml: &str, options: &ParseOptions) -> Result<ParsedDocument> {
    parse_reader(xml.as_bytes(), options, &Never)
}

/// Parse the GPX file at `path`. The file handle is dropped on every exit path.
pub fn parse_file(path: impl AsRef<Path>, options: &ParseOptions) -> Result<ParsedDocument> {
    parse_cancellable(GpxSource::Path(path.as_ref()), options, &Never)
}

pub fn parse<'a>(source: impl Into<GpxSource<'a>>, options: &ParseOptions) -> Result<ParsedDocument> {
    parse_cancellable(source.into(), options, &Never)
}

/// Parse any source, polling `cancel` before each tokenizer event.
pub fn parse_cancellable(
    source: GpxSource<'_>,
    options: &ParseOptions,
    cancel: &dyn Cancellation,
) -> Result<ParsedDocument> {
    match source {
        GpxSource::Str(xml) => parse_reader(xml.as_bytes(), options, cancel),
        GpxSource::Bytes(bytes) => parse_reader(bytes, options, cancel),
        GpxSource::Path(path) => {
            let file =
                File::open(path).map_err(|e| ParseError::unavailable(path.display().to_string(), e))?;
            parse_reader(BufReader::new(file), options, cancel)
        }
    }
}

/// Drive quick-xml over `source`, feeding events to a fresh [`DocumentBuilder`].
pub fn parse_reader<R: BufRead>(
    source: R,
    options: &ParseOptions,
    cancel: &dyn Cancellation,
) -> Result<ParsedDocument> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().expand_empty_elements = true;

    let mut builder = DocumentBuilder::new(options);
    let mut open: Vec<String> = Vec::new();
    let mut saw_root = false;
    let mut buf = Vec::new();

    loop {
        if cancel.is_cancelled() {
            return Err(ParseError::Cancelled);
        }

        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(e.local_name().into_inner())?;
                if open.is_empty() {
                    if saw_root {
                        return Err(ParseError::Malformed(format!(
                            "second root element <{name}>"
                        ))
                        .at(reader.buffer_position() as u64));
                    }
                    saw_root = true;
                }
                let attributes = read_attributes(&e, reader.decoder())?;
                let borrowed: Vec<(&str, &str)> = attributes
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                builder.on_start(&name, &borrowed);
                open.push(name);
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.local_name().into_inner())?;
                builder.on_end(&name);
                open.pop();
            }
            Ok(Event::Text(e)) => builder.on_text(utf8(e.as_ref())?),
            Ok(Event::CData(e)) => builder.on_text(utf8(e.as_ref())?),
            Ok(Event::GeneralRef(e)) => {
                let ch = resolve_reference(&e)
                    .map_err(|err| err.at(reader.buffer_position() as u64))?;
                let mut tmp = [0u8; 4];
                builder.on_text(ch.encode_utf8(&mut tmp));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ParseError::from(e).at(reader.error_position() as u64)),
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ParseError::Malformed("no root element".to_string()));
    }
    if let Some(unclosed) = open.last() {
        return Err(ParseError::Malformed(format!(
            "document ended inside <{unclosed}>"
        )));
    }

    if builder.dropped_points() > 0 {
        debug!(
            "Dropped {} point(s) with unusable coordinates",
            builder.dropped_points()
        );
    }
    let document = builder.finish();
    debug!(
        "Parsed GPX: {} waypoint(s), {} track(s)",
        document.waypoints.len(),
        document.tracks.len()
    );
    Ok(document)
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| ParseError::Malformed(format!("invalid UTF-8 in text content: {e}")))
}

fn local_name(bytes: &[u8]) -> Result<String> {
    utf8(bytes).map(str::to_string)
}

/// Attribute `(local name, unescaped value)` pairs of a start tag.
fn read_attributes(start: &BytesStart<'_>, decoder: Decoder) -> Result<Vec<(String, String)>> {
    let mut attributes = Vec::new();
    for attr_result in start.attributes() {
        let attr = attr_result?;
        let key = utf8(attr.key.local_name().into_inner())?.to_string();
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        attributes.push((key, value));
    }
    Ok(attributes)
}

/// Resolve a character reference (`&#60;`, `&#x3C;`) or predefined entity.
/// GPX documents declare no entities, so any other name is an error.
fn resolve_reference(e: &BytesRef<'_>) -> Result<char> {
    let name = utf8(e.as_ref())?;
    if let Some(ch) = e
        .resolve_char_ref()
        .map_err(|err| {
            ParseError::Malformed(format!("invalid character reference &{name};: {err}"))
        })?
    {
        return Ok(ch);
    }
    match name {
        "amp" => Ok('&'),
        "lt" => Ok('<'),
        "gt" => Ok('>'),
        "quot" => Ok('"'),
        "apos" => Ok('\''),
        other => Err(ParseError::Malformed(format!(
            "undeclared entity &{other};"
        ))),
    }
}
