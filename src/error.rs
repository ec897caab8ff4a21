use std::io;
use std::sync::Arc;

use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Fatal outcomes of a GPX parse. A failed parse never hands back a partial document.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("GPX source unavailable ({origin}): {source}")]
    SourceUnavailable {
        origin: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Malformed GPX: {0}")]
    Malformed(String),

    #[error("GPX parse cancelled")]
    Cancelled,
}

impl ParseError {
    pub(crate) fn unavailable(origin: impl Into<String>, source: io::Error) -> Self {
        Self::SourceUnavailable {
            origin: origin.into(),
            source: Arc::new(source),
        }
    }

    /// Attach the reader's byte offset to a tokenizer failure.
    pub(crate) fn at(self, position: u64) -> Self {
        match self {
            Self::Malformed(detail) => Self::Malformed(format!("{detail} (at byte {position})")),
            other => other,
        }
    }
}

impl From<quick_xml::Error> for ParseError {
    fn from(e: quick_xml::Error) -> Self {
        match e {
            quick_xml::Error::Io(source) => Self::SourceUnavailable {
                origin: "reader".to_string(),
                source,
            },
            other => Self::Malformed(other.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for ParseError {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<ParseError> for JsValue {
    fn from(e: ParseError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
