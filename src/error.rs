//! Site error definitions.

use std::fmt;

use wasm_bindgen::JsValue;

/// Errors surfaced while wiring the site into the page.
///
/// Event callbacks never return these to the host; they are logged instead.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteError {
    NoWindow,
    NoDocument,
    NoBody,
    /// A required element could not be found or created.
    MissingElement(&'static str),
    /// `getContext("2d")` returned nothing for the named canvas.
    NoContext(&'static str),
    /// Config payload from the host could not be parsed.
    Config(String),
    /// A DOM call threw.
    Js(String),
}

pub type SiteResult<T> = Result<T, SiteError>;

impl fmt::Display for SiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWindow => write!(f, "no window"),
            Self::NoDocument => write!(f, "no document"),
            Self::NoBody => write!(f, "document has no body"),
            Self::MissingElement(what) => write!(f, "missing element: {what}"),
            Self::NoContext(canvas) => write!(f, "no 2d context for canvas {canvas}"),
            Self::Config(msg) => write!(f, "invalid config: {msg}"),
            Self::Js(msg) => write!(f, "js error: {msg}"),
        }
    }
}

impl std::error::Error for SiteError {}

impl From<JsValue> for SiteError {
    fn from(value: JsValue) -> Self {
        let msg = value.as_string().unwrap_or_else(|| format!("{value:?}"));
        Self::Js(msg)
    }
}

impl From<SiteError> for JsValue {
    fn from(value: SiteError) -> Self {
        JsValue::from_str(&value.to_string())
    }
}
