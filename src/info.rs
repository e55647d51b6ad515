//! Container "info" dictionary: the string-keyed, mixed-type facts a container reader
//! exposes (text chunks, resolution, raw EXIF/ICC/XMP payloads, flags).

use indexmap::IndexMap;
use serde_json::Value;

use crate::exif::bytes_repr;

/// One info dictionary value.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    List(Vec<InfoValue>),
}

/// Ordered info dictionary.
pub type InfoDict = IndexMap<String, InfoValue>;

impl InfoValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            InfoValue::Bytes(b) => Some(b),
            InfoValue::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Truthiness: empty strings, byte strings, lists, zero and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            InfoValue::Text(s) => !s.is_empty(),
            InfoValue::Bytes(b) => !b.is_empty(),
            InfoValue::List(v) => !v.is_empty(),
            InfoValue::Int(i) => *i != 0,
            InfoValue::Float(f) => *f != 0.0,
            InfoValue::Bool(b) => *b,
        }
    }

    /// Text rendering: strings verbatim, bytes in `b'...'` form, lists as `(a, b)`.
    pub fn to_display(&self) -> String {
        match self {
            InfoValue::Text(s) => s.clone(),
            InfoValue::Int(i) => i.to_string(),
            InfoValue::Float(f) => format_float(*f),
            InfoValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
            InfoValue::Bytes(b) => bytes_repr(b),
            InfoValue::List(items) => {
                let parts: Vec<String> = items.iter().map(InfoValue::to_display).collect();
                format!("({})", parts.join(", "))
            }
        }
    }

    /// Document value for a scalar; `None` for bytes and lists, which callers render.
    pub fn scalar_value(&self) -> Option<Value> {
        match self {
            InfoValue::Text(s) => Some(Value::String(s.clone())),
            InfoValue::Int(i) => Some(Value::from(*i)),
            InfoValue::Float(f) => Some(Value::from(*f)),
            InfoValue::Bool(b) => Some(Value::Bool(*b)),
            InfoValue::Bytes(_) | InfoValue::List(_) => None,
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

/// Container-level facts gathered by a format reader without decoding pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerInfo {
    /// Format name as reported in the document, e.g. `PNG`, `JPEG`, `WEBP`.
    pub format: &'static str,
    /// Pixel mode such as `RGB`, `RGBA`, `L`, `P`, `CMYK`.
    pub mode: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Bits per sample.
    pub bits: Option<u8>,
    pub compression: Option<String>,
    pub palette: bool,
    pub info: InfoDict,
}

/// Decode Latin-1 bytes (PNG `tEXt`/`zTXt` payloads).
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
