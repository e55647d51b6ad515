//! Normalization of decoded EXIF entries into named document values.

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::tags::{gps_tag_name, tag_name};
use super::{ExifData, ExifValue};

const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const ISO_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Named, normalized EXIF values in file order. Unknown tags are keyed by their decimal id.
pub fn read_exif(exif: &ExifData) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    for (tag, value) in &exif.entries {
        let name = tag_name(*tag)
            .map(str::to_string)
            .unwrap_or_else(|| tag.to_string());
        let normalized = normalize(&name, value);
        out.insert(name, normalized);
    }
    out
}

/// `YYYY:MM:DD HH:MM:SS` to `YYYY-MM-DD HH:MM:SS`; `None` when the text does not parse.
pub fn reformat_exif_date(text: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(text, EXIF_DATE_FORMAT)
        .ok()
        .map(|dt| dt.format(ISO_DATE_FORMAT).to_string())
}

/// Byte-string rendering used when bytes are not valid UTF-8: `b'...'` with escapes.
pub fn bytes_repr(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out.push('\'');
    out
}

fn normalize(name: &str, value: &ExifValue) -> Value {
    match value {
        ExifValue::Text(s) => {
            if name.contains("Date") {
                if let Some(iso) = reformat_exif_date(s) {
                    return Value::String(iso);
                }
            }
            Value::String(s.clone())
        }
        ExifValue::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => Value::String(s.to_string()),
            Err(_) => Value::String(bytes_repr(b)),
        },
        ExifValue::Int(i) => Value::from(*i),
        ExifValue::Float(f) => Value::from(*f),
        ExifValue::List(items) => {
            Value::Array(items.iter().map(|v| normalize(name, v)).collect())
        }
        ExifValue::Ifd(entries) => {
            let mut map = Map::new();
            for (tag, v) in entries {
                let sub_name = gps_tag_name(*tag)
                    .map(str::to_string)
                    .unwrap_or_else(|| tag.to_string());
                let normalized = normalize(&sub_name, v);
                map.insert(sub_name, normalized);
            }
            Value::Object(map)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_repr_escapes() {
        assert_eq!(bytes_repr(b"a\x00'\xff"), "b'a\\x00\\'\\xff'");
    }

    #[test]
    fn nan_float_becomes_null() {
        let v = normalize("XResolution", &ExifValue::Float(f64::NAN));
        assert!(v.is_null());
    }
}
