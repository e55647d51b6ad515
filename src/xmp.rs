//! Targeted XMP packet fields: Dublin Core creator/description/rights and the IPTC
//! digital-source markers that flag generated media.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::config::DEFAULT_PREVIEW_LEN;
use crate::document::preview;

static CREATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:creator>(.*?)</dc:creator>").unwrap());
static DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:description>(.*?)</dc:description>").unwrap());
static RIGHTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:rights>(.*?)</dc:rights>").unwrap());
static SOURCE_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)DigitalSourceType="([^"]+)""#).unwrap());
static IMAGE_GUID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)DigImageGUID="([^"]+)""#).unwrap());

/// IPTC digital source type for media produced by a trained model.
pub const TRAINED_ALGORITHMIC_MEDIA: &str = "trainedAlgorithmicMedia";

/// Extract with the default preview length.
pub fn extract_xmp(packet: &str) -> IndexMap<String, Value> {
    extract_xmp_with(packet, DEFAULT_PREVIEW_LEN)
}

/// `Present`, a `Raw` preview of `preview_len` characters, then whichever fields occur.
pub fn extract_xmp_with(packet: &str, preview_len: usize) -> IndexMap<String, Value> {
    let mut out = IndexMap::new();
    out.insert("Present".to_string(), Value::from("Yes"));
    out.insert("Raw".to_string(), Value::from(preview(packet, preview_len)));

    let fields: [(&str, &Lazy<Regex>); 3] = [
        ("Creator", &CREATOR),
        ("Description", &DESCRIPTION),
        ("Rights", &RIGHTS),
    ];
    for (key, re) in fields {
        if let Some(text) = first_capture(re, packet) {
            out.insert(key.to_string(), Value::from(text.trim()));
        }
    }
    if packet.contains(TRAINED_ALGORITHMIC_MEDIA) {
        out.insert("AI_Generated".to_string(), Value::from("Yes"));
    }
    if let Some(v) = first_capture(&SOURCE_TYPE, packet) {
        out.insert("Digital_Source_Type".to_string(), Value::from(v.trim()));
    }
    if let Some(v) = first_capture(&IMAGE_GUID, packet) {
        out.insert("Image_GUID".to_string(), Value::from(v.trim()));
    }
    out
}

fn first_capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}
