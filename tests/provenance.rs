//! Provenance cascade: rule order, author capture, DALL-E hint, filename signal.

mod common;

use std::path::Path;

use common::{ascii, tiff_le, undefined};
use provscan::exif::ExifData;
use provscan::info::{InfoDict, InfoValue};
use provscan::provenance::{
    detect, filename_signal, split_sd_parameters, GENERATOR_DALLE, GENERATOR_GENERIC,
    GENERATOR_MIDJOURNEY, GENERATOR_STABLE_DIFFUSION,
};
use provscan::scanner::GENERATOR_JSON;
use provscan::{ImageHandle, ScanConfig};
use serde_json::{Map, Value};

const SD_RAW: &[u8] = b"\x89PNG....comment\0parameters: A cat, masterpiece\n\
Negative prompt: blurry\nSteps: 20, Sampler: Euler\n\ntrailing";

fn handle(info: &[(&str, &str)], exif: Option<Vec<u8>>) -> ImageHandle {
    let info: InfoDict = info
        .iter()
        .map(|(k, v)| (k.to_string(), InfoValue::Text(v.to_string())))
        .collect();
    ImageHandle {
        format: "PNG".into(),
        mode: "RGB".into(),
        width: 4,
        height: 3,
        info,
        exif: exif.as_deref().and_then(ExifData::parse),
        ..ImageHandle::default()
    }
}

#[test]
fn midjourney_description_wins_over_sd_block() {
    let h = handle(&[("Description", "a lighthouse --ar 16:9"), ("Author", "someone")], None);
    let found = detect(&h, SD_RAW, &ScanConfig::default());
    let p = found.provenance.unwrap();
    assert_eq!(p.generator, GENERATOR_MIDJOURNEY);
    assert_eq!(p.prompt, "a lighthouse --ar 16:9");
    assert_eq!(found.author, None);
}

#[test]
fn description_without_markers_falls_through() {
    let h = handle(&[("Description", "holiday photo")], None);
    let found = detect(&h, b"", &ScanConfig::default());
    assert!(found.is_empty());
}

#[test]
fn sd_block_is_split() {
    let h = handle(&[], None);
    let found = detect(&h, SD_RAW, &ScanConfig::default());
    let p = found.provenance.unwrap();
    assert_eq!(p.generator, GENERATOR_STABLE_DIFFUSION);
    assert_eq!(
        p.prompt,
        "A cat, masterpiece\nNegative prompt: blurry\nSteps: 20, Sampler: Euler"
    );
    assert_eq!(p.positive_prompt.as_deref(), Some("A cat, masterpiece"));
    assert_eq!(p.negative_prompt.as_deref(), Some("blurry"));
    assert_eq!(p.parameters.as_deref(), Some("Steps: 20, Sampler: Euler"));
}

#[test]
fn sd_block_without_negative_keeps_only_prompt() {
    let h = handle(&[], None);
    let found = detect(&h, b"parameters: just a prompt", &ScanConfig::default());
    let p = found.provenance.unwrap();
    assert_eq!(p.prompt, "just a prompt");
    assert_eq!(p.positive_prompt, None);
    assert_eq!(p.negative_prompt, None);
}

#[test]
fn split_uses_first_negative_marker() {
    let sd = split_sd_parameters("a Negative prompt: b Negative prompt: c Steps: 5").unwrap();
    assert_eq!(sd.positive, "a");
    assert_eq!(sd.negative, "b Negative prompt: c");
    assert_eq!(sd.parameters.as_deref(), Some("Steps: 5"));
    assert!(split_sd_parameters("no marker here").is_none());
}

#[test]
fn author_is_recorded_with_later_rule() {
    let h = handle(&[("Author", "studio")], None);
    let found = detect(&h, SD_RAW, &ScanConfig::default());
    assert_eq!(found.author.as_deref(), Some("studio"));
    let p = found.provenance.as_ref().unwrap();
    assert_eq!(p.author.as_deref(), Some("studio"));

    let mut section = Map::new();
    found.write_into(&mut section);
    let keys: Vec<&str> = section.keys().map(String::as_str).collect();
    assert_eq!(keys[..3], ["Author", "Generator", "prompt"]);
}

#[test]
fn author_alone_is_reported_without_generator() {
    let h = handle(&[("Author", "studio")], None);
    let found = detect(&h, b"", &ScanConfig::default());
    assert_eq!(found.author.as_deref(), Some("studio"));
    assert!(found.provenance.is_none());
    let mut section = Map::new();
    found.write_into(&mut section);
    assert_eq!(section.get("Author"), Some(&Value::from("studio")));
    assert!(!section.contains_key("Generator"));
}

#[test]
fn midjourney_exif_user_comment() {
    let mut comment = b"ASCII\0\0\0".to_vec();
    comment.extend_from_slice(b"neon city /imagine");
    let tiff = tiff_le(&[ascii(0x010F, "Camera")], &[undefined(0x9286, &comment)]);
    let h = handle(&[], Some(tiff));
    let p = detect(&h, b"", &ScanConfig::default()).provenance.unwrap();
    assert_eq!(p.generator, GENERATOR_MIDJOURNEY);
    assert_eq!(p.prompt, "neon city /imagine");
}

#[test]
fn dalle_software_with_description() {
    let tiff = tiff_le(
        &[
            ascii(0x010E, "an astronaut riding a horse"),
            ascii(0x0131, "DALL-E 3"),
        ],
        &[],
    );
    let h = handle(&[], Some(tiff));
    let found = detect(&h, b"", &ScanConfig::default());
    let p = found.provenance.unwrap();
    assert_eq!(p.generator, GENERATOR_DALLE);
    assert_eq!(p.prompt, "an astronaut riding a horse");
}

#[test]
fn dalle_software_without_prompt_sets_generator_only() {
    let tiff = tiff_le(&[ascii(0x010E, "short"), ascii(0x0131, "DALL-E 2")], &[]);
    let h = handle(&[], Some(tiff));
    let found = detect(&h, b"", &ScanConfig::default());
    assert!(found.provenance.is_none());
    assert_eq!(found.generator.as_deref(), Some(GENERATOR_DALLE));
}

#[test]
fn dalle_hint_is_overridden_by_later_rule() {
    let tiff = tiff_le(&[ascii(0x0131, "DALL-E 2")], &[]);
    let h = handle(&[("prompt", "forest spirit")], Some(tiff));
    let found = detect(&h, b"", &ScanConfig::default());
    let mut section = Map::new();
    found.write_into(&mut section);
    assert_eq!(section["Generator"], GENERATOR_GENERIC);
    assert_eq!(section["prompt"], "forest spirit");
}

#[test]
fn prompt_info_key_marks_generic_generator() {
    let h = handle(&[("parameters", "a quiet harbor, Steps: 20")], None);
    let p = detect(&h, b"", &ScanConfig::default()).provenance.unwrap();
    assert_eq!(p.generator, GENERATOR_GENERIC);
    assert_eq!(p.prompt, "a quiet harbor, Steps: 20");
}

#[test]
fn binary_scan_is_last_resort() {
    let h = handle(&[], None);
    let raw = br#"....{"prompt":"a watercolor of a fox"}...."#;
    let p = detect(&h, raw, &ScanConfig::default()).provenance.unwrap();
    assert_eq!(p.generator, GENERATOR_JSON);
    assert_eq!(p.prompt, "a watercolor of a fox");
}

#[test]
fn filename_signal_needs_three_parts() {
    assert!(filename_signal(Path::new("/tmp/user_prompt_words_1234.png")));
    assert!(filename_signal(Path::new("a_b_c.png")));
    assert!(!filename_signal(Path::new("holiday_photo.png")));
    assert!(!filename_signal(Path::new("plain.png")));
}
