//! Image metadata extraction end to end over encoded fixtures.

mod common;

use common::{
    ascii, encoded, exif_app1, itxt_chunk, jpeg_with, png_chunk, png_with, text_chunk, tiff_le,
    write_file,
};
use image::ImageFormat;
use provscan::imaging::{extract_image, DecodeMode, ImageHandle};
use provscan::provenance::{GENERATOR_DALLE, GENERATOR_FILENAME, GENERATOR_MIDJOURNEY};
use provscan::{ScanConfig, Section};
use serde_json::{json, Value};

const XMP_PACKET: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF><rdf:Description
    Iptc4xmpExt:DigitalSourceType="http://cv.iptc.org/newscodes/digitalsourcetype/trainedAlgorithmicMedia">
    <dc:creator> Studio Nine </dc:creator>
    <dc:rights>CC-BY</dc:rights>
</rdf:Description></rdf:RDF></x:xmpmeta>"#;

fn zlib(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn extract(name: &str, bytes: &[u8], mode: DecodeMode) -> provscan::Extraction {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), name, bytes);
    extract_image(&path, &ScanConfig::default(), mode)
}

#[test]
fn png_with_every_metadata_source() {
    let mut iccp = b"profile\0\0".to_vec();
    iccp.extend(zlib(&[1u8; 128]));
    let data = png_with(&[
        png_chunk(b"iCCP", &iccp),
        text_chunk("Description", "a koi pond at dusk --ar 16:9 --v 6"),
        itxt_chunk("XML:com.adobe.xmp", XMP_PACKET),
    ]);
    let out = extract("koi.png", &data, DecodeMode::Decoder);
    let doc = &out.document;

    let basic = doc.section(Section::Basic).unwrap();
    let keys: Vec<&str> = basic.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        [
            "File Name",
            "File Size",
            "File Path",
            "File Extension",
            "Image Format",
            "Mode",
            "Dimensions",
            "Bit Depth",
            "Compression",
            "Palette",
        ]
    );
    assert_eq!(basic["File Name"], "koi.png");
    assert_eq!(basic["File Extension"], "PNG");
    assert_eq!(basic["Image Format"], "PNG");
    assert_eq!(basic["Mode"], "RGB");
    assert_eq!(basic["Dimensions"], "4 x 3 pixels");
    assert_eq!(basic["Bit Depth"], "8");
    assert_eq!(basic["Palette"], "No");

    assert_eq!(
        doc.get_str(Section::FormatSpecific, "Description"),
        Some("a koi pond at dusk --ar 16:9 --v 6")
    );
    assert_eq!(doc.get_str(Section::AiMetadata, "Generator"), Some(GENERATOR_MIDJOURNEY));
    assert_eq!(out.prompt.as_deref(), Some("a koi pond at dusk --ar 16:9 --v 6"));

    assert_eq!(doc.get_str(Section::IccProfile, "Present"), Some("Yes"));
    assert_eq!(doc.get_str(Section::IccProfile, "Size"), Some("128 bytes"));

    assert_eq!(doc.get_str(Section::XmpMetadata, "Present"), Some("Yes"));
    assert_eq!(doc.get_str(Section::XmpMetadata, "Creator"), Some("Studio Nine"));
    assert_eq!(doc.get_str(Section::XmpMetadata, "Rights"), Some("CC-BY"));
    assert_eq!(doc.get_str(Section::XmpMetadata, "AI_Generated"), Some("Yes"));
    let raw = doc.get_str(Section::XmpMetadata, "Raw").unwrap();
    assert!(raw.ends_with("... (truncated)"));

    let structure = doc.section(Section::PngStructure).unwrap();
    let chunks = structure["Chunks"].as_array().unwrap();
    assert_eq!(structure["Chunk_Count"], json!(chunks.len()));
    assert_eq!(chunks[0], json!({ "Type": "IHDR", "Length": 13 }));
    assert_eq!(chunks[1]["Type"], "iCCP");
    assert!(!doc.contains(Section::Error));
}

#[test]
fn jpeg_with_exif_dalle() {
    let tiff = tiff_le(
        &[
            ascii(0x010E, "a teapot shaped like a snail"),
            ascii(0x0131, "DALL-E 3"),
        ],
        &[ascii(0x9003, "2024:02:29 12:00:00")],
    );
    let data = jpeg_with(&[exif_app1(&tiff)]);
    let out = extract("teapot.jpg", &data, DecodeMode::Decoder);
    let doc = &out.document;

    assert_eq!(doc.get_str(Section::Basic, "Image Format"), Some("JPEG"));
    assert_eq!(doc.get_str(Section::Basic, "Dimensions"), Some("4 x 3 pixels"));
    assert_eq!(doc.get_str(Section::Exif, "Software"), Some("DALL-E 3"));
    assert_eq!(
        doc.get_str(Section::Exif, "DateTimeOriginal"),
        Some("2024-02-29 12:00:00")
    );
    assert_eq!(doc.get_str(Section::AiMetadata, "Generator"), Some(GENERATOR_DALLE));
    assert_eq!(out.prompt.as_deref(), Some("a teapot shaped like a snail"));
    assert!(!doc.contains(Section::PngStructure));
}

#[test]
fn jpeg_xmp_segment() {
    let mut app1 = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    app1.extend_from_slice(XMP_PACKET.as_bytes());
    let data = jpeg_with(&[(0xE1, app1)]);
    let out = extract("scan.jpeg", &data, DecodeMode::Decoder);
    assert_eq!(
        out.document.get_str(Section::XmpMetadata, "Creator"),
        Some("Studio Nine")
    );
    assert_eq!(
        out.document.get_str(Section::Basic, "File Extension"),
        Some("JPEG")
    );
}

#[test]
fn webp_format_and_dimensions() {
    let data = encoded(ImageFormat::WebP, 5, 7);
    let out = extract("tile.webp", &data, DecodeMode::Decoder);
    assert_eq!(out.document.get_str(Section::Basic, "Image Format"), Some("WEBP"));
    assert_eq!(out.document.get_str(Section::Basic, "Dimensions"), Some("5 x 7 pixels"));
}

#[test]
fn garbage_records_processing_error() {
    let out = extract("broken.png", b"definitely not an image", DecodeMode::Decoder);
    let doc = &out.document;
    let names: Vec<&str> = doc.sections().map(|(n, _)| n).collect();
    assert_eq!(names, ["Basic", "Error"]);
    assert!(doc.get_str(Section::Error, "Processing Error").is_some());
    assert_eq!(doc.get_str(Section::Basic, "File Size"), Some("0.0 KB"));
    assert_eq!(out.prompt, None);
}

#[test]
fn missing_file_records_processing_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.png");
    let out = extract_image(&path, &ScanConfig::default(), DecodeMode::Decoder);
    assert_eq!(out.document.get_str(Section::Basic, "File Size"), Some("Unknown"));
    assert!(out.document.contains(Section::Error));
}

#[test]
fn container_only_matches_decoder_facts() {
    let data = png_with(&[text_chunk("Software", "painter")]);
    let decoded = extract("same.png", &data, DecodeMode::Decoder);
    let container = extract("same.png", &data, DecodeMode::ContainerOnly);
    for key in ["Image Format", "Mode", "Dimensions", "Bit Depth", "Compression"] {
        assert_eq!(
            decoded.document.get(Section::Basic, key),
            container.document.get(Section::Basic, key),
            "{key}"
        );
    }
    assert_eq!(
        container.document.get_str(Section::FormatSpecific, "Software"),
        Some("painter")
    );
}

#[test]
fn filename_signal_without_prompt() {
    let data = png_with(&[]);
    let out = extract("user_castle_sky.png", &data, DecodeMode::Decoder);
    assert_eq!(
        out.document.get_str(Section::AiMetadata, "Generator"),
        Some(GENERATOR_FILENAME)
    );
    assert_eq!(out.prompt, None);
}

#[test]
fn cascade_result_overrides_filename_signal() {
    let data = png_with(&[text_chunk("Description", "a castle above the clouds --v 6")]);
    let out = extract("user_castle_sky.png", &data, DecodeMode::Decoder);
    assert_eq!(
        out.document.get_str(Section::AiMetadata, "Generator"),
        Some(GENERATOR_MIDJOURNEY)
    );
    assert_eq!(
        out.document.get_str(Section::AiMetadata, "prompt"),
        Some("a castle above the clouds --v 6")
    );
    assert_eq!(out.prompt.as_deref(), Some("a castle above the clouds --v 6"));
}

#[test]
fn non_utf8_info_bytes_are_summarized() {
    let handle = ImageHandle::from_bytes(&jpeg_with(&[(0xFE, vec![0xff, 0xfe, 0x00])])).unwrap();
    let value = provscan::imaging::format_specific_value(
        handle.info("comment").unwrap(),
        ScanConfig::default().preview_len,
    );
    assert_eq!(value, Value::from("bytes (3 bytes)"));
}
