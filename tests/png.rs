//! PNG chunk walking and info dictionary.

mod common;

use std::io::Write;

use common::{itxt_chunk, png_chunk, png_with, text_chunk, write_file};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use provscan::info::InfoValue;
use provscan::png::{read_info, walk, walk_bytes, Chunks, XMP_KEY};

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn types(data: &[u8]) -> Vec<String> {
    walk_bytes(data).into_iter().map(|c| c.chunk_type).collect()
}

#[test]
fn walk_lists_chunks_in_order() {
    let data = png_with(&[text_chunk("Software", "painter")]);
    let chunks = walk_bytes(&data);
    assert_eq!(chunks[0].chunk_type, "IHDR");
    assert_eq!(chunks[0].length, 13);
    assert_eq!(chunks[1].chunk_type, "tEXt");
    assert_eq!(chunks[1].length, ("Software".len() + 1 + "painter".len()) as u32);
    assert_eq!(chunks.last().unwrap().chunk_type, "IEND");
    assert!(types(&data).contains(&"IDAT".to_string()));
}

#[test]
fn walk_stops_after_iend() {
    let mut data = png_with(&[]);
    data.extend(png_chunk(b"tEXt", b"k\0after end"));
    assert_eq!(types(&data).last().map(String::as_str), Some("IEND"));
}

#[test]
fn truncated_file_keeps_prefix() {
    let data = png_with(&[text_chunk("Comment", "a fairly long comment body")]);
    // keep the signature, IHDR and only the header of the tEXt chunk
    let cut = &data[..8 + 25 + 8 + 3];
    let chunks = walk_bytes(cut);
    let names: Vec<&str> = chunks.iter().map(|c| c.chunk_type.as_str()).collect();
    assert_eq!(names, ["IHDR", "tEXt"]);
}

#[test]
fn walk_stops_on_non_ascii_type() {
    let mut data = png_with(&[]);
    data.truncate(8 + 25);
    data.extend_from_slice(&[0, 0, 0, 0, 0xC3, 0xA9, b'x', b'y']);
    assert_eq!(types(&data), ["IHDR"]);
}

#[test]
fn walk_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "a.png", &png_with(&[]));
    let chunks = walk(&path).unwrap();
    assert_eq!(chunks.first().unwrap().chunk_type, "IHDR");
    assert!(walk(dir.path().join("missing.png")).is_err());
}

#[test]
fn walk_of_empty_input_is_empty() {
    assert!(walk_bytes(b"").is_empty());
    assert!(walk_bytes(b"\x89PNG\r\n\x1a\n").is_empty());
}

#[test]
fn chunk_serializes_with_document_keys() {
    let chunks = walk_bytes(&png_with(&[]));
    let v = serde_json::to_value(&chunks[0]).unwrap();
    assert_eq!(v, serde_json::json!({ "Type": "IHDR", "Length": 13 }));
}

#[test]
fn chunks_iterator_yields_bodies() {
    let data = png_with(&[text_chunk("k", "v")]);
    let bodies: Vec<(&[u8], &[u8])> = Chunks::new(&data).collect();
    assert_eq!(bodies[1], (&b"tEXt"[..], &b"k\0v"[..]));
    assert!(Chunks::new(b"not a png").next().is_none());
}

#[test]
fn info_reads_header_and_text_chunks() {
    let mut ztxt = b"Comment\0\0".to_vec();
    ztxt.extend(zlib(b"compressed comment"));
    let data = png_with(&[
        text_chunk("Description", "caf\u{e9}"),
        png_chunk(b"zTXt", &ztxt),
        itxt_chunk(XMP_KEY, "<x:xmpmeta/>"),
    ]);
    let info = read_info(&data).unwrap();
    assert_eq!(info.format, "PNG");
    assert_eq!((info.width, info.height), (Some(4), Some(3)));
    assert_eq!(info.bits, Some(8));
    assert_eq!(info.mode.as_deref(), Some("RGB"));
    assert_eq!(info.compression.as_deref(), Some("deflate"));
    assert!(!info.palette);
    // tEXt is Latin-1: the two UTF-8 bytes of é become two characters
    assert_eq!(
        info.info["Description"],
        InfoValue::Text("caf\u{c3}\u{a9}".into())
    );
    assert_eq!(info.info["Comment"], InfoValue::Text("compressed comment".into()));
    assert_eq!(info.info[XMP_KEY], InfoValue::Text("<x:xmpmeta/>".into()));
}

#[test]
fn info_reads_profile_exif_and_physical_size() {
    let mut iccp = b"sRGB profile\0\0".to_vec();
    iccp.extend(zlib(&[7u8; 300]));
    let mut phys = 2835u32.to_be_bytes().to_vec();
    phys.extend(2835u32.to_be_bytes());
    phys.push(1);
    let data = png_with(&[
        png_chunk(b"iCCP", &iccp),
        png_chunk(b"eXIf", b"II*\0\x08\0\0\0\0\0"),
        png_chunk(b"pHYs", &phys),
        png_chunk(b"gAMA", &45455u32.to_be_bytes()),
        png_chunk(b"tIME", &[0x07, 0xE8, 3, 9, 14, 5, 59]),
    ]);
    let info = read_info(&data).unwrap().info;
    assert_eq!(info["icc_profile"], InfoValue::Bytes(vec![7u8; 300]));
    assert!(matches!(&info["exif"], InfoValue::Bytes(b) if b.len() == 10));
    match &info["dpi"] {
        InfoValue::List(v) => {
            assert_eq!(v.len(), 2);
            assert!(matches!(v[0], InfoValue::Float(f) if (f - 72.009).abs() < 1e-9));
        }
        other => panic!("unexpected dpi {other:?}"),
    }
    assert_eq!(info["gamma"], InfoValue::Float(0.45455));
    assert_eq!(info["modification_time"], InfoValue::Text("2024-03-09 14:05:59".into()));
}

#[test]
fn info_rejects_other_formats() {
    assert!(read_info(b"GIF89a").is_none());
}
