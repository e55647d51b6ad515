//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};

pub const TYPE_ASCII: u16 = 2;
pub const TYPE_SHORT: u16 = 3;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_RATIONAL: u16 = 5;
pub const TYPE_UNDEFINED: u16 = 7;

/// Encode a small solid RGB image with the `image` crate.
pub fn encoded(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 40, 90]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("encode fixture");
    out.into_inner()
}

/// One PNG chunk with a valid CRC.
pub fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut crc = flate2::Crc::new();
    crc.update(kind);
    crc.update(data);
    let mut out = (data.len() as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
    out
}

pub fn text_chunk(key: &str, text: &str) -> Vec<u8> {
    let mut data = key.as_bytes().to_vec();
    data.push(0);
    data.extend_from_slice(text.as_bytes());
    png_chunk(b"tEXt", &data)
}

/// Uncompressed iTXt chunk.
pub fn itxt_chunk(key: &str, text: &str) -> Vec<u8> {
    let mut data = key.as_bytes().to_vec();
    data.extend_from_slice(&[0, 0, 0, 0, 0]);
    data.extend_from_slice(text.as_bytes());
    png_chunk(b"iTXt", &data)
}

/// A 4x3 PNG with `extra` chunks inserted right after IHDR.
pub fn png_with(extra: &[Vec<u8>]) -> Vec<u8> {
    let base = encoded(ImageFormat::Png, 4, 3);
    // signature (8) + IHDR chunk (4 + 4 + 13 + 4)
    let split = 8 + 25;
    let mut out = base[..split].to_vec();
    for chunk in extra {
        out.extend_from_slice(chunk);
    }
    out.extend_from_slice(&base[split..]);
    out
}

/// A 4x3 JPEG with `segments` (marker, payload) inserted right after SOI.
pub fn jpeg_with(segments: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let base = encoded(ImageFormat::Jpeg, 4, 3);
    let mut out = base[..2].to_vec();
    for (marker, payload) in segments {
        out.extend_from_slice(&[0xFF, *marker]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
    }
    out.extend_from_slice(&base[2..]);
    out
}

/// JPEG APP1 payload carrying an EXIF block.
pub fn exif_app1(tiff: &[u8]) -> (u8, Vec<u8>) {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(tiff);
    (0xE1, payload)
}

/// One IFD entry before layout.
#[derive(Clone)]
pub struct Entry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub bytes: Vec<u8>,
}

pub fn ascii(tag: u16, text: &str) -> Entry {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    Entry { tag, field_type: TYPE_ASCII, count: bytes.len() as u32, bytes }
}

pub fn undefined(tag: u16, bytes: &[u8]) -> Entry {
    Entry { tag, field_type: TYPE_UNDEFINED, count: bytes.len() as u32, bytes: bytes.to_vec() }
}

pub fn short(tag: u16, value: u16) -> Entry {
    Entry { tag, field_type: TYPE_SHORT, count: 1, bytes: value.to_le_bytes().to_vec() }
}

pub fn rational(tag: u16, num: u32, den: u32) -> Entry {
    let mut bytes = num.to_le_bytes().to_vec();
    bytes.extend_from_slice(&den.to_le_bytes());
    Entry { tag, field_type: TYPE_RATIONAL, count: 1, bytes }
}

/// Little-endian TIFF block: IFD0 and, when non-empty, an Exif IFD linked from IFD0.
pub fn tiff_le(ifd0: &[Entry], exif_ifd: &[Entry]) -> Vec<u8> {
    let mut ifd0 = ifd0.to_vec();
    let ifd_len = |n: usize| 2 + n * 12 + 4;
    let n0 = ifd0.len() + usize::from(!exif_ifd.is_empty());
    let exif_offset = 8 + ifd_len(n0);
    if !exif_ifd.is_empty() {
        ifd0.push(Entry {
            tag: 0x8769,
            field_type: TYPE_LONG,
            count: 1,
            bytes: (exif_offset as u32).to_le_bytes().to_vec(),
        });
    }
    let data_start = exif_offset + if exif_ifd.is_empty() { 0 } else { ifd_len(exif_ifd.len()) };

    let mut head = b"II".to_vec();
    head.extend_from_slice(&42u16.to_le_bytes());
    head.extend_from_slice(&8u32.to_le_bytes());
    let mut data = Vec::new();
    let mut ifds = Vec::new();
    for entries in [&ifd0[..], exif_ifd] {
        if entries.is_empty() {
            continue;
        }
        ifds.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for e in entries {
            ifds.extend_from_slice(&e.tag.to_le_bytes());
            ifds.extend_from_slice(&e.field_type.to_le_bytes());
            ifds.extend_from_slice(&e.count.to_le_bytes());
            if e.bytes.len() <= 4 {
                let mut inline = e.bytes.clone();
                inline.resize(4, 0);
                ifds.extend_from_slice(&inline);
            } else {
                let offset = (data_start + data.len()) as u32;
                ifds.extend_from_slice(&offset.to_le_bytes());
                data.extend_from_slice(&e.bytes);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }
        ifds.extend_from_slice(&0u32.to_le_bytes());
    }
    head.extend(ifds);
    head.extend(data);
    head
}

pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
