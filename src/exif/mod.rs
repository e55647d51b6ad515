//! EXIF block decoding.
//!
//! The block is the TIFF structure found in a JPEG APP1 segment, a PNG `eXIf` chunk or a
//! WebP `EXIF` chunk (with or without the `Exif\0\0` prefix). IFD0, the Exif IFD and the
//! Interop IFD are flattened into one ordered entry list; the GPS IFD stays nested.

mod reader;
mod tags;
pub mod tiff;

pub use reader::{bytes_repr, read_exif, reformat_exif_date};
pub use tags::{
    gps_tag_name, tag_name, TAG_EXIF_IFD, TAG_GPS_IFD, TAG_IMAGE_DESCRIPTION, TAG_INTEROP_IFD,
    TAG_SOFTWARE, TAG_USER_COMMENT, TAG_XP_COMMENT,
};

use self::tiff::{
    entry_value_bytes, read_pointer, read_tiff_header, strip_exif_prefix, walk_ifd, Endian,
    IfdEntry, TYPE_ASCII, TYPE_BYTE, TYPE_DOUBLE, TYPE_FLOAT, TYPE_LONG, TYPE_RATIONAL,
    TYPE_SBYTE, TYPE_SHORT, TYPE_SLONG, TYPE_SRATIONAL, TYPE_SSHORT, TYPE_UNDEFINED,
};

/// Largest number of IFDs followed in one block (guards against offset loops).
const MAX_IFDS: usize = 8;

/// Decoded value of one EXIF entry, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ExifValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
    List(Vec<ExifValue>),
    /// Nested IFD (GPS), keyed by raw tag id.
    Ifd(Vec<(u16, ExifValue)>),
}

impl ExifValue {
    /// Text view: strings as-is, bytes only when valid UTF-8.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ExifValue::Text(s) => Some(s.clone()),
            ExifValue::Bytes(b) => std::str::from_utf8(b).ok().map(str::to_string),
            _ => None,
        }
    }
}

/// All entries of an EXIF block in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub entries: Vec<(u16, ExifValue)>,
}

impl ExifData {
    /// Parse an EXIF block. Returns `None` when there is no valid TIFF header.
    pub fn parse(block: &[u8]) -> Option<Self> {
        let data = strip_exif_prefix(block);
        let (bo, ifd0) = read_tiff_header(data)?;
        let mut entries = Vec::new();
        let mut visited = Vec::new();
        collect_ifd(bo, data, ifd0, &mut entries, &mut visited);
        tracing::trace!(count = entries.len(), "decoded EXIF entries");
        Some(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last value recorded for `tag` (later IFDs override earlier ones).
    pub fn get(&self, tag: u16) -> Option<&ExifValue> {
        self.entries.iter().rev().find(|(t, _)| *t == tag).map(|(_, v)| v)
    }

    /// Non-empty text value of `tag`; undecodable byte values yield `None`.
    pub fn text(&self, tag: u16) -> Option<String> {
        self.get(tag)
            .and_then(ExifValue::as_text)
            .filter(|s| !s.is_empty())
    }
}

fn collect_ifd(
    bo: Endian,
    data: &[u8],
    offset: u32,
    out: &mut Vec<(u16, ExifValue)>,
    visited: &mut Vec<u32>,
) {
    if offset == 0 || visited.contains(&offset) || visited.len() >= MAX_IFDS {
        return;
    }
    visited.push(offset);
    let Some((entries, _next)) = walk_ifd(bo, data, offset) else {
        tracing::debug!(offset, "unreadable IFD");
        return;
    };
    for entry in entries {
        match entry.tag {
            TAG_EXIF_IFD | TAG_INTEROP_IFD => {
                if let Some(sub) = read_pointer(bo, data, &entry) {
                    collect_ifd(bo, data, sub, out, visited);
                }
            }
            TAG_GPS_IFD => {
                let Some(sub) = read_pointer(bo, data, &entry) else {
                    continue;
                };
                let mut gps = Vec::new();
                collect_ifd(bo, data, sub, &mut gps, visited);
                out.push((entry.tag, ExifValue::Ifd(gps)));
            }
            _ => {
                if let Some(value) = decode_entry(bo, data, &entry) {
                    out.push((entry.tag, value));
                }
            }
        }
    }
}

/// Decode one entry's value. `None` for unknown types or out-of-bounds value offsets.
fn decode_entry(bo: Endian, data: &[u8], entry: &IfdEntry) -> Option<ExifValue> {
    let raw = entry_value_bytes(data, entry)?;
    let value = match entry.field_type {
        TYPE_ASCII => {
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            ExifValue::Text(String::from_utf8_lossy(&raw[..end]).into_owned())
        }
        TYPE_BYTE | TYPE_UNDEFINED => match entry.tag {
            TAG_USER_COMMENT => decode_user_comment(bo, raw),
            0x9C9B..=0x9C9F => ExifValue::Text(decode_utf16(Endian::Little, raw)),
            _ => ExifValue::Bytes(raw.to_vec()),
        },
        TYPE_SBYTE => collapse(raw.iter().map(|&b| ExifValue::Int(b as i8 as i64)).collect()),
        TYPE_SHORT => collapse(ints(raw, 2, |o| bo.read_u16(raw, o).map(i64::from))),
        TYPE_SSHORT => collapse(ints(raw, 2, |o| bo.read_u16(raw, o).map(|v| v as i16 as i64))),
        TYPE_LONG => collapse(ints(raw, 4, |o| bo.read_u32(raw, o).map(i64::from))),
        TYPE_SLONG => collapse(ints(raw, 4, |o| bo.read_u32(raw, o).map(|v| v as i32 as i64))),
        TYPE_RATIONAL => collapse(rationals(bo, raw, false)),
        TYPE_SRATIONAL => collapse(rationals(bo, raw, true)),
        TYPE_FLOAT => collapse(
            (0..raw.len() / 4)
                .filter_map(|i| bo.read_u32(raw, i * 4))
                .map(|v| ExifValue::Float(f32::from_bits(v) as f64))
                .collect(),
        ),
        TYPE_DOUBLE => collapse(
            (0..raw.len() / 8)
                .filter_map(|i| bo.read_u64(raw, i * 8))
                .map(|v| ExifValue::Float(f64::from_bits(v)))
                .collect(),
        ),
        _ => return None,
    };
    Some(value)
}

fn ints(raw: &[u8], unit: usize, read: impl Fn(usize) -> Option<i64>) -> Vec<ExifValue> {
    (0..raw.len() / unit)
        .filter_map(|i| read(i * unit))
        .map(ExifValue::Int)
        .collect()
}

fn rationals(bo: Endian, raw: &[u8], signed: bool) -> Vec<ExifValue> {
    (0..raw.len() / 8)
        .filter_map(|i| {
            let num = bo.read_u32(raw, i * 8)?;
            let den = bo.read_u32(raw, i * 8 + 4)?;
            let (num, den) = if signed {
                (num as i32 as f64, den as i32 as f64)
            } else {
                (num as f64, den as f64)
            };
            Some(ExifValue::Float(if den == 0.0 { f64::NAN } else { num / den }))
        })
        .collect()
}

/// Single values stand alone; multiple values become a list.
fn collapse(mut values: Vec<ExifValue>) -> ExifValue {
    if values.len() == 1 {
        values.remove(0)
    } else {
        ExifValue::List(values)
    }
}

/// UserComment starts with an 8-byte character code naming the encoding of the rest.
fn decode_user_comment(bo: Endian, raw: &[u8]) -> ExifValue {
    if raw.len() < 8 {
        return ExifValue::Bytes(raw.to_vec());
    }
    let (code, body) = raw.split_at(8);
    match code {
        b"ASCII\0\0\0" => ExifValue::Text(
            String::from_utf8_lossy(body)
                .trim_end_matches('\0')
                .to_string(),
        ),
        b"UNICODE\0" => ExifValue::Text(decode_utf16(bo, body)),
        b"JIS\0\0\0\0\0" => ExifValue::Bytes(body.to_vec()),
        [0, 0, 0, 0, 0, 0, 0, 0] => {
            let end = body.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            ExifValue::Bytes(body[..end].to_vec())
        }
        _ => ExifValue::Bytes(raw.to_vec()),
    }
}

fn decode_utf16(bo: Endian, raw: &[u8]) -> String {
    let units: Vec<u16> = (0..raw.len() / 2)
        .filter_map(|i| bo.read_u16(raw, i * 2))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}
