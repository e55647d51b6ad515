//! PNG info dictionary: IHDR facts plus text, colour-profile, EXIF, resolution and timing
//! chunks, keyed the way image libraries conventionally expose them.

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::chunks::{is_png, Chunks};
use crate::info::{latin1, ContainerInfo, InfoValue};

/// Cap on the inflated size of one compressed chunk.
pub const INFLATE_LIMIT: u64 = 8 * 1024 * 1024;

/// Key under which PNG files carry an XMP packet.
pub const XMP_KEY: &str = "XML:com.adobe.xmp";

const METERS_PER_INCH: f64 = 0.0254;

/// Read container facts from an in-memory PNG. `None` when the signature is missing.
pub fn read_info(data: &[u8]) -> Option<ContainerInfo> {
    if !is_png(data) {
        return None;
    }
    let mut out = ContainerInfo {
        format: "PNG",
        compression: Some("deflate".to_string()),
        ..ContainerInfo::default()
    };
    for (kind, body) in Chunks::new(data) {
        match kind {
            b"IHDR" => read_ihdr(body, &mut out),
            b"PLTE" => out.palette = true,
            b"tEXt" => {
                if let Some((key, text)) = split_keyword(body) {
                    out.info
                        .insert(latin1(key), InfoValue::Text(latin1(text)));
                }
            }
            b"zTXt" => {
                if let Some((key, rest)) = split_keyword(body) {
                    // rest[0] is the compression method; only zlib exists
                    if let Some(text) = rest.get(1..).and_then(inflate) {
                        out.info.insert(latin1(key), InfoValue::Text(latin1(&text)));
                    }
                }
            }
            b"iTXt" => {
                if let Some((key, text)) = read_itxt(body) {
                    out.info.insert(key, InfoValue::Text(text));
                }
            }
            b"iCCP" => {
                if let Some((_, rest)) = split_keyword(body) {
                    if let Some(profile) = rest.get(1..).and_then(inflate) {
                        out.info
                            .insert("icc_profile".into(), InfoValue::Bytes(profile));
                    }
                }
            }
            b"eXIf" => {
                out.info
                    .insert("exif".into(), InfoValue::Bytes(body.to_vec()));
            }
            b"pHYs" => read_phys(body, &mut out),
            b"gAMA" => {
                if let Some(raw) = be_u32(body, 0) {
                    out.info
                        .insert("gamma".into(), InfoValue::Float(raw as f64 / 100_000.0));
                }
            }
            b"sRGB" => {
                if let Some(&intent) = body.first() {
                    out.info.insert("srgb".into(), InfoValue::Int(intent.into()));
                }
            }
            b"tIME" => {
                if let Some(stamp) = read_time(body) {
                    out.info
                        .insert("modification_time".into(), InfoValue::Text(stamp));
                }
            }
            _ => {}
        }
    }
    Some(out)
}

fn read_ihdr(body: &[u8], out: &mut ContainerInfo) {
    if body.len() < 13 {
        return;
    }
    out.width = be_u32(body, 0);
    out.height = be_u32(body, 4);
    let depth = body[8];
    let color_type = body[9];
    out.bits = Some(depth);
    out.mode = Some(png_mode(color_type, depth).to_string());
    if body[12] == 1 {
        out.info.insert("interlace".into(), InfoValue::Int(1));
    }
}

/// Conventional pixel-mode name for an IHDR colour type and bit depth.
fn png_mode(color_type: u8, depth: u8) -> &'static str {
    match (color_type, depth) {
        (0, 1) => "1",
        (0, 16) => "I;16",
        (0, _) => "L",
        (2, _) => "RGB",
        (3, _) => "P",
        (4, _) => "LA",
        (6, _) => "RGBA",
        _ => "Unknown",
    }
}

fn read_phys(body: &[u8], out: &mut ContainerInfo) {
    let (Some(px), Some(py), Some(&unit)) = (be_u32(body, 0), be_u32(body, 4), body.get(8)) else {
        return;
    };
    if unit == 1 {
        let dpi = |v: u32| v as f64 * METERS_PER_INCH;
        out.info.insert(
            "dpi".into(),
            InfoValue::List(vec![InfoValue::Float(dpi(px)), InfoValue::Float(dpi(py))]),
        );
    } else {
        out.info.insert(
            "aspect".into(),
            InfoValue::List(vec![InfoValue::Int(px.into()), InfoValue::Int(py.into())]),
        );
    }
}

fn read_time(body: &[u8]) -> Option<String> {
    if body.len() < 7 {
        return None;
    }
    let year = u16::from_be_bytes([body[0], body[1]]);
    Some(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, body[2], body[3], body[4], body[5], body[6]
    ))
}

/// iTXt: keyword, compression flag, method, language tag, translated keyword, UTF-8 text.
fn read_itxt(body: &[u8]) -> Option<(String, String)> {
    let (key, rest) = split_keyword(body)?;
    let flag = *rest.first()?;
    let after = rest.get(2..)?;
    let lang_end = after.iter().position(|&b| b == 0)?;
    let after_lang = &after[lang_end + 1..];
    let trans_end = after_lang.iter().position(|&b| b == 0)?;
    let text = &after_lang[trans_end + 1..];
    let text = if flag == 1 {
        String::from_utf8_lossy(&inflate(text)?).into_owned()
    } else {
        String::from_utf8_lossy(text).into_owned()
    };
    Some((latin1(key), text))
}

/// Split a chunk body at the NUL ending its keyword.
fn split_keyword(body: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = body.iter().position(|&b| b == 0)?;
    Some((&body[..nul], &body[nul + 1..]))
}

fn inflate(data: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    match ZlibDecoder::new(data).take(INFLATE_LIMIT).read_to_end(&mut out) {
        Ok(_) => Some(out),
        Err(e) => {
            tracing::debug!(error = %e, "failed to inflate PNG chunk");
            None
        }
    }
}

#[inline]
fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}
