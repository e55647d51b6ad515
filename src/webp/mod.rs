//! WebP RIFF container: canvas facts from VP8/VP8L/VP8X and the ICCP/EXIF/XMP chunks.

use crate::info::{ContainerInfo, InfoValue};
use crate::jpeg::XMP_KEY;

const VP8X_ALPHA: u8 = 0x10;
const VP8X_ANIMATION: u8 = 0x02;

#[inline]
pub fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// `(fourcc, payload)` for each complete chunk after the RIFF header.
pub fn chunks(data: &[u8]) -> Vec<(&[u8], &[u8])> {
    let mut out = Vec::new();
    let mut pos = 12;
    while pos + 8 <= data.len() {
        let fourcc = &data[pos..pos + 4];
        let size =
            u32::from_le_bytes([data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]])
                as usize;
        let start = pos + 8;
        let Some(payload) = start.checked_add(size).and_then(|end| data.get(start..end)) else {
            tracing::debug!("truncated WebP chunk");
            break;
        };
        out.push((fourcc, payload));
        // chunks are padded to even size
        pos = start + size + (size & 1);
    }
    out
}

/// Read container facts from an in-memory WebP. `None` when the RIFF header is missing.
pub fn read_info(data: &[u8]) -> Option<ContainerInfo> {
    if !is_webp(data) {
        return None;
    }
    let mut out = ContainerInfo {
        format: "WEBP",
        bits: Some(8),
        mode: Some("RGB".to_string()),
        ..ContainerInfo::default()
    };
    let mut frames = 0u32;
    for (fourcc, p) in chunks(data) {
        match fourcc {
            b"VP8 " => {
                out.compression.get_or_insert_with(|| "VP8".to_string());
                if out.width.is_none() && p.len() >= 10 && p[3..6] == [0x9D, 0x01, 0x2A] {
                    out.width = Some(u32::from(u16::from_le_bytes([p[6], p[7]]) & 0x3FFF));
                    out.height = Some(u32::from(u16::from_le_bytes([p[8], p[9]]) & 0x3FFF));
                }
            }
            b"VP8L" => {
                out.compression.get_or_insert_with(|| "VP8L".to_string());
                if out.width.is_none() && p.len() >= 5 && p[0] == 0x2F {
                    let bits = u32::from_le_bytes([p[1], p[2], p[3], p[4]]);
                    out.width = Some((bits & 0x3FFF) + 1);
                    out.height = Some(((bits >> 14) & 0x3FFF) + 1);
                    if bits & (1 << 28) != 0 {
                        out.mode = Some("RGBA".to_string());
                    }
                }
            }
            b"VP8X" if p.len() >= 10 => {
                let flags = p[0];
                out.width = Some(u24_le(&p[4..7]) + 1);
                out.height = Some(u24_le(&p[7..10]) + 1);
                if flags & VP8X_ALPHA != 0 {
                    out.mode = Some("RGBA".to_string());
                }
                if flags & VP8X_ANIMATION != 0 {
                    out.info.insert("animated".into(), InfoValue::Bool(true));
                }
            }
            b"ALPH" => out.mode = Some("RGBA".to_string()),
            b"ANIM" if p.len() >= 6 => {
                out.info.insert("animated".into(), InfoValue::Bool(true));
                out.info.insert(
                    "background".into(),
                    InfoValue::Int(u32::from_le_bytes([p[0], p[1], p[2], p[3]]).into()),
                );
                out.info.insert(
                    "loop".into(),
                    InfoValue::Int(u16::from_le_bytes([p[4], p[5]]).into()),
                );
            }
            b"ANMF" => frames += 1,
            b"ICCP" => {
                out.info.insert("icc_profile".into(), InfoValue::Bytes(p.to_vec()));
            }
            b"EXIF" => {
                out.info.insert("exif".into(), InfoValue::Bytes(p.to_vec()));
            }
            b"XMP " => {
                out.info.insert(XMP_KEY.into(), InfoValue::Bytes(p.to_vec()));
            }
            _ => {}
        }
    }
    if frames > 0 {
        out.info.insert("n_frames".into(), InfoValue::Int(frames.into()));
    }
    Some(out)
}

fn u24_le(b: &[u8]) -> u32 {
    u32::from(b[0]) | u32::from(b[1]) << 8 | u32::from(b[2]) << 16
}
