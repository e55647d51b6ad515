//! JPEG marker segments: frame header facts and the APPn/COM payloads that carry metadata.

use crate::info::{ContainerInfo, InfoValue};

const SOI: [u8; 2] = [0xFF, 0xD8];
const MARKER_SOS: u8 = 0xDA;
const MARKER_EOI: u8 = 0xD9;
const MARKER_COM: u8 = 0xFE;
const MARKER_APP0: u8 = 0xE0;
const MARKER_APP1: u8 = 0xE1;
const MARKER_APP2: u8 = 0xE2;
const MARKER_APP13: u8 = 0xED;
const MARKER_APP14: u8 = 0xEE;

const EXIF_ID: &[u8] = b"Exif\0\0";
const XMP_ID: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const ICC_ID: &[u8] = b"ICC_PROFILE\0";
const PHOTOSHOP_ID: &[u8] = b"Photoshop 3.0\0";

/// Key under which JPEG and WebP files carry an XMP packet.
pub const XMP_KEY: &str = "xmp";

#[inline]
pub fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[..2] == SOI && data[2] == 0xFF
}

/// One marker segment: marker byte and payload (after the length field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub marker: u8,
    pub payload: &'a [u8],
}

/// Marker segments from SOI up to (not including) the first scan.
pub fn segments(data: &[u8]) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    if !data.starts_with(&SOI) {
        return out;
    }
    let mut i = 2;
    while i + 1 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }
        let marker = data[i + 1];
        // fill bytes and standalone markers
        if marker == 0xFF {
            i += 1;
            continue;
        }
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            i += 2;
            continue;
        }
        if marker == MARKER_SOS || marker == MARKER_EOI {
            break;
        }
        let Some(len) = data
            .get(i + 2..i + 4)
            .map(|b| u16::from_be_bytes([b[0], b[1]]) as usize)
        else {
            break;
        };
        if len < 2 {
            break;
        }
        let start = i + 4;
        let Some(payload) = data.get(start..start + len - 2) else {
            tracing::debug!(marker, "truncated JPEG segment");
            break;
        };
        out.push(Segment { marker, payload });
        i = start + len - 2;
    }
    out
}

/// Read container facts from an in-memory JPEG. `None` when the SOI marker is missing.
pub fn read_info(data: &[u8]) -> Option<ContainerInfo> {
    if !is_jpeg(data) {
        return None;
    }
    let mut out = ContainerInfo {
        format: "JPEG",
        ..ContainerInfo::default()
    };
    let mut icc_parts: Vec<(u8, &[u8])> = Vec::new();
    let mut comments: Vec<InfoValue> = Vec::new();
    for seg in segments(data) {
        let p = seg.payload;
        match seg.marker {
            0xC0..=0xCF if !matches!(seg.marker, 0xC4 | 0xC8 | 0xCC) => {
                read_frame(seg.marker, p, &mut out);
            }
            MARKER_APP0 if p.starts_with(b"JFIF\0") => read_jfif(p, &mut out),
            MARKER_APP1 if p.starts_with(EXIF_ID) => {
                out.info.insert("exif".into(), InfoValue::Bytes(p.to_vec()));
            }
            MARKER_APP1 if p.starts_with(XMP_ID) => {
                out.info.insert(
                    XMP_KEY.into(),
                    InfoValue::Bytes(p[XMP_ID.len()..].to_vec()),
                );
            }
            MARKER_APP2 if p.starts_with(ICC_ID) && p.len() >= ICC_ID.len() + 2 => {
                let seq = p[ICC_ID.len()];
                icc_parts.push((seq, &p[ICC_ID.len() + 2..]));
            }
            MARKER_APP13 if p.starts_with(PHOTOSHOP_ID) => {
                let len = (p.len() - PHOTOSHOP_ID.len()) as i64;
                out.info.insert("photoshop".into(), InfoValue::Int(len));
            }
            MARKER_APP14 if p.starts_with(b"Adobe") && p.len() >= 12 => {
                let version = u16::from_be_bytes([p[5], p[6]]);
                out.info.insert("adobe".into(), InfoValue::Int(version.into()));
                out.info
                    .insert("adobe_transform".into(), InfoValue::Int(p[11].into()));
            }
            MARKER_COM => comments.push(InfoValue::Bytes(p.to_vec())),
            _ => {}
        }
    }
    if !icc_parts.is_empty() {
        icc_parts.sort_by_key(|(seq, _)| *seq);
        let profile: Vec<u8> = icc_parts.iter().flat_map(|(_, d)| d.iter().copied()).collect();
        out.info.insert("icc_profile".into(), InfoValue::Bytes(profile));
    }
    match comments.len() {
        0 => {}
        1 => {
            if let Some(c) = comments.pop() {
                out.info.insert("comment".into(), c);
            }
        }
        _ => {
            out.info.insert("comment".into(), InfoValue::List(comments));
        }
    }
    Some(out)
}

/// SOFn: precision, height, width, component count.
fn read_frame(marker: u8, p: &[u8], out: &mut ContainerInfo) {
    if p.len() < 6 {
        return;
    }
    out.bits = Some(p[0]);
    out.height = Some(u16::from_be_bytes([p[1], p[2]]).into());
    out.width = Some(u16::from_be_bytes([p[3], p[4]]).into());
    out.mode = Some(
        match p[5] {
            1 => "L",
            3 => "RGB",
            4 => "CMYK",
            _ => "Unknown",
        }
        .to_string(),
    );
    let progressive = matches!(marker, 0xC2 | 0xC6 | 0xCA | 0xCE);
    let compression = match marker {
        0xC3 | 0xC7 | 0xCB | 0xCF => "lossless",
        _ if progressive => "progressive",
        _ => "baseline",
    };
    out.compression = Some(compression.to_string());
    if progressive {
        out.info.insert("progressive".into(), InfoValue::Int(1));
        out.info.insert("progression".into(), InfoValue::Int(1));
    }
}

/// APP0 JFIF: version, density unit and densities.
fn read_jfif(p: &[u8], out: &mut ContainerInfo) {
    if p.len() < 12 {
        return;
    }
    out.info.insert(
        "jfif".into(),
        InfoValue::Int(i64::from(u16::from_be_bytes([p[5], p[6]]))),
    );
    out.info.insert(
        "jfif_version".into(),
        InfoValue::List(vec![InfoValue::Int(p[5].into()), InfoValue::Int(p[6].into())]),
    );
    let unit = p[7];
    let x = u16::from_be_bytes([p[8], p[9]]);
    let y = u16::from_be_bytes([p[10], p[11]]);
    out.info.insert("jfif_unit".into(), InfoValue::Int(unit.into()));
    let density = InfoValue::List(vec![InfoValue::Int(x.into()), InfoValue::Int(y.into())]);
    out.info.insert("jfif_density".into(), density.clone());
    match unit {
        1 => {
            out.info.insert("dpi".into(), density);
        }
        2 => {
            let dpi = |v: u16| InfoValue::Float(v as f64 * 2.54);
            out.info
                .insert("dpi".into(), InfoValue::List(vec![dpi(x), dpi(y)]));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn reads_frame_and_comment() {
        let mut jpg = SOI.to_vec();
        jpg.extend(segment(MARKER_COM, b"hello"));
        jpg.extend(segment(0xC0, &[8, 0, 20, 0, 30, 3, 0, 0, 0]));
        jpg.extend(segment(MARKER_SOS, &[0; 4]));
        let info = read_info(&jpg).unwrap();
        assert_eq!(info.width, Some(30));
        assert_eq!(info.height, Some(20));
        assert_eq!(info.mode.as_deref(), Some("RGB"));
        assert_eq!(info.info.get("comment"), Some(&InfoValue::Bytes(b"hello".to_vec())));
    }

    #[test]
    fn icc_parts_are_joined_in_order() {
        let mut jpg = SOI.to_vec();
        let mut second = ICC_ID.to_vec();
        second.extend_from_slice(&[2, 2, b'C', b'D']);
        let mut first = ICC_ID.to_vec();
        first.extend_from_slice(&[1, 2, b'A', b'B']);
        jpg.extend(segment(MARKER_APP2, &second));
        jpg.extend(segment(MARKER_APP2, &first));
        let info = read_info(&jpg).unwrap();
        assert_eq!(info.info.get("icc_profile"), Some(&InfoValue::Bytes(b"ABCD".to_vec())));
    }
}
