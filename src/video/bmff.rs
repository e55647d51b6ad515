//! ISO base media file (MP4/MOV) inspector. Top-level boxes are seeked over; only `ftyp`
//! and `moov` are loaded.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{Duration, NaiveDate};

use super::inspector::{MediaInspector, MediaTrack, TrackField, TrackKind};
use crate::error::{Error, Result};

const BOX_HEADER_LEN: u64 = 8;
const LARGE_HEADER_LEN: u64 = 16;
/// Largest `moov` payload loaded into memory.
const MAX_MOOV_LEN: u64 = 64 * 1024 * 1024;
const MAX_FTYP_LEN: u64 = 4096;

/// Inspector for `mp4` and `mov` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BmffInspector;

impl BmffInspector {
    pub fn new() -> Self {
        Self
    }

    pub fn extensions() -> &'static [&'static str] {
        &["mp4", "mov", "m4v"]
    }
}

impl MediaInspector for BmffInspector {
    fn name(&self) -> &str {
        "bmff"
    }

    fn supports(&self, extension: &str) -> bool {
        Self::extensions().contains(&extension)
    }

    fn inspect(&self, path: &Path) -> Result<Vec<MediaTrack>> {
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        let top = read_top_level(&mut reader, file_size)?;
        let moov = top
            .moov
            .ok_or_else(|| Error::Inspect("no moov box found".into()))?;
        Ok(tracks_from(&top.ftyp, &moov, file_size))
    }
}

#[derive(Debug, Default)]
struct TopLevel {
    ftyp: Vec<u8>,
    moov: Option<Vec<u8>>,
}

fn read_top_level<R: Read + Seek>(reader: &mut R, file_size: u64) -> Result<TopLevel> {
    let mut top = TopLevel::default();
    let mut pos = 0u64;
    let mut seen_any = false;
    while pos.checked_add(BOX_HEADER_LEN).is_some_and(|end| end <= file_size) {
        reader.seek(SeekFrom::Start(pos))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let kind = [header[4], header[5], header[6], header[7]];
        if !kind.iter().all(|b| b.is_ascii_graphic() || *b == b' ' || *b == 0xA9) {
            if seen_any {
                tracing::debug!(pos, "garbage after last box");
                break;
            }
            return Err(Error::Inspect("not an ISO base media file".into()));
        }
        seen_any = true;
        let (header_len, size) = match size32 {
            0 => (BOX_HEADER_LEN, file_size - pos),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (LARGE_HEADER_LEN, u64::from_be_bytes(large))
            }
            n => (BOX_HEADER_LEN, u64::from(n)),
        };
        if size < header_len {
            return Err(Error::Inspect(format!("box at {pos} has invalid size {size}")));
        }
        let payload_len = size - header_len;
        match &kind {
            b"ftyp" if payload_len <= MAX_FTYP_LEN => {
                top.ftyp = read_payload(reader, payload_len)?;
            }
            b"moov" if top.moov.is_none() => {
                if payload_len > MAX_MOOV_LEN {
                    return Err(Error::Inspect(format!("moov box too large ({payload_len} bytes)")));
                }
                top.moov = Some(read_payload(reader, payload_len)?);
            }
            _ => {}
        }
        match pos.checked_add(size) {
            Some(next) => pos = next,
            None => break,
        }
    }
    Ok(top)
}

fn read_payload<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut buf)?;
    if (buf.len() as u64) < len {
        return Err(Error::Inspect("box payload truncated".into()));
    }
    Ok(buf)
}

/// Child boxes of a container payload: `(type, payload)`.
fn children(data: &[u8]) -> Vec<([u8; 4], &[u8])> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos + 8 <= data.len() {
        let size = be_u32(data, pos).unwrap_or(0) as usize;
        let kind = [data[pos + 4], data[pos + 5], data[pos + 6], data[pos + 7]];
        let (header, size) = match size {
            0 => (8, data.len() - pos),
            1 => match be_u64(data, pos + 8).and_then(|large| usize::try_from(large).ok()) {
                Some(large) => (16, large),
                None => break,
            },
            n => (8, n),
        };
        if size < header {
            break;
        }
        let Some(end) = pos.checked_add(size).filter(|&end| end <= data.len()) else {
            break;
        };
        out.push((kind, &data[pos + header..end]));
        pos = end;
    }
    out
}

fn child<'a>(data: &'a [u8], kind: &[u8; 4]) -> Option<&'a [u8]> {
    children(data)
        .into_iter()
        .find(|(k, _)| k == kind)
        .map(|(_, p)| p)
}

fn path<'a>(data: &'a [u8], kinds: &[&[u8; 4]]) -> Option<&'a [u8]> {
    kinds.iter().try_fold(data, |cur, kind| child(cur, kind))
}

fn tracks_from(ftyp: &[u8], moov: &[u8], file_size: u64) -> Vec<MediaTrack> {
    let mut general = MediaTrack::new(TrackKind::General);
    let brand = ftyp.get(0..4).map(fourcc);
    general.set(
        TrackField::Format,
        match brand.as_deref() {
            Some("qt  ") => "QuickTime",
            _ => "MPEG-4",
        },
    );
    if let Some(brand) = &brand {
        general.set(TrackField::CodecId, brand.trim().to_string());
        let compatible: Vec<String> = ftyp
            .get(8..)
            .unwrap_or_default()
            .chunks_exact(4)
            .map(|c| fourcc(c).trim().to_string())
            .collect();
        if !compatible.is_empty() {
            general.set(TrackField::CompatibleBrands, compatible.join("/"));
        }
    }
    general.set(TrackField::FileSize, file_size as i64);

    if let Some(mvhd) = child(moov, b"mvhd") {
        if let Some(h) = read_time_header(mvhd) {
            if let Some(ms) = h.duration_ms() {
                general.set(TrackField::Duration, ms);
                if ms > 0 {
                    general.set(TrackField::OverallBitRate, (file_size as i64 * 8 * 1000) / ms);
                }
            }
            if let Some(date) = bmff_date(h.created) {
                general.set(TrackField::EncodedDate, date);
            }
            if let Some(date) = bmff_date(h.modified) {
                general.set(TrackField::TaggedDate, date);
            }
        }
    }
    read_user_data(moov, &mut general);

    let mut tracks = vec![general];
    for (kind, trak) in children(moov) {
        if &kind == b"trak" {
            tracks.push(read_trak(trak));
        }
    }
    tracks
}

/// Creation/modification times and duration shared by `mvhd` and `mdhd`.
struct TimeHeader {
    created: u64,
    modified: u64,
    timescale: u32,
    duration: u64,
}

impl TimeHeader {
    fn duration_ms(&self) -> Option<i64> {
        (self.timescale != 0).then(|| (self.duration as f64 * 1000.0 / self.timescale as f64) as i64)
    }

    fn seconds(&self) -> Option<f64> {
        (self.timescale != 0).then(|| self.duration as f64 / self.timescale as f64)
    }
}

fn read_time_header(p: &[u8]) -> Option<TimeHeader> {
    let version = *p.first()?;
    if version == 1 {
        Some(TimeHeader {
            created: be_u64(p, 4)?,
            modified: be_u64(p, 12)?,
            timescale: be_u32(p, 20)?,
            duration: be_u64(p, 24)?,
        })
    } else {
        Some(TimeHeader {
            created: be_u32(p, 4)?.into(),
            modified: be_u32(p, 8)?.into(),
            timescale: be_u32(p, 12)?,
            duration: be_u32(p, 16)?.into(),
        })
    }
}

fn bmff_date(secs: u64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1904, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let secs = i64::try_from(secs).ok()?;
    let at = epoch.checked_add_signed(Duration::try_seconds(secs)?)?;
    Some(format!("{} UTC", at.format("%Y-%m-%d %H:%M:%S")))
}

fn read_trak(trak: &[u8]) -> MediaTrack {
    let handler = path(trak, &[b"mdia", b"hdlr"])
        .and_then(|h| h.get(8..12))
        .map(fourcc);
    let kind = match handler.as_deref() {
        Some("vide") => TrackKind::Video,
        Some("soun") => TrackKind::Audio,
        _ => TrackKind::Other,
    };
    let mut track = MediaTrack::new(kind);

    if let Some(tkhd) = child(trak, b"tkhd") {
        let version = tkhd.first().copied().unwrap_or(0);
        let id_at = if version == 1 { 20 } else { 12 };
        if let Some(id) = be_u32(tkhd, id_at) {
            track.set(TrackField::TrackId, i64::from(id));
        }
    }

    let mdhd = path(trak, &[b"mdia", b"mdhd"]).and_then(|p| {
        let header = read_time_header(p)?;
        let lang_at = if p.first() == Some(&1) { 32 } else { 20 };
        Some((header, be_u16(p, lang_at)))
    });
    let mut seconds = None;
    if let Some((header, lang)) = &mdhd {
        if let Some(ms) = header.duration_ms() {
            track.set(TrackField::Duration, ms);
        }
        seconds = header.seconds();
        if let Some(lang) = lang.and_then(unpack_language) {
            track.set(TrackField::Language, lang);
        }
        if let Some(date) = bmff_date(header.created) {
            track.set(TrackField::EncodedDate, date);
        }
        if let Some(date) = bmff_date(header.modified) {
            track.set(TrackField::TaggedDate, date);
        }
    }

    let stbl = path(trak, &[b"mdia", b"minf", b"stbl"]);
    if let Some(entry) = stbl.and_then(|s| child(s, b"stsd")).and_then(first_sample_entry) {
        let (codec, body) = entry;
        track.set(TrackField::Format, codec_format(&codec));
        track.set(TrackField::CodecId, codec.trim().to_string());
        match kind {
            TrackKind::Video => {
                if let (Some(w), Some(h)) = (be_u16(body, 24), be_u16(body, 26)) {
                    track.set(TrackField::Width, i64::from(w));
                    track.set(TrackField::Height, i64::from(h));
                }
            }
            TrackKind::Audio => {
                if let Some(channels) = be_u16(body, 16) {
                    track.set(TrackField::ChannelS, i64::from(channels));
                }
                if let Some(rate) = be_u32(body, 24) {
                    track.set(TrackField::SamplingRate, i64::from(rate >> 16));
                }
            }
            _ => {}
        }
    }

    if let Some(frames) = stbl.and_then(|s| child(s, b"stts")).and_then(sample_count) {
        if kind == TrackKind::Video {
            track.set(TrackField::FrameCount, frames as i64);
            if let Some(secs) = seconds.filter(|s| *s > 0.0) {
                let rate = (frames as f64 / secs * 1000.0).round() / 1000.0;
                track.set(TrackField::FrameRate, rate);
            }
        }
    }
    track
}

/// First `stsd` entry: codec fourcc and the entry body after its 8-byte header.
fn first_sample_entry(stsd: &[u8]) -> Option<(String, &[u8])> {
    let entries = stsd.get(8..)?;
    let (kind, body) = children(entries).into_iter().next()?;
    Some((fourcc(&kind), body))
}

fn sample_count(stts: &[u8]) -> Option<u64> {
    let count = be_u32(stts, 4)? as usize;
    let total = (0..count)
        .map_while(|i| be_u32(stts, 8 + i * 8))
        .map(u64::from)
        .sum();
    Some(total)
}

fn codec_format(codec: &str) -> String {
    match codec {
        "avc1" | "avc3" => "AVC",
        "hvc1" | "hev1" => "HEVC",
        "av01" => "AV1",
        "vp09" => "VP9",
        "mp4a" => "AAC",
        "ac-3" => "AC-3",
        "ec-3" => "E-AC-3",
        "Opus" => "Opus",
        "mp4v" => "MPEG-4 Visual",
        "apcn" | "apch" | "apcs" | "apco" | "ap4h" => "ProRes",
        other => other.trim(),
    }
    .to_string()
}

/// ISO-639-2/T code packed as three 5-bit letters.
fn unpack_language(packed: u16) -> Option<String> {
    let letters: String = [10u16, 5, 0]
        .iter()
        .map(|shift| (((packed >> shift) & 0x1F) as u8 + 0x60) as char)
        .collect();
    (letters.chars().all(|c| c.is_ascii_lowercase()) && letters != "und").then_some(letters)
}

/// `udta` metadata: iTunes-style `meta/ilst` items and QuickTime `©xxx` text atoms.
fn read_user_data(moov: &[u8], general: &mut MediaTrack) {
    let Some(udta) = child(moov, b"udta") else {
        return;
    };
    for (kind, payload) in children(udta) {
        if let Some(field) = user_data_field(&kind) {
            if let Some(text) = quicktime_text(payload) {
                general.set(field, text);
            }
        }
    }
    let Some(meta) = child(udta, b"meta") else {
        return;
    };
    // ISO `meta` is a full box; QuickTime's starts directly with children
    let meta = if meta.get(4..8) == Some(&b"hdlr"[..]) { meta } else { meta.get(4..).unwrap_or_default() };
    let Some(ilst) = child(meta, b"ilst") else {
        return;
    };
    for (kind, item) in children(ilst) {
        let Some(field) = user_data_field(&kind) else {
            continue;
        };
        if let Some(text) = child(item, b"data").and_then(|d| d.get(8..)) {
            let text = String::from_utf8_lossy(text).trim_end_matches('\0').to_string();
            if field != TrackField::Comment || general.get(TrackField::Comment).is_none() {
                general.set(field, text);
            }
        }
    }
}

fn user_data_field(kind: &[u8; 4]) -> Option<TrackField> {
    match *kind {
        [0xA9, b't', b'o', b'o'] | [0xA9, b's', b'w', b'r'] => Some(TrackField::WritingApplication),
        [0xA9, b'n', b'a', b'm'] => Some(TrackField::Title),
        [0xA9, b'c', b'm', b't'] | [b'd', b'e', b's', b'c'] => Some(TrackField::Comment),
        _ => None,
    }
}

/// QuickTime user-data text: 16-bit length, 16-bit language, text.
fn quicktime_text(payload: &[u8]) -> Option<String> {
    let len = be_u16(payload, 0)? as usize;
    let text = payload.get(4..4 + len)?;
    Some(String::from_utf8_lossy(text).into_owned())
}

fn fourcc(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}

#[inline]
fn be_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
    Some(u16::from_be_bytes(bytes))
}

#[inline]
fn be_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_be_bytes(bytes))
}

#[inline]
fn be_u64(data: &[u8], offset: usize) -> Option<u64> {
    let bytes: [u8; 8] = data.get(offset..offset + 8)?.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
