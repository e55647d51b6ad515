//! Video metadata extractor: track sections from a media inspector plus a binary scan of
//! the file header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Map;

use super::inspector::{MediaInspector, MediaTrack, TrackKind};
use crate::config::ScanConfig;
use crate::document::{basic_section, Extraction, MetadataDocument, Section};
use crate::scanner;

/// Notice recorded when no inspector handles the container.
pub const LIMITED_INFORMATION: &str =
    "No media inspector is available for this container; track details are not reported.";

/// Extract metadata from the video at `path`. Never fails: inspector and read errors are
/// recorded under `Error`.
pub fn extract_video(
    path: &Path,
    config: &ScanConfig,
    inspector: Option<&dyn MediaInspector>,
) -> Extraction {
    let mut doc = MetadataDocument::new();
    let size = std::fs::metadata(path).ok().map(|m| m.len());
    doc.set_section(Section::Basic, basic_section(path, size));

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match inspector.filter(|i| i.supports(&extension)) {
        Some(inspector) => match inspector.inspect(path) {
            Ok(tracks) => {
                for (kind, section) in [
                    (TrackKind::General, Section::General),
                    (TrackKind::Video, Section::Video),
                    (TrackKind::Audio, Section::Audio),
                ] {
                    if let Some(track) = tracks.iter().find(|t| t.kind == kind) {
                        doc.set_section(section, track_section(track));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(inspector = inspector.name(), error = %e, "media inspection failed");
                doc.record_error("Media Inspection Error", e.to_string());
            }
        },
        None => doc.insert(Section::Notice, "Limited Information", LIMITED_INFORMATION),
    }

    let mut prompt = None;
    match read_header(path, config.header_window) {
        Ok(header) => {
            if let Some(found) = scanner::scan_with(&header, config.min_prompt_len) {
                found.write_into(doc.section_mut(Section::AiMetadata));
                prompt = Some(found.prompt);
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read video header");
            doc.record_error("Binary Analysis Error", e.to_string());
        }
    }
    Extraction { document: doc, prompt }
}

/// Non-empty fields of a track in reporting order.
fn track_section(track: &MediaTrack) -> Map<String, serde_json::Value> {
    track
        .fields
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(f, v)| (f.as_str().to_string(), v.to_value()))
        .collect()
}

fn read_header(path: &Path, window: usize) -> std::io::Result<Vec<u8>> {
    let mut header = Vec::new();
    File::open(path)?
        .take(window as u64)
        .read_to_end(&mut header)?;
    Ok(header)
}
