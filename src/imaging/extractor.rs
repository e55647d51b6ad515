//! Image metadata extractor: builds the full document for one still image.

use std::path::Path;

use serde_json::{Map, Value};

use super::ImageHandle;
use crate::config::ScanConfig;
use crate::document::{basic_section, preview, Extraction, MetadataDocument, Section};
use crate::info::InfoValue;
use crate::provenance::{self, GENERATOR_FILENAME};
use crate::{png, xmp};

/// How the image is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Probe with the `image` decoder, then read container metadata.
    #[default]
    Decoder,
    /// Container readers only.
    ContainerOnly,
}

/// Extract every metadata section from the image at `path`. Never fails: read and decode
/// errors are recorded under `Error."Processing Error"` next to the `Basic` section.
pub fn extract_image(path: &Path, config: &ScanConfig, mode: DecodeMode) -> Extraction {
    let mut doc = MetadataDocument::new();
    let size = std::fs::metadata(path).ok().map(|m| m.len());
    doc.set_section(Section::Basic, basic_section(path, size));

    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read image");
            doc.record_error("Processing Error", e.to_string());
            return Extraction { document: doc, prompt: None };
        }
    };
    let opened = match mode {
        DecodeMode::Decoder => ImageHandle::from_bytes(&data),
        DecodeMode::ContainerOnly => ImageHandle::from_container(&data),
    };
    let handle = match opened {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot decode image");
            doc.record_error("Processing Error", e.to_string());
            return Extraction { document: doc, prompt: None };
        }
    };

    describe_image(&mut doc, &handle);

    let format_info: Map<String, Value> = handle
        .info
        .iter()
        .map(|(k, v)| (k.clone(), format_specific_value(v, config.preview_len)))
        .collect();
    if !format_info.is_empty() {
        doc.set_section(Section::FormatSpecific, format_info);
    }

    if provenance::filename_signal(path) {
        doc.insert(Section::AiMetadata, "Generator", GENERATOR_FILENAME);
    }
    let detection = provenance::detect(&handle, &data, config);
    if !detection.is_empty() {
        detection.write_into(doc.section_mut(Section::AiMetadata));
    }
    let prompt = detection.prompt().map(str::to_string);

    let named = handle.read_exif();
    if !named.is_empty() {
        doc.set_section(Section::Exif, named.into_iter().collect());
    }
    if let Some(icc) = handle.icc_profile() {
        let size = icc
            .as_bytes()
            .map(|b| format!("{} bytes", b.len()))
            .unwrap_or_else(|| "Unknown".to_string());
        doc.insert(Section::IccProfile, "Present", "Yes");
        doc.insert(Section::IccProfile, "Size", size);
    }
    if let Some(packet) = handle.xmp_packet() {
        let fields = xmp::extract_xmp_with(&packet, config.preview_len);
        doc.set_section(Section::XmpMetadata, fields.into_iter().collect());
    }
    if is_png_path(path) {
        let chunks = png::walk_bytes(&data);
        if !chunks.is_empty() {
            let mut structure = Map::new();
            structure.insert("Chunk_Count".into(), chunks.len().into());
            structure.insert("Chunks".into(), serde_json::to_value(&chunks).unwrap_or_default());
            doc.set_section(Section::PngStructure, structure);
        }
    }

    tracing::debug!(
        path = %path.display(),
        sections = doc.sections().count(),
        prompt = prompt.is_some(),
        "image extracted"
    );
    Extraction { document: doc, prompt }
}

fn describe_image(doc: &mut MetadataDocument, handle: &ImageHandle) {
    let basic = doc.section_mut(Section::Basic);
    basic.insert("Image Format".into(), handle.format.clone().into());
    basic.insert("Mode".into(), handle.mode.clone().into());
    basic.insert(
        "Dimensions".into(),
        format!("{} x {} pixels", handle.width, handle.height).into(),
    );
    basic.insert(
        "Bit Depth".into(),
        handle
            .bits
            .map(|b| b.to_string())
            .unwrap_or_else(|| "Unknown".into())
            .into(),
    );
    basic.insert(
        "Compression".into(),
        handle
            .compression
            .clone()
            .unwrap_or_else(|| "Unknown".into())
            .into(),
    );
    basic.insert(
        "Palette".into(),
        if handle.palette { "Yes" } else { "No" }.into(),
    );
}

/// `Format_Specific` rendering of one info value: scalars verbatim, UTF-8 bytes as text
/// (previewed), other bytes as a size note, lists stringified.
pub fn format_specific_value(value: &InfoValue, preview_len: usize) -> Value {
    if let Some(v) = value.scalar_value() {
        return v;
    }
    match value {
        InfoValue::Bytes(b) => match std::str::from_utf8(b) {
            Ok(text) => Value::String(preview(text, preview_len)),
            Err(_) => Value::String(format!("bytes ({} bytes)", b.len())),
        },
        other => Value::String(other.to_display()),
    }
}

fn is_png_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_render_by_validity() {
        assert_eq!(
            format_specific_value(&InfoValue::Bytes(vec![0xff, 0xfe, 0x00]), 100),
            Value::String("bytes (3 bytes)".into())
        );
        let long = InfoValue::Bytes(vec![b'x'; 120]);
        let rendered = format_specific_value(&long, 100);
        assert!(rendered.as_str().unwrap().ends_with("... (truncated)"));
    }
}
