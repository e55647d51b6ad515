use std::path::Path;

use serde_json::{Map, Value};

use crate::config::ScanConfig;
use crate::document::AiProvenance;
use crate::exif::{ExifData, TAG_IMAGE_DESCRIPTION, TAG_SOFTWARE, TAG_USER_COMMENT};
use crate::imaging::ImageHandle;
use crate::info::InfoValue;
use crate::scanner::{self, patterns::SD_BLOCK};

pub const GENERATOR_MIDJOURNEY: &str = "Midjourney";
pub const GENERATOR_STABLE_DIFFUSION: &str = "Stable Diffusion";
pub const GENERATOR_DALLE: &str = "DALL-E";
pub const GENERATOR_GENERIC: &str = "AI Image Generator";
pub const GENERATOR_FILENAME: &str = "Midjourney (from filename)";

/// Markers of a Midjourney prompt in a `Description` text chunk.
const DESCRIPTION_MARKERS: [&str; 5] = ["--ar", "--v", "--style", "Job ID:", "/imagine"];
/// Markers of a Midjourney prompt in EXIF description tags.
const EXIF_MARKERS: [&str; 3] = ["--ar", "--v", "/imagine"];
/// EXIF tags that carry free-text descriptions, in lookup order.
const DESCRIPTION_TAGS: [u16; 2] = [TAG_IMAGE_DESCRIPTION, TAG_USER_COMMENT];
/// Info keys whose presence alone marks generator output.
const PROMPT_KEYS: [&str; 4] = ["parameters", "prompt", "sd-metadata", "ai_metadata"];

const NEGATIVE_MARKER: &str = "Negative prompt:";
const STEPS_MARKER: &str = "Steps: ";

/// Outcome of the cascade for one image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    pub provenance: Option<AiProvenance>,
    /// `Author` info value, recorded when no earlier rule fired.
    pub author: Option<String>,
    /// Generator named by a rule that found no prompt (EXIF `Software` says DALL-E).
    pub generator: Option<String>,
}

impl Detection {
    pub fn prompt(&self) -> Option<&str> {
        self.provenance.as_ref().map(|p| p.prompt.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.provenance.is_none() && self.author.is_none() && self.generator.is_none()
    }

    /// Merge into an `AI_Metadata` section.
    pub fn write_into(&self, section: &mut Map<String, Value>) {
        if let Some(author) = &self.author {
            section.insert("Author".into(), author.clone().into());
        }
        if let Some(generator) = &self.generator {
            section.insert("Generator".into(), generator.clone().into());
        }
        if let Some(p) = &self.provenance {
            p.write_into(section);
        }
    }

    fn fired(mut self, mut provenance: AiProvenance) -> Self {
        provenance.author = self.author.clone();
        self.provenance = Some(provenance);
        self
    }
}

/// Run the cascade over an opened image and its raw file bytes.
pub fn detect(handle: &ImageHandle, raw: &[u8], config: &ScanConfig) -> Detection {
    if let Some(p) = midjourney_description(handle) {
        tracing::debug!("Midjourney markers in Description");
        return Detection {
            provenance: Some(p),
            ..Detection::default()
        };
    }
    let mut found = Detection {
        author: handle
            .info("Author")
            .filter(|v| v.is_truthy())
            .map(InfoValue::to_display),
        ..Detection::default()
    };

    if let Some(p) = stable_diffusion_block(raw) {
        tracing::debug!("Stable Diffusion parameters block");
        return found.fired(p);
    }
    if let Some(exif) = &handle.exif {
        if let Some(p) = midjourney_exif(exif) {
            tracing::debug!("Midjourney markers in EXIF");
            return found.fired(p);
        }
        if software_is_dalle(exif) {
            found.generator = Some(GENERATOR_DALLE.to_string());
            if let Some(prompt) = first_description(exif, config.description_min_len) {
                tracing::debug!("DALL-E with description prompt");
                return found.fired(AiProvenance::new(GENERATOR_DALLE, prompt));
            }
        }
    }
    if let Some(p) = prompt_info_key(handle) {
        return found.fired(p);
    }
    if let Some(p) = scanner::scan_with(raw, config.min_prompt_len) {
        tracing::debug!(generator = %p.generator, "binary scan match");
        return found.fired(p);
    }
    found
}

fn midjourney_description(handle: &ImageHandle) -> Option<AiProvenance> {
    let text = handle.info("Description")?.to_display();
    DESCRIPTION_MARKERS
        .iter()
        .any(|m| text.contains(m))
        .then(|| AiProvenance::new(GENERATOR_MIDJOURNEY, text))
}

fn stable_diffusion_block(raw: &[u8]) -> Option<AiProvenance> {
    let caps = SD_BLOCK.captures(raw)?;
    let body = caps.get(1).map_or(&[][..], |m| m.as_bytes());
    let text = decode_dropping_invalid(body).trim().to_string();
    let mut provenance = AiProvenance::new(GENERATOR_STABLE_DIFFUSION, text.clone());
    if let Some(sd) = split_sd_parameters(&text) {
        provenance.positive_prompt = Some(sd.positive);
        provenance.negative_prompt = Some(sd.negative);
        provenance.parameters = sd.parameters;
    }
    Some(provenance)
}

/// Stable Diffusion parameter text split at `Negative prompt:` and `Steps: `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdParameters {
    pub positive: String,
    pub negative: String,
    pub parameters: Option<String>,
}

/// Split a parameters block. `None` when it has no negative prompt.
pub fn split_sd_parameters(text: &str) -> Option<SdParameters> {
    let (positive, rest) = text.split_once(NEGATIVE_MARKER)?;
    let rest = rest.trim();
    let (negative, parameters) = match rest.find(STEPS_MARKER) {
        Some(at) => (rest[..at].trim(), Some(rest[at..].trim().to_string())),
        None => (rest, None),
    };
    Some(SdParameters {
        positive: positive.trim().to_string(),
        negative: negative.to_string(),
        parameters,
    })
}

fn midjourney_exif(exif: &ExifData) -> Option<AiProvenance> {
    DESCRIPTION_TAGS.iter().find_map(|&tag| {
        let text = exif.text(tag)?;
        EXIF_MARKERS
            .iter()
            .any(|m| text.contains(m))
            .then(|| AiProvenance::new(GENERATOR_MIDJOURNEY, text))
    })
}

fn software_is_dalle(exif: &ExifData) -> bool {
    exif.text(TAG_SOFTWARE)
        .is_some_and(|s| s.contains(GENERATOR_DALLE))
}

fn first_description(exif: &ExifData, min_len: usize) -> Option<String> {
    DESCRIPTION_TAGS
        .iter()
        .filter_map(|&tag| exif.text(tag))
        .find(|text| text.chars().count() > min_len)
}

fn prompt_info_key(handle: &ImageHandle) -> Option<AiProvenance> {
    PROMPT_KEYS.iter().find_map(|key| {
        let value = handle.info(key)?;
        tracing::debug!(key, "generator info key");
        Some(AiProvenance::new(GENERATOR_GENERIC, value.to_display()))
    })
}

/// UTF-8 decode that drops invalid sequences instead of substituting them.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Weak signal: a file name of three or more `_`-separated parts.
pub fn filename_signal(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().split('_').count() >= 3)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_without_steps_keeps_whole_negative() {
        let sd = split_sd_parameters("a cat Negative prompt: dogs").unwrap();
        assert_eq!(sd.positive, "a cat");
        assert_eq!(sd.negative, "dogs");
        assert_eq!(sd.parameters, None);
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        assert_eq!(decode_dropping_invalid(b"a\xffb"), "ab");
        assert_eq!(decode_dropping_invalid("x\u{FFFD}y".as_bytes()), "x\u{FFFD}y");
    }
}
