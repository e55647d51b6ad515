//! Result types: the sectioned metadata document, AI provenance and prompt candidates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::Result;

/// Top-level section of a [`MetadataDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Basic,
    Exif,
    FormatSpecific,
    IccProfile,
    XmpMetadata,
    PngStructure,
    AiMetadata,
    General,
    Video,
    Audio,
    Error,
    Notice,
}

impl Section {
    /// Key used for this section in the serialized document.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Basic => "Basic",
            Section::Exif => "EXIF",
            Section::FormatSpecific => "Format_Specific",
            Section::IccProfile => "ICC_Profile",
            Section::XmpMetadata => "XMP_Metadata",
            Section::PngStructure => "PNG_Structure",
            Section::AiMetadata => "AI_Metadata",
            Section::General => "General",
            Section::Video => "Video",
            Section::Audio => "Audio",
            Section::Error => "Error",
            Section::Notice => "Notice",
        }
    }
}

/// Ordered mapping from section name to a mapping of scalars, nested mappings and sequences.
///
/// Sections and keys keep insertion order through serialization. Re-inserting an existing key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    sections: Map<String, Value>,
}

impl MetadataDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn contains(&self, section: Section) -> bool {
        self.sections.contains_key(section.as_str())
    }

    /// Section contents, if the section exists.
    pub fn section(&self, section: Section) -> Option<&Map<String, Value>> {
        self.sections.get(section.as_str()).and_then(Value::as_object)
    }

    /// Section contents, created empty on first access.
    pub fn section_mut(&mut self, section: Section) -> &mut Map<String, Value> {
        let slot = self
            .sections
            .entry(section.as_str())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        match slot {
            Value::Object(map) => map,
            _ => unreachable!("section slot was just made an object"),
        }
    }

    /// Replace a whole section.
    pub fn set_section(&mut self, section: Section, contents: Map<String, Value>) {
        self.sections
            .insert(section.as_str().to_string(), Value::Object(contents));
    }

    pub fn insert(&mut self, section: Section, key: impl Into<String>, value: impl Into<Value>) {
        self.section_mut(section).insert(key.into(), value.into());
    }

    pub fn get(&self, section: Section, key: &str) -> Option<&Value> {
        self.section(section)?.get(key)
    }

    pub fn get_str(&self, section: Section, key: &str) -> Option<&str> {
        self.get(section, key)?.as_str()
    }

    /// Record a recoverable failure under the `Error` section.
    pub fn record_error(&mut self, key: &str, message: impl Into<String>) {
        self.insert(Section::Error, key, message.into());
    }

    /// Iterate `(section name, value)` pairs in document order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize as JSON indented by four spaces.
    pub fn to_json_pretty(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.sections.clone())
    }
}

/// Generator and prompt recovered from a file. At most one per file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiProvenance {
    pub generator: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positive_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl AiProvenance {
    pub fn new(generator: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            generator: generator.into(),
            prompt: prompt.into(),
            positive_prompt: None,
            negative_prompt: None,
            parameters: None,
            author: None,
        }
    }

    /// The prompt as a ranked candidate.
    pub fn candidate(&self) -> PromptCandidate {
        PromptCandidate::new(self.prompt.clone())
    }

    /// Merge into an `AI_Metadata` section, overwriting keys it sets and keeping the rest.
    pub fn write_into(&self, section: &mut Map<String, Value>) {
        if let Some(author) = &self.author {
            section.insert("Author".into(), author.clone().into());
        }
        section.insert("Generator".into(), self.generator.clone().into());
        section.insert("prompt".into(), self.prompt.clone().into());
        let optional = [
            ("positive_prompt", &self.positive_prompt),
            ("negative_prompt", &self.negative_prompt),
            ("parameters", &self.parameters),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                section.insert(key.into(), v.clone().into());
            }
        }
    }
}

/// A possible prompt found by pattern scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptCandidate {
    pub text: String,
    /// Length in characters.
    pub length: usize,
}

impl PromptCandidate {
    pub fn new(text: String) -> Self {
        let length = text.chars().count();
        Self { text, length }
    }
}

/// Output of one extractor call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub document: MetadataDocument,
    pub prompt: Option<String>,
}

/// First `max_chars` characters, with a truncation marker when the text is longer.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}... (truncated)", &text[..cut]),
        None => text.to_string(),
    }
}

const MIB: u64 = 1024 * 1024;

/// Human-readable size: one decimal in KB below 1 MiB, two decimals in MB from 1 MiB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    }
}

/// Uppercased extension without the dot (`photo.jpeg` -> `JPEG`).
pub fn extension_label(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_uppercase()
}

/// The `Basic` section every extractor records first.
pub fn basic_section(path: &Path, size: Option<u64>) -> Map<String, Value> {
    let mut basic = Map::new();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    basic.insert("File Name".into(), name.into());
    basic.insert(
        "File Size".into(),
        size.map(format_file_size)
            .unwrap_or_else(|| "Unknown".to_string())
            .into(),
    );
    basic.insert("File Path".into(), path.display().to_string().into());
    basic.insert("File Extension".into(), extension_label(path).into());
    basic
}
