//! Media-track inspection interface.

use std::path::Path;

use serde_json::Value;

use crate::error::Result;

/// Track category. Only the first track of each of General, Video and Audio is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    General,
    Video,
    Audio,
    Other,
}

/// Track attribute names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackField {
    Format,
    CodecId,
    Duration,
    Width,
    Height,
    FrameRate,
    FrameCount,
    SamplingRate,
    ChannelS,
    Language,
    TrackId,
    EncodedDate,
    TaggedDate,
    WritingApplication,
    Title,
    Comment,
    CompatibleBrands,
    OverallBitRate,
    FileSize,
}

impl TrackField {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackField::Format => "format",
            TrackField::CodecId => "codec_id",
            TrackField::Duration => "duration",
            TrackField::Width => "width",
            TrackField::Height => "height",
            TrackField::FrameRate => "frame_rate",
            TrackField::FrameCount => "frame_count",
            TrackField::SamplingRate => "sampling_rate",
            TrackField::ChannelS => "channel_s",
            TrackField::Language => "language",
            TrackField::TrackId => "track_id",
            TrackField::EncodedDate => "encoded_date",
            TrackField::TaggedDate => "tagged_date",
            TrackField::WritingApplication => "writing_application",
            TrackField::Title => "title",
            TrackField::Comment => "comment",
            TrackField::CompatibleBrands => "compatible_brands",
            TrackField::OverallBitRate => "overall_bit_rate",
            TrackField::FileSize => "file_size",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl FieldValue {
    /// Empty strings and zero are "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Int(i) => *i == 0,
            FieldValue::Float(f) => *f == 0.0,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => Value::from(*f),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

/// One track with its attributes in reporting order.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaTrack {
    pub kind: TrackKind,
    pub fields: Vec<(TrackField, FieldValue)>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
        }
    }

    /// Set a field, replacing an earlier value in place.
    pub fn set(&mut self, field: TrackField, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: TrackField) -> Option<&FieldValue> {
        self.fields.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }
}

/// Source of per-track media attributes.
pub trait MediaInspector: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether files with this lowercase extension (no dot) can be inspected.
    fn supports(&self, extension: &str) -> bool;

    /// All tracks of the file, General first.
    fn inspect(&self, path: &Path) -> Result<Vec<MediaTrack>>;
}
