//! Video support: the media-track inspector seam, the built-in ISO-BMFF inspector and the
//! video metadata extractor.

mod bmff;
mod extractor;
mod inspector;

pub use bmff::BmffInspector;
pub use extractor::{extract_video, LIMITED_INFORMATION};
pub use inspector::{FieldValue, MediaInspector, MediaTrack, TrackField, TrackKind};
