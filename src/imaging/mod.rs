//! Still-image support: the decoded handle and the image metadata extractor.

mod decode;
mod extractor;

pub use decode::ImageHandle;
pub use extractor::{extract_image, format_specific_value, DecodeMode};
