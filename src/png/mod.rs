//! PNG container: chunk structure walk and the info dictionary built from ancillary chunks.

mod chunks;
mod text;

pub use chunks::{is_png, walk, walk_bytes, walk_reader, Chunks, PngChunk, PNG_SIGNATURE};
pub use text::{read_info, INFLATE_LIMIT, XMP_KEY};
