//! # provscan
//!
//! Library to pull metadata and AI-generation provenance out of images and videos: which
//! generator produced a file and the text prompt used, recovered from structured metadata
//! (EXIF, PNG text chunks, XMP) and, failing that, from pattern scans of the raw bytes.
//!
//! ## Supported formats
//!
//! - **PNG, JPEG, WEBP**: `Basic` file facts, `Format_Specific` container info, `EXIF`,
//!   `ICC_Profile`, `XMP_Metadata`, `PNG_Structure` (PNG only) and `AI_Metadata`.
//! - **MP4, MOV**: `General`/`Video`/`Audio` track sections from the ISO-BMFF inspector.
//! - **WEBM**: accepted; track details need a [`MediaInspector`] that supports it.
//!
//! ## Provenance
//!
//! Images go through an ordered cascade (Midjourney `Description`, Stable Diffusion
//! `parameters` block, Midjourney EXIF markers, DALL-E `Software` tag, generic prompt keys,
//! binary scan); the first rule that fires wins. Videos only get the binary scan of the
//! first 32 KiB. [`deep_scan`] lists every candidate in a file, longest first.
//!
//! ## Example
//!
//! ```no_run
//! use provscan::{Analyzer, Section};
//!
//! let analyzer = Analyzer::default();
//! let extraction = analyzer.analyze("render_0001_upscaled.png").unwrap();
//! if let Some(prompt) = &extraction.prompt {
//!     println!("prompt: {prompt}");
//! }
//! println!("{:?}", extraction.document.get_str(Section::AiMetadata, "Generator"));
//! ```
//!
//! ## Throughput
//!
//! - Each call is independent; an [`Analyzer`] can be shared across threads.
//! - For many files, use [`Analyzer::analyze_batch`]; with the `parallel` feature it runs
//!   on the rayon pool.

pub mod analyzer;
pub mod config;
pub mod deep_scan;
pub mod document;
pub mod error;
pub mod exif;
pub mod export;
pub mod imaging;
pub mod info;
pub mod jpeg;
pub mod png;
pub mod provenance;
pub mod scanner;
pub mod video;
pub mod webp;
pub mod xmp;

pub use analyzer::{Analyzer, BatchItem, Capabilities};
pub use config::ScanConfig;
pub use deep_scan::{deep_scan, deep_scan_with};
pub use document::{AiProvenance, Extraction, MetadataDocument, PromptCandidate, Section};
pub use error::{Error, Result};
pub use imaging::{extract_image, ImageHandle};
pub use png::{walk, walk_bytes, PngChunk};
pub use provenance::{detect, Detection};
pub use scanner::{scan, scan_all};
pub use video::{extract_video, BmffInspector, MediaInspector};
pub use xmp::extract_xmp;

/// Image extensions accepted by the dispatcher (lowercase, no dot).
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];
/// Video extensions accepted by the dispatcher (lowercase, no dot).
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "mov", "webm"];

/// Routing class of a supported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Short label for display.
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Classify a lowercase extension without the dot. `None` means unsupported.
#[inline]
pub fn classify_extension(extension: &str) -> Option<MediaKind> {
    if IMAGE_EXTENSIONS.contains(&extension) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Detect the media kind from magic bytes (no extension needed).
/// Use this to check that content matches the extension.
#[inline]
pub fn detect_media_kind(data: &[u8]) -> Option<MediaKind> {
    if png::is_png(data) || jpeg::is_jpeg(data) || webp::is_webp(data) {
        return Some(MediaKind::Image);
    }
    if data.len() >= 8 && &data[4..8] == b"ftyp" {
        return Some(MediaKind::Video);
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(MediaKind::Video);
    }
    None
}

/// Analyze one file with the default configuration and capabilities.
pub fn analyze<P: AsRef<std::path::Path>>(path: P) -> Result<Extraction> {
    Analyzer::default().analyze(path)
}
