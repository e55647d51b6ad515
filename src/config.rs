//! Scan configuration, loadable from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Bytes of a video file handed to the binary scanner.
pub const DEFAULT_HEADER_WINDOW: usize = 32 * 1024;
/// Candidates at or below this many characters are discarded.
pub const DEFAULT_MIN_PROMPT_LEN: usize = 15;
/// Byte values and XMP packets are previewed up to this many characters.
pub const DEFAULT_PREVIEW_LEN: usize = 100;
/// Deep-scan candidates shown to the user.
pub const DEFAULT_TOP_CANDIDATES: usize = 10;
/// DALL-E description tags must be longer than this to count as a prompt.
pub const DEFAULT_DESCRIPTION_MIN_LEN: usize = 10;

/// Tunables for extraction and scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Leading bytes of a video scanned for embedded prompts
    pub header_window: usize,
    /// Minimum cleaned candidate length (exclusive)
    pub min_prompt_len: usize,
    /// Truncation length for byte previews and raw XMP
    pub preview_len: usize,
    /// Number of deep-scan candidates to report
    pub top_candidates: usize,
    /// Minimum DALL-E description length (exclusive)
    pub description_min_len: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            header_window: DEFAULT_HEADER_WINDOW,
            min_prompt_len: DEFAULT_MIN_PROMPT_LEN,
            preview_len: DEFAULT_PREVIEW_LEN,
            top_candidates: DEFAULT_TOP_CANDIDATES,
            description_min_len: DEFAULT_DESCRIPTION_MIN_LEN,
        }
    }
}

impl ScanConfig {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ScanConfig = toml::from_str(content)?;
        Ok(config)
    }
}
