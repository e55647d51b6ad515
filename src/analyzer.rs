//! Dispatcher: validates input, routes to the image or video extractor, and runs batches.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ScanConfig;
use crate::document::{Extraction, PromptCandidate};
use crate::error::{Error, Result};
use crate::imaging::{self, DecodeMode};
use crate::video::{self, BmffInspector, MediaInspector};
use crate::{classify_extension, deep_scan, MediaKind};

/// Optional collaborators available to the extractors.
#[derive(Clone)]
pub struct Capabilities {
    /// Probe images with the `image` decoder; when off, container readers alone are used.
    pub image_decoding: bool,
    pub media_inspector: Option<Arc<dyn MediaInspector>>,
}

impl Capabilities {
    /// Neither the image decoder nor a media inspector.
    pub fn minimal() -> Self {
        Self {
            image_decoding: false,
            media_inspector: None,
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn MediaInspector>) -> Self {
        self.media_inspector = Some(inspector);
        self
    }

    pub fn without_inspector(mut self) -> Self {
        self.media_inspector = None;
        self
    }

    fn decode_mode(&self) -> DecodeMode {
        if self.image_decoding {
            DecodeMode::Decoder
        } else {
            DecodeMode::ContainerOnly
        }
    }
}

impl Default for Capabilities {
    /// Image decoder on, ISO-BMFF inspector installed.
    fn default() -> Self {
        Self {
            image_decoding: true,
            media_inspector: Some(Arc::new(BmffInspector::new())),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("image_decoding", &self.image_decoding)
            .field(
                "media_inspector",
                &self.media_inspector.as_ref().map(|i| i.name().to_string()),
            )
            .finish()
    }
}

/// Entry point for extraction. Holds no per-file state; share it across threads freely.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: ScanConfig,
    capabilities: Capabilities,
}

/// Result of one path in a batch.
#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub result: Result<Extraction>,
}

impl Analyzer {
    pub fn new(config: ScanConfig, capabilities: Capabilities) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Validate `path` and run the matching extractor. Unsupported extensions and missing
    /// files are rejected before any extraction happens.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let kind = classify_extension(&extension)
            .ok_or_else(|| Error::UnsupportedExtension(format!(".{extension}")))?;
        if !path.is_file() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), ?kind, "dispatching");
        Ok(match kind {
            MediaKind::Image => self.extract_image(path),
            MediaKind::Video => self.extract_video(path),
        })
    }

    pub fn extract_image<P: AsRef<Path>>(&self, path: P) -> Extraction {
        imaging::extract_image(path.as_ref(), &self.config, self.capabilities.decode_mode())
    }

    pub fn extract_video<P: AsRef<Path>>(&self, path: P) -> Extraction {
        video::extract_video(
            path.as_ref(),
            &self.config,
            self.capabilities.media_inspector.as_deref(),
        )
    }

    pub fn deep_scan<P: AsRef<Path>>(&self, path: P) -> Result<Vec<PromptCandidate>> {
        deep_scan::deep_scan_with(path, &self.config)
    }

    /// Analyze many paths, in input order.
    #[cfg(not(feature = "parallel"))]
    pub fn analyze_batch(&self, paths: &[PathBuf]) -> Vec<BatchItem> {
        paths.iter().map(|p| self.batch_item(p)).collect()
    }

    /// Analyze many paths on the rayon pool, in input order.
    #[cfg(feature = "parallel")]
    pub fn analyze_batch(&self, paths: &[PathBuf]) -> Vec<BatchItem> {
        use rayon::prelude::*;
        paths.par_iter().map(|p| self.batch_item(p)).collect()
    }

    fn batch_item(&self, path: &Path) -> BatchItem {
        BatchItem {
            path: path.to_path_buf(),
            result: self.analyze(path),
        }
    }
}
