//! Error type for the dispatcher, deep scan, export and configuration loading.
//!
//! Extractors never return these: decode problems are recorded inside the document.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type: {0}")]
    UnsupportedExtension(String),

    #[error("Not a valid file: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Media inspection error: {0}")]
    Inspect(String),

    #[error("No prompt to export for {}", .0.display())]
    NoPrompt(PathBuf),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
