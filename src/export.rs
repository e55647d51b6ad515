//! Writing a document and its prompt next to the source file or into a chosen directory.

use std::path::{Path, PathBuf};

use crate::document::MetadataDocument;
use crate::error::{Error, Result};

/// `<stem>_<suffix>` beside `source`, or inside `out_dir` when given.
fn sibling(source: &Path, out_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = format!("{stem}_{suffix}");
    match out_dir {
        Some(dir) => dir.join(name),
        None => source.with_file_name(name),
    }
}

pub fn metadata_path(source: &Path, out_dir: Option<&Path>) -> PathBuf {
    sibling(source, out_dir, "metadata.json")
}

pub fn prompt_path(source: &Path, out_dir: Option<&Path>) -> PathBuf {
    sibling(source, out_dir, "prompt.txt")
}

/// Write the document as four-space indented JSON. Returns the written path.
pub fn export_metadata(
    document: &MetadataDocument,
    source: &Path,
    out_dir: Option<&Path>,
) -> Result<PathBuf> {
    let target = metadata_path(source, out_dir);
    std::fs::write(&target, document.to_json_pretty()?)?;
    tracing::info!(path = %target.display(), "metadata exported");
    Ok(target)
}

/// Write the prompt text unchanged. `Error::NoPrompt` when there is nothing to write.
pub fn export_prompt(prompt: Option<&str>, source: &Path, out_dir: Option<&Path>) -> Result<PathBuf> {
    let prompt = prompt.ok_or_else(|| Error::NoPrompt(source.to_path_buf()))?;
    let target = prompt_path(source, out_dir);
    std::fs::write(&target, prompt)?;
    tracing::info!(path = %target.display(), "prompt exported");
    Ok(target)
}
