//! Exhaustive prompt search over a whole file.

use std::path::Path;

use crate::config::ScanConfig;
use crate::document::PromptCandidate;
use crate::error::Result;
use crate::scanner::scan_all_with;

/// Every prompt candidate in the file at `path`, longest first.
pub fn deep_scan<P: AsRef<Path>>(path: P) -> Result<Vec<PromptCandidate>> {
    deep_scan_with(path, &ScanConfig::default())
}

pub fn deep_scan_with<P: AsRef<Path>>(path: P, config: &ScanConfig) -> Result<Vec<PromptCandidate>> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let found = scan_all_with(&data, config.min_prompt_len);
    tracing::debug!(path = %path.display(), candidates = found.len(), "deep scan finished");
    Ok(found)
}

/// `#i (Length: n):` listing of the first `limit` candidates.
pub fn format_candidates(candidates: &[PromptCandidate], limit: usize) -> String {
    let mut out = String::new();
    for (i, c) in candidates.iter().take(limit).enumerate() {
        out.push_str(&format!("#{} (Length: {}):\n{}\n\n", i + 1, c.length, c.text));
    }
    out
}

/// The detected prompt when there is one, else the longest candidate.
pub fn best_prompt(detected: Option<&str>, candidates: &[PromptCandidate]) -> Option<String> {
    detected
        .map(str::to_string)
        .or_else(|| candidates.first().map(|c| c.text.clone()))
}
