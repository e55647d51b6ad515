use std::collections::HashSet;

use regex::bytes::{Captures, Regex};
use serde_json::Value;

use crate::config::DEFAULT_MIN_PROMPT_LEN;
use crate::document::{AiProvenance, PromptCandidate};
use crate::scanner::patterns::{DEEP_PATTERNS, JSON_PATTERNS, TEXT_PATTERNS};

pub const GENERATOR_JSON: &str = "AI Generator (from JSON)";
pub const GENERATOR_BINARY: &str = "AI Generator (from binary data)";

/// Decode permissively and blank out everything outside printable ASCII, then trim.
pub fn clean_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .map(|c| if (' '..='~').contains(&c) { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Single best match with the default length threshold.
pub fn scan(buffer: &[u8]) -> Option<AiProvenance> {
    scan_with(buffer, DEFAULT_MIN_PROMPT_LEN)
}

/// Single best match: JSON spans first, then text patterns whose cleaned capture is longer
/// than `min_len` characters.
pub fn scan_with(buffer: &[u8], min_len: usize) -> Option<AiProvenance> {
    if let Some(prompt) = scan_json(buffer) {
        return Some(AiProvenance::new(GENERATOR_JSON, prompt));
    }
    for re in TEXT_PATTERNS.iter() {
        for caps in re.captures_iter(buffer) {
            let text = clean_text(capture_bytes(&caps));
            if text.chars().count() > min_len {
                return Some(AiProvenance::new(GENERATOR_BINARY, text));
            }
        }
    }
    None
}

/// First JSON span that parses to an object carrying `prompt` (preferred) or
/// `positive_prompt`. Spans that fail to parse are skipped.
fn scan_json(buffer: &[u8]) -> Option<String> {
    for re in JSON_PATTERNS.iter() {
        for m in re.find_iter(buffer) {
            let Ok(Value::Object(obj)) = serde_json::from_slice::<Value>(m.as_bytes()) else {
                continue;
            };
            if let Some(v) = obj.get("prompt").or_else(|| obj.get("positive_prompt")) {
                return Some(json_text(v));
            }
        }
    }
    None
}

fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Every candidate from the deep-scan pattern set, default threshold.
pub fn scan_all(buffer: &[u8]) -> Vec<PromptCandidate> {
    scan_all_with(buffer, DEFAULT_MIN_PROMPT_LEN)
}

/// Every candidate from the deep-scan pattern set: cleaned, longer than `min_len`,
/// deduplicated by exact text, sorted by descending length (stable on ties).
pub fn scan_all_with(buffer: &[u8], min_len: usize) -> Vec<PromptCandidate> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for re in DEEP_PATTERNS.iter() {
        collect_matches(re, buffer, min_len, &mut seen, &mut found);
    }
    found.sort_by(|a: &PromptCandidate, b| b.length.cmp(&a.length));
    found
}

fn collect_matches(
    re: &Regex,
    buffer: &[u8],
    min_len: usize,
    seen: &mut HashSet<String>,
    found: &mut Vec<PromptCandidate>,
) {
    for caps in re.captures_iter(buffer) {
        let text = clean_text(capture_bytes(&caps));
        if text.chars().count() <= min_len || seen.contains(&text) {
            continue;
        }
        seen.insert(text.clone());
        found.push(PromptCandidate::new(text));
    }
}

/// Group 1 when the pattern has one, else the whole match.
fn capture_bytes<'h>(caps: &Captures<'h>) -> &'h [u8] {
    caps.get(1)
        .or_else(|| caps.get(0))
        .map(|m| m.as_bytes())
        .unwrap_or_default()
}
