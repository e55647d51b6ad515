//! Compiled pattern tables. All patterns run on bytes with Unicode disabled so that `.` and
//! negated classes match arbitrary non-UTF-8 bytes (never `\n` unless `(?s)` is set).

use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// JSON-shaped spans, in priority order. Each span ends at the first `}`.
const JSON_SOURCES: &[&str] = &[
    r#"(?-u)\{"prompt":.*?\}"#,
    r#"(?-u)\{"positive_prompt":.*?\}"#,
    r#"(?-u)\{"data":.*?\}"#,
    r#"(?-u)\{"parameters":.*?\}"#,
];

/// Delimiter and tag patterns tried after the JSON spans, in priority order.
const TEXT_SOURCES: &[&str] = &[
    r#"(?-u)"prompt"\s*:\s*"([^"]+)""#,
    r#"(?-u)"prompt"\s*:\s*'([^']+)'"#,
    r#"(?-u)"description"\s*:\s*"([^"]+)""#,
    r#"(?-u)prompt[=:]\s*([^\r\n&]+)"#,
    r#"(?-u)Prompt:\s*([^\r\n]+)"#,
    r#"(?-u)<prompt>(.*?)</prompt>"#,
];

/// Deep-scan superset. Patterns without a capture group contribute the whole match.
const DEEP_SOURCES: &[&str] = &[
    // JSON keys
    r#"(?-u)"prompt"\s*:\s*"([^"]+)""#,
    r#"(?-u)"prompt"\s*:\s*'([^']+)'"#,
    r#"(?-u)"description"\s*:\s*"([^"]+)""#,
    r#"(?-u)"text"\s*:\s*"([^"]+)""#,
    r#"(?-u)"positive_prompt"\s*:\s*"([^"]+)""#,
    // key=value
    r#"(?-u)prompt[=:]\s*([^\r\n&]+)"#,
    r#"(?-u)description[=:]\s*([^\r\n&]+)"#,
    // tags and labels
    r#"(?-u)<prompt>(.*?)</prompt>"#,
    r#"(?-u)<description>(.*?)</description>"#,
    r#"(?-u)Prompt:\s*([^\r\n]+)"#,
    r#"(?-u)Generated with:\s*([^\r\n]+)"#,
    // Midjourney
    r#"(?-u)/imagine\s+([^\r\n]+)"#,
    r#"(?-u)--ar \d+:\d+\s+([^\r\n]+)"#,
    r#"(?-u)--v \d+\s+([^\r\n]+)"#,
    // Stable Diffusion
    r#"(?-u)Steps: \d+, Sampler: [^,]+, CFG scale: [\d\.]+, Seed: \d+"#,
    r#"(?-u)Negative prompt:(.*?)Steps:"#,
    r#"(?-u)parameters\s*:\s*(.*?)(?:\n\n|\z)"#,
    // DALL-E
    r#"(?-u)DALL-E\s+\d\s+([^\r\n]+)"#,
];

/// `parameters:` block used by the Stable Diffusion rule; spans lines up to a blank line.
const SD_BLOCK_SOURCE: &str = r#"(?s-u)parameters\s*:\s*(.*?)(?:\n\n|\z)"#;

pub const JSON_PATTERN_COUNT: usize = JSON_SOURCES.len();
pub const TEXT_PATTERN_COUNT: usize = TEXT_SOURCES.len();
pub const DEEP_SCAN_PATTERN_COUNT: usize = DEEP_SOURCES.len();

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).unwrap_or_else(|e| panic!("invalid built-in pattern {s}: {e}")))
        .collect()
}

pub(crate) static JSON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(JSON_SOURCES));
pub(crate) static TEXT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(TEXT_SOURCES));
pub(crate) static DEEP_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| compile(DEEP_SOURCES));
pub(crate) static SD_BLOCK: Lazy<Regex> = Lazy::new(|| compile(&[SD_BLOCK_SOURCE]).remove(0));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_patterns_compile() {
        assert_eq!(JSON_PATTERNS.len(), JSON_PATTERN_COUNT);
        assert_eq!(TEXT_PATTERNS.len(), TEXT_PATTERN_COUNT);
        assert_eq!(DEEP_PATTERNS.len(), DEEP_SCAN_PATTERN_COUNT);
        assert!(SD_BLOCK.is_match(b"parameters: x"));
    }

    #[test]
    fn dot_matches_invalid_utf8_but_not_newline() {
        let re = &TEXT_PATTERNS[5];
        assert!(re.is_match(b"<prompt>\xff\xfe</prompt>"));
        assert!(!re.is_match(b"<prompt>a\nb</prompt>"));
    }

    #[test]
    fn sd_block_spans_lines() {
        let caps = SD_BLOCK.captures(b"parameters: a\nb\n\nrest").unwrap();
        assert_eq!(&caps[1], b"a\nb");
    }
}
