//! Binary pattern scanner: regex and JSON heuristics over raw bytes.
//!
//! Two modes:
//! - [`scan`]: fixed-priority single best match, used as the fallback of every extractor.
//! - [`scan_all`]: exhaustive candidate collection for the user-triggered deep scan.

pub(crate) mod patterns;
mod scan;

pub use patterns::{DEEP_SCAN_PATTERN_COUNT, JSON_PATTERN_COUNT, TEXT_PATTERN_COUNT};
pub use scan::{
    clean_text, scan, scan_all, scan_all_with, scan_with, GENERATOR_BINARY, GENERATOR_JSON,
};
