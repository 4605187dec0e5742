//! Disease terms files.

use std::fs;
use std::io;
use std::path::Path;

/// Parse a terms file body: one term per line, blank lines and `#`
/// comments ignored, order preserved.
pub fn parse_terms(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_terms_file(path: &Path) -> io::Result<Vec<String>> {
    Ok(parse_terms(&fs::read_to_string(path)?))
}
