pub mod error;
pub mod filler;
pub mod grid;
pub mod logging;
pub mod search;
pub mod state;
pub mod words;

use std::path::PathBuf;

/// Guess the field separator of a CSV file from its first line.
/// Layouts and word lists are accepted with either comma or semicolon.
pub fn sniff_delimiter(contents: &str) -> u8 {
    let first_line = contents.lines().next().unwrap_or("");
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Expand a literal path or glob pattern into a sorted list of paths.
/// The caller decides which error kind a failure maps to.
pub(crate) fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>, String> {
    let entries = glob::glob(pattern)
        .map_err(|e| format!("bad pattern {}: {}", pattern, e))?;
    let mut paths: Vec<PathBuf> = vec![];
    for entry in entries {
        let path = entry.map_err(|e| format!("unreadable path under {}: {}", pattern, e))?;
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}
