//! Source reader: loads a character file into numbered lines.
//!
//! All file I/O for a parse happens here, up front; nothing holds a file
//! handle while the rest of the pipeline runs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::diag::{DiagnosticCode, Diagnostics};

/// One line of source, with its 1-indexed number for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Read the whole file. On I/O failure a fatal diagnostic is recorded and
/// `None` is returned so the caller can abort this branch.
pub fn read_lines(path: &Path, diags: &mut Diagnostics) -> Option<Vec<SourceLine>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            diags.report(
                DiagnosticCode::IoError,
                path,
                0,
                format!("cannot open {}: {}", path.display(), e),
            );
            return None;
        }
    };

    let reader = BufReader::new(file);
    let mut lines = Vec::new();
    for (idx, line_result) in reader.lines().enumerate() {
        match line_result {
            Ok(text) => lines.push(SourceLine {
                number: idx + 1,
                text,
            }),
            Err(e) => {
                diags.report(
                    DiagnosticCode::IoError,
                    path,
                    idx + 1,
                    format!("error reading {}: {}", path.display(), e),
                );
                return None;
            }
        }
    }

    log::debug!("loaded {} lines from {}", lines.len(), path.display());
    Some(lines)
}

/// Strip an inline `#` comment, ignoring `#` inside double-quoted strings
/// (escape-aware). Returns the line up to the comment marker.
pub fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in line.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// True for lines the parsers skip everywhere: blank or comment-only.
pub fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}
