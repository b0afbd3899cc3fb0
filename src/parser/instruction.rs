//! Instruction and argument parsing.
//!
//! Parses `Name` or `Name(arg, arg, ...)`. Argument splitting is a single
//! scanning pass that tracks parenthesis depth (so commas inside nested
//! calls don't split), double-quoted string mode (commas allowed inside)
//! and a pending escape (for `\"`). An argument of the form `Inner(...)`
//! is parsed recursively into a nested instruction; depth is unbounded.

use std::path::Path;

use crate::model::{Argument, InstructionDescriptor};

use super::diag::{DiagnosticCode, Diagnostics};

/// Parse one cleaned (comment-stripped, trimmed) action line. Returns
/// `None` if the line was malformed; the diagnostic is already recorded
/// and the caller just moves on to the next line.
pub fn parse_instruction(
    line: &str,
    line_number: usize,
    path: &Path,
    diags: &mut Diagnostics,
) -> Option<InstructionDescriptor> {
    let line = line.trim();

    let open = match line.find('(') {
        Some(idx) => idx,
        None => {
            // Bare instruction, no arguments.
            return Some(InstructionDescriptor {
                name: line.to_string(),
                args: Vec::new(),
                line: line_number,
            });
        }
    };

    let name = line[..open].trim().to_string();
    let scan = match scan_call_body(&line[open + 1..]) {
        Ok(scan) => scan,
        Err(ScanError::UnbalancedParens) => {
            diags.report(
                DiagnosticCode::UnbalancedArgumentParens,
                path,
                line_number,
                format!("unbalanced parentheses in `{line}`"),
            );
            return None;
        }
        Err(ScanError::UnterminatedString) => {
            diags.report(
                DiagnosticCode::UnterminatedStringLiteral,
                path,
                line_number,
                format!("unterminated string literal in `{line}`"),
            );
            return None;
        }
    };

    if !scan.rest.trim().is_empty() {
        diags.report(
            DiagnosticCode::UnbalancedArgumentParens,
            path,
            line_number,
            format!("unexpected `{}` after closing parenthesis", scan.rest.trim()),
        );
        return None;
    }

    let mut args = Vec::with_capacity(scan.raw_args.len());
    for raw in &scan.raw_args {
        args.push(classify_argument(raw, line_number, path, diags)?);
    }

    Some(InstructionDescriptor {
        name,
        args,
        line: line_number,
    })
}

enum ScanError {
    UnbalancedParens,
    UnterminatedString,
}

struct CallBody<'a> {
    raw_args: Vec<String>,
    /// Whatever followed the matching close paren.
    rest: &'a str,
}

/// Split the text after the opening paren into top-level raw arguments,
/// stopping at the matching close paren.
fn scan_call_body(body: &str) -> Result<CallBody<'_>, ScanError> {
    let mut depth = 1usize;
    let mut in_string = false;
    let mut escape_next = false;
    let mut current = String::new();
    let mut raw_args = Vec::new();

    let mut chars = body.char_indices();
    for (i, ch) in &mut chars {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => {
                current.push(ch);
                escape_next = true;
            }
            '"' => {
                current.push(ch);
                in_string = !in_string;
            }
            '(' if !in_string => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    if !current.trim().is_empty() {
                        raw_args.push(current.trim().to_string());
                    }
                    return Ok(CallBody {
                        raw_args,
                        rest: &body[i + 1..],
                    });
                }
                current.push(ch);
            }
            ',' if !in_string && depth == 1 => {
                if !current.trim().is_empty() {
                    raw_args.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if in_string {
        Err(ScanError::UnterminatedString)
    } else {
        Err(ScanError::UnbalancedParens)
    }
}

/// Decide what one raw top-level argument is: a quoted string, a nested
/// call, or a bare token.
fn classify_argument(
    raw: &str,
    line_number: usize,
    path: &Path,
    diags: &mut Diagnostics,
) -> Option<Argument> {
    if raw.starts_with('"') {
        if let Some(text) = unquote(raw) {
            return Some(Argument::Str(text));
        }
        diags.report(
            DiagnosticCode::UnterminatedStringLiteral,
            path,
            line_number,
            format!("malformed string literal `{raw}`"),
        );
        return None;
    }

    if is_call_shaped(raw) {
        return parse_instruction(raw, line_number, path, diags).map(Argument::Call);
    }

    Some(Argument::Token(raw.to_string()))
}

/// `Name(...)` with an identifier name and a trailing close paren.
fn is_call_shaped(raw: &str) -> bool {
    let open = match raw.find('(') {
        Some(idx) if idx > 0 => idx,
        _ => return false,
    };
    let name = &raw[..open];
    let ident = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    ident && raw.ends_with(')')
}

/// Strip surrounding quotes and resolve `\"` / `\\` escapes. `None` if the
/// argument is not exactly one well-formed string literal.
fn unquote(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    // Unknown escape, kept verbatim.
                    out.push('\\');
                    out.push(other);
                }
                None => return None,
            },
            '"' => {
                // Closing quote must end the argument.
                return if chars.next().is_none() { Some(out) } else { None };
            }
            other => out.push(other),
        }
    }
    None
}
