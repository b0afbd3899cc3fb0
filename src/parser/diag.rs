//! Diagnostics for the character parser.
//!
//! The parser keeps parsing past recoverable problems so a single pass
//! surfaces as many diagnostics as possible. Every parsing function takes
//! the collector explicitly; there is no global error state.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Non-blocking (module transform failures).
    Warning,
    /// Recoverable: the offending line or block is skipped.
    Error,
    /// Aborts the current file / recursion branch.
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticCode {
    IoError,
    CyclicInheritance,
    MalformedBlockHeader,
    MalformedMetadataLine,
    MissingTypeParenthesis,
    UnknownVariableType,
    DuplicateVariableName,
    UnbalancedArgumentParens,
    UnterminatedStringLiteral,
    AmbiguousBlockKind,
    MergeConflict,
    MissingRequiredState,
    ModuleTransformFailure,
}

impl DiagnosticCode {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::IoError | DiagnosticCode::CyclicInheritance => Severity::Fatal,
            DiagnosticCode::ModuleTransformFailure => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One recorded problem: what, where, and a human-readable message with a
/// 1-indexed line number.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub severity: Severity,
    pub file: PathBuf,
    pub line: usize,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {:?} [{}] {}",
            self.file.display(),
            self.line,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Explicit diagnostics collector threaded through the whole parse.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    strict: bool,
    fatal_seen: bool,
}

impl Diagnostics {
    pub fn new(strict: bool) -> Self {
        Self {
            items: Vec::new(),
            strict,
            fatal_seen: false,
        }
    }

    /// Record a diagnostic; strict mode escalates everything to fatal.
    pub fn report(
        &mut self,
        code: DiagnosticCode,
        file: impl AsRef<Path>,
        line: usize,
        message: impl Into<String>,
    ) {
        let severity = if self.strict {
            Severity::Fatal
        } else {
            code.severity()
        };
        if severity == Severity::Fatal {
            self.fatal_seen = true;
        }
        let diag = Diagnostic {
            code,
            severity,
            file: file.as_ref().to_path_buf(),
            line,
            message: message.into(),
        };
        log::debug!("diagnostic: {diag}");
        self.items.push(diag);
    }

    pub fn has_fatal(&self) -> bool {
        self.fatal_seen
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Drain into a list ordered by file path then line number, so tooling
    /// sees deterministic output regardless of traversal order.
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items
            .sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
        self.items
    }
}

/// Terminal failure of a top-level parse call. Returned only when a fatal
/// diagnostic occurred (or strict mode escalated one).
#[derive(Debug, Error)]
#[error("character parse failed ({} diagnostics)", .diagnostics.len())]
pub struct ParseError {
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    /// Pretty multi-line rendering for CLI output.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for d in &self.diagnostics {
            out.push_str(&d.to_string());
            out.push('\n');
        }
        out
    }
}
