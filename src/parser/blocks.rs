//! Block splitter: partitions a file's lines into named top-level blocks
//! and decides what each one is.
//!
//! A trimmed line `:Name:` opens a block. `Character` and `Variables` are
//! reserved; anything else is a state (phase markers or instruction lines)
//! or a specblock (flat `Key: Value` lines only). A block showing evidence
//! of both is ambiguous and skipped.

use std::path::Path;

use super::diag::{DiagnosticCode, Diagnostics};
use super::source::{self, SourceLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Character,
    Variables,
    State,
    Specblock,
}

/// One top-level block: the raw header (attributes included), the bare
/// name, and the body lines still unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    /// Full header text between the colons, e.g. `Idle(Helper)[NoCancel]`.
    pub header: String,
    /// Name with attributes stripped, e.g. `Idle`.
    pub name: String,
    pub header_line: usize,
    pub lines: Vec<SourceLine>,
}

/// Everything in the header after the name means state attributes.
fn split_header_name(header: &str) -> &str {
    let end = header
        .find(|c| c == '(' || c == '[')
        .unwrap_or(header.len());
    header[..end].trim()
}

/// Split the file into blocks. Malformed headers and ambiguous blocks are
/// reported and skipped; everything else is returned in file order.
pub fn split_blocks(lines: &[SourceLine], path: &Path, diags: &mut Diagnostics) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut current: Option<Block> = None;

    for line in lines {
        let trimmed = line.text.trim();

        if trimmed.starts_with(':') && !trimmed.starts_with("---") {
            if trimmed.len() >= 2 && trimmed.ends_with(':') {
                if let Some(block) = current.take() {
                    push_classified(block, path, diags, &mut blocks);
                }
                let header = trimmed[1..trimmed.len() - 1].to_string();
                let name = split_header_name(&header).to_string();
                current = Some(Block {
                    kind: BlockKind::Specblock, // decided on close
                    header,
                    name,
                    header_line: line.number,
                    lines: Vec::new(),
                });
                continue;
            }
            diags.report(
                DiagnosticCode::MalformedBlockHeader,
                path,
                line.number,
                format!("block header `{trimmed}` does not end with `:`"),
            );
            continue;
        }

        if let Some(block) = current.as_mut() {
            block.lines.push(line.clone());
        }
        // Content before the first block header is ignored.
    }

    if let Some(block) = current.take() {
        push_classified(block, path, diags, &mut blocks);
    }

    blocks
}

fn push_classified(mut block: Block, path: &Path, diags: &mut Diagnostics, out: &mut Vec<Block>) {
    match classify(&block) {
        Some(kind) => {
            block.kind = kind;
            out.push(block);
        }
        None => {
            diags.report(
                DiagnosticCode::AmbiguousBlockKind,
                path,
                block.header_line,
                format!(
                    "block `{}` mixes phase/instruction lines with flat key/value lines",
                    block.name
                ),
            );
        }
    }
}

/// Decide what a block is from its header and body. `None` means the body
/// mixes state and specblock evidence.
fn classify(block: &Block) -> Option<BlockKind> {
    match block.name.as_str() {
        "Character" => return Some(BlockKind::Character),
        "Variables" => return Some(BlockKind::Variables),
        _ => {}
    }

    // Header attributes only make sense on states.
    let header_has_attrs = block.header.len() > block.name.len();

    let mut state_evidence = header_has_attrs;
    let mut flat_evidence = false;

    for line in &block.lines {
        let stripped = source::strip_inline_comment(&line.text);
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("---") {
            state_evidence = true;
        } else if has_top_level_colon(trimmed) {
            // Key/value wins even when the value contains a call form,
            // e.g. `Stand: Anim(stand, 5)`.
            flat_evidence = true;
        } else {
            // Instruction line (`Wait()`, bare name, nested call...).
            state_evidence = true;
        }
    }

    match (state_evidence, flat_evidence) {
        (true, true) => None,
        (true, false) => Some(BlockKind::State),
        // Flat lines only, or an entirely empty body.
        _ => Some(BlockKind::Specblock),
    }
}

/// `:` outside any double-quoted string (escape-aware).
fn has_top_level_colon(line: &str) -> bool {
    let mut in_string = false;
    let mut escape_next = false;
    for ch in line.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ':' if !in_string => return true,
            _ => {}
        }
    }
    false
}
