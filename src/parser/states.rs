//! State parser: header attributes plus phase subsections with ordered
//! instruction lists.
//!
//! Header forms, resolving the attribute grammar the file format leaves
//! open elsewhere:
//!
//!   :Name:                    kind Normal
//!   :Name(Helper):            parenthesised known kind
//!   :Name(Standing):          unknown token means parent state
//!   :Name(Helper, Standing):  kind, parent
//!   :Name(...)[Tag, Tag]:     trailing transition-flag tags

use std::path::Path;

use crate::model::{StateDescriptor, StateKind};

use super::blocks::Block;
use super::diag::{DiagnosticCode, Diagnostics};
use super::instruction;
use super::source;

pub fn parse_state(block: &Block, path: &Path, diags: &mut Diagnostics) -> StateDescriptor {
    let mut state = StateDescriptor::new(block.name.clone());
    parse_header_attributes(block, path, diags, &mut state);

    let mut current_phase: Option<String> = None;

    for line in &block.lines {
        if source::is_skippable(&line.text) {
            continue;
        }
        let stripped = source::strip_inline_comment(&line.text);
        let cleaned = stripped.trim();
        if cleaned.is_empty() {
            continue;
        }

        if let Some(marker) = cleaned.strip_prefix("---") {
            match marker.find(':') {
                Some(colon) => {
                    let phase = marker[..colon].trim().to_string();
                    state.phases.entry(phase.clone()).or_default();
                    current_phase = Some(phase);
                }
                None => {
                    diags.report(
                        DiagnosticCode::MalformedBlockHeader,
                        path,
                        line.number,
                        format!("phase marker `{cleaned}` does not end with `:`"),
                    );
                }
            }
            continue;
        }

        let Some(phase) = current_phase.as_ref() else {
            log::debug!(
                "{}:{}: instruction `{cleaned}` outside any phase, dropped",
                path.display(),
                line.number
            );
            continue;
        };

        if let Some(instr) = instruction::parse_instruction(cleaned, line.number, path, diags) {
            state.phases.entry(phase.clone()).or_default().push(instr);
        }
    }

    state
}

/// Read `(Kind, Parent)` and `[Flag, Flag]` attributes off the header.
fn parse_header_attributes(
    block: &Block,
    path: &Path,
    diags: &mut Diagnostics,
    state: &mut StateDescriptor,
) {
    let attrs = block.header[block.name.len()..].trim();
    if attrs.is_empty() {
        return;
    }

    let mut rest = attrs;

    if let Some(open) = rest.find('(') {
        match rest.find(')') {
            Some(close) if close > open => {
                apply_paren_params(rest[open + 1..close].trim(), state);
                rest = rest[close + 1..].trim_start();
            }
            _ => {
                diags.report(
                    DiagnosticCode::MalformedBlockHeader,
                    path,
                    block.header_line,
                    format!("state `{}`: unclosed attribute parenthesis", block.name),
                );
                return;
            }
        }
    }

    if let Some(open) = rest.find('[') {
        match rest.find(']') {
            Some(close) if close > open => {
                state.transition_flags = rest[open + 1..close]
                    .split(',')
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect();
            }
            _ => {
                diags.report(
                    DiagnosticCode::MalformedBlockHeader,
                    path,
                    block.header_line,
                    format!("state `{}`: unclosed transition-flag bracket", block.name),
                );
            }
        }
    }
}

fn apply_paren_params(params: &str, state: &mut StateDescriptor) {
    if params.is_empty() {
        return;
    }
    match params.split_once(',') {
        Some((kind_token, parent)) => {
            state.kind = StateKind::from_token(kind_token.trim()).unwrap_or(StateKind::Normal);
            state.parent = Some(parent.trim().to_string());
        }
        None => {
            // A lone known kind is the kind; anything else names the parent.
            match StateKind::from_token(params) {
                Some(kind) => state.kind = kind,
                None => state.parent = Some(params.to_string()),
            }
        }
    }
}
