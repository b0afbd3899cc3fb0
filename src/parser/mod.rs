//! The character-file parsing core.
//!
//! One call to [`parse_character`] reads the file, resolves its skeleton
//! chain, runs the caller's module transforms and hands back one immutable
//! [`ParsedCharacter`]. Recoverable problems never stop the pass; they
//! accumulate in the diagnostics list so an author sees everything at
//! once.

pub mod blocks;
pub mod diag;
pub mod inherit;
pub mod instruction;
pub mod metadata;
pub mod source;
pub mod specblock;
pub mod states;
pub mod variables;

use std::path::Path;

use indexmap::IndexMap;

use crate::model::{
    CharacterMetadata, ParsedCharacter, SpecblockDefines, StateDescriptor, VariableDescriptor,
};
use crate::modules::{self, CharacterModule};

use blocks::BlockKind;
use diag::{Diagnostic, DiagnosticCode, Diagnostics, ParseError};

/// Caller-selected knobs for one parse invocation.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Escalate every diagnostic to fatal and require an `Idle` state.
    pub strict: bool,
}

/// A successful parse: the character plus whatever non-fatal diagnostics
/// were collected along the way, ordered by file then line.
#[derive(Debug)]
pub struct ParseOutcome {
    pub character: ParsedCharacter,
    pub diagnostics: Vec<Diagnostic>,
}

/// One file's parse result before inheritance merging.
#[derive(Debug, Clone, Default)]
pub struct RawCharacter {
    pub metadata: CharacterMetadata,
    /// Line of the `Skeleton` metadata key, for cycle/failure reporting.
    pub skeleton_line: usize,
    pub variables: IndexMap<String, VariableDescriptor>,
    pub states: IndexMap<String, StateDescriptor>,
    pub specblocks: SpecblockDefines,
}

/// Parse one character file end to end.
pub fn parse_character(
    path: &Path,
    modules: &[Box<dyn CharacterModule>],
    options: &ParseOptions,
) -> Result<ParseOutcome, ParseError> {
    let mut diags = Diagnostics::new(options.strict);
    let no_overwrite = modules::no_overwrite_blocks(modules);

    let mut loading = Vec::new();
    let raw = inherit::load_with_inheritance(path, &mut loading, &no_overwrite, &mut diags);

    let Some(raw) = raw else {
        return Err(ParseError {
            diagnostics: diags.into_sorted(),
        });
    };

    let transformed_data = modules::run_transforms(modules, &raw.specblocks, path, &mut diags);

    if options.strict && !raw.states.contains_key("Idle") {
        diags.report(
            DiagnosticCode::MissingRequiredState,
            path,
            0,
            "strict mode requires an `Idle` state",
        );
    }

    if diags.has_fatal() {
        return Err(ParseError {
            diagnostics: diags.into_sorted(),
        });
    }

    Ok(ParseOutcome {
        character: ParsedCharacter {
            metadata: raw.metadata,
            variables: raw.variables,
            states: raw.states,
            specblocks: raw.specblocks,
            subentities: IndexMap::new(),
            transformed_data,
        },
        diagnostics: diags.into_sorted(),
    })
}

/// Lightweight fast path for editor-style callers: metadata only, no
/// inheritance, no modules.
pub fn parse_metadata_only(path: &Path) -> Result<CharacterMetadata, ParseError> {
    let mut diags = Diagnostics::new(false);
    let Some(lines) = source::read_lines(path, &mut diags) else {
        return Err(ParseError {
            diagnostics: diags.into_sorted(),
        });
    };
    let blocks = blocks::split_blocks(&lines, path, &mut diags);

    let mut result = CharacterMetadata::default();
    for block in &blocks {
        if block.kind == BlockKind::Character {
            let meta = metadata::parse_metadata(block, path, &mut diags);
            for (key, value) in meta.fields {
                result.set(key, value);
            }
        }
    }

    if diags.has_fatal() {
        return Err(ParseError {
            diagnostics: diags.into_sorted(),
        });
    }
    Ok(result)
}

/// Parse one file into its raw (pre-merge) form. `None` on fatal I/O.
pub(crate) fn parse_file(path: &Path, diags: &mut Diagnostics) -> Option<RawCharacter> {
    let lines = source::read_lines(path, diags)?;
    let blocks = blocks::split_blocks(&lines, path, diags);

    let mut character = RawCharacter::default();

    for block in &blocks {
        match block.kind {
            BlockKind::Character => {
                let meta = metadata::parse_metadata(block, path, diags);
                for (key, value) in meta.fields {
                    character.metadata.set(key, value);
                }
                if let Some(line) = skeleton_key_line(block) {
                    character.skeleton_line = line;
                }
            }
            BlockKind::Variables => {
                variables::parse_variables(block, path, &mut character.variables, diags);
            }
            BlockKind::State => {
                let state = states::parse_state(block, path, diags);
                character.states.insert(state.name.clone(), state);
            }
            BlockKind::Specblock => {
                let parsed = specblock::parse_specblock(block, path, diags);
                // A repeated block name within one file merges, later keys
                // overriding earlier ones.
                let entry = character.specblocks.entry(block.name.clone()).or_default();
                for (key, define) in parsed.entries {
                    entry.entries.insert(key, define);
                }
            }
        }
    }

    log::debug!(
        "{}: {} variables, {} states, {} specblocks",
        path.display(),
        character.variables.len(),
        character.states.len(),
        character.specblocks.len()
    );
    Some(character)
}

/// Find the line the `Skeleton` key sits on, for inheritance diagnostics.
fn skeleton_key_line(block: &blocks::Block) -> Option<usize> {
    for line in &block.lines {
        let cleaned = source::strip_inline_comment(&line.text);
        let trimmed = cleaned.trim();
        if let Some(colon) = trimmed.find(':') {
            if trimmed[..colon].trim() == "Skeleton" {
                return Some(line.number);
            }
        }
    }
    None
}
