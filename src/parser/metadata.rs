//! Metadata parser for the reserved `Character` block.

use std::path::Path;

use crate::model::CharacterMetadata;

use super::blocks::Block;
use super::diag::{DiagnosticCode, Diagnostics};
use super::source;

/// Parse every `Key: Value` line of the block. Unknown keys are stored
/// as-is so newer files keep working against older consumers. Lines with
/// no colon are reported and skipped.
pub fn parse_metadata(block: &Block, path: &Path, diags: &mut Diagnostics) -> CharacterMetadata {
    let mut metadata = CharacterMetadata::default();

    for line in &block.lines {
        if source::is_skippable(&line.text) {
            continue;
        }
        let stripped = source::strip_inline_comment(&line.text);
        let cleaned = stripped.trim();
        if cleaned.is_empty() {
            continue;
        }

        match cleaned.find(':') {
            Some(colon) => {
                let key = cleaned[..colon].trim();
                let value = cleaned[colon + 1..].trim();
                metadata.set(key, value);
            }
            None => {
                diags.report(
                    DiagnosticCode::MalformedMetadataLine,
                    path,
                    line.number,
                    format!("metadata line `{cleaned}` has no `Key: Value` separator"),
                );
            }
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::source::SourceLine;

    fn block(body: &str) -> Block {
        Block {
            kind: crate::parser::blocks::BlockKind::Character,
            header: "Character".into(),
            name: "Character".into(),
            header_line: 1,
            lines: body
                .lines()
                .enumerate()
                .map(|(i, text)| SourceLine {
                    number: i + 2,
                    text: text.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_basic_metadata() {
        let mut diags = Diagnostics::new(false);
        let meta = parse_metadata(
            &block("Name: Ryu\nAuthor: Test\nDescription: A fighter"),
            Path::new("test.casp"),
            &mut diags,
        );
        assert!(diags.is_empty());
        assert_eq!(meta.name(), "Ryu");
        assert_eq!(meta.author(), "Test");
        assert_eq!(meta.description(), "A fighter");
    }

    #[test]
    fn test_unknown_keys_preserved_in_order() {
        let mut diags = Diagnostics::new(false);
        let meta = parse_metadata(
            &block("Name: Ryu\nEditorName: Ryu (Demo)\nTheme: Blue"),
            Path::new("test.casp"),
            &mut diags,
        );
        let keys: Vec<&String> = meta.fields.keys().collect();
        assert_eq!(keys, vec!["Name", "EditorName", "Theme"]);
        assert_eq!(meta.get("Theme"), Some("Blue"));
    }

    #[test]
    fn test_malformed_line_recovers() {
        let mut diags = Diagnostics::new(false);
        let meta = parse_metadata(
            &block("Name: Ryu\nthis has no separator\nAuthor: Test"),
            Path::new("test.casp"),
            &mut diags,
        );
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.code, DiagnosticCode::MalformedMetadataLine);
        assert_eq!(diag.line, 3);
        // Parsing continued past the bad line.
        assert_eq!(meta.author(), "Test");
    }

    #[test]
    fn test_inline_comments_stripped() {
        let mut diags = Diagnostics::new(false);
        let meta = parse_metadata(
            &block("Name: Ryu # the classic\n# full comment\nSkeleton: base.casp"),
            Path::new("test.casp"),
            &mut diags,
        );
        assert!(diags.is_empty());
        assert_eq!(meta.name(), "Ryu");
        assert_eq!(meta.skeleton(), Some("base.casp"));
    }

    #[test]
    fn test_value_may_contain_colons() {
        let mut diags = Diagnostics::new(false);
        let meta = parse_metadata(
            &block("Skeleton: res://fighters/base.casp"),
            Path::new("test.casp"),
            &mut diags,
        );
        assert_eq!(meta.skeleton(), Some("res://fighters/base.casp"));
    }
}
