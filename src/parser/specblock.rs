//! Specblock parser: a non-reserved, non-state block of flat `Key: Value`
//! lines. The parser records raw values only; meaning is assigned later by
//! whichever module claims the block.

use std::path::Path;

use crate::model::{RawDefine, Specblock};

use super::blocks::Block;
use super::diag::Diagnostics;
use super::source;

pub fn parse_specblock(block: &Block, path: &Path, _diags: &mut Diagnostics) -> Specblock {
    let mut parsed = Specblock::default();

    for line in &block.lines {
        if source::is_skippable(&line.text) {
            continue;
        }
        let stripped = source::strip_inline_comment(&line.text);
        let cleaned = stripped.trim();
        if cleaned.is_empty() {
            continue;
        }

        // Classification already guaranteed flat key/value content.
        if let Some(colon) = cleaned.find(':') {
            let key = cleaned[..colon].trim().to_string();
            let value = cleaned[colon + 1..].trim().to_string();
            parsed.entries.insert(
                key,
                RawDefine {
                    value,
                    file: path.to_path_buf(),
                    line: line.number,
                },
            );
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::BlockKind;
    use crate::parser::source::SourceLine;

    fn parse(body: &str) -> Specblock {
        let block = Block {
            kind: BlockKind::Specblock,
            header: "Graphics".into(),
            name: "Graphics".into(),
            header_line: 1,
            lines: body
                .lines()
                .enumerate()
                .map(|(i, text)| SourceLine {
                    number: i + 2,
                    text: text.to_string(),
                })
                .collect(),
        };
        let mut diags = Diagnostics::new(false);
        parse_specblock(&block, Path::new("test.casp"), &mut diags)
    }

    #[test]
    fn test_key_values_in_order() {
        let sb = parse("GRAPHICS_Scale: 3000\nGRAPHICS_UseSprites: 1\nGRAPHICS_UseModel: 0");
        let keys: Vec<&String> = sb.entries.keys().collect();
        assert_eq!(keys, vec!["GRAPHICS_Scale", "GRAPHICS_UseSprites", "GRAPHICS_UseModel"]);
        assert_eq!(sb.get("GRAPHICS_Scale"), Some("3000"));
    }

    #[test]
    fn test_origin_recorded() {
        let sb = parse("A: 1\nB: 2");
        let define = &sb.entries["B"];
        assert_eq!(define.line, 3);
        assert_eq!(define.file, Path::new("test.casp"));
    }

    #[test]
    fn test_repeated_key_last_wins() {
        let sb = parse("A: 1\nA: 2");
        assert_eq!(sb.get("A"), Some("2"));
    }

    #[test]
    fn test_comments_and_blanks_skipped() {
        let sb = parse("# palette setup\n\nColor: red # primary");
        assert_eq!(sb.get("Color"), Some("red"));
        assert_eq!(sb.entries.len(), 1);
    }
}
