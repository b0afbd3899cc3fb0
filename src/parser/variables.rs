//! Variable parser for the reserved `Variables` block.
//!
//! Grammar: `(var|def) Name Type(Subtype?) = DefaultText`. The keyword
//! picks the mutability; names starting with `_` are engine-reserved and
//! marked Internal. The default is kept as raw text.

use std::path::Path;

use indexmap::IndexMap;

use crate::model::{Mutability, VariableDescriptor, VariableType};

use super::blocks::Block;
use super::diag::{DiagnosticCode, Diagnostics};
use super::source;

/// Parse the block's declarations into `variables`, which accumulates
/// across every `Variables` block of one file so duplicates are caught at
/// the line that redeclares, wherever the first declaration lived.
pub fn parse_variables(
    block: &Block,
    path: &Path,
    variables: &mut IndexMap<String, VariableDescriptor>,
    diags: &mut Diagnostics,
) {
    for line in &block.lines {
        if source::is_skippable(&line.text) {
            continue;
        }
        let stripped = source::strip_inline_comment(&line.text);
        let cleaned = stripped.trim();
        if cleaned.is_empty() {
            continue;
        }

        let (keyword_mutability, rest) = if let Some(rest) = cleaned.strip_prefix("var ") {
            (Mutability::Variable, rest)
        } else if let Some(rest) = cleaned.strip_prefix("def ") {
            (Mutability::Define, rest)
        } else {
            // Not a declaration; the block tolerates free-form notes.
            continue;
        };

        if let Some(var) = parse_declaration(rest, keyword_mutability, line.number, path, diags) {
            if variables.contains_key(&var.name) {
                diags.report(
                    DiagnosticCode::DuplicateVariableName,
                    path,
                    line.number,
                    format!("variable `{}` is declared more than once in this file", var.name),
                );
                continue;
            }
            variables.insert(var.name.clone(), var);
        }
    }
}

/// Parse everything after the `var `/`def ` keyword.
fn parse_declaration(
    rest: &str,
    keyword_mutability: Mutability,
    line_number: usize,
    path: &Path,
    diags: &mut Diagnostics,
) -> Option<VariableDescriptor> {
    let (decl, default) = match rest.find('=') {
        Some(eq) => (rest[..eq].trim(), rest[eq + 1..].trim()),
        None => (rest.trim(), ""),
    };

    let (name, type_part) = match decl.split_once(char::is_whitespace) {
        Some((name, type_part)) => (name.trim(), type_part.trim()),
        None => (decl, ""),
    };

    let open = match type_part.find('(') {
        Some(idx) => idx,
        None => {
            diags.report(
                DiagnosticCode::MissingTypeParenthesis,
                path,
                line_number,
                format!(
                    "variable `{name}`: type `{type_part}` is missing its parenthesis pair, \
                     expected e.g. `int()`"
                ),
            );
            return None;
        }
    };
    let close = match type_part.rfind(')') {
        Some(idx) if idx > open => idx,
        _ => {
            diags.report(
                DiagnosticCode::MissingTypeParenthesis,
                path,
                line_number,
                format!(
                    "variable `{name}`: type `{type_part}` is missing its parenthesis pair, \
                     expected e.g. `int()`"
                ),
            );
            return None;
        }
    };

    let tag = type_part[..open].trim();
    let var_type = match VariableType::from_tag(tag) {
        Some(ty) => ty,
        None => {
            diags.report(
                DiagnosticCode::UnknownVariableType,
                path,
                line_number,
                format!("variable `{name}`: unknown type tag `{tag}`"),
            );
            return None;
        }
    };

    let subtype_text = type_part[open + 1..close].trim();
    let subtype = if subtype_text.is_empty() {
        None
    } else {
        Some(subtype_text.to_string())
    };

    let mutability = if name.starts_with('_') {
        Mutability::Internal
    } else {
        keyword_mutability
    };

    Some(VariableDescriptor {
        name: name.to_string(),
        mutability,
        var_type,
        subtype,
        value: default.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::blocks::BlockKind;
    use crate::parser::source::SourceLine;

    fn parse(body: &str) -> (IndexMap<String, VariableDescriptor>, Diagnostics) {
        let block = Block {
            kind: BlockKind::Variables,
            header: "Variables".into(),
            name: "Variables".into(),
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
        let mut vars = IndexMap::new();
        parse_variables(&block, Path::new("test.casp"), &mut vars, &mut diags);
        (vars, diags)
    }

    #[test]
    fn test_basic_var() {
        let (vars, diags) = parse("var Health int() = 1000");
        assert!(diags.is_empty());
        let health = &vars["Health"];
        assert_eq!(health.var_type, VariableType::Integer);
        assert_eq!(health.mutability, Mutability::Variable);
        assert_eq!(health.subtype, None);
        assert_eq!(health.value, "1000", "default stays raw text");
    }

    #[test]
    fn test_def_declaration() {
        let (vars, _) = parse("def MaxJumps int() = 2");
        assert_eq!(vars["MaxJumps"].mutability, Mutability::Define);
    }

    #[test]
    fn test_subtype() {
        let (vars, diags) = parse("var Hurtbox box(Standing) = 0,0,40,90");
        assert!(diags.is_empty());
        let hurtbox = &vars["Hurtbox"];
        assert_eq!(hurtbox.var_type, VariableType::Box);
        assert_eq!(hurtbox.subtype.as_deref(), Some("Standing"));
        assert_eq!(hurtbox.value, "0,0,40,90");
    }

    #[test]
    fn test_internal_by_underscore() {
        let (vars, _) = parse("var _State str() = Idle");
        assert_eq!(vars["_State"].mutability, Mutability::Internal);
    }

    #[test]
    fn test_missing_type_parenthesis() {
        // `var Health int = 100` must fail, and parsing must continue.
        let (vars, diags) = parse("var Health int = 100\nvar Meter int() = 0");
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.code, DiagnosticCode::MissingTypeParenthesis);
        assert_eq!(diag.line, 2);
        assert!(!vars.contains_key("Health"));
        assert!(vars.contains_key("Meter"), "next line still parsed");
    }

    #[test]
    fn test_unknown_type() {
        let (vars, diags) = parse("var Speed float() = 1.5");
        assert_eq!(
            diags.iter().next().unwrap().code,
            DiagnosticCode::UnknownVariableType
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let (vars, diags) = parse("var Health int() = 1000\nvar Health int() = 500");
        assert_eq!(
            diags.iter().next().unwrap().code,
            DiagnosticCode::DuplicateVariableName
        );
        assert_eq!(vars["Health"].value, "1000");
    }

    #[test]
    fn test_duplicate_across_blocks_cites_declaration_line() {
        // Two Variables blocks accumulate into one map; the diagnostic
        // points at the redeclaring line, not the block header.
        let first = Block {
            kind: BlockKind::Variables,
            header: "Variables".into(),
            name: "Variables".into(),
            header_line: 1,
            lines: vec![SourceLine {
                number: 2,
                text: "var Health int() = 1000".into(),
            }],
        };
        let second = Block {
            kind: BlockKind::Variables,
            header: "Variables".into(),
            name: "Variables".into(),
            header_line: 6,
            lines: vec![SourceLine {
                number: 7,
                text: "var Health int() = 500".into(),
            }],
        };

        let mut vars = IndexMap::new();
        let mut diags = Diagnostics::new(false);
        parse_variables(&first, Path::new("test.casp"), &mut vars, &mut diags);
        parse_variables(&second, Path::new("test.casp"), &mut vars, &mut diags);

        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.code, DiagnosticCode::DuplicateVariableName);
        assert_eq!(diag.line, 7);
        assert_eq!(vars["Health"].value, "1000", "first declaration kept");
    }

    #[test]
    fn test_missing_default_is_empty() {
        let (vars, diags) = parse("var Name str()");
        assert!(diags.is_empty());
        assert_eq!(vars["Name"].value, "");
    }

    #[test]
    fn test_all_types() {
        let (vars, diags) = parse(
            "var A int() = 1\n\
             var B str() = hi\n\
             var C var() = anything\n\
             var D vec2() = 1,2\n\
             var E vec3() = 1,2,3\n\
             var F box() = 0,0,1,1\n\
             var G bool() = true",
        );
        assert!(diags.is_empty());
        assert_eq!(vars.len(), 7);
        assert_eq!(vars["C"].var_type, VariableType::Generic);
        assert_eq!(vars["E"].var_type, VariableType::Vector3);
    }

    #[test]
    fn test_declaration_order_preserved() {
        let (vars, _) = parse("var Z int() = 1\nvar A int() = 2\nvar M int() = 3");
        let names: Vec<&String> = vars.keys().collect();
        assert_eq!(names, vec!["Z", "A", "M"]);
    }
}
