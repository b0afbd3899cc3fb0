//! Serialized character document in the externally fixed regression
//! layout: top-level `metadata` (keys lower-cased), `subentities`,
//! `variables`, `states`, `transformed_data`. Maps keep insertion order so
//! the output is byte-stable across identical parses.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value, json};

use crate::model::{
    CharacterMetadata, Mutability, ParsedCharacter, StateDescriptor, StateKind,
    VariableDescriptor, VariableType,
};
use crate::parser::diag::Diagnostics;
use crate::parser::instruction;

pub fn build_document(character: &ParsedCharacter) -> Value {
    let mut metadata = Map::new();
    for (key, value) in &character.metadata.fields {
        metadata.insert(key.to_lowercase(), json!(value));
    }

    let mut subentities = Map::new();
    for (name, sub) in &character.subentities {
        let mut vars = Map::new();
        for (var_name, var) in &sub.variables {
            vars.insert(var_name.clone(), variable_entry(var));
        }
        let mut sub_states = Map::new();
        for (state_name, state) in &sub.states {
            sub_states.insert(state_name.clone(), state_entry(state));
        }
        subentities.insert(
            name.clone(),
            json!({
                "variables": Value::Object(vars),
                "states": Value::Object(sub_states),
            }),
        );
    }

    let mut variables = Map::new();
    for (name, var) in &character.variables {
        variables.insert(name.clone(), variable_entry(var));
    }

    let mut states = Map::new();
    for (name, state) in &character.states {
        states.insert(name.clone(), state_entry(state));
    }

    let mut transformed = Map::new();
    for (name, value) in &character.transformed_data {
        transformed.insert(name.clone(), value.clone());
    }

    json!({
        "metadata": Value::Object(metadata),
        "subentities": Value::Object(subentities),
        "variables": Value::Object(variables),
        "states": Value::Object(states),
        "transformed_data": Value::Object(transformed),
    })
}

fn variable_entry(var: &VariableDescriptor) -> Value {
    json!({
        "Name": var.name,
        "Value": var.value,
        "Type": type_name(var.var_type),
        "Subtype": var.subtype.clone().unwrap_or_default(),
        "Mutability": mutability_name(var.mutability),
    })
}

fn state_entry(state: &StateDescriptor) -> Value {
    let mut phases = Map::new();
    for (phase, instructions) in &state.phases {
        let rendered: Vec<Value> = instructions
            .iter()
            .map(|instr| {
                let args: Vec<String> = instr.args.iter().map(|a| a.as_text()).collect();
                json!({
                    "name": instr.name,
                    "args": args,
                    "line": instr.line,
                })
            })
            .collect();
        phases.insert(
            phase.clone(),
            json!({
                "instruction_count": instructions.len(),
                "instructions": rendered,
            }),
        );
    }

    json!({
        "Parent": state.parent.clone().map(Value::String).unwrap_or(Value::Null),
        "Type": kind_name(state.kind),
        "TransitionFlags": state.transition_flags,
        "Phases": Value::Object(phases),
    })
}

pub fn to_json_string(character: &ParsedCharacter) -> Result<String> {
    serde_json::to_string_pretty(&build_document(character)).context("serializing character")
}

pub fn emit(character: &ParsedCharacter, out_path: &Path) -> Result<()> {
    let text = to_json_string(character)?;
    std::fs::write(out_path, text)
        .with_context(|| format!("writing {}", out_path.display()))?;
    Ok(())
}

/// Rebuild a character from its serialized form. `transformed_data` is
/// carried opaquely; instruction arguments are re-parsed from their
/// rendered text. Used by regression tooling to check round-trips.
pub fn character_from_document(doc: &Value) -> Result<ParsedCharacter> {
    let mut metadata = CharacterMetadata::default();
    for (key, value) in object(doc, "metadata")? {
        metadata.set(key.clone(), value.as_str().unwrap_or_default());
    }

    let mut variables = indexmap::IndexMap::new();
    for (name, entry) in object(doc, "variables")? {
        let subtype = entry["Subtype"].as_str().unwrap_or_default();
        variables.insert(
            name.clone(),
            VariableDescriptor {
                name: name.clone(),
                mutability: parse_mutability(entry["Mutability"].as_str().unwrap_or_default())?,
                var_type: parse_type_name(entry["Type"].as_str().unwrap_or_default())?,
                subtype: (!subtype.is_empty()).then(|| subtype.to_string()),
                value: entry["Value"].as_str().unwrap_or_default().to_string(),
            },
        );
    }

    let mut states = indexmap::IndexMap::new();
    for (name, entry) in object(doc, "states")? {
        let mut state = StateDescriptor::new(name.clone());
        state.kind = parse_kind_name(entry["Type"].as_str().unwrap_or("Normal"))?;
        state.parent = entry["Parent"].as_str().map(str::to_string);
        if let Some(flags) = entry["TransitionFlags"].as_array() {
            state.transition_flags = flags
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect();
        }
        if let Some(phases) = entry["Phases"].as_object() {
            for (phase, body) in phases {
                let mut list = Vec::new();
                for rendered in body["instructions"].as_array().into_iter().flatten() {
                    list.push(reparse_instruction(rendered)?);
                }
                state.phases.insert(phase.clone(), list);
            }
        }
        states.insert(name.clone(), state);
    }

    let mut transformed_data = indexmap::IndexMap::new();
    for (name, value) in object(doc, "transformed_data")? {
        transformed_data.insert(name.clone(), value.clone());
    }

    Ok(ParsedCharacter {
        metadata,
        variables,
        states,
        specblocks: Default::default(),
        subentities: Default::default(),
        transformed_data,
    })
}

fn object<'a>(doc: &'a Value, key: &str) -> Result<&'a Map<String, Value>> {
    doc[key]
        .as_object()
        .ok_or_else(|| anyhow!("document has no `{key}` object"))
}

fn reparse_instruction(rendered: &Value) -> Result<crate::model::InstructionDescriptor> {
    let name = rendered["name"]
        .as_str()
        .ok_or_else(|| anyhow!("instruction without name"))?;
    let args: Vec<&str> = rendered["args"]
        .as_array()
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let line = rendered["line"].as_u64().unwrap_or(0) as usize;

    let text = if args.is_empty() {
        name.to_string()
    } else {
        format!("{}({})", name, args.join(", "))
    };
    let mut diags = Diagnostics::new(false);
    instruction::parse_instruction(&text, line, Path::new("<document>"), &mut diags)
        .ok_or_else(|| anyhow!("instruction `{text}` did not re-parse"))
}

fn type_name(ty: VariableType) -> &'static str {
    match ty {
        VariableType::Integer => "Integer",
        VariableType::String => "String",
        VariableType::Generic => "Generic",
        VariableType::Vector2 => "Vector2",
        VariableType::Vector3 => "Vector3",
        VariableType::Box => "Box",
        VariableType::Boolean => "Boolean",
    }
}

fn parse_type_name(name: &str) -> Result<VariableType> {
    match name {
        "Integer" => Ok(VariableType::Integer),
        "String" => Ok(VariableType::String),
        "Generic" => Ok(VariableType::Generic),
        "Vector2" => Ok(VariableType::Vector2),
        "Vector3" => Ok(VariableType::Vector3),
        "Box" => Ok(VariableType::Box),
        "Boolean" => Ok(VariableType::Boolean),
        other => Err(anyhow!("unknown variable type `{other}` in document")),
    }
}

fn mutability_name(m: Mutability) -> &'static str {
    match m {
        Mutability::Variable => "Variable",
        Mutability::Define => "Define",
        Mutability::Internal => "Internal",
    }
}

fn parse_mutability(name: &str) -> Result<Mutability> {
    match name {
        "Variable" => Ok(Mutability::Variable),
        "Define" => Ok(Mutability::Define),
        "Internal" => Ok(Mutability::Internal),
        other => Err(anyhow!("unknown mutability `{other}` in document")),
    }
}

fn kind_name(kind: StateKind) -> &'static str {
    match kind {
        StateKind::Normal => "Normal",
        StateKind::BaseState => "BaseState",
        StateKind::Helper => "Helper",
        StateKind::Special => "Special",
    }
}

fn parse_kind_name(name: &str) -> Result<StateKind> {
    match name {
        "Normal" => Ok(StateKind::Normal),
        "BaseState" => Ok(StateKind::BaseState),
        "Helper" => Ok(StateKind::Helper),
        "Special" => Ok(StateKind::Special),
        other => Err(anyhow!("unknown state kind `{other}` in document")),
    }
}
