use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

/// Whether a declaration is a runtime variable, a constant define, or an
/// engine-reserved internal (names starting with `_`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mutability {
    Variable,
    Define,
    Internal,
}

/// Declared variable types. The parser only records the tag; it never
/// converts the default text into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VariableType {
    Integer,
    String,
    Generic,
    Vector2,
    Vector3,
    Box,
    Boolean,
}

impl VariableType {
    /// The tag as it appears in a declaration (`var Health int() = 1000`).
    pub fn tag(&self) -> &'static str {
        match self {
            VariableType::Integer => "int",
            VariableType::String => "str",
            VariableType::Generic => "var",
            VariableType::Vector2 => "vec2",
            VariableType::Vector3 => "vec3",
            VariableType::Box => "box",
            VariableType::Boolean => "bool",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "int" => Some(VariableType::Integer),
            "str" => Some(VariableType::String),
            "var" => Some(VariableType::Generic),
            "vec2" => Some(VariableType::Vector2),
            "vec3" => Some(VariableType::Vector3),
            "box" => Some(VariableType::Box),
            "bool" => Some(VariableType::Boolean),
            _ => None,
        }
    }
}

/// State kinds recognised in a state header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StateKind {
    Normal,
    BaseState,
    Helper,
    Special,
}

impl StateKind {
    /// `None` means the token is not a kind and should be read as a parent
    /// state name instead.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "BaseState" => Some(StateKind::BaseState),
            "Helper" => Some(StateKind::Helper),
            "Special" => Some(StateKind::Special),
            _ => None,
        }
    }
}

/// ─────────────────────────────────────────────────────
/// Descriptors
/// ─────────────────────────────────────────────────────

/// One `var`/`def` declaration. The default stays raw text; coercion is the
/// consuming module's job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDescriptor {
    pub name: String,
    pub mutability: Mutability,
    pub var_type: VariableType,
    pub subtype: Option<String>,
    pub value: String,
}

/// One parsed action line: a name plus zero or more arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstructionDescriptor {
    pub name: String,
    pub args: Vec<Argument>,
    pub line: usize,
}

/// A single argument. Nested calls keep their own argument lists, so depth
/// is unbounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Argument {
    /// Bare token (`1000`, `Standing`, a variable reference, ...).
    Token(String),
    /// Double-quoted string, quotes removed and escapes resolved.
    Str(String),
    /// Nested instruction call.
    Call(InstructionDescriptor),
}

impl Argument {
    /// The argument rendered back to source-ish text, used by the document
    /// writer and in diagnostics.
    pub fn as_text(&self) -> String {
        match self {
            Argument::Token(t) => t.clone(),
            Argument::Str(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Argument::Call(call) => {
                let inner: Vec<String> = call.args.iter().map(|a| a.as_text()).collect();
                format!("{}({})", call.name, inner.join(", "))
            }
        }
    }
}

/// One state block: header attributes plus phase -> ordered instructions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateDescriptor {
    pub name: String,
    pub kind: StateKind,
    pub parent: Option<String>,
    pub transition_flags: Vec<String>,
    pub phases: IndexMap<String, Vec<InstructionDescriptor>>,
}

impl StateDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: StateKind::Normal,
            parent: None,
            transition_flags: Vec::new(),
            phases: IndexMap::new(),
        }
    }
}

/// Character metadata: an ordered key -> value map with accessors for the
/// well-known keys. Unknown keys are kept for forward compatibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CharacterMetadata {
    pub fields: IndexMap<String, String>,
}

impl CharacterMetadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn name(&self) -> &str {
        self.get("Name").unwrap_or("")
    }

    pub fn author(&self) -> &str {
        self.get("Author").unwrap_or("")
    }

    pub fn description(&self) -> &str {
        self.get("Description").unwrap_or("")
    }

    /// Non-empty `Skeleton` key triggers inheritance.
    pub fn skeleton(&self) -> Option<&str> {
        self.get("Skeleton").filter(|s| !s.is_empty())
    }
}

/// One raw specblock value together with where it was defined, so merge
/// conflicts can cite both origins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawDefine {
    pub value: String,
    pub file: PathBuf,
    pub line: usize,
}

/// One named specblock: ordered key -> raw value map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Specblock {
    pub entries: IndexMap<String, RawDefine>,
}

impl Specblock {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|d| d.value.as_str())
    }
}

/// All specblocks of one character, keyed by block name.
pub type SpecblockDefines = IndexMap<String, Specblock>;

/// Nested character-like record for subentities. The body is out of scope
/// for the parser; the interface is kept so consumers have a stable shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubentityDescriptor {
    pub variables: IndexMap<String, VariableDescriptor>,
    pub states: IndexMap<String, StateDescriptor>,
}

/// The fully merged and transformed character. Immutable once assembled;
/// safe to share across threads.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedCharacter {
    pub metadata: CharacterMetadata,
    pub variables: IndexMap<String, VariableDescriptor>,
    pub states: IndexMap<String, StateDescriptor>,
    pub specblocks: SpecblockDefines,
    pub subentities: IndexMap<String, SubentityDescriptor>,
    /// Module name -> module-specific structure. A module with nothing
    /// relevant simply has no entry here.
    pub transformed_data: IndexMap<String, serde_json::Value>,
}
