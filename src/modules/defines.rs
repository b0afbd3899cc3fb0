//! Bundled module that claims one named specblock and coerces its raw
//! values into JSON under a `Defines` key. This is the shape the engine's
//! base systems (Core, Graphics, Anims, PhysicsMovement) consume.

use serde_json::{Map, Value, json};

use crate::model::SpecblockDefines;

use super::CharacterModule;

pub struct DefinesModule {
    name: String,
    block: String,
    no_overwrite: bool,
}

impl DefinesModule {
    pub fn new(name: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            block: block.into(),
            no_overwrite: false,
        }
    }

    /// Declare the claimed block add-only under inheritance.
    pub fn no_overwrite(mut self) -> Self {
        self.no_overwrite = true;
        self
    }
}

impl CharacterModule for DefinesModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform_defines(&self, defines: &SpecblockDefines) -> anyhow::Result<Option<Value>> {
        let block = match defines.get(&self.block) {
            Some(block) if !block.entries.is_empty() => block,
            _ => return Ok(None),
        };

        let mut out = Map::new();
        for (key, define) in &block.entries {
            out.insert(key.clone(), infer_value(&define.value));
        }

        Ok(Some(json!({ "Defines": Value::Object(out) })))
    }

    fn no_overwrite_blocks(&self) -> Vec<String> {
        if self.no_overwrite {
            vec![self.block.clone()]
        } else {
            Vec::new()
        }
    }
}

/// Coerce a raw define value by inference: int, then float, then bool,
/// then 2/3-component numeric tuple, then string (surrounding quotes
/// removed). Mirrors the runtime's loose typing without ever touching
/// parser-owned data.
pub fn infer_value(raw: &str) -> Value {
    let trimmed = raw.trim();

    if let Ok(i) = trimmed.parse::<i64>() {
        return json!(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        return json!(f);
    }
    match trimmed.to_lowercase().as_str() {
        "true" => return json!(true),
        "false" => return json!(false),
        _ => {}
    }
    if let Some(tuple) = parse_tuple(trimmed) {
        return tuple;
    }

    let unquoted = if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
        || (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2)
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    json!(unquoted)
}

/// `x, y` or `(x, y)` (and the 3-component form) as a numeric array. Four
/// or more components is a box and stays text.
fn parse_tuple(s: &str) -> Option<Value> {
    let cleaned = s.trim_matches(|c| c == '(' || c == ')');
    let parts: Vec<&str> = cleaned.split(',').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return None;
    }
    let mut components = Vec::with_capacity(parts.len());
    for part in &parts {
        components.push(part.trim().parse::<f64>().ok()?);
    }
    Some(json!(components))
}
