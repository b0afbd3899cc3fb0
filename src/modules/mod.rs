//! Module transform pass.
//!
//! Modules interpret merged specblock data into typed structures for one
//! engine subsystem each. The parser never discovers modules on its own;
//! the caller hands in an ordered list and each module's one pure
//! operation runs exactly once per parse.

pub mod defines;

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use crate::model::SpecblockDefines;
use crate::parser::diag::{DiagnosticCode, Diagnostics};

pub use defines::DefinesModule;

/// One engine module's parse-time surface.
pub trait CharacterModule {
    fn name(&self) -> &str;

    /// Turn the merged defines into this module's structure. `Ok(None)`
    /// means nothing relevant was present and the module gets no entry in
    /// the output at all.
    fn transform_defines(&self, defines: &SpecblockDefines)
    -> anyhow::Result<Option<serde_json::Value>>;

    /// Specblocks this module requires to be add-only under inheritance:
    /// a child redefining an inherited key in one of these is a merge
    /// conflict.
    fn no_overwrite_blocks(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Collect the no-overwrite block names declared by the caller's modules.
pub fn no_overwrite_blocks(modules: &[Box<dyn CharacterModule>]) -> HashSet<String> {
    modules
        .iter()
        .flat_map(|m| m.no_overwrite_blocks())
        .collect()
}

/// Run every transform once, in caller order. A failing module is a
/// warning and its entry is omitted; it never aborts the parse.
pub fn run_transforms(
    modules: &[Box<dyn CharacterModule>],
    defines: &SpecblockDefines,
    path: &Path,
    diags: &mut Diagnostics,
) -> IndexMap<String, serde_json::Value> {
    let mut transformed = IndexMap::new();

    for module in modules {
        match module.transform_defines(defines) {
            Ok(Some(value)) => {
                log::debug!("module `{}` produced data", module.name());
                transformed.insert(module.name().to_string(), value);
            }
            Ok(None) => {
                log::debug!("module `{}` had nothing relevant", module.name());
            }
            Err(e) => {
                diags.report(
                    DiagnosticCode::ModuleTransformFailure,
                    path,
                    0,
                    format!("module `{}` transform failed: {e:#}", module.name()),
                );
            }
        }
    }

    transformed
}

/// The module set the CLI registers, mirroring the engine's base systems.
pub fn standard_modules() -> Vec<Box<dyn CharacterModule>> {
    vec![
        Box::new(DefinesModule::new("Core", "Core")),
        Box::new(DefinesModule::new("Graphics", "Graphics")),
        Box::new(DefinesModule::new("Anims", "Anims")),
        Box::new(DefinesModule::new("PhysicsMovement", "PhysicsMovement")),
    ]
}
