//! Skeleton inheritance: recursive parent-file loading and field-level
//! merge.
//!
//! The currently-loading path set travels down the recursion explicitly,
//! so a skeleton cycle fails with a diagnostic instead of looping. Merge
//! precedence: child metadata keys overwrite parent keys, child variables
//! and states replace parent entries of the same name wholesale, and
//! specblocks merge key-by-key (child wins unless a module declared the
//! block no-overwrite).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::RawCharacter;
use super::diag::{DiagnosticCode, Diagnostics};

/// Parse `path` and, recursively, its skeleton chain, returning the merged
/// result. `None` means a fatal problem ended this branch; the diagnostics
/// say where.
pub fn load_with_inheritance(
    path: &Path,
    loading: &mut Vec<PathBuf>,
    no_overwrite: &HashSet<String>,
    diags: &mut Diagnostics,
) -> Option<RawCharacter> {
    loading.push(canonical(path));
    let result = load_inner(path, loading, no_overwrite, diags);
    loading.pop();
    result
}

fn load_inner(
    path: &Path,
    loading: &mut Vec<PathBuf>,
    no_overwrite: &HashSet<String>,
    diags: &mut Diagnostics,
) -> Option<RawCharacter> {
    let mut character = super::parse_file(path, diags)?;

    let Some(skeleton) = character.metadata.skeleton().map(str::to_string) else {
        return Some(character);
    };
    let skeleton_line = character.skeleton_line;

    let parent_path = resolve_relative(path, &skeleton);
    if loading.contains(&canonical(&parent_path)) {
        diags.report(
            DiagnosticCode::CyclicInheritance,
            path,
            skeleton_line,
            format!("skeleton `{skeleton}` is already on the inheritance chain"),
        );
        return None;
    }

    log::debug!("{} inherits from {}", path.display(), parent_path.display());
    let mark = diags.len();
    let Some(parent) = load_with_inheritance(&parent_path, loading, no_overwrite, diags) else {
        // The root cause is already recorded; add the referencing site
        // under the same code so cycles are not mislabeled as I/O.
        let code = if diags
            .iter()
            .skip(mark)
            .any(|d| d.code == DiagnosticCode::CyclicInheritance)
        {
            DiagnosticCode::CyclicInheritance
        } else {
            DiagnosticCode::IoError
        };
        diags.report(
            code,
            path,
            skeleton_line,
            format!("failed to load skeleton `{skeleton}`"),
        );
        return None;
    };

    merge_parent_into_child(&mut character, parent, no_overwrite, diags);
    Some(character)
}

/// Skeleton paths resolve relative to the referencing file's directory.
fn resolve_relative(child: &Path, skeleton: &str) -> PathBuf {
    let skeleton_path = Path::new(skeleton);
    if skeleton_path.is_absolute() {
        return skeleton_path.to_path_buf();
    }
    match child.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(skeleton_path),
        _ => skeleton_path.to_path_buf(),
    }
}

/// Stable identity for cycle detection; falls back to the raw path when
/// the file cannot be canonicalized.
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Fold the fully-resolved parent into the child in place.
pub fn merge_parent_into_child(
    child: &mut RawCharacter,
    parent: RawCharacter,
    no_overwrite: &HashSet<String>,
    diags: &mut Diagnostics,
) {
    // Metadata: child key wins, parent-only keys survive.
    for (key, value) in parent.metadata.fields {
        child.metadata.fields.entry(key).or_insert(value);
    }

    // Variables and states: child entry of the same name fully replaces
    // the parent's; parent-only entries are inherited.
    for (name, var) in parent.variables {
        child.variables.entry(name).or_insert(var);
    }
    for (name, state) in parent.states {
        child.states.entry(name).or_insert(state);
    }

    // Specblocks: merged key-by-key per block.
    for (block_name, parent_block) in parent.specblocks {
        let Some(child_block) = child.specblocks.get_mut(&block_name) else {
            child.specblocks.insert(block_name, parent_block);
            continue;
        };

        let add_only = no_overwrite.contains(&block_name);
        for (key, parent_define) in parent_block.entries {
            match child_block.entries.get_mut(&key) {
                Some(child_define) => {
                    if add_only {
                        diags.report(
                            DiagnosticCode::MergeConflict,
                            child_define.file.clone(),
                            child_define.line,
                            format!(
                                "specblock `{block_name}` is add-only: key `{key}` redefines \
                                 the value inherited from {}:{}",
                                parent_define.file.display(),
                                parent_define.line
                            ),
                        );
                        // Policy says the inherited value is retained.
                        *child_define = parent_define;
                    }
                    // Default policy: the child value stands.
                }
                None => {
                    child_block.entries.insert(key, parent_define);
                }
            }
        }
    }
}
