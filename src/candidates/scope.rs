//! Path scoping for module-graph candidates

use crate::candidates::SharedCandidates;
use crate::compiler::SourceRoot;
use crate::core::ids::to_slash;
use std::collections::HashSet;

/// `C:` style prefix of an absolute Windows path
fn has_drive_letter(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_uppercase() && bytes[1] == b':'
}

/// Whether candidates recorded for module `id` belong to a root scoped to
/// `base_path`.
///
/// Without a base everything qualifies. Ids that are not file-system
/// absolute are treated as virtual modules and always qualify.
pub fn should_include_candidates_from(id: &str, base_path: Option<&str>) -> bool {
    let Some(base_path) = base_path else {
        return true;
    };

    if id.starts_with(base_path) {
        return true;
    }

    // Absolute Windows path outside the base
    if has_drive_letter(id) {
        return false;
    }

    // Not absolute: a virtual or bundler-internal module
    if !id.starts_with('/') {
        return true;
    }

    // Absolute POSIX path outside the base
    false
}

/// Union of the shared candidates that fall inside `root`'s scope.
///
/// A `source(none)` root takes nothing from the module graph.
pub fn module_graph_candidates(root: &SourceRoot, shared: &SharedCandidates) -> HashSet<String> {
    if *root == SourceRoot::None {
        return HashSet::new();
    }

    let base_path = root.explicit_base().map(|base| to_slash(&base));

    let mut merged = HashSet::new();
    for (id, candidates) in shared {
        if !should_include_candidates_from(id, base_path.as_deref()) {
            continue;
        }
        merged.extend(candidates.iter().cloned());
    }
    merged
}
