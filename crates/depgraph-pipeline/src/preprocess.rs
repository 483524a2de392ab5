use std::collections::HashMap;

use depgraph_core::error::{Error, Result};
use depgraph_core::types::QueryOptions;

use crate::component_path::ComponentPath;
use crate::node_store::NodeStore;

/// Invariant 2: every dependency relationship connects two leaves at the
/// same ancestry depth. Checked once, up front, over every parsed path —
/// a violation means the store itself is corrupted, so it is fatal rather
/// than filtered away.
pub fn check_leaf_depth_invariant(paths: &[ComponentPath], node_store: &NodeStore) -> Result<()> {
    for path in paths {
        for edge in &path.dependency_edges {
            let depth_a = node_store.get(&edge.start_node).map(|n| n.depth as usize).unwrap_or(0);
            let depth_b = node_store.get(&edge.end_node).map(|n| n.depth as usize).unwrap_or(0);
            if depth_a != depth_b {
                return Err(Error::DepthInvariantBroken {
                    a: edge.start_node.clone(),
                    b: edge.end_node.clone(),
                    depth_a,
                    depth_b,
                });
            }
        }
    }
    Ok(())
}

/// Keeps, per `path_id`, only the record with the largest `target_depth` —
/// shorter-target-depth copies of the same dependency chain would inflate
/// the fan-in/fan-out counts the degree filter relies on.
pub fn dedup_longest_path(paths: Vec<ComponentPath>) -> Vec<ComponentPath> {
    let mut best: HashMap<String, ComponentPath> = HashMap::new();
    for path in paths {
        let id = path.path_id();
        match best.get(&id) {
            Some(existing) if existing.target_depth >= path.target_depth => {}
            _ => {
                best.insert(id, path);
            }
        }
    }
    best.into_values().collect()
}

/// Drops any path whose source- or target-side root ancestor full-name
/// matches one of `excluded_domains`.
pub fn exclude_domains(paths: Vec<ComponentPath>, node_store: &NodeStore, excluded_domains: &[String]) -> Vec<ComponentPath> {
    if excluded_domains.is_empty() {
        return paths;
    }
    paths
        .into_iter()
        .filter(|path| {
            let source_root = node_store.root_ancestor(&path.start_node);
            let target_root = node_store.root_ancestor(&path.end_node);
            let source_name = node_store.get(&source_root).map(|n| n.full_name.as_str()).unwrap_or_default();
            let target_name = node_store.get(&target_root).map(|n| n.full_name.as_str()).unwrap_or_default();
            !excluded_domains.iter().any(|d| d == source_name || d == target_name)
        })
        .collect()
}

/// Drops individual dependency edges whose `dependency_type` the request
/// excludes, before lifting runs. Paths
/// themselves are never dropped by this filter, only the edges within
/// them — a path with an empty dependency middle still informs the Node
/// Store.
pub fn filter_dependency_types(mut paths: Vec<ComponentPath>, options: &QueryOptions) -> Vec<ComponentPath> {
    if !options.dependency_type_filter_active() {
        return paths;
    }
    for path in &mut paths {
        path.dependency_edges.retain(|edge| options.allows_dependency_type(edge.dependency_type));
    }
    paths
}
