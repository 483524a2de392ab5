use std::collections::HashMap;

use depgraph_core::edge::{DependencyRelationship, ReferenceGroup};
use depgraph_core::error::Result;
use depgraph_core::node::Node;
use depgraph_core::types::{DegreeRange, ElementId, QueryOptions};

use crate::component_path::ComponentPath;
use crate::node_store::NodeStore;

/// Lifts every path to `depth` in place.
pub fn lift_all(paths: &mut [ComponentPath], depth: usize, node_store: &NodeStore) -> Result<()> {
    for path in paths.iter_mut() {
        path.lift(depth, node_store)?;
    }
    Ok(())
}

pub fn flatten(paths: Vec<ComponentPath>) -> Vec<DependencyRelationship> {
    paths.into_iter().flat_map(|p| p.dependency_edges).collect()
}

/// Self-edge filter plus the three independent relation-scope toggles
/// — applied together since both
/// are evaluated per-edge against the same endpoint membership facts.
pub fn apply_scope_filters(edges: Vec<DependencyRelationship>, node_store: &NodeStore, options: &QueryOptions) -> Vec<DependencyRelationship> {
    edges
        .into_iter()
        .filter(|edge| {
            if !options.self_edges_allowed() && edge.is_self_edge() {
                return false;
            }
            scope_allows(edge, node_store, options)
        })
        .collect()
}

fn scope_allows(edge: &DependencyRelationship, node_store: &NodeStore, options: &QueryOptions) -> bool {
    let start_in_selection = node_store.get(&edge.start_node).map(|n| n.in_selection).unwrap_or(false);
    let end_in_selection = node_store.get(&edge.end_node).map(|n| n.in_selection).unwrap_or(false);

    if options.show_selected_internal_relations == Some(false) && start_in_selection && end_in_selection {
        return false;
    }

    let same_domain = node_store.root_ancestor(&edge.start_node) == node_store.root_ancestor(&edge.end_node);

    if options.show_domain_internal_relations == Some(false) && same_domain {
        return false;
    }
    if options.show_external_relations == Some(false) && !same_domain {
        return false;
    }

    true
}

/// Per-endpoint-side degree filter, counted *before* duplicate merging
/// — otherwise a pair of identical lifted
/// edges would be undercounted as one.
pub fn degree_filter(edges: Vec<DependencyRelationship>, outgoing: DegreeRange, incoming: DegreeRange, node_store: &NodeStore) -> Vec<DependencyRelationship> {
    let mut outgoing_counts: HashMap<ElementId, usize> = HashMap::new();
    let mut incoming_counts: HashMap<ElementId, usize> = HashMap::new();

    for edge in &edges {
        if node_store.get(&edge.start_node).map(|n| n.in_selection).unwrap_or(false) {
            *outgoing_counts.entry(edge.start_node.clone()).or_insert(0) += 1;
        }
        if node_store.get(&edge.end_node).map(|n| n.in_selection).unwrap_or(false) {
            *incoming_counts.entry(edge.end_node.clone()).or_insert(0) += 1;
        }
    }

    edges
        .into_iter()
        .filter(|edge| {
            let start_in_selection = node_store.get(&edge.start_node).map(|n| n.in_selection).unwrap_or(false);
            let out_ok = !start_in_selection || outgoing.contains(*outgoing_counts.get(&edge.start_node).unwrap_or(&0));

            let end_in_selection = node_store.get(&edge.end_node).map(|n| n.in_selection).unwrap_or(false);
            let in_ok = !end_in_selection || incoming.contains(*incoming_counts.get(&edge.end_node).unwrap_or(&0));

            out_ok && in_ok
        })
        .collect()
}

/// Two dependencies sharing a post-lift `(start, end)` pair get the same
/// element-id, first-seen wins, so the renderer sees a stable id once
/// merging folds them together.
pub fn assign_canonical_ids(edges: &mut [DependencyRelationship]) {
    let mut seen: HashMap<(ElementId, ElementId), String> = HashMap::new();
    for edge in edges.iter_mut() {
        let key = edge.endpoint_pair();
        let canonical = seen.entry(key).or_insert_with(|| edge.element_id.clone());
        edge.element_id = canonical.clone();
    }
}

/// Folds dependencies sharing a `(start_node, end_node)` pair into one,
/// aggregating module/function dependency counts, dependency types and
/// reference groups. Idempotent: running this twice
/// over an already-merged set leaves the aggregate fields unchanged.
pub fn merge_duplicates(edges: Vec<DependencyRelationship>) -> Vec<DependencyRelationship> {
    let mut groups: HashMap<(ElementId, ElementId), DependencyRelationship> = HashMap::new();
    for edge in edges {
        let key = edge.endpoint_pair();
        match groups.remove(&key) {
            Some(mut acc) => {
                merge_into(&mut acc, &edge);
                groups.insert(key, acc);
            }
            None => {
                groups.insert(key, seed_merge(edge));
            }
        }
    }
    groups.into_values().collect()
}

fn seed_merge(mut edge: DependencyRelationship) -> DependencyRelationship {
    if edge.nr_module_dependencies.is_none() {
        edge.nr_module_dependencies = Some(1);
    }
    if edge.nr_function_dependencies.is_none() {
        edge.nr_function_dependencies = edge.nr_dependencies;
    }
    if edge.dependency_types.is_none() {
        edge.dependency_types = edge.dependency_type.map(|t| vec![t]);
    }
    if edge.references.is_none() {
        edge.references = edge.reference_type.clone().map(|reference_type| {
            vec![ReferenceGroup {
                reference_type,
                names: edge.reference_names.clone(),
            }]
        });
    }
    edge
}

fn merge_into(acc: &mut DependencyRelationship, other: &DependencyRelationship) {
    acc.nr_module_dependencies = Some(acc.nr_module_dependencies.unwrap_or(1) + 1);
    acc.nr_function_dependencies = Some(acc.nr_function_dependencies.unwrap_or(0) + other.nr_dependencies.unwrap_or(0));

    if let Some(t) = other.dependency_type {
        let types = acc.dependency_types.get_or_insert_with(Vec::new);
        if !types.contains(&t) {
            types.push(t);
        }
    }

    if let Some(reference_type) = &other.reference_type {
        let groups = acc.references.get_or_insert_with(Vec::new);
        match groups.iter_mut().find(|g| &g.reference_type == reference_type) {
            Some(group) => {
                for name in &other.reference_names {
                    if !group.names.contains(name) {
                        group.names.push(name.clone());
                    }
                }
            }
            None => groups.push(ReferenceGroup {
                reference_type: reference_type.clone(),
                names: other.reference_names.clone(),
            }),
        }
    }

    acc.violations.sublayer |= other.violations.sublayer;
    acc.violations.dependency_cycle |= other.violations.dependency_cycle;
}

/// Node filtering: keeps ids appearing on a
/// surviving edge plus their ancestors, unioned with every node already
/// marked `in_selection` (the selected subtree).
pub fn select_result_nodes(node_store: &NodeStore, edges: &[DependencyRelationship]) -> HashMap<ElementId, Node> {
    let mut keep = std::collections::HashSet::new();
    for edge in edges {
        keep.insert(edge.start_node.clone());
        keep.insert(edge.end_node.clone());
    }

    let mut frontier: Vec<ElementId> = keep.iter().cloned().collect();
    while let Some(id) = frontier.pop() {
        if let Some(parent) = node_store.get(&id).and_then(|n| n.parent.clone()) {
            if keep.insert(parent.clone()) {
                frontier.push(parent);
            }
        }
    }

    for (id, node) in node_store.iter() {
        if node.in_selection {
            keep.insert(id.clone());
        }
    }

    node_store
        .iter()
        .filter(|(id, _)| keep.contains(*id))
        .map(|(id, node)| (id.clone(), node.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use depgraph_core::edge::ViolationFlags;
    use depgraph_core::types::DependencyType;

    fn dep(id: &str, start: &str, end: &str, nr_dependencies: u64, dependency_type: DependencyType) -> DependencyRelationship {
        DependencyRelationship {
            element_id: id.into(),
            start_node: start.into(),
            end_node: end.into(),
            edge_type: "CALLS".into(),
            reference_type: None,
            dependency_type: Some(dependency_type),
            reference_names: Vec::new(),
            nr_dependencies: Some(nr_dependencies),
            nr_calls: None,
            original_start_node: None,
            original_end_node: None,
            dependency_types: None,
            references: None,
            nr_module_dependencies: None,
            nr_function_dependencies: None,
            violations: ViolationFlags::default(),
        }
    }

    #[test]
    fn merge_aggregates_counts_as_in_the_worked_example() {
        let edges = vec![
            dep("e1", "A", "A", 3, DependencyType::Strong),
            dep("e2", "A", "A", 5, DependencyType::Strong),
        ];
        let merged = merge_duplicates(edges);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].nr_function_dependencies, Some(8));
        assert_eq!(merged[0].nr_module_dependencies, Some(2));
    }

    #[test]
    fn merge_is_idempotent() {
        let edges = vec![dep("e1", "A", "A", 3, DependencyType::Strong), dep("e2", "A", "A", 5, DependencyType::Strong)];
        let once = merge_duplicates(edges);
        let twice = merge_duplicates(once.clone());
        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].nr_function_dependencies, twice[0].nr_function_dependencies);
        assert_eq!(once[0].nr_module_dependencies, twice[0].nr_module_dependencies);
    }

    #[test]
    fn degree_filter_matches_the_worked_example() {
        use crate::containment::ContainmentIndex;
        use crate::node_store::NodeStore;
        use depgraph_core::record_source::{GraphNode, PathRecord};
        use std::collections::HashMap as Map;

        let ids = ["M1", "M2", "M3", "M4", "M5", "M6"];
        let nodes: Vec<GraphNode> = ids
            .iter()
            .map(|id| GraphNode {
                element_id: (*id).into(),
                identity: 0,
                labels: vec!["Module".into()],
                properties: Map::new(),
            })
            .collect();
        let paths = vec![PathRecord {
            nodes,
            relationships: Vec::new(),
        }];
        let store = NodeStore::construct(&paths, None, Some(&"M1".to_string()), &ContainmentIndex::default());

        let edges = vec![
            dep("e1", "M1", "M2", 1, DependencyType::Strong),
            dep("e2", "M1", "M3", 1, DependencyType::Strong),
            dep("e3", "M1", "M4", 1, DependencyType::Strong),
            dep("e4", "M1", "M5", 1, DependencyType::Strong),
            dep("e5", "M1", "M6", 1, DependencyType::Strong),
        ];

        let filtered = degree_filter(edges.clone(), DegreeRange { min: None, max: Some(3) }, DegreeRange::default(), &store);
        assert!(filtered.is_empty());

        let filtered = degree_filter(edges.clone(), DegreeRange { min: Some(6), max: None }, DegreeRange::default(), &store);
        assert!(filtered.is_empty());

        let filtered = degree_filter(edges, DegreeRange { min: Some(1), max: Some(5) }, DegreeRange::default(), &store);
        assert_eq!(filtered.len(), 5);
    }
}
