use std::collections::{HashMap, HashSet};

use depgraph_core::edge::DependencyRelationship;
use depgraph_core::record_source::DependencyCycle;
use depgraph_core::types::ElementId;
use depgraph_core::violations::{CycleRender, ExtendedEdge};

use crate::node_store::NodeStore;

use super::node_data;

/// Rewrites store-reported cycles into post-abstraction identifiers and
/// groups them into `CycleRender`s.
pub fn extract(
    raw_cycles: Vec<DependencyCycle>,
    depth: usize,
    edges: &mut [DependencyRelationship],
    node_store: &NodeStore,
    surviving_node_ids: &HashSet<ElementId>,
) -> Vec<CycleRender> {
    let mut by_original_pair: HashMap<(ElementId, ElementId), usize> = HashMap::new();
    for (index, edge) in edges.iter().enumerate() {
        by_original_pair.insert(edge.original_endpoint_pair(), index);
    }

    let mut groups: HashMap<String, CycleRender> = HashMap::new();

    for cycle in raw_cycles {
        let mut rendered_path: Vec<ExtendedEdge> = Vec::with_capacity(cycle.segments.len());

        for segment in &cycle.segments {
            let original_pair = (segment.start.element_id.clone(), segment.end.element_id.clone());
            if let Some(&index) = by_original_pair.get(&original_pair) {
                edges[index].violations.dependency_cycle = true;
                let edge = &edges[index];
                rendered_path.push(ExtendedEdge {
                    id: edge.element_id.clone(),
                    start: node_data(node_store, &edge.start_node),
                    end: node_data(node_store, &edge.end_node),
                    edge_type: edge.edge_type.clone(),
                });
            } else {
                let lifted_start = node_store
                    .lift_to_depth(&segment.start.element_id, depth)
                    .unwrap_or_else(|| segment.start.element_id.clone());
                let lifted_end = node_store
                    .lift_to_depth(&segment.end.element_id, depth)
                    .unwrap_or_else(|| segment.end.element_id.clone());
                let id = format!("cycle-edge-{lifted_start}--{lifted_end}");
                rendered_path.push(ExtendedEdge {
                    id,
                    start: node_data(node_store, &lifted_start),
                    end: node_data(node_store, &lifted_end),
                    edge_type: segment.relationship.rel_type.clone(),
                });
            }
        }

        let all_self_edges = !rendered_path.is_empty() && rendered_path.iter().all(|e| e.start.id == e.end.id);
        let filtered_path: Vec<ExtendedEdge> = if all_self_edges {
            rendered_path.into_iter().take(1).collect()
        } else {
            rendered_path.into_iter().filter(|e| e.start.id != e.end.id).collect()
        };

        if filtered_path.is_empty() {
            continue;
        }

        let node_id_lifted = node_store.lift_to_depth(&cycle.node, depth).unwrap_or_else(|| cycle.node.clone());
        if !surviving_node_ids.contains(&node_id_lifted) {
            continue;
        }

        let cycle_id = format!(
            "{}--{}",
            node_id_lifted,
            filtered_path.iter().map(|e| e.id.as_str()).collect::<Vec<_>>().join("-")
        );

        let render = groups.entry(cycle_id.clone()).or_insert_with(|| CycleRender {
            id: cycle_id,
            node: node_data(node_store, &node_id_lifted),
            path: filtered_path.clone(),
            length: filtered_path.len(),
            actual_cycles: Vec::new(),
        });
        render.actual_cycles.push(cycle);
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containment::ContainmentIndex;
    use depgraph_core::edge::ViolationFlags;
    use depgraph_core::record_source::{CycleSegment, GraphNode, GraphRelationship, PathRecord};
    use std::collections::HashMap as Map;

    fn graph_node(id: &str, depth: u64) -> GraphNode {
        let mut properties = Map::new();
        properties.insert("simple_name".to_string(), serde_json::json!(id));
        properties.insert("full_name".to_string(), serde_json::json!(id));
        properties.insert("depth".to_string(), serde_json::json!(depth));
        GraphNode {
            element_id: id.into(),
            identity: 0,
            labels: vec!["Module".into()],
            properties,
        }
    }

    fn rel(id: &str, start: &str, end: &str) -> GraphRelationship {
        GraphRelationship {
            element_id: id.into(),
            rel_type: "CALLS".into(),
            start_node_element_id: start.into(),
            end_node_element_id: end.into(),
            properties: Map::new(),
        }
    }

    fn dep(id: &str, start: &str, end: &str, original_start: &str, original_end: &str) -> DependencyRelationship {
        DependencyRelationship {
            element_id: id.into(),
            start_node: start.into(),
            end_node: end.into(),
            edge_type: "CALLS".into(),
            reference_type: None,
            dependency_type: None,
            reference_names: Vec::new(),
            nr_dependencies: None,
            nr_calls: None,
            original_start_node: Some(original_start.into()),
            original_end_node: Some(original_end.into()),
            dependency_types: None,
            references: None,
            nr_module_dependencies: None,
            nr_function_dependencies: None,
            violations: ViolationFlags::default(),
        }
    }

    #[test]
    fn rewrites_cycle_to_lifted_endpoints_matching_worked_example() {
        let nodes = vec![
            graph_node("A1", 1),
            graph_node("A2", 1),
            graph_node("A3", 1),
            graph_node("M1", 2),
            graph_node("M2", 2),
            graph_node("M3", 2),
        ];
        let mut source_to_targets = Map::new();
        source_to_targets.insert("A1".to_string(), vec!["M1".to_string()]);
        source_to_targets.insert("A2".to_string(), vec!["M2".to_string()]);
        source_to_targets.insert("A3".to_string(), vec!["M3".to_string()]);
        let mut target_to_source = Map::new();
        target_to_source.insert("M1".to_string(), "A1".to_string());
        target_to_source.insert("M2".to_string(), "A2".to_string());
        target_to_source.insert("M3".to_string(), "A3".to_string());
        let containment = ContainmentIndex {
            source_to_targets,
            target_to_source,
        };
        let paths = vec![PathRecord {
            nodes,
            relationships: Vec::new(),
        }];
        let store = NodeStore::construct(&paths, None, None, &containment);

        let mut edges = vec![
            dep("e1", "A1", "A2", "M1", "M2"),
            dep("e2", "A2", "A3", "M2", "M3"),
            dep("e3", "A3", "A1", "M3", "M1"),
        ];

        let cycle = DependencyCycle {
            node: "M1".into(),
            segments: vec![
                CycleSegment {
                    start: graph_node("M1", 2),
                    relationship: rel("r1", "M1", "M2"),
                    end: graph_node("M2", 2),
                },
                CycleSegment {
                    start: graph_node("M2", 2),
                    relationship: rel("r2", "M2", "M3"),
                    end: graph_node("M3", 2),
                },
                CycleSegment {
                    start: graph_node("M3", 2),
                    relationship: rel("r3", "M3", "M1"),
                    end: graph_node("M1", 2),
                },
            ],
        };

        let surviving: HashSet<ElementId> = ["A1", "A2", "A3"].iter().map(|s| s.to_string()).collect();
        let renders = extract(vec![cycle], 1, &mut edges, &store, &surviving);

        assert_eq!(renders.len(), 1);
        assert_eq!(renders[0].length, 3);
        assert_eq!(renders[0].actual_cycles.len(), 1);
        assert!(edges.iter().all(|e| e.violations.dependency_cycle));
    }
}
