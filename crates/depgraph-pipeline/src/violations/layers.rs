use std::collections::HashMap;
use std::collections::HashSet;

use depgraph_core::edge::DependencyRelationship;
use depgraph_core::record_source::PathRecord;
use depgraph_core::types::ElementId;
use depgraph_core::violations::{EdgeData, ExtendedEdge, LayerViolation, ViolationCatalogueEntry};

use crate::node_store::NodeStore;

use super::node_data;

/// Builds the `(from_sublayer, to_sublayer)` catalogue from the raw path
/// records a `(source)-[:VIOLATES]->(target)` query returns. Loaded once per
/// request by the caller and passed through explicitly — no process-global
/// cache.
pub fn catalogue_from_records(records: Vec<PathRecord>) -> HashSet<ViolationCatalogueEntry> {
    let mut catalogue = HashSet::new();
    for record in &records {
        for rel in &record.relationships {
            if !rel.rel_type.eq_ignore_ascii_case("VIOLATES") {
                continue;
            }
            let from = record.nodes.iter().find(|n| n.element_id == rel.start_node_element_id);
            let to = record.nodes.iter().find(|n| n.element_id == rel.end_node_element_id);
            if let (Some(from), Some(to)) = (from, to) {
                let from_sublayer = from.properties.get("simple_name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let to_sublayer = to.properties.get("simple_name").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                catalogue.insert(ViolationCatalogueEntry { from_sublayer, to_sublayer });
            }
        }
    }
    catalogue
}

/// Walks each surviving dependency's endpoints to their sublayer ancestor
/// and marks/extracts those matching the catalogue.
pub fn mark_and_extract(edges: &mut [DependencyRelationship], node_store: &NodeStore, catalogue: &HashSet<ViolationCatalogueEntry>) -> Vec<LayerViolation> {
    let mut groups: HashMap<(ElementId, ElementId), LayerViolation> = HashMap::new();

    for edge in edges.iter_mut() {
        let Some(start_sublayer) = node_store.sublayer_ancestor(&edge.start_node) else {
            continue;
        };
        let Some(end_sublayer) = node_store.sublayer_ancestor(&edge.end_node) else {
            continue;
        };

        let from_sublayer = node_store.get(&start_sublayer).map(|n| n.simple_name.clone()).unwrap_or_default();
        let to_sublayer = node_store.get(&end_sublayer).map(|n| n.simple_name.clone()).unwrap_or_default();

        let entry = ViolationCatalogueEntry { from_sublayer, to_sublayer };
        if !catalogue.contains(&entry) {
            continue;
        }

        edge.violations.sublayer = true;

        let key = edge.endpoint_pair();
        let rendered = ExtendedEdge {
            id: edge.element_id.clone(),
            start: node_data(node_store, &edge.start_node),
            end: node_data(node_store, &edge.end_node),
            edge_type: edge.edge_type.clone(),
        };
        let actual_edge = EdgeData {
            id: edge.element_id.clone(),
            start_node: edge.original_start_node.clone().unwrap_or_else(|| edge.start_node.clone()),
            end_node: edge.original_end_node.clone().unwrap_or_else(|| edge.end_node.clone()),
            reference_type: edge.reference_type.clone(),
            nr_dependencies: edge.nr_dependencies,
            nr_calls: edge.nr_calls,
        };

        groups
            .entry(key)
            .or_insert_with(|| LayerViolation {
                edge: rendered,
                actual_edges: Vec::new(),
            })
            .actual_edges
            .push(actual_edge);
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containment::ContainmentIndex;
    use depgraph_core::edge::ViolationFlags;
    use depgraph_core::record_source::GraphNode;
    use std::collections::HashMap as Map;

    fn sublayer_node(id: &str, simple_name: &str) -> GraphNode {
        let mut properties = Map::new();
        properties.insert("simple_name".to_string(), serde_json::json!(simple_name));
        properties.insert("full_name".to_string(), serde_json::json!(simple_name));
        GraphNode {
            element_id: id.into(),
            identity: 0,
            labels: vec!["Sublayer".into()],
            properties,
        }
    }

    fn module_node(id: &str) -> GraphNode {
        let mut properties = Map::new();
        properties.insert("simple_name".to_string(), serde_json::json!(id));
        GraphNode {
            element_id: id.into(),
            identity: 0,
            labels: vec!["Module".into()],
            properties,
        }
    }

    fn dep(start: &str, end: &str) -> DependencyRelationship {
        DependencyRelationship {
            element_id: "e1".into(),
            start_node: start.into(),
            end_node: end.into(),
            edge_type: "CALLS".into(),
            reference_type: None,
            dependency_type: None,
            reference_names: Vec::new(),
            nr_dependencies: None,
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
    fn marks_and_extracts_the_catalogued_violation() {
        let nodes = vec![
            sublayer_node("Controllers", "Controllers"),
            sublayer_node("Repositories", "Repositories"),
            module_node("M1"),
            module_node("M2"),
        ];
        let mut source_to_targets = Map::new();
        source_to_targets.insert("Controllers".to_string(), vec!["M1".to_string()]);
        source_to_targets.insert("Repositories".to_string(), vec!["M2".to_string()]);
        let mut target_to_source = Map::new();
        target_to_source.insert("M1".to_string(), "Controllers".to_string());
        target_to_source.insert("M2".to_string(), "Repositories".to_string());
        let containment = ContainmentIndex {
            source_to_targets,
            target_to_source,
        };
        let paths = vec![depgraph_core::record_source::PathRecord {
            nodes,
            relationships: Vec::new(),
        }];
        let store = NodeStore::construct(&paths, None, None, &containment);

        let catalogue: HashSet<ViolationCatalogueEntry> = [ViolationCatalogueEntry {
            from_sublayer: "Controllers".into(),
            to_sublayer: "Repositories".into(),
        }]
        .into_iter()
        .collect();

        let mut edges = vec![dep("M1", "M2")];
        let violations = mark_and_extract(&mut edges, &store, &catalogue);

        assert_eq!(violations.len(), 1);
        assert!(edges[0].violations.sublayer);
    }
}
