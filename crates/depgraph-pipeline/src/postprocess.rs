use depgraph_core::error::Result;
use depgraph_core::graph::{Graph, ResultGraph};

/// Final merge + integrity check: concatenates every
/// intermediate graph with first-wins id collisions, asserts every edge's
/// endpoints exist, then collapses containment edges into node `parent`
/// references.
pub fn finalize(graphs: Vec<Graph>, containment_type: &str) -> Result<ResultGraph> {
    let mut merged = Graph::new("result");
    for graph in graphs {
        merged.merge_first_wins(graph);
    }
    merged.check_integrity()?;
    merged.collapse_containment(containment_type);
    Ok(merged.into_result())
}

#[cfg(test)]
mod tests {
    use super::*;
    use depgraph_core::edge::{DependencyRelationship, ViolationFlags};
    use depgraph_core::error::Error;
    use depgraph_core::node::Node;
    use depgraph_core::types::{DependencyProfile, DependencyProfileCategory};

    fn node(id: &str) -> Node {
        Node {
            element_id: id.into(),
            labels: vec!["Module".into()],
            simple_name: id.into(),
            full_name: id.into(),
            color: None,
            depth: 0,
            dependency_profile_category: Some(DependencyProfileCategory::Hidden),
            parent: None,
            children: Vec::new(),
            dependency_profile: DependencyProfile::default(),
            selected: false,
            in_selection: false,
        }
    }

    fn edge(id: &str, start: &str, end: &str, edge_type: &str) -> DependencyRelationship {
        DependencyRelationship {
            element_id: id.into(),
            start_node: start.into(),
            end_node: end.into(),
            edge_type: edge_type.into(),
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
    fn collapses_containment_edges_into_parent_references() {
        let mut graph = Graph::new("deps");
        graph.nodes.insert("D".into(), node("D"));
        graph.nodes.insert("A".into(), node("A"));
        graph.edges.insert("e1".into(), edge("e1", "D", "A", "CONTAINS"));

        let result = finalize(vec![graph], "CONTAINS").unwrap();
        assert!(result.edges.is_empty());
        let a = result.nodes.iter().find(|n| n.element_id == "A").unwrap();
        assert_eq!(a.parent.as_deref(), Some("D"));
    }

    #[test]
    fn missing_endpoint_fails_with_a_full_diagnostic() {
        let mut graph = Graph::new("deps");
        graph.nodes.insert("Y".into(), node("Y"));
        graph.edges.insert("e1".into(), edge("e1", "X", "Y", "CALLS"));

        let err = finalize(vec![graph], "CONTAINS").unwrap_err();
        match err {
            Error::ResultIntegrityFailure(violations) => {
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].edge_id, "e1");
                assert!(violations[0].missing_source);
                assert!(!violations[0].missing_target);
            }
            other => panic!("expected ResultIntegrityFailure, got {other:?}"),
        }
    }
}
