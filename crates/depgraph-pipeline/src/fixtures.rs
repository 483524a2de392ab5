use std::collections::HashMap;

use async_trait::async_trait;
use depgraph_core::error::Result;
use depgraph_core::record_source::{CycleSegment, DependencyCycle, GraphNode, GraphRelationship, PathRecord, RecordSource};
use depgraph_core::types::ElementId;
use serde_json::json;

/// In-memory `RecordSource` test double. Every query string is looked up
/// verbatim against a small table of canned responses; unknown queries
/// return an empty result rather than an error, matching how a real store
/// behaves for a query that matches nothing.
pub struct FixtureRecordSource {
    responses: HashMap<String, Vec<PathRecord>>,
    cycles: Vec<DependencyCycle>,
}

#[async_trait]
impl RecordSource for FixtureRecordSource {
    async fn execute_query(&self, cypher: &str) -> Result<Vec<PathRecord>> {
        Ok(self.responses.get(cypher).cloned().unwrap_or_default())
    }

    async fn detect_cycles(&self, _node_ids: &[ElementId]) -> Result<Vec<DependencyCycle>> {
        Ok(self.cycles.clone())
    }
}

fn node(id: &str, depth: u64, simple_name: &str) -> GraphNode {
    let mut properties = HashMap::new();
    properties.insert("simple_name".to_string(), json!(simple_name));
    properties.insert("full_name".to_string(), json!(simple_name));
    properties.insert("depth".to_string(), json!(depth));
    GraphNode {
        element_id: id.into(),
        identity: 0,
        labels: vec!["Module".into()],
        properties,
    }
}

fn contains(id: &str, start: &str, end: &str) -> GraphRelationship {
    rel(id, "CONTAINS", start, end)
}

fn rel(id: &str, rel_type: &str, start: &str, end: &str) -> GraphRelationship {
    GraphRelationship {
        element_id: id.into(),
        rel_type: rel_type.into(),
        start_node_element_id: start.into(),
        end_node_element_id: end.into(),
        properties: HashMap::new(),
    }
}

impl FixtureRecordSource {
    /// Spec.md §8 scenario 1: node store `{D, A, M1, M2}`, one path record
    /// with the literal relationship list from the worked example.
    pub fn minimal_lift() -> Self {
        let nodes = vec![node("D", 0, "D"), node("A", 1, "A"), node("M1", 2, "M1"), node("M2", 2, "M2")];
        let path = PathRecord {
            nodes: nodes.clone(),
            relationships: vec![
                contains("c1", "D", "A"),
                contains("c2", "A", "M1"),
                rel("r1", "CALLS", "M1", "M2"),
                contains("c3", "D", "A"),
                contains("c4", "A", "M2"),
            ],
        };

        let mut responses = HashMap::new();
        responses.insert(
            "neighbourhood(D, 1)".to_string(),
            vec![PathRecord {
                nodes: nodes.clone(),
                relationships: vec![contains("c1", "D", "A"), contains("c2", "A", "M1"), contains("c4", "A", "M2")],
            }],
        );
        responses.insert("outgoing(D, 1)".to_string(), vec![path.clone()]);
        responses.insert("incoming(D, 1)".to_string(), Vec::new());

        Self {
            responses,
            cycles: Vec::new(),
        }
    }

    /// Spec.md §8 scenario 6: the neighbourhood-tree query reports an edge
    /// referencing `X`, but no record ever materialises `X` as a node — it
    /// survives the Node Store/Path Parser (neighbourhood relationships
    /// bypass `ComponentPath::from_record`'s endpoint check) and is only
    /// caught by the Post-Processor's referential-integrity assertion.
    pub fn integrity_failure() -> Self {
        let nodes = vec![node("Y", 0, "Y")];
        let mut responses = HashMap::new();
        responses.insert(
            "neighbourhood(Y, 0)".to_string(),
            vec![PathRecord {
                nodes,
                relationships: vec![rel("bad", "CALLS", "X", "Y")],
            }],
        );
        responses.insert("outgoing(Y, 0)".to_string(), Vec::new());
        responses.insert("incoming(Y, 0)".to_string(), Vec::new());

        Self {
            responses,
            cycles: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self {
            responses: HashMap::new(),
            cycles: Vec::new(),
        }
    }

    /// Spec.md §8 scenario 4: three modules `M1→M2→M3→M1`, each contained
    /// by a distinct ancestor `A1/A2/A3`, with the store reporting the
    /// underlying module-level cycle.
    pub fn cycle_rewriting() -> Self {
        let nodes = vec![
            node("A1", 1, "A1"),
            node("A2", 1, "A2"),
            node("A3", 1, "A3"),
            node("M1", 2, "M1"),
            node("M2", 2, "M2"),
            node("M3", 2, "M3"),
        ];
        let containment = vec![
            contains("c1", "A1", "M1"),
            contains("c2", "A2", "M2"),
            contains("c3", "A3", "M3"),
        ];

        let outgoing_paths = vec![
            PathRecord {
                nodes: nodes.clone(),
                relationships: vec![contains("c1", "A1", "M1"), rel("r1", "CALLS", "M1", "M2"), contains("c2", "A2", "M2")],
            },
            PathRecord {
                nodes: nodes.clone(),
                relationships: vec![contains("c2", "A2", "M2"), rel("r2", "CALLS", "M2", "M3"), contains("c3", "A3", "M3")],
            },
            PathRecord {
                nodes: nodes.clone(),
                relationships: vec![contains("c3", "A3", "M3"), rel("r3", "CALLS", "M3", "M1"), contains("c1", "A1", "M1")],
            },
        ];

        let mut responses = HashMap::new();
        responses.insert(
            "neighbourhood(M1, 1)".to_string(),
            vec![PathRecord {
                nodes: nodes.clone(),
                relationships: containment,
            }],
        );
        responses.insert("outgoing(M1, 2)".to_string(), outgoing_paths);
        responses.insert("incoming(M1, 2)".to_string(), Vec::new());

        let cycle = DependencyCycle {
            node: "M1".into(),
            segments: vec![
                CycleSegment {
                    start: node("M1", 2, "M1"),
                    relationship: rel("r1", "CALLS", "M1", "M2"),
                    end: node("M2", 2, "M2"),
                },
                CycleSegment {
                    start: node("M2", 2, "M2"),
                    relationship: rel("r2", "CALLS", "M2", "M3"),
                    end: node("M3", 2, "M3"),
                },
                CycleSegment {
                    start: node("M3", 2, "M3"),
                    relationship: rel("r3", "CALLS", "M3", "M1"),
                    end: node("M1", 2, "M1"),
                },
            ],
        };

        Self {
            responses,
            cycles: vec![cycle],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_query_returns_empty_rather_than_erroring() {
        let source = FixtureRecordSource::empty();
        let result = source.execute_query("nonsense").await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn minimal_lift_outgoing_query_returns_the_worked_example_path() {
        let source = FixtureRecordSource::minimal_lift();
        let records = source.execute_query("outgoing(D, 1)").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relationships.len(), 5);
    }
}
