use crate::edge::DependencyRelationship;
use crate::error::{Error, IntegrityViolation, Result};
use crate::node::Node;
use crate::types::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The intermediate graph shape every pipeline stage operates on: maps keyed
/// by element id, cheap to merge and to look up into.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub name: String,
    pub nodes: HashMap<ElementId, Node>,
    pub edges: HashMap<ElementId, DependencyRelationship>,
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// Merges `other` into `self`, first-wins on id collision for both
    /// nodes and edges.
    pub fn merge_first_wins(&mut self, other: Graph) {
        for (id, node) in other.nodes {
            self.nodes.entry(id).or_insert(node);
        }
        for (id, edge) in other.edges {
            self.edges.entry(id).or_insert(edge);
        }
    }

    /// Verifies every edge's endpoints exist in `nodes`. Returns every offending edge, not just the
    /// first — "this check has caught bugs in earlier pipeline stages
    /// repeatedly; it is non-negotiable".
    pub fn check_integrity(&self) -> Result<()> {
        let violations: Vec<IntegrityViolation> = self
            .edges
            .values()
            .filter_map(|edge| {
                let missing_source = !self.nodes.contains_key(&edge.start_node);
                let missing_target = !self.nodes.contains_key(&edge.end_node);
                if missing_source || missing_target {
                    Some(IntegrityViolation {
                        edge_id: edge.element_id.clone(),
                        missing_source,
                        missing_target,
                    })
                } else {
                    None
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::ResultIntegrityFailure(violations))
        }
    }

    /// Collapses every `contains`-typed edge into a `parent` reference on
    /// its target node and drops the edge.
    pub fn collapse_containment(&mut self, containment_type: &str) {
        let contains_ids: Vec<ElementId> = self
            .edges
            .iter()
            .filter(|(_, e)| e.edge_type.eq_ignore_ascii_case(containment_type))
            .map(|(id, _)| id.clone())
            .collect();

        for id in contains_ids {
            if let Some(edge) = self.edges.remove(&id) {
                if let Some(node) = self.nodes.get_mut(&edge.end_node) {
                    node.parent = Some(edge.start_node.clone());
                }
            }
        }
    }

    /// Produces the ordered, response-ready shape. Order is deterministic
    /// (sorted by id) but carries no semantic meaning beyond that — the
    /// renderer orders by id/label downstream.
    pub fn into_result(self) -> ResultGraph {
        let mut nodes: Vec<Node> = self.nodes.into_values().collect();
        nodes.sort_by(|a, b| a.element_id.cmp(&b.element_id));

        let mut edges: Vec<DependencyRelationship> = self.edges.into_values().collect();
        edges.sort_by(|a, b| a.element_id.cmp(&b.element_id));

        ResultGraph {
            name: self.name,
            nodes,
            edges,
        }
    }
}

/// The final, serialisable graph shape returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultGraph {
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<DependencyRelationship>,
}
