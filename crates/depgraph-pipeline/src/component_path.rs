use depgraph_core::edge::DependencyRelationship;
use depgraph_core::error::{Error, Result};
use depgraph_core::record_source::{GraphRelationship, PathRecord};
use depgraph_core::types::ElementId;

use crate::node_store::NodeStore;

/// One raw record's decomposition into a source-side containment prefix, a
/// dependency middle, and a target-side containment suffix.
#[derive(Debug, Clone)]
pub struct ComponentPath {
    pub start_node: ElementId,
    pub end_node: ElementId,
    pub source_depth: usize,
    pub target_depth: usize,
    pub dependency_edges: Vec<DependencyRelationship>,
}

impl ComponentPath {
    pub fn from_record(
        record: &PathRecord,
        node_store: &NodeStore,
        containment_type: &str,
        selected_domain: bool,
    ) -> Result<Self> {
        if record.relationships.is_empty() {
            let only_node = record
                .nodes
                .first()
                .map(|n| n.element_id.clone())
                .unwrap_or_default();
            return Ok(Self {
                start_node: only_node.clone(),
                end_node: only_node,
                source_depth: 0,
                target_depth: 0,
                dependency_edges: Vec::new(),
            });
        }

        let mut chunks = group_chunks(&record.relationships);

        if chunks.len() == 1 && chunks[0][0].rel_type == containment_type {
            let (prefix, suffix) = split_turning_point(chunks.remove(0), selected_domain);
            chunks = vec![prefix, suffix];
        } else {
            let first_is_containment = chunks.first().map(|c| c[0].rel_type == containment_type).unwrap_or(false);
            if !first_is_containment {
                chunks.insert(0, Vec::new());
            }
            let last_is_containment = chunks.last().map(|c| c[0].rel_type == containment_type).unwrap_or(false);
            if !last_is_containment {
                chunks.push(Vec::new());
            }
        }

        let source_prefix = chunks.first().cloned().unwrap_or_default();
        let target_suffix = chunks.last().cloned().unwrap_or_default();
        let middle_rels: Vec<GraphRelationship> = if chunks.len() > 2 {
            chunks[1..chunks.len() - 1].iter().flatten().cloned().collect()
        } else {
            Vec::new()
        };

        let mut dependency_edges = Vec::with_capacity(middle_rels.len());
        for rel in &middle_rels {
            let start = rel.start_node_element_id.clone();
            let end = rel.end_node_element_id.clone();
            if node_store.get(&start).is_none() {
                return Err(Error::MissingEndpoint {
                    relationship_id: rel.element_id.clone(),
                    node_id: start,
                });
            }
            if node_store.get(&end).is_none() {
                return Err(Error::MissingEndpoint {
                    relationship_id: rel.element_id.clone(),
                    node_id: end,
                });
            }
            dependency_edges.push(DependencyRelationship::from_raw(rel, start, end));
        }

        let start_node = source_prefix
            .last()
            .map(|r| r.end_node_element_id.clone())
            .or_else(|| middle_rels.first().map(|r| r.start_node_element_id.clone()))
            .or_else(|| target_suffix.last().map(|r| r.end_node_element_id.clone()))
            .unwrap_or_default();

        let end_node = target_suffix
            .last()
            .map(|r| r.end_node_element_id.clone())
            .or_else(|| middle_rels.last().map(|r| r.end_node_element_id.clone()))
            .or_else(|| source_prefix.first().map(|r| r.start_node_element_id.clone()))
            .unwrap_or_default();

        Ok(Self {
            start_node,
            end_node,
            source_depth: source_prefix.len(),
            target_depth: target_suffix.len(),
            dependency_edges,
        })
    }

    /// Comma-join of dependency-edge ids, or the leaf id when there are no
    /// dependency edges — used to deduplicate multi-hop paths describing
    /// the same chain.
    pub fn path_id(&self) -> String {
        if self.dependency_edges.is_empty() {
            self.start_node.clone()
        } else {
            self.dependency_edges
                .iter()
                .map(|e| e.element_id.as_str())
                .collect::<Vec<_>>()
                .join(",")
        }
    }

    /// Replaces leaf-to-leaf dependency edges with edges between their
    /// `tooDeep`-th ancestors, where `tooDeep = source_depth - depth`
    ///. No-op when the path is already shallow enough.
    pub fn lift(&mut self, depth: usize, node_store: &NodeStore) -> Result<()> {
        if self.source_depth <= depth {
            return Ok(());
        }
        let too_deep = self.source_depth - depth;

        let new_target_depth = self.target_depth.checked_sub(too_deep).ok_or_else(|| Error::LiftingTooDeep {
            node_id: self.end_node.clone(),
            requested: too_deep,
            available: self.target_depth,
        })?;

        let lifted_start = node_store.nth_ancestor(&self.start_node, too_deep).ok_or_else(|| Error::LiftingTooDeep {
            node_id: self.start_node.clone(),
            requested: too_deep,
            available: node_store.ancestor_depth(&self.start_node),
        })?;
        let lifted_end = node_store.nth_ancestor(&self.end_node, too_deep).ok_or_else(|| Error::LiftingTooDeep {
            node_id: self.end_node.clone(),
            requested: too_deep,
            available: node_store.ancestor_depth(&self.end_node),
        })?;

        for dep in &mut self.dependency_edges {
            let original_start = dep.start_node.clone();
            let original_end = dep.end_node.clone();
            dep.start_node = node_store.nth_ancestor(&original_start, too_deep).ok_or_else(|| Error::LiftingTooDeep {
                node_id: original_start.clone(),
                requested: too_deep,
                available: node_store.ancestor_depth(&original_start),
            })?;
            dep.end_node = node_store.nth_ancestor(&original_end, too_deep).ok_or_else(|| Error::LiftingTooDeep {
                node_id: original_end.clone(),
                requested: too_deep,
                available: node_store.ancestor_depth(&original_end),
            })?;
            dep.original_start_node = Some(original_start);
            dep.original_end_node = Some(original_end);
        }

        self.source_depth = depth;
        self.target_depth = new_target_depth;
        self.start_node = lifted_start;
        self.end_node = lifted_end;
        Ok(())
    }
}

fn group_chunks(rels: &[GraphRelationship]) -> Vec<Vec<GraphRelationship>> {
    let mut chunks: Vec<Vec<GraphRelationship>> = Vec::new();
    for rel in rels {
        match chunks.last_mut() {
            Some(chunk) if chunk[0].rel_type == rel.rel_type => chunk.push(rel.clone()),
            _ => chunks.push(vec![rel.clone()]),
        }
    }
    chunks
}

/// The lone-`CONTAINS`-chunk turning-point rule:
/// find the last occurrence of the final relationship's id among all but
/// the last element. No occurrence, or an occurrence immediately before the
/// last element, means "the turn is at the end" — branch on
/// `selected_domain` to decide which side gets the empty chunk. Otherwise
/// split the chunk at the occurrence.
fn split_turning_point(chunk: Vec<GraphRelationship>, selected_domain: bool) -> (Vec<GraphRelationship>, Vec<GraphRelationship>) {
    let len = chunk.len();
    if len == 0 {
        return (Vec::new(), Vec::new());
    }
    let last_id = chunk[len - 1].element_id.clone();
    let search_end = len.saturating_sub(1);
    let turn = chunk[..search_end].iter().rposition(|r| r.element_id == last_id);

    let turn_at_end = match turn {
        None => true,
        Some(i) => i == len.saturating_sub(2),
    };

    if turn_at_end {
        if selected_domain {
            (chunk, Vec::new())
        } else {
            (Vec::new(), chunk)
        }
    } else {
        let i = turn.expect("turn_at_end is false only when an index was found");
        let mut prefix = chunk;
        let suffix = prefix.split_off(i + 1);
        (prefix, suffix)
    }
}
