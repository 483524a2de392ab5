use std::collections::HashMap;

use depgraph_core::record_source::PathRecord;
use depgraph_core::types::ElementId;

/// Bidirectional containment map built from every `CONTAINS` relationship
/// seen across a batch of paths. Built once per request and
/// consulted by the Node Store and the Path Parser for ancestor lookups.
#[derive(Debug, Clone, Default)]
pub struct ContainmentIndex {
    pub source_to_targets: HashMap<ElementId, Vec<ElementId>>,
    pub target_to_source: HashMap<ElementId, ElementId>,
}

impl ContainmentIndex {
    /// Single linear scan over every path's relationships; only those whose
    /// type matches `containment_type` are indexed. Tolerates the same
    /// `(source, target)` pair appearing in more than one path.
    pub fn build(paths: &[PathRecord], containment_type: &str) -> Self {
        let mut source_to_targets: HashMap<ElementId, Vec<ElementId>> = HashMap::new();
        let mut target_to_source: HashMap<ElementId, ElementId> = HashMap::new();

        for path in paths {
            for rel in &path.relationships {
                if rel.rel_type != containment_type {
                    continue;
                }
                let targets = source_to_targets
                    .entry(rel.start_node_element_id.clone())
                    .or_default();
                if !targets.contains(&rel.end_node_element_id) {
                    targets.push(rel.end_node_element_id.clone());
                }
                target_to_source
                    .entry(rel.end_node_element_id.clone())
                    .or_insert_with(|| rel.start_node_element_id.clone());
            }
        }

        Self {
            source_to_targets,
            target_to_source,
        }
    }
}
