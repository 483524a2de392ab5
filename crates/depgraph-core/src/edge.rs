use crate::record_source::GraphRelationship;
use crate::types::{DependencyType, ElementId};
use serde::{Deserialize, Serialize};

/// One `(reference_type, names)` group produced when merging duplicate
/// dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceGroup {
    pub reference_type: String,
    pub names: Vec<String>,
}

/// `{sublayer, dependency_cycle}` — whether this edge participates in a
/// detected violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationFlags {
    pub sublayer: bool,
    pub dependency_cycle: bool,
}

/// A dependency relationship between two modules, or between their
/// ancestors once lifted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyRelationship {
    pub element_id: ElementId,
    pub start_node: ElementId,
    pub end_node: ElementId,
    pub edge_type: String,
    pub reference_type: Option<String>,
    pub dependency_type: Option<DependencyType>,
    pub reference_names: Vec<String>,
    pub nr_dependencies: Option<u64>,
    pub nr_calls: Option<u64>,

    /// Set during lifting (`component_path::lift`); the pre-lift endpoints,
    /// needed by cycle extraction to match store-reported cycle edges back
    /// to their post-abstraction counterpart.
    pub original_start_node: Option<ElementId>,
    pub original_end_node: Option<ElementId>,

    /// Populated by `process::merge_duplicates`; `None` beforehand.
    pub dependency_types: Option<Vec<DependencyType>>,
    pub references: Option<Vec<ReferenceGroup>>,
    pub nr_module_dependencies: Option<u64>,
    pub nr_function_dependencies: Option<u64>,

    pub violations: ViolationFlags,
}

impl DependencyRelationship {
    pub fn from_raw(rel: &GraphRelationship, start_node: ElementId, end_node: ElementId) -> Self {
        let reference_type = rel
            .properties
            .get("reference_type")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let dependency_type = rel
            .properties
            .get("dependency_type")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok());
        let reference_names = rel
            .properties
            .get("reference_names")
            .and_then(|v| v.as_str())
            .map(|s| s.split('|').map(str::to_string).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();
        let nr_dependencies = rel.properties.get("nr_dependencies").and_then(|v| v.as_u64());
        let nr_calls = rel.properties.get("nr_calls").and_then(|v| v.as_u64());

        DependencyRelationship {
            element_id: rel.element_id.clone(),
            start_node,
            end_node,
            edge_type: rel.rel_type.clone(),
            reference_type,
            dependency_type,
            reference_names,
            nr_dependencies,
            nr_calls,
            original_start_node: None,
            original_end_node: None,
            dependency_types: None,
            references: None,
            nr_module_dependencies: None,
            nr_function_dependencies: None,
            violations: ViolationFlags::default(),
        }
    }

    /// The endpoint pair lifting mutates towards; used to key the
    /// duplicate-merge groups.
    pub fn endpoint_pair(&self) -> (ElementId, ElementId) {
        (self.start_node.clone(), self.end_node.clone())
    }

    /// Endpoints before any lifting mutated them (falls back to the
    /// current endpoints when this edge was never lifted).
    pub fn original_endpoint_pair(&self) -> (ElementId, ElementId) {
        (
            self.original_start_node.clone().unwrap_or_else(|| self.start_node.clone()),
            self.original_end_node.clone().unwrap_or_else(|| self.end_node.clone()),
        )
    }

    pub fn is_self_edge(&self) -> bool {
        self.start_node == self.end_node
    }
}
