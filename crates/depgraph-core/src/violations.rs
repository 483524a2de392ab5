use crate::record_source::DependencyCycle;
use crate::types::ElementId;
use serde::{Deserialize, Serialize};

/// Lightweight node projection embedded in violation DTOs, so a renderer
/// doesn't have to cross-reference the full node set to draw a cycle or a
/// layer violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub id: ElementId,
    pub label: String,
    pub simple_name: String,
    pub full_name: String,
}

/// An edge projected for display in a violation: endpoints carry full
/// `NodeData` rather than bare ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedEdge {
    pub id: ElementId,
    pub start: NodeData,
    pub end: NodeData,
    pub edge_type: String,
}

/// One underlying, un-abstracted relationship folded into an `ExtendedEdge`
/// during lifting — kept around for violation drill-down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeData {
    pub id: ElementId,
    pub start_node: ElementId,
    pub end_node: ElementId,
    pub reference_type: Option<String>,
    pub nr_dependencies: Option<u64>,
    pub nr_calls: Option<u64>,
}

/// One abstracted cycle in the result graph, aggregating every store-level
/// `DependencyCycle` that collapsed to the same post-lift identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRender {
    pub id: String,
    pub node: NodeData,
    pub path: Vec<ExtendedEdge>,
    pub length: usize,
    pub actual_cycles: Vec<DependencyCycle>,
}

/// One surviving dependency whose source-sublayer → target-sublayer
/// matches the static violation catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerViolation {
    pub edge: ExtendedEdge,
    pub actual_edges: Vec<EdgeData>,
}

/// `{dependency_cycles: [...], sublayers: [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Violations {
    pub dependency_cycles: Vec<CycleRender>,
    pub sublayers: Vec<LayerViolation>,
}

impl Violations {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// One `(from_sublayer, to_sublayer)` pair drawn from the
/// `(source)-[:VIOLATES]->(target)` catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViolationCatalogueEntry {
    pub from_sublayer: String,
    pub to_sublayer: String,
}
