use crate::error::Result;
use crate::types::ElementId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A node as returned by the store: `element_id`, `identity`, `labels` and a
/// loosely-typed `properties` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub element_id: ElementId,
    pub identity: i64,
    pub labels: Vec<String>,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

/// A relationship as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRelationship {
    pub element_id: ElementId,
    #[serde(rename = "type")]
    pub rel_type: String,
    pub start_node_element_id: ElementId,
    pub end_node_element_id: ElementId,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

/// One raw path record, as it comes out of a reachability query: the nodes
/// it touches plus its relationships in traversal order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathRecord {
    pub nodes: Vec<GraphNode>,
    pub relationships: Vec<GraphRelationship>,
}

/// One segment of a cycle returned by the store's cycle-detection
/// incantation: `{ start, relationship, end }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSegment {
    pub start: GraphNode,
    pub relationship: GraphRelationship,
    pub end: GraphNode,
}

/// A cycle as reported by the store: a primary node plus the ordered
/// segments that close the loop back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyCycle {
    pub node: ElementId,
    pub segments: Vec<CycleSegment>,
}

/// The sole boundary to the backing labelled property graph. Everything
/// upstream of this trait (the Cypher text, the wire driver, connection
/// pooling) is an external collaborator.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn execute_query(&self, cypher: &str) -> Result<Vec<PathRecord>>;
    async fn detect_cycles(&self, node_ids: &[ElementId]) -> Result<Vec<DependencyCycle>>;
}
