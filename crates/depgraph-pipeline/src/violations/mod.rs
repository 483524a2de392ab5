pub mod cycles;
pub mod layers;

use depgraph_core::node::Node;
use depgraph_core::types::ElementId;
use depgraph_core::violations::NodeData;

use crate::node_store::NodeStore;

fn node_data(node_store: &NodeStore, id: &ElementId) -> NodeData {
    match node_store.get(id) {
        Some(node) => node_data_from(node),
        None => NodeData {
            id: id.clone(),
            label: String::new(),
            simple_name: String::new(),
            full_name: String::new(),
        },
    }
}

fn node_data_from(node: &Node) -> NodeData {
    NodeData {
        id: node.element_id.clone(),
        label: node.semantic_label().unwrap_or_default().to_string(),
        simple_name: node.simple_name.clone(),
        full_name: node.full_name.clone(),
    }
}
