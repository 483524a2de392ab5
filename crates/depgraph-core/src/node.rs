use crate::record_source::GraphNode;
use crate::types::{DependencyProfile, DependencyProfileCategory, ElementId};
use serde::{Deserialize, Serialize};

/// A node in the containment hierarchy: a domain, application, layer,
/// sublayer or module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub element_id: ElementId,
    pub labels: Vec<String>,
    pub simple_name: String,
    pub full_name: String,
    pub color: Option<String>,
    pub depth: u32,
    pub dependency_profile_category: Option<DependencyProfileCategory>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub dependency_profile: DependencyProfile,
    pub selected: bool,
    pub in_selection: bool,
}

impl Node {
    /// The semantic label: the longest entry in `labels`. Ties break on
    /// first occurrence.
    pub fn semantic_label(&self) -> Option<&str> {
        self.labels
            .iter()
            .max_by_key(|l| l.len())
            .map(String::as_str)
    }

    /// Tag classes contributed by labels of the form `<label>_<class>`, where
    /// `<label>` is some other label carried by the same node. Tag labels
    /// are necessarily longer than the base label they tag, so this cannot
    /// be computed relative to `semantic_label()` (the longest label) —
    /// it is computed by prefix-matching every label against its siblings.
    pub fn tag_classes(&self) -> Vec<&str> {
        self.labels
            .iter()
            .filter_map(|l| {
                self.labels.iter().find_map(|base| {
                    if base == l {
                        return None;
                    }
                    l.strip_prefix(base.as_str())
                        .and_then(|rest| rest.strip_prefix('_'))
                })
            })
            .collect()
    }

    /// `true` when this node is the sublayer marker used by the
    /// layer-violation detector.
    pub fn is_sublayer(&self) -> bool {
        self.labels.iter().any(|l| l.contains("Sublayer"))
    }

    pub fn has_no_children(&self) -> bool {
        self.children.is_empty()
    }
}

impl From<&GraphNode> for Node {
    fn from(raw: &GraphNode) -> Self {
        let simple_name = raw
            .properties
            .get("simple_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let full_name = raw
            .properties
            .get("full_name")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| simple_name.as_str())
            .to_string();
        let color = raw
            .properties
            .get("color")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let depth = raw
            .properties
            .get("depth")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;
        let dependency_profile_category = raw
            .properties
            .get("dependency_profile_category")
            .and_then(|v| v.as_str())
            .and_then(parse_profile_category);

        Node {
            element_id: raw.element_id.clone(),
            labels: raw.labels.clone(),
            simple_name,
            full_name,
            color,
            depth,
            dependency_profile_category,
            parent: None,
            children: Vec::new(),
            dependency_profile: DependencyProfile::default(),
            selected: false,
            in_selection: false,
        }
    }
}

fn parse_profile_category(s: &str) -> Option<DependencyProfileCategory> {
    match s.to_uppercase().as_str() {
        "HIDDEN" => Some(DependencyProfileCategory::Hidden),
        "INBOUND" => Some(DependencyProfileCategory::Inbound),
        "OUTBOUND" => Some(DependencyProfileCategory::Outbound),
        "TRANSIT" => Some(DependencyProfileCategory::Transit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_labels(labels: &[&str]) -> Node {
        Node {
            element_id: "n1".into(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            simple_name: "N".into(),
            full_name: "N".into(),
            color: None,
            depth: 0,
            dependency_profile_category: None,
            parent: None,
            children: Vec::new(),
            dependency_profile: DependencyProfile::default(),
            selected: false,
            in_selection: false,
        }
    }

    #[test]
    fn semantic_label_is_the_longest() {
        let node = node_with_labels(&["Layer", "Layer_Controller"]);
        assert_eq!(node.semantic_label(), Some("Layer_Controller"));
    }

    #[test]
    fn tag_classes_strip_semantic_prefix() {
        let node = node_with_labels(&["Module", "Module_Entity"]);
        assert_eq!(node.tag_classes(), vec!["Entity"]);
    }

    #[test]
    fn sublayer_marker_matches_substring() {
        let node = node_with_labels(&["ControllersSublayer"]);
        assert!(node.is_sublayer());
        let node = node_with_labels(&["Module"]);
        assert!(!node.is_sublayer());
    }
}
