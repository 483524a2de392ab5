use std::collections::{HashMap, HashSet};

use depgraph_core::node::Node;
use depgraph_core::record_source::PathRecord;
use depgraph_core::types::{DependencyProfile, ElementId};

use crate::containment::ContainmentIndex;

/// Owns every node touched by a request, keyed by element id — an arena,
/// per the Design Notes' "cyclic references" recommendation: `parent` and
/// `children` are stored as ids rather than object references, so the
/// containment tree never needs `Rc`/`RefCell`.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: HashMap<ElementId, Node>,
}

impl NodeStore {
    /// Materialises one `Node` per distinct id seen across `paths`, merges
    /// in an optional context node set (the local, paths-derived node wins
    /// on collision — context may lack complete parent references), wires
    /// parent/child from `containment`, marks `in_selection`, and folds
    /// dependency profiles bottom-up.
    pub fn construct(
        paths: &[PathRecord],
        context: Option<HashMap<ElementId, Node>>,
        selected_id: Option<&ElementId>,
        containment: &ContainmentIndex,
    ) -> Self {
        let mut nodes: HashMap<ElementId, Node> = HashMap::new();
        for path in paths {
            for raw in &path.nodes {
                nodes.entry(raw.element_id.clone()).or_insert_with(|| Node::from(raw));
            }
        }
        if let Some(context) = context {
            for (id, node) in context {
                nodes.entry(id).or_insert(node);
            }
        }

        let mut store = Self { nodes };
        store.wire_containment(containment);
        if let Some(selected) = selected_id {
            store.mark_selection(selected);
        }
        store.fold_dependency_profile();
        store
    }

    fn wire_containment(&mut self, containment: &ContainmentIndex) {
        for (target, source) in &containment.target_to_source {
            if let Some(node) = self.nodes.get_mut(target) {
                node.parent = Some(source.clone());
            }
        }
        for (source, targets) in &containment.source_to_targets {
            if let Some(node) = self.nodes.get_mut(source) {
                node.children = targets.clone();
            }
        }
    }

    fn mark_selection(&mut self, selected: &ElementId) {
        let ids: Vec<ElementId> = self.nodes.keys().cloned().collect();
        for id in ids {
            let in_selection = self.ancestor_chain_contains(&id, selected);
            if let Some(node) = self.nodes.get_mut(&id) {
                node.in_selection = in_selection;
                node.selected = &id == selected;
            }
        }
    }

    fn ancestor_chain_contains(&self, id: &ElementId, selected: &ElementId) -> bool {
        let mut current = Some(id.clone());
        while let Some(cur) = current {
            if &cur == selected {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|n| n.parent.clone());
        }
        false
    }

    /// Post-order fold: leaves derive their profile from
    /// `dependency_profile_category`, every other node's profile is the
    /// component-wise sum of its children's.
    fn fold_dependency_profile(&mut self) {
        let order = self.post_order();
        for id in order {
            let profile = match self.nodes.get(&id) {
                Some(node) if node.has_no_children() => DependencyProfile::from_category(node.dependency_profile_category),
                Some(node) => {
                    let mut sum = DependencyProfile::default();
                    for child in &node.children {
                        if let Some(c) = self.nodes.get(child) {
                            sum += c.dependency_profile;
                        }
                    }
                    sum
                }
                None => continue,
            };
            if let Some(node) = self.nodes.get_mut(&id) {
                node.dependency_profile = profile;
            }
        }
    }

    fn post_order(&self) -> Vec<ElementId> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let ids: Vec<ElementId> = self.nodes.keys().cloned().collect();
        for id in ids {
            self.visit(&id, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, id: &ElementId, visited: &mut HashSet<ElementId>, order: &mut Vec<ElementId>) {
        if !visited.insert(id.clone()) {
            return;
        }
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                self.visit(child, visited, order);
            }
        }
        order.push(id.clone());
    }

    pub fn get(&self, id: &ElementId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ElementId, &Node)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walks `n` parent hops from `id`. `None` if the chain is shallower
    /// than `n`.
    pub fn nth_ancestor(&self, id: &ElementId, n: usize) -> Option<ElementId> {
        let mut current = id.clone();
        for _ in 0..n {
            current = self.nodes.get(&current)?.parent.clone()?;
        }
        Some(current)
    }

    /// How many parent hops are available above `id`, for error reporting
    /// when a lift request asks for more than exist.
    pub fn ancestor_depth(&self, id: &ElementId) -> usize {
        let mut count = 0;
        let mut current = id.clone();
        while let Some(parent) = self.nodes.get(&current).and_then(|n| n.parent.clone()) {
            count += 1;
            current = parent;
        }
        count
    }

    pub fn root_ancestor(&self, id: &ElementId) -> ElementId {
        let mut current = id.clone();
        while let Some(parent) = self.nodes.get(&current).and_then(|n| n.parent.clone()) {
            current = parent;
        }
        current
    }

    /// Walks the chain from `id` upward (inclusive) to the first node whose
    /// label marks it as a sublayer.
    pub fn sublayer_ancestor(&self, id: &ElementId) -> Option<ElementId> {
        let mut current = Some(id.clone());
        while let Some(cur) = current {
            let node = self.nodes.get(&cur)?;
            if node.is_sublayer() {
                return Some(cur);
            }
            current = node.parent.clone();
        }
        None
    }

    /// Lifts a node (identified by its own absolute `depth` property, not a
    /// path-relative depth) to the ancestor at containment depth `depth`.
    /// Used by cycle extraction to rewrite raw cycle nodes that have no
    /// matching post-lift dependency edge.
    pub fn lift_to_depth(&self, id: &ElementId, depth: usize) -> Option<ElementId> {
        let node = self.nodes.get(id)?;
        let current_depth = node.depth as usize;
        if current_depth <= depth {
            return Some(id.clone());
        }
        self.nth_ancestor(id, current_depth - depth)
    }

    pub fn into_map(self) -> HashMap<ElementId, Node> {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depgraph_core::record_source::GraphNode;
    use depgraph_core::types::DependencyProfileCategory;
    use serde_json::json;
    use std::collections::HashMap as Map;

    fn graph_node(id: &str, depth: u64, category: Option<&str>) -> GraphNode {
        let mut properties = Map::new();
        properties.insert("simple_name".to_string(), json!(id));
        properties.insert("full_name".to_string(), json!(id));
        properties.insert("depth".to_string(), json!(depth));
        if let Some(category) = category {
            properties.insert("dependency_profile_category".to_string(), json!(category));
        }
        GraphNode {
            element_id: id.into(),
            identity: 0,
            labels: vec!["Module".into()],
            properties,
        }
    }

    fn path_with_nodes(nodes: Vec<GraphNode>) -> PathRecord {
        PathRecord {
            nodes,
            relationships: Vec::new(),
        }
    }

    #[test]
    fn dependency_profile_is_conserved_across_levels() {
        let paths = vec![path_with_nodes(vec![
            graph_node("D", 0, None),
            graph_node("A", 1, None),
            graph_node("M1", 2, Some("INBOUND")),
            graph_node("M2", 2, Some("OUTBOUND")),
        ])];

        let mut source_to_targets = HashMap::new();
        source_to_targets.insert("D".to_string(), vec!["A".to_string()]);
        source_to_targets.insert("A".to_string(), vec!["M1".to_string(), "M2".to_string()]);
        let mut target_to_source = HashMap::new();
        target_to_source.insert("A".to_string(), "D".to_string());
        target_to_source.insert("M1".to_string(), "A".to_string());
        target_to_source.insert("M2".to_string(), "A".to_string());
        let containment = ContainmentIndex {
            source_to_targets,
            target_to_source,
        };

        let store = NodeStore::construct(&paths, None, Some(&"D".to_string()), &containment);

        let a = store.get(&"A".to_string()).unwrap();
        assert_eq!(a.dependency_profile.inbound, 1);
        assert_eq!(a.dependency_profile.outbound, 1);
        let d = store.get(&"D".to_string()).unwrap();
        assert_eq!(d.dependency_profile.sum(), a.dependency_profile.sum());
        assert!(store.get(&"M1".to_string()).unwrap().in_selection);
    }

    #[test]
    fn local_node_wins_over_context_on_collision() {
        let paths = vec![path_with_nodes(vec![graph_node("A", 0, None)])];
        let mut context = HashMap::new();
        let mut stale = Node::from(&graph_node("A", 0, None));
        stale.full_name = "stale".into();
        context.insert("A".to_string(), stale);

        let store = NodeStore::construct(&paths, Some(context), None, &ContainmentIndex::default());
        assert_eq!(store.get(&"A".to_string()).unwrap().full_name, "A");
    }
}
