use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque store-assigned identifier. Never minted or validated locally.
pub type ElementId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependencyProfileCategory {
    Hidden,
    Inbound,
    Outbound,
    Transit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependencyType {
    Strong,
    Weak,
    Entity,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyType::Strong => "STRONG",
            DependencyType::Weak => "WEAK",
            DependencyType::Entity => "ENTITY",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STRONG" => Ok(DependencyType::Strong),
            "WEAK" => Ok(DependencyType::Weak),
            "ENTITY" => Ok(DependencyType::Entity),
            other => Err(format!("unknown dependency type: {other}")),
        }
    }
}

/// The `[hidden, inbound, outbound, transit]` quadruple, component-wise
/// summable across a containment subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyProfile {
    pub hidden: u64,
    pub inbound: u64,
    pub outbound: u64,
    pub transit: u64,
}

impl DependencyProfile {
    pub fn from_category(category: Option<DependencyProfileCategory>) -> Self {
        match category {
            Some(DependencyProfileCategory::Hidden) => Self {
                hidden: 1,
                ..Default::default()
            },
            Some(DependencyProfileCategory::Inbound) => Self {
                inbound: 1,
                ..Default::default()
            },
            Some(DependencyProfileCategory::Outbound) => Self {
                outbound: 1,
                ..Default::default()
            },
            Some(DependencyProfileCategory::Transit) => Self {
                transit: 1,
                ..Default::default()
            },
            None => Self::default(),
        }
    }

    pub fn sum(&self) -> u64 {
        self.hidden + self.inbound + self.outbound + self.transit
    }
}

impl std::ops::Add for DependencyProfile {
    type Output = DependencyProfile;

    fn add(self, rhs: Self) -> Self::Output {
        DependencyProfile {
            hidden: self.hidden + rhs.hidden,
            inbound: self.inbound + rhs.inbound,
            outbound: self.outbound + rhs.outbound,
            transit: self.transit + rhs.transit,
        }
    }
}

impl std::ops::AddAssign for DependencyProfile {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A partial `[min, max]` range used by the in-/out-degree filters. Either
/// bound may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeRange {
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub max: Option<usize>,
}

impl DegreeRange {
    pub fn contains(&self, count: usize) -> bool {
        if let Some(min) = self.min {
            if count < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if count > max {
                return false;
            }
        }
        true
    }
}

/// Request shape of `POST /graph/node`. The HTTP controller
/// that accepts this body is out of scope; this crate only needs the shape
/// to drive the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOptions {
    pub id: ElementId,
    /// Containment depth edges are lifted to (`ComponentPath::lift`) and the
    /// hop-bound for the neighbourhood-tree query. Distinct from
    /// `dependency_depth`, which only bounds the outgoing/incoming
    /// reachability queries.
    pub layer_depth: u32,
    /// Hop-bound for the outgoing/incoming dependency-path queries. Not used
    /// for edge lifting — see `layer_depth`.
    pub dependency_depth: usize,
    #[serde(default)]
    pub show_selected_internal_relations: Option<bool>,
    #[serde(default)]
    pub show_domain_internal_relations: Option<bool>,
    #[serde(default)]
    pub show_external_relations: Option<bool>,
    #[serde(default)]
    pub show_outgoing: Option<bool>,
    #[serde(default)]
    pub show_incoming: Option<bool>,
    #[serde(default)]
    pub outgoing_range: Option<DegreeRange>,
    #[serde(default)]
    pub incoming_range: Option<DegreeRange>,
    #[serde(default)]
    pub self_edges: Option<bool>,
    #[serde(default)]
    pub show_weak_dependencies: Option<bool>,
    #[serde(default)]
    pub show_strong_dependencies: Option<bool>,
    #[serde(default)]
    pub show_entity_dependencies: Option<bool>,
    /// Excludes paths whose source- or target-side root ancestor full-name
    /// matches one of these.
    #[serde(default)]
    pub excluded_domains: Vec<String>,
    /// Gates the lone-`CONTAINS`-chunk turning-point rule in
    /// `component_path::chunk`.
    #[serde(default)]
    pub selected_domain: bool,
}

impl QueryOptions {
    pub fn self_edges_allowed(&self) -> bool {
        self.self_edges.unwrap_or(true)
    }

    pub fn outgoing_enabled(&self) -> bool {
        self.show_outgoing.unwrap_or(true)
    }

    pub fn incoming_enabled(&self) -> bool {
        self.show_incoming.unwrap_or(true)
    }

    /// `true` when the request filters dependency types at all, i.e. at
    /// least one of the three toggles was explicitly set.
    pub fn dependency_type_filter_active(&self) -> bool {
        self.show_weak_dependencies.is_some()
            || self.show_strong_dependencies.is_some()
            || self.show_entity_dependencies.is_some()
    }

    pub fn allows_dependency_type(&self, dependency_type: Option<DependencyType>) -> bool {
        if !self.dependency_type_filter_active() {
            return true;
        }
        match dependency_type {
            Some(DependencyType::Strong) => self.show_strong_dependencies.unwrap_or(true),
            Some(DependencyType::Weak) => self.show_weak_dependencies.unwrap_or(true),
            Some(DependencyType::Entity) => self.show_entity_dependencies.unwrap_or(true),
            None => true,
        }
    }
}
