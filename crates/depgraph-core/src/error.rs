use thiserror::Error;

/// One endpoint of an edge that `PostProcessor::finalize` found missing from
/// the result node set.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IntegrityViolation {
    pub edge_id: String,
    pub missing_source: bool,
    pub missing_target: bool,
}

impl std::fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let which = match (self.missing_source, self.missing_target) {
            (true, true) => "source and target",
            (true, false) => "source",
            (false, true) => "target",
            (false, false) => "neither endpoint (unexpected)",
        };
        write!(f, "edge {} is missing its {}", self.edge_id, which)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store query timed out: {0}")]
    StoreTimeout(String),

    #[error("relationship {relationship_id} references node {node_id}, which is not in the node store")]
    MissingEndpoint {
        relationship_id: String,
        node_id: String,
    },

    #[error("depth invariant broken: leaves {a} and {b} of the same query have different ancestry depths ({depth_a} vs {depth_b})")]
    DepthInvariantBroken {
        a: String,
        b: String,
        depth_a: usize,
        depth_b: usize,
    },

    #[error("lifting to depth {requested} is too deep for node {node_id} (ancestry depth {available})")]
    LiftingTooDeep {
        node_id: String,
        requested: usize,
        available: usize,
    },

    #[error("result integrity failure: {} offending edge(s): {}", .0.len(), render_integrity_violations(.0))]
    ResultIntegrityFailure(Vec<IntegrityViolation>),

    #[error("configuration error: {0}")]
    Configuration(String),
}

fn render_integrity_violations(violations: &[IntegrityViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
