use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DegreeRange;

/// Everything about a request that is legitimately configurable rather than
/// request-supplied: the store read-timeout budget, the defaults applied
/// when a request omits a degree range, and the Cypher fragment the
/// layer-violation detector issues to load its catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(with = "humantime_secs")]
    pub store_read_timeout: Duration,
    pub default_outgoing_range: DegreeRange,
    pub default_incoming_range: DegreeRange,
    pub violation_catalogue_query: String,
    pub containment_edge_type: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            store_read_timeout: Duration::from_secs(5),
            default_outgoing_range: DegreeRange::default(),
            default_incoming_range: DegreeRange::default(),
            violation_catalogue_query:
                "MATCH (source)-[:VIOLATES]->(target) RETURN source.simple_name AS fromSublayer, target.simple_name AS toSublayer".to_string(),
            containment_edge_type: "CONTAINS".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Layers `config/pipeline.toml` and `DEPGRAPH_*` environment variables
    /// over the defaults above (`File::from(..).required(false)` followed by
    /// `Environment::with_prefix`).
    pub fn load() -> Result<Self> {
        let defaults = Self::default();
        let builder = Config::builder()
            .set_default("store_read_timeout", defaults.store_read_timeout.as_secs())
            .and_then(|b| b.set_default("default_outgoing_range.min", None::<i64>))
            .and_then(|b| b.set_default("default_outgoing_range.max", None::<i64>))
            .and_then(|b| b.set_default("default_incoming_range.min", None::<i64>))
            .and_then(|b| b.set_default("default_incoming_range.max", None::<i64>))
            .and_then(|b| b.set_default("violation_catalogue_query", defaults.violation_catalogue_query.clone()))
            .and_then(|b| b.set_default("containment_edge_type", defaults.containment_edge_type.clone()))
            .map_err(|e| Error::Configuration(format!("failed to seed config defaults: {e}")))?
            .add_source(File::with_name("config/pipeline").required(false))
            .add_source(Environment::with_prefix("DEPGRAPH").separator("__"));

        let config = builder
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| Error::Configuration(format!("failed to deserialize config: {e}")))
    }
}

mod humantime_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
