use std::collections::HashSet;
use std::time::Instant;

use depgraph_core::config::PipelineConfig;
use depgraph_core::edge::DependencyRelationship;
use depgraph_core::error::{Error, Result};
use depgraph_core::graph::{Graph, ResultGraph};
use depgraph_core::record_source::{DependencyCycle, PathRecord, RecordSource};
use depgraph_core::types::{ElementId, QueryOptions};
use depgraph_core::violations::Violations;

use crate::component_path::ComponentPath;
use crate::containment::ContainmentIndex;
use crate::node_store::NodeStore;
use crate::{postprocess, preprocess, process, violations};

/// Thin async orchestrator: fetches the neighbourhood
/// tree plus outgoing/incoming path records concurrently, runs the
/// transformation pipeline over them, and attaches violations on a
/// best-effort basis.
pub struct VisualizationService<S: RecordSource> {
    source: S,
    config: PipelineConfig,
}

impl<S: RecordSource> VisualizationService<S> {
    pub fn new(source: S, config: PipelineConfig) -> Self {
        Self { source, config }
    }

    pub async fn render(&self, options: QueryOptions) -> Result<(ResultGraph, Violations)> {
        let span = tracing::info_span!("visualization_request", node = %options.id);
        let _enter = span.enter();
        let started = Instant::now();

        let neighbourhood_query = format!("neighbourhood({}, {})", options.id, options.layer_depth);
        let outgoing_query = format!("outgoing({}, {})", options.id, options.dependency_depth);
        let incoming_query = format!("incoming({}, {})", options.id, options.dependency_depth);

        let (neighbourhood, outgoing, incoming) = if options.outgoing_enabled() && options.incoming_enabled() {
            tokio::try_join!(
                self.timed_query(&neighbourhood_query),
                self.timed_query(&outgoing_query),
                self.timed_query(&incoming_query),
            )?
        } else if options.outgoing_enabled() {
            let (n, o) = tokio::try_join!(self.timed_query(&neighbourhood_query), self.timed_query(&outgoing_query))?;
            (n, o, Vec::new())
        } else if options.incoming_enabled() {
            let (n, i) = tokio::try_join!(self.timed_query(&neighbourhood_query), self.timed_query(&incoming_query))?;
            (n, Vec::new(), i)
        } else {
            (self.timed_query(&neighbourhood_query).await?, Vec::new(), Vec::new())
        };

        tracing::debug!(
            neighbourhood = neighbourhood.len(),
            outgoing = outgoing.len(),
            incoming = incoming.len(),
            "fetched path records"
        );

        let mut all_paths = Vec::with_capacity(neighbourhood.len() + outgoing.len() + incoming.len());
        all_paths.extend(neighbourhood.iter().cloned());
        all_paths.extend(outgoing.iter().cloned());
        all_paths.extend(incoming.iter().cloned());

        let containment = ContainmentIndex::build(&all_paths, &self.config.containment_edge_type);
        let node_store = NodeStore::construct(&all_paths, None, Some(&options.id), &containment);

        let mut dep_paths = Vec::new();
        for record in outgoing.iter().chain(incoming.iter()) {
            dep_paths.push(ComponentPath::from_record(record, &node_store, &self.config.containment_edge_type, options.selected_domain)?);
        }

        preprocess::check_leaf_depth_invariant(&dep_paths, &node_store)?;
        let dep_paths = preprocess::dedup_longest_path(dep_paths);
        let dep_paths = preprocess::exclude_domains(dep_paths, &node_store, &options.excluded_domains);
        let mut dep_paths = preprocess::filter_dependency_types(dep_paths, &options);

        process::lift_all(&mut dep_paths, options.layer_depth as usize, &node_store)?;
        let edges = process::flatten(dep_paths);
        let edges = process::apply_scope_filters(edges, &node_store, &options);
        let mut edges = process::degree_filter(
            edges,
            options.outgoing_range.unwrap_or(self.config.default_outgoing_range),
            options.incoming_range.unwrap_or(self.config.default_incoming_range),
            &node_store,
        );
        process::assign_canonical_ids(&mut edges);

        let result_violations = match self.collect_violations(&options, &mut edges, &node_store).await {
            Ok(violations) => violations,
            Err(err) => {
                tracing::warn!(error = %err, "violations collection failed; returning graph with empty violations");
                Violations::empty()
            }
        };

        let merged_edges = process::merge_duplicates(edges);
        let result_nodes = process::select_result_nodes(&node_store, &merged_edges);

        let dependency_graph = Graph {
            name: "dependencies".to_string(),
            nodes: result_nodes,
            edges: merged_edges.into_iter().map(|e| (e.element_id.clone(), e)).collect(),
        };
        let neighbourhood_graph = build_neighbourhood_graph(&neighbourhood, &node_store);

        let result = postprocess::finalize(vec![neighbourhood_graph, dependency_graph], &self.config.containment_edge_type)?;

        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            nodes = result.nodes.len(),
            edges = result.edges.len(),
            "visualization request complete"
        );

        Ok((result, result_violations))
    }

    async fn collect_violations(&self, options: &QueryOptions, edges: &mut Vec<DependencyRelationship>, node_store: &NodeStore) -> Result<Violations> {
        let node_ids: Vec<ElementId> = edges.iter().flat_map(|e| [e.start_node.clone(), e.end_node.clone()]).collect();
        let surviving: HashSet<ElementId> = node_ids.iter().cloned().collect();

        let raw_cycles = self.timed_cycles(&node_ids).await?;
        let cycle_renders = violations::cycles::extract(raw_cycles, options.layer_depth as usize, edges, node_store, &surviving);

        let catalogue_records = self.timed_query(&self.config.violation_catalogue_query).await?;
        let catalogue = violations::layers::catalogue_from_records(catalogue_records);
        let layer_violations = violations::layers::mark_and_extract(edges, node_store, &catalogue);

        Ok(Violations {
            dependency_cycles: cycle_renders,
            sublayers: layer_violations,
        })
    }

    async fn timed_query(&self, cypher: &str) -> Result<Vec<PathRecord>> {
        tokio::time::timeout(self.config.store_read_timeout, self.source.execute_query(cypher))
            .await
            .map_err(|_| Error::StoreTimeout(cypher.to_string()))?
    }

    async fn timed_cycles(&self, node_ids: &[ElementId]) -> Result<Vec<DependencyCycle>> {
        tokio::time::timeout(self.config.store_read_timeout, self.source.detect_cycles(node_ids))
            .await
            .map_err(|_| Error::StoreTimeout("detect_cycles".to_string()))?
    }
}

fn build_neighbourhood_graph(records: &[PathRecord], node_store: &NodeStore) -> Graph {
    let mut graph = Graph::new("neighbourhood");
    for record in records {
        for raw in &record.nodes {
            if let Some(node) = node_store.get(&raw.element_id) {
                graph.nodes.entry(raw.element_id.clone()).or_insert_with(|| node.clone());
            }
        }
        for rel in &record.relationships {
            let edge = DependencyRelationship::from_raw(rel, rel.start_node_element_id.clone(), rel.end_node_element_id.clone());
            graph.edges.entry(edge.element_id.clone()).or_insert(edge);
        }
    }
    graph
}
