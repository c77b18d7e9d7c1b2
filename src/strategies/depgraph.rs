//! Dependency-graph strategy
//!
//! Builds the package-level import graph and reports dependency cycles.
//! Unlike the per-package strategies this one needs the whole project in
//! view, so it produces a single synthetic "graph" bucket whose
//! description carries the serialized graph for downstream consumers.
//! Informational by default: weight 0, so it shows up in the report
//! without moving the score.

use crate::discover::{rust_files, StrategyParameter};
use crate::models::{Issue, Summaries, Summary, SummaryMap};
use crate::scoring::percentage_from_issue_count;
use crate::strategies::base::Strategy;
use crate::sync::ProgressMeter;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Name of the synthetic analysis unit.
const GRAPH_UNIT: &str = "graph";

pub struct DependencyGraphStrategy {
    weight: f64,
    import_pattern: Regex,
}

/// Serialized form embedded in the summary description.
#[derive(Debug, Serialize)]
struct GraphRecord {
    packages: usize,
    edges: Vec<(String, String)>,
    cycles: usize,
}

impl DependencyGraphStrategy {
    pub fn new() -> Self {
        Self {
            weight: 0.0,
            // `use crate::foo`, `use super::foo`, `mod foo;` - the first
            // path segment is enough to resolve a package-level edge.
            import_pattern: Regex::new(
                r"^\s*(?:pub\s+)?(?:use\s+crate::([A-Za-z_][A-Za-z0-9_]*)|mod\s+([A-Za-z_][A-Za-z0-9_]*)\s*;)",
            )
            .expect("hard-coded pattern compiles"),
        }
    }

    /// Map each package's trailing path component to its package name, for
    /// resolving import segments.
    fn component_index(params: &StrategyParameter) -> BTreeMap<String, String> {
        params
            .all_dirs
            .keys()
            .filter_map(|name| {
                let component = name.rsplit('/').next()?;
                Some((component.to_string(), name.clone()))
            })
            .collect()
    }

    fn build_graph(&self, params: &StrategyParameter) -> (DiGraph<String, ()>, Vec<(String, String)>) {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes: BTreeMap<String, NodeIndex> = BTreeMap::new();
        for name in params.all_dirs.keys() {
            let idx = graph.add_node(name.clone());
            nodes.insert(name.clone(), idx);
        }

        let components = Self::component_index(params);
        let mut edges: Vec<(String, String)> = Vec::new();

        for (package, dir) in &params.all_dirs {
            for file in rust_files(dir) {
                let Ok(content) = std::fs::read_to_string(&file) else {
                    continue;
                };
                for line in content.lines() {
                    let Some(caps) = self.import_pattern.captures(line) else {
                        continue;
                    };
                    let segment = caps
                        .get(1)
                        .or_else(|| caps.get(2))
                        .map(|m| m.as_str())
                        .unwrap_or_default();
                    let Some(target) = components.get(segment) else {
                        continue;
                    };
                    if target == package {
                        continue;
                    }
                    let (from, to) = (nodes[package], nodes[target]);
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                        edges.push((package.clone(), target.clone()));
                    }
                }
            }
        }

        (graph, edges)
    }
}

impl Default for DependencyGraphStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for DependencyGraphStrategy {
    fn compute(&self, params: &StrategyParameter, progress: &ProgressMeter) -> Summaries {
        progress.expect(1);

        let (graph, edges) = self.build_graph(params);
        let cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .collect();

        let mut summary = Summary::new(GRAPH_UNIT);
        for scc in &cycles {
            let mut members: Vec<&str> = scc.iter().map(|&idx| graph[idx].as_str()).collect();
            members.sort_unstable();
            summary.push(Issue::new(
                0,
                format!("dependency cycle: {}", members.join(" -> ")),
            ));
        }

        let record = GraphRecord {
            packages: graph.node_count(),
            edges,
            cycles: cycles.len(),
        };
        summary.description = serde_json::to_string(&record).unwrap_or_default();
        debug!(
            "dependency graph: {} packages, {} edges, {} cycles",
            graph.node_count(),
            graph.edge_count(),
            cycles.len()
        );

        let summaries = Summaries::new();
        summaries.insert(summary);
        progress.tick();
        summaries
    }

    fn percentage(&self, summaries: &SummaryMap) -> f64 {
        let issues: usize = summaries.values().map(|s| s.issues.len()).sum();
        percentage_from_issue_count(issues)
    }

    fn name(&self) -> &'static str {
        "DependencyGraph"
    }

    fn description(&self) -> &'static str {
        "Package import graph and dependency cycles"
    }

    fn weight(&self) -> f64 {
        self.weight
    }
}
