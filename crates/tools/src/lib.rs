//! Offline checks over a tour dataset, shared by the `tour` binary.

use std::path::Path;
use std::rc::Rc;

use formats::{TourDataset, ViewerConfig};
use graph::{IntegrityIssue, LocationGraph, ReciprocityIssue};
use navigation::{Hop, HopResult, NavigationEngine, Speed};
use serde::Serialize;
use tracing::debug;

pub fn load_graph(dataset: &Path) -> Result<LocationGraph, String> {
    let dataset =
        TourDataset::from_path(dataset).map_err(|e| format!("load {}: {e}", dataset.display()))?;
    LocationGraph::new(dataset).map_err(|e| format!("graph: {e}"))
}

pub fn load_config(config: Option<&Path>) -> Result<ViewerConfig, String> {
    match config {
        Some(path) => {
            ViewerConfig::from_path(path).map_err(|e| format!("config {}: {e}", path.display()))
        }
        None => Ok(ViewerConfig::default()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub nodes: usize,
    pub issues: Vec<String>,
}

pub fn validate(graph: &LocationGraph) -> ValidationReport {
    ValidationReport {
        nodes: graph.len(),
        issues: graph
            .validate()
            .iter()
            .map(IntegrityIssue::to_string)
            .collect(),
    }
}

pub fn reciprocity(graph: &LocationGraph) -> Vec<String> {
    graph
        .reciprocity_issues()
        .iter()
        .map(ReciprocityIssue::to_string)
        .collect()
}

pub fn route(graph: &LocationGraph, from: &str, to: &str) -> Result<Vec<String>, String> {
    graph
        .shortest_path(from, to)
        .ok_or_else(|| format!("no route from {from} to {to}"))
}

/// One autoplay hop on the virtual clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub at_ms: f64,
    pub node_id: String,
    pub area: Option<String>,
}

/// Runs an autoplay of `path` at `speed` with instant photo loads and
/// returns when each hop happened.
pub fn simulate(
    graph: LocationGraph,
    config: &ViewerConfig,
    path: Vec<String>,
    speed: Speed,
) -> Result<Vec<TimelineEntry>, String> {
    let graph = Rc::new(graph);
    let mut engine = NavigationEngine::new(Rc::clone(&graph), config.playback.clone());
    engine.set_speed(speed);
    let steps = path.len();
    engine.start_navigation(path).map_err(|e| e.to_string())?;

    let mut hops: Vec<(String, f64)> = Vec::with_capacity(steps);
    // Each timer fires exactly one hop, so the sequence ends within `steps` ticks.
    for _ in 0..steps {
        let Some(due) = engine.next_hop_due() else {
            break;
        };
        let mut record = |hop: &Hop| {
            hops.push((hop.node_id.clone(), due.0));
            HopResult::Complete
        };
        engine.tick(due, &mut record);
    }
    debug!(hops = hops.len(), state = ?engine.state(), "simulation finished");

    Ok(hops
        .into_iter()
        .map(|(node_id, at_ms)| TimelineEntry {
            at_ms,
            area: graph.get_area(&node_id).map(|a| a.name.clone()),
            node_id,
        })
        .collect())
}
