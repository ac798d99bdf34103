//! Graph validation and topological ordering.

use std::collections::{HashMap, HashSet, VecDeque};

use nodeflow_core::error::{NodeflowError, Result};
use nodeflow_core::graph::{GraphEdge, GraphNode, NodeKind};

/// Structural validation, run before any node executes: every edge
/// endpoint must name an existing node, and each `(target, handle)` pair
/// may receive at most one inbound edge. List nodes are exempt from the
/// latter because each `input-N` handle is distinct by construction.
pub fn validate(nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<()> {
    let known: HashMap<&str, &GraphNode> = nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut seen_inputs: HashSet<(&str, &str)> = HashSet::new();

    for edge in edges {
        if !known.contains_key(edge.source.as_str()) {
            return Err(NodeflowError::UnknownNode(edge.source.clone()));
        }
        let Some(target) = known.get(edge.target.as_str()) else {
            return Err(NodeflowError::UnknownNode(edge.target.clone()));
        };

        if target.kind() == NodeKind::List {
            continue;
        }
        if !seen_inputs.insert((edge.target.as_str(), edge.target_port())) {
            return Err(NodeflowError::DuplicateInput {
                node: edge.target.clone(),
                handle: edge.target_port().to_string(),
            });
        }
    }

    Ok(())
}

/// Kahn's algorithm. Returns node ids in execution order; the order is
/// stable for a given input (ready nodes are emitted in first-seen
/// order). A shortfall in the emitted count means a cycle.
pub fn sort(nodes: &[GraphNode], edges: &[GraphEdge]) -> Result<Vec<String>> {
    let mut in_degree: HashMap<&str, usize> =
        nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        if let Some(degree) = in_degree.get_mut(edge.target.as_str()) {
            *degree += 1;
        }
    }

    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut sorted = Vec::with_capacity(nodes.len());

    while let Some(id) = queue.pop_front() {
        sorted.push(id.to_string());
        if let Some(successors) = adjacency.get(id) {
            for successor in successors {
                let degree = in_degree.get_mut(successor).expect("validated edge");
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(successor);
                }
            }
        }
    }

    if sorted.len() != nodes.len() {
        return Err(NodeflowError::Cycle);
    }
    Ok(sorted)
}
