//! Structural statistics of a protocol graph.
//!
//! Every statistic is defined for the empty graph and for a single node: centrality of
//! a graph with at most one node is zero, the percentile of no values is zero and the
//! network size of a graph without nodes and edges is zero.

use crate::graph::builder::{ContractNode, ProtocolGraph};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use session_store::is_zero_address;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Leave the zero address node out. It stands for "no dependency" and would
    /// otherwise collect an edge from every contract with an unset address.
    pub exclude_zero_address: bool,
    /// Percentile of degree centrality above which a node is core.
    pub core_percentile: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            exclude_zero_address: false,
            core_percentile: 75.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Core,
    Periphery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeCentrality {
    pub address: String,
    pub label: String,
    pub degree: f64,
    pub in_degree: f64,
    pub out_degree: f64,
    pub role: NodeRole,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Component {
    /// Member addresses, sorted.
    pub members: Vec<String>,
    pub size: usize,
    /// Edges between two distinct members.
    pub internal_edges: usize,
    /// `internal_edges / (size * (size - 1))`, zero for a single node.
    pub density: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub centrality: Vec<NodeCentrality>,
    pub centrality_threshold: f64,
    pub core: Vec<String>,
    pub periphery: Vec<String>,
    /// Every strongly connected component, largest first.
    pub strongly_connected_components: Vec<Component>,
    pub component_sizes: Vec<usize>,
    pub cluster_strength: f64,
    pub isolated_nodes: usize,
    pub network_size: f64,
}

impl GraphStatistics {
    /// Components with more than one member, the ones that contain a cycle through
    /// distinct contracts.
    pub fn cycles(&self) -> impl Iterator<Item = &Component> {
        self.strongly_connected_components
            .iter()
            .filter(|component| component.size > 1)
    }

    pub fn centrality_of(&self, address: &str) -> Option<&NodeCentrality> {
        self.centrality.iter().find(|node| node.address == address)
    }
}

/// Linear interpolation between closest ranks, zero for no values.
pub fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (percentile.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// `2·n·e / (n + e)`, zero for an empty graph.
pub fn network_size(node_count: usize, edge_count: usize) -> f64 {
    let total = node_count + edge_count;
    if total == 0 {
        return 0.0;
    }
    2.0 * node_count as f64 * edge_count as f64 / total as f64
}

pub fn analyze(graph: &ProtocolGraph, options: &AnalysisOptions) -> GraphStatistics {
    let filtered;
    let graph: &DiGraph<ContractNode, ()> = if options.exclude_zero_address {
        filtered = graph.graph().filter_map(
            |_, node| (!is_zero_address(&node.address)).then(|| node.clone()),
            |_, edge| Some(*edge),
        );
        &filtered
    } else {
        graph.graph()
    };

    let node_count = graph.node_count();
    let edge_count = graph.edge_count();
    let scale = if node_count > 1 {
        1.0 / (node_count - 1) as f64
    } else {
        0.0
    };

    let mut centrality: Vec<NodeCentrality> = graph
        .node_indices()
        .map(|index| {
            let in_degree = graph.edges_directed(index, Direction::Incoming).count();
            let out_degree = graph.edges_directed(index, Direction::Outgoing).count();
            NodeCentrality {
                address: graph[index].address.clone(),
                label: graph[index].label.clone(),
                degree: (in_degree + out_degree) as f64 * scale,
                in_degree: in_degree as f64 * scale,
                out_degree: out_degree as f64 * scale,
                role: NodeRole::Periphery,
            }
        })
        .collect();

    let degrees: Vec<f64> = centrality.iter().map(|node| node.degree).collect();
    let centrality_threshold = percentile(&degrees, options.core_percentile);
    let mut core = Vec::new();
    let mut periphery = Vec::new();
    for node in &mut centrality {
        if node.degree > centrality_threshold {
            node.role = NodeRole::Core;
            core.push(node.address.clone());
        } else {
            periphery.push(node.address.clone());
        }
    }

    let strongly_connected_components = components(graph);
    let component_sizes = strongly_connected_components
        .iter()
        .map(|component| component.size)
        .collect();
    let cluster_strength = strongly_connected_components
        .iter()
        .filter(|component| component.size > 1)
        .map(|component| component.size as f64 * component.density)
        .sum();

    let isolated_nodes = graph
        .node_indices()
        .filter(|index| graph.neighbors_undirected(*index).next().is_none())
        .count();

    GraphStatistics {
        node_count,
        edge_count,
        centrality,
        centrality_threshold,
        core,
        periphery,
        strongly_connected_components,
        component_sizes,
        cluster_strength,
        isolated_nodes,
        network_size: network_size(node_count, edge_count),
    }
}

fn components(graph: &DiGraph<ContractNode, ()>) -> Vec<Component> {
    let sccs = tarjan_scc(graph);

    let mut component_of = vec![0; graph.node_count()];
    for (component, indices) in sccs.iter().enumerate() {
        for index in indices {
            component_of[index.index()] = component;
        }
    }

    // Self-loops do not count toward density.
    let mut internal_edges = vec![0usize; sccs.len()];
    for edge in graph.edge_references() {
        let (source, target) = (edge.source().index(), edge.target().index());
        if source != target && component_of[source] == component_of[target] {
            internal_edges[component_of[source]] += 1;
        }
    }

    let mut components: Vec<Component> = sccs
        .into_iter()
        .zip(internal_edges)
        .map(|(indices, internal_edges)| {
            let size = indices.len();
            let density = if size > 1 {
                internal_edges as f64 / (size * (size - 1)) as f64
            } else {
                0.0
            };
            let mut members: Vec<String> = indices
                .iter()
                .map(|index| graph[*index].address.clone())
                .collect();
            members.sort();
            Component {
                members,
                size,
                internal_edges,
                density,
            }
        })
        .collect();

    components.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.members.cmp(&b.members)));
    components
}
