use crate::errors::Result;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use session_store::{Session, SessionStore, normalize_address};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Label of the node standing for the zero address.
pub const ZERO_ADDRESS_LABEL: &str = "ZERO_ADDRESS";

/// Node identifier: the checksummed address, or the raw string when it is not an
/// address at all.
pub fn node_id(address: &str) -> String {
    normalize_address(address).unwrap_or_else(|| address.trim().to_string())
}

fn is_zero_id(id: &str) -> bool {
    session_store::is_zero_address(id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractNode {
    pub address: String,
    pub label: String,
    /// Location of the session document, empty for contracts that were only referenced.
    pub session_path: String,
    /// External call expressions of the session that mention one of its resolved
    /// variable names.
    pub ext_expressions: Vec<String>,
    pub analyzed: bool,
}

/// Directed graph of contracts keyed by address. Edges read "source calls target".
#[derive(Debug, Clone, Default)]
pub struct ProtocolGraph {
    graph: DiGraph<ContractNode, ()>,
    index: HashMap<String, NodeIndex>,
}

impl ProtocolGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn graph(&self) -> &DiGraph<ContractNode, ()> {
        &self.graph
    }

    pub fn node_index(&self, address: &str) -> Option<NodeIndex> {
        self.index.get(&node_id(address)).copied()
    }

    pub fn node(&self, address: &str) -> Option<&ContractNode> {
        self.node_index(address).map(|index| &self.graph[index])
    }

    pub fn contains(&self, address: &str) -> bool {
        self.node_index(address).is_some()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ContractNode> {
        self.graph.node_weights()
    }

    /// `(source, target)` address pairs.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.graph.edge_indices().filter_map(|edge| {
            let (source, target) = self.graph.edge_endpoints(edge)?;
            Some((
                self.graph[source].address.as_str(),
                self.graph[target].address.as_str(),
            ))
        })
    }

    pub fn successors(&self, address: &str) -> Vec<&str> {
        self.neighbors(address, Direction::Outgoing)
    }

    pub fn predecessors(&self, address: &str) -> Vec<&str> {
        self.neighbors(address, Direction::Incoming)
    }

    fn neighbors(&self, address: &str, direction: Direction) -> Vec<&str> {
        let Some(index) = self.node_index(address) else {
            return Vec::new();
        };
        let mut neighbors: Vec<&str> = self
            .graph
            .neighbors_directed(index, direction)
            .map(|neighbor| self.graph[neighbor].address.as_str())
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// Adds or completes the node of an analyzed contract. Its own attributes replace
    /// whatever a reference recorded before.
    pub fn add_session_node(
        &mut self,
        address: &str,
        label: &str,
        session_path: &str,
        ext_expressions: Vec<String>,
    ) -> NodeIndex {
        let id = node_id(address);
        let zero = is_zero_id(&id);
        let node = ContractNode {
            label: if zero {
                ZERO_ADDRESS_LABEL.to_string()
            } else {
                label.to_string()
            },
            session_path: if zero {
                String::new()
            } else {
                session_path.to_string()
            },
            ext_expressions,
            analyzed: true,
            address: id.clone(),
        };

        match self.index.get(&id) {
            Some(&index) => {
                self.graph[index] = node;
                index
            }
            None => self.insert(id, node),
        }
    }

    /// Adds the node of a referenced contract unless it is already known.
    pub fn add_referenced_node(&mut self, address: &str, label: &str) -> NodeIndex {
        let id = node_id(address);
        if let Some(&index) = self.index.get(&id) {
            return index;
        }
        let node = ContractNode {
            label: if is_zero_id(&id) {
                ZERO_ADDRESS_LABEL.to_string()
            } else {
                label.to_string()
            },
            session_path: String::new(),
            ext_expressions: Vec::new(),
            analyzed: false,
            address: id.clone(),
        };
        self.insert(id, node)
    }

    /// Adds `source -> target`. Returns `false` when the edge already existed.
    pub fn add_edge(&mut self, source: NodeIndex, target: NodeIndex) -> bool {
        if self.graph.find_edge(source, target).is_some() {
            return false;
        }
        self.graph.update_edge(source, target, ());
        true
    }

    fn insert(&mut self, id: String, node: ContractNode) -> NodeIndex {
        let index = self.graph.add_node(node);
        self.index.insert(id, index);
        index
    }

    /// networkx style node-link document.
    pub fn to_node_link(&self) -> NodeLinkGraph {
        NodeLinkGraph {
            directed: true,
            multigraph: false,
            nodes: self
                .graph
                .node_weights()
                .map(|node| NodeLinkNode {
                    id: node.address.clone(),
                    node: node.clone(),
                })
                .collect(),
            links: self
                .edges()
                .map(|(source, target)| NodeLinkEdge {
                    source: source.to_string(),
                    target: target.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLinkGraph {
    pub directed: bool,
    pub multigraph: bool,
    pub nodes: Vec<NodeLinkNode>,
    pub links: Vec<NodeLinkEdge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLinkNode {
    pub id: String,
    #[serde(flatten)]
    pub node: ContractNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLinkEdge {
    pub source: String,
    pub target: String,
}

/// Aggregates sessions into a [`ProtocolGraph`].
#[derive(Debug, Default)]
pub struct ProtocolGraphBuilder {
    graph: ProtocolGraph,
}

impl ProtocolGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the session's own node, one node per resolved external address and an edge
    /// to each of them. Sessions without a contract address contribute nothing.
    pub fn add_session(&mut self, session: &Session, session_path: Option<&Path>) -> &mut Self {
        let address = session.contract_address();
        if address.trim().is_empty() {
            debug!(
                "Session {} has no contract address, not graphed",
                session.contract_name()
            );
            return self;
        }

        let names: Vec<&str> = session.external_addresses().map(|(name, _)| name).collect();
        let ext_expressions = session
            .external_calls()
            .iter()
            .filter(|call| names.iter().any(|name| call.contains(name)))
            .cloned()
            .collect();
        let session_path = session_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| session.network_info.data_directory.clone());

        let source = self.graph.add_session_node(
            address,
            session.contract_name(),
            &session_path,
            ext_expressions,
        );
        for (name, external_address) in session.external_addresses() {
            let target = self.graph.add_referenced_node(external_address, name);
            self.graph.add_edge(source, target);
        }
        self
    }

    pub fn finish(self) -> ProtocolGraph {
        self.graph
    }

    pub fn build<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> ProtocolGraph {
        let mut builder = Self::new();
        for session in sessions {
            builder.add_session(session, None);
        }
        builder.finish()
    }

    /// Graph of every loadable session of `store`.
    pub fn from_store<S: SessionStore + ?Sized>(store: &S) -> Result<ProtocolGraph> {
        let mut builder = Self::new();
        for (path, session) in store.sessions()? {
            builder.add_session(&session, Some(&path));
        }
        let graph = builder.finish();
        debug!(
            "Built protocol graph: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}
