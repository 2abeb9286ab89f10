//! Protocol graph: contracts as nodes, resolved external addresses as edges.

pub mod analysis;
pub mod builder;

pub use analysis::{AnalysisOptions, Component, GraphStatistics, NodeCentrality, NodeRole, analyze};
pub use builder::{
    ContractNode, NodeLinkGraph, ProtocolGraph, ProtocolGraphBuilder, ZERO_ADDRESS_LABEL,
};
