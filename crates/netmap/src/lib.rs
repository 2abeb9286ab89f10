//! # Netmap
//!
//! Cross-contract dependency mapping over a corpus of analyzed contract sessions.
//!
//! - [`extractor`] separates genuine external calls from accessor, cast and library noise
//! - [`resolver`] resolves address-holding state variables from literals or live getters
//! - [`enrich`] writes both results back into a stored session
//! - [`crawl`] schedules analysis of referenced contracts that have no session yet
//! - [`graph`] aggregates every session into a directed protocol graph and its statistics

pub mod config;
pub mod crawl;
pub mod enrich;
pub mod errors;
pub mod extractor;
pub mod graph;
pub mod resolver;
pub mod rpc;

pub use config::{NetmapConfiguration, get_or_create_netmap_configuration};
pub use crawl::{CrawlLevel, CrawlReport, CrawlScheduler, HttpDispatcher};
pub use enrich::{EnrichmentSummary, enrich_session, map_target};
pub use errors::{NetmapError, Result};
pub use graph::{AnalysisOptions, GraphStatistics, ProtocolGraph, ProtocolGraphBuilder, analyze};
pub use resolver::{AddressResolver, ContractReader};
pub use rpc::JsonRpcReader;
