use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "127.0.0.1:5050";

#[derive(Parser, Debug)]
#[command(
    name = "recon",
    version,
    about = "Smart contract reconnaissance CLI",
    long_about = "Maps the external dependencies of analyzed contracts, crawls the contracts they reference and builds the protocol graph."
)]
pub struct ReconCli {
    /// Data directory holding sessions, the address index and settings (defaults to ~/.netmap)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl ReconCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a target and crawl the contracts referenced by stored sessions
    Crawl(CrawlArgs),
    /// Resolve and record the external dependencies of stored sessions
    Map(MapArgs),
    /// Build the protocol graph of every stored session and print its statistics
    Graph(GraphArgs),
    /// Rebuild the address index
    Index,
    /// List session directories
    List(ListArgs),
    /// Serve the read-only JSON API over the stored sessions
    Server(ServerArgs),
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// `network:address`, bare address or block explorer URL to analyze first
    pub target: Option<String>,

    /// Crawl level: 1 analyzes referenced contracts once, 0 keeps crawling until nothing new is found
    #[arg(short, long)]
    pub level: Option<u32>,

    /// Base URL of the analysis service (overrides the settings file)
    #[arg(long)]
    pub dispatch_url: Option<String>,

    /// Dispatches allowed per rate limit window (overrides the settings file)
    #[arg(long)]
    pub max_dispatches: Option<usize>,

    /// Print the crawl report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct MapArgs {
    /// Address, `network:address` key, explorer URL or part of a session directory name
    #[arg(required_unless_present = "all")]
    pub target: Option<String>,

    /// Map every session that has not been mapped yet
    #[arg(long, default_value_t = false, conflicts_with = "target")]
    pub all: bool,

    /// JSON-RPC node used to call address getters (overrides the settings file)
    #[arg(long)]
    pub rpc_url: Option<String>,

    /// Print the mapping result as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Leave the zero address out of the statistics
    #[arg(long, default_value_t = false)]
    pub exclude_zero: bool,

    /// Print the node-link graph and its statistics as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Also write the node-link graph to this file
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Print a header line
    #[arg(long, default_value_t = false)]
    pub header: bool,
}

#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(short, long, default_value = DEFAULT_BIND)]
    pub bind: String,
}
