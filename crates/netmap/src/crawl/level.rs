use crate::crawl::dispatch::DispatchRoute;
use crate::errors::{NetmapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a crawl expands from the requested target.
///
/// The level picks the dispatch route for newly discovered addresses. It is not a depth
/// counter: an unbounded crawl stops only when a pass discovers nothing new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlLevel {
    /// No level given: only the requested target is analyzed.
    TargetOnly,
    /// Level 1: discovered addresses are analyzed through the lightweight route, which
    /// never crawls further.
    SingleHop,
    /// Level 0: discovered addresses are analyzed through the full route and their own
    /// dependencies are crawled in turn.
    Unbounded,
}

impl CrawlLevel {
    pub fn from_level(level: Option<u32>) -> Result<Self> {
        match level {
            None => Ok(CrawlLevel::TargetOnly),
            Some(0) => Ok(CrawlLevel::Unbounded),
            Some(1) => Ok(CrawlLevel::SingleHop),
            Some(other) => Err(NetmapError::UnsupportedCrawlLevel(other)),
        }
    }

    pub fn as_level(self) -> Option<u32> {
        match self {
            CrawlLevel::TargetOnly => None,
            CrawlLevel::SingleHop => Some(1),
            CrawlLevel::Unbounded => Some(0),
        }
    }

    /// Route used for frontier addresses, `None` when the frontier is not expanded.
    pub fn frontier_route(self) -> Option<DispatchRoute> {
        match self {
            CrawlLevel::TargetOnly => None,
            CrawlLevel::SingleHop => Some(DispatchRoute::Lightweight),
            CrawlLevel::Unbounded => Some(DispatchRoute::Full),
        }
    }
}

impl fmt::Display for CrawlLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlLevel::TargetOnly => write!(f, "target only"),
            CrawlLevel::SingleHop => write!(f, "single hop (level 1)"),
            CrawlLevel::Unbounded => write!(f, "unbounded (level 0)"),
        }
    }
}
