//! Crawl scheduling over the session corpus.
//!
//! ## Architecture Overview
//!
//! ```text
//! SessionStore ──sessions()──► classify frontier ──► work queue
//!      ▲                                                 │
//!      │                                   RateLimiter ──┤
//!      │                                                 ▼
//!      └──────── persisted by the service ◄──── Dispatcher (HTTP)
//!                                                        │
//!                                                 FailureLedger
//! ```
//!
//! ## Modules
//!
//! - **[`level`]**: Crawl levels and the dispatch route each one uses
//! - **[`scheduler`]**: Frontier classification, the in-flight set and the worker loop
//! - **[`dispatch`]**: The `Dispatcher` seam and its blocking HTTP implementation
//! - **[`rate_limit`]**: Sliding window limiter applied to every dispatch
//! - **[`ledger`]**: Append-only record of failed dispatches

pub mod dispatch;
pub mod ledger;
pub mod level;
pub mod rate_limit;
pub mod scheduler;

pub use dispatch::{DispatchRequest, DispatchRoute, Dispatcher, HttpDispatcher};
pub use ledger::{FailureLedger, FailureRecord};
pub use level::CrawlLevel;
pub use rate_limit::RateLimiter;
pub use scheduler::{CrawlReport, CrawlScheduler, CrawlState, FrontierEntry, SkipReason};
