use crate::crawl::dispatch::{DispatchRequest, DispatchRoute, Dispatcher};
use crate::crawl::level::CrawlLevel;
use crate::crawl::rate_limit::RateLimiter;
use crate::errors::Result;
use serde::Serialize;
use session_store::store::session_key;
use session_store::target::parse_address;
use session_store::{Session, SessionKey, SessionStore, ZERO_ADDRESS};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    ZeroAddress,
    DepthExhausted,
    InvalidAddress,
}

/// Scheduling state of one frontier entry during a crawl run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum CrawlState {
    /// Referenced by a session but not yet classified.
    Pending,
    /// Sent to the analysis service.
    Queued,
    /// A session exists, or the address is in flight in this run.
    Analyzed,
    Skipped(SkipReason),
}

/// One `(name, address)` pair of some session's `external_addresses`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrontierEntry {
    pub source: String,
    pub variable_name: String,
    pub address: String,
    pub state: CrawlState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchFailure {
    pub target: String,
    pub route: DispatchRoute,
    pub error: String,
}

/// Outcome of one crawl run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub level: CrawlLevel,
    pub passes: usize,
    /// Latest state of every frontier entry seen, in discovery order.
    pub entries: Vec<FrontierEntry>,
    /// Targets handed to the dispatcher, in dispatch order.
    pub dispatched: Vec<String>,
    pub failures: Vec<DispatchFailure>,
}

impl CrawlReport {
    fn new(level: CrawlLevel) -> Self {
        Self {
            level,
            passes: 0,
            entries: Vec::new(),
            dispatched: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn count(&self, state: CrawlState) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state == state)
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.state, CrawlState::Skipped(_)))
            .count()
    }

    fn upsert(&mut self, source: &str, variable_name: &str, address: &str) -> usize {
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.source == source && entry.variable_name == variable_name)
        {
            self.entries[index].address = address.to_string();
            return index;
        }
        self.entries.push(FrontierEntry {
            source: source.to_string(),
            variable_name: variable_name.to_string(),
            address: address.to_string(),
            state: CrawlState::Pending,
        });
        self.entries.len() - 1
    }

    fn set_state(&mut self, request: &DispatchRequest, state: CrawlState) {
        if let (Some(source), Some(variable_name)) = (&request.referenced_by, &request.variable_name)
            && let Some(entry) = self
                .entries
                .iter_mut()
                .find(|entry| &entry.source == source && &entry.variable_name == variable_name)
        {
            entry.state = state;
        }
    }
}

/// Discovers the addresses referenced by stored sessions and hands the unseen ones to
/// the analysis service.
///
/// A crawl run alternates between classifying the frontier of every known session and
/// draining the resulting work queue one request at a time. The store is the
/// deduplication ledger across runs; within a run, addresses already handed out are
/// tracked as in flight and count as analyzed.
pub struct CrawlScheduler<S: ?Sized, D> {
    store: Arc<S>,
    dispatcher: D,
    level: CrawlLevel,
    rate_limiter: RateLimiter,
}

impl<S, D> CrawlScheduler<S, D>
where
    S: SessionStore + ?Sized,
    D: Dispatcher,
{
    /// Fails with `UnsupportedCrawlLevel` for any level other than none, 0 or 1.
    pub fn new(store: Arc<S>, dispatcher: D, level: Option<u32>) -> Result<Self> {
        Ok(Self {
            store,
            dispatcher,
            level: CrawlLevel::from_level(level)?,
            rate_limiter: RateLimiter::default(),
        })
    }

    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn level(&self) -> CrawlLevel {
        self.level
    }

    /// Runs one crawl. `target` is analyzed first through the full route when the store
    /// has no session for it; the frontier of the corpus is then expanded according to
    /// the crawl level.
    pub fn crawl(&mut self, target: Option<&str>) -> Result<CrawlReport> {
        let mut report = CrawlReport::new(self.level);
        let mut in_flight: HashSet<SessionKey> = HashSet::new();
        let mut returned: Vec<Session> = Vec::new();

        if let Some(target) = target {
            let key = SessionKey::parse(target)?;
            if let Some(path) = self.store.exists(&key.checksummed_address()) {
                info!("{} already analyzed at {}", key, path.display());
            } else {
                in_flight.insert(key.clone());
                let mut queue = VecDeque::from([DispatchRequest::target(key)]);
                self.drain(&mut queue, &mut report, &mut returned);
            }
        }

        info!("Crawling frontier, level {}", self.level);
        loop {
            report.passes += 1;
            let mut queue = self.classify_frontier(&mut report, &mut in_flight, &returned)?;
            if queue.is_empty() {
                break;
            }
            info!("Pass {}: {} addresses queued", report.passes, queue.len());
            self.drain(&mut queue, &mut report, &mut returned);
            if self.level != CrawlLevel::Unbounded {
                break;
            }
        }

        info!(
            "Crawl finished after {} passes: {} dispatched, {} failed, {} skipped",
            report.passes,
            report.dispatched.len(),
            report.failures.len(),
            report.skipped()
        );
        Ok(report)
    }

    /// Classifies every `(name, address)` pair referenced by the known sessions and
    /// returns the work queue of this pass.
    fn classify_frontier(
        &self,
        report: &mut CrawlReport,
        in_flight: &mut HashSet<SessionKey>,
        returned: &[Session],
    ) -> Result<VecDeque<DispatchRequest>> {
        let mut sessions: Vec<Session> = self
            .store
            .sessions()?
            .into_iter()
            .map(|(_, session)| session)
            .collect();
        // Sessions handed back by the service that the store does not show yet.
        for session in returned {
            if self.store.exists(session.contract_address()).is_none() {
                sessions.push(session.clone());
            }
        }

        let mut queue = VecDeque::new();
        for session in &sessions {
            let source_key = match session_key(session) {
                Ok(key) => key,
                Err(e) => {
                    warn!("Skipping frontier of {}: {}", session.contract_name(), e);
                    continue;
                }
            };
            let source = source_key.to_string();

            for (name, address) in session.external_addresses() {
                let index = report.upsert(&source, name, address);
                let state = self.classify(
                    &source_key,
                    name,
                    address,
                    in_flight,
                    &mut queue,
                );
                report.entries[index].state = state;
            }
        }
        Ok(queue)
    }

    fn classify(
        &self,
        source: &SessionKey,
        name: &str,
        address: &str,
        in_flight: &mut HashSet<SessionKey>,
        queue: &mut VecDeque<DispatchRequest>,
    ) -> CrawlState {
        let Some(parsed) = parse_address(address) else {
            warn!("{} in {}: invalid address {}", name, source, address);
            return CrawlState::Skipped(SkipReason::InvalidAddress);
        };
        let key = SessionKey {
            network: source.network.clone(),
            address: parsed,
        };

        if self.store.exists(&key.checksummed_address()).is_some() || in_flight.contains(&key) {
            return CrawlState::Analyzed;
        }
        if address.eq_ignore_ascii_case(ZERO_ADDRESS) {
            warn!(
                "{} in {}: address {} is not supported (zero address)",
                name, source, address
            );
            return CrawlState::Skipped(SkipReason::ZeroAddress);
        }
        let Some(route) = self.level.frontier_route() else {
            debug!("{} in {}: {} left for a deeper crawl", name, source, key);
            return CrawlState::Skipped(SkipReason::DepthExhausted);
        };

        in_flight.insert(key.clone());
        queue.push_back(DispatchRequest {
            key,
            route,
            referenced_by: Some(source.to_string()),
            variable_name: Some(name.to_string()),
        });
        CrawlState::Queued
    }

    /// The worker loop: one request at a time, rate limited, each failure recorded and
    /// skipped.
    fn drain(
        &mut self,
        queue: &mut VecDeque<DispatchRequest>,
        report: &mut CrawlReport,
        returned: &mut Vec<Session>,
    ) {
        while let Some(request) = queue.pop_front() {
            let payload = request.payload();
            if self.store.exists(&request.key.checksummed_address()).is_some() {
                debug!("{} appeared in the store, not dispatching", payload);
                report.set_state(&request, CrawlState::Analyzed);
                continue;
            }

            self.rate_limiter.acquire();
            report.dispatched.push(payload.clone());
            match self.dispatcher.dispatch(&request) {
                Ok(Some(session)) => {
                    debug!("{} produced session {}", payload, session.contract_name());
                    returned.push(session);
                }
                Ok(None) => debug!("{} dispatched", payload),
                Err(e) => {
                    error!("Dispatch of {} failed: {}", payload, e);
                    report.failures.push(DispatchFailure {
                        target: payload,
                        route: request.route,
                        error: e.to_string(),
                    });
                }
            }
        }
    }
}
