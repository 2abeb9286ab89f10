use netmap::crawl::{
    CrawlScheduler, CrawlState, DispatchRequest, DispatchRoute, Dispatcher, RateLimiter,
    SkipReason,
};
use netmap::{NetmapError, Result};
use session_store::{InMemorySessionStore, NetworkInfo, Session, SessionStore, ZERO_ADDRESS};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

const A: &str = "0xaAaAaAaaAaAaAaaAaAAAAAAAAaaaAaAaAaaAaaAa";
const B: &str = "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB";
const C: &str = "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC";
const D: &str = "0xDDdDddDdDdddDDddDDddDDDDdDdDDdDDdDDDDDDd";

fn session(name: &str, address: &str, external: &[(&str, &str)]) -> Session {
    let mut session = Session {
        network_info: NetworkInfo {
            contract_name: name.to_string(),
            contract_address: address.to_lowercase(),
            contract_network: "mainet".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    session.contract_data.external_addresses = Some(
        external
            .iter()
            .map(|(name, address)| (name.to_string(), address.to_lowercase()))
            .collect::<BTreeMap<_, _>>(),
    );
    session
}

fn store(sessions: Vec<Session>) -> Arc<InMemorySessionStore> {
    Arc::new(InMemorySessionStore::with_sessions(sessions).unwrap())
}

fn payload(address: &str) -> String {
    format!("mainet:{address}")
}

/// Stands in for the analysis service: records every request and, when it knows the
/// target, persists the session the service would have produced.
struct FakeService {
    store: Option<Arc<InMemorySessionStore>>,
    produces: HashMap<String, Session>,
    failing: Vec<String>,
    requests: RefCell<Vec<DispatchRequest>>,
}

impl FakeService {
    fn recording() -> Self {
        Self {
            store: None,
            produces: HashMap::new(),
            failing: Vec::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn persisting(store: Arc<InMemorySessionStore>, sessions: Vec<Session>) -> Self {
        Self {
            store: Some(store),
            ..Self::returning(sessions)
        }
    }

    fn returning(sessions: Vec<Session>) -> Self {
        Self {
            produces: sessions
                .into_iter()
                .map(|session| (payload(&session.contract_address().to_lowercase()), session))
                .collect(),
            ..Self::recording()
        }
    }

    fn payloads(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(DispatchRequest::payload)
            .collect()
    }
}

impl Dispatcher for FakeService {
    fn dispatch(&self, request: &DispatchRequest) -> Result<Option<Session>> {
        self.requests.borrow_mut().push(request.clone());
        let payload = request.payload();

        if self.failing.contains(&payload) {
            return Err(NetmapError::Dispatch {
                target: payload,
                reason: "HTTP 500 Internal Server Error".to_string(),
            });
        }

        let produced = self.produces.get(&payload.to_lowercase()).cloned();
        if let (Some(store), Some(session)) = (&self.store, &produced) {
            store.save(session)?;
        }
        Ok(produced)
    }
}

#[test]
fn scenario_a_single_hop_dispatches_new_dependency_once() {
    let store = store(vec![session("Vault", A, &[("token", B)])]);
    let service = FakeService::recording();
    let mut scheduler = CrawlScheduler::new(store, &service, Some(1)).unwrap();

    let report = scheduler.crawl(None).unwrap();

    let requests = service.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].payload(), payload(B));
    assert_eq!(requests[0].route, DispatchRoute::Lightweight);
    assert_eq!(requests[0].variable_name.as_deref(), Some("token"));
    assert_eq!(report.count(CrawlState::Queued), 1);
    assert_eq!(report.passes, 1);
}

#[test]
fn scenario_b_existing_dependency_is_not_dispatched() {
    let store = store(vec![
        session("Vault", A, &[("token", B)]),
        session("Token", B, &[]),
    ]);
    let service = FakeService::recording();
    let mut scheduler = CrawlScheduler::new(store, &service, Some(1)).unwrap();

    let report = scheduler.crawl(None).unwrap();

    assert!(service.requests.borrow().is_empty());
    assert_eq!(report.count(CrawlState::Analyzed), 1);
    assert!(report.dispatched.is_empty());
}

#[test]
fn scenario_c_zero_address_is_skipped() {
    let store = store(vec![session("Vault", A, &[("burn", ZERO_ADDRESS)])]);
    let service = FakeService::recording();

    for level in [None, Some(0), Some(1)] {
        let mut scheduler = CrawlScheduler::new(Arc::clone(&store), &service, level).unwrap();
        let report = scheduler.crawl(None).unwrap();
        assert_eq!(
            report.entries[0].state,
            CrawlState::Skipped(SkipReason::ZeroAddress)
        );
    }
    assert!(service.requests.borrow().is_empty());
}

#[test]
fn rerunning_over_a_stable_store_dispatches_nothing() {
    let store = store(vec![session("Vault", A, &[("token", B)])]);
    let service =
        FakeService::persisting(Arc::clone(&store), vec![session("Token", B, &[("vault", A)])]);
    let mut scheduler = CrawlScheduler::new(Arc::clone(&store), &service, Some(1)).unwrap();

    scheduler.crawl(None).unwrap();
    assert_eq!(service.payloads(), vec![payload(B)]);

    let report = scheduler.crawl(None).unwrap();
    assert_eq!(service.payloads().len(), 1);
    assert!(report.dispatched.is_empty());
    assert_eq!(report.count(CrawlState::Analyzed), 2);
}

#[test]
fn unbounded_crawl_follows_new_sessions_until_closed() {
    let store = store(vec![session("Vault", A, &[("token", B)])]);
    let service = FakeService::persisting(
        Arc::clone(&store),
        vec![
            session("Token", B, &[("oracle", C), ("vault", A)]),
            session("Oracle", C, &[("token", B)]),
        ],
    );
    let mut scheduler = CrawlScheduler::new(Arc::clone(&store), &service, Some(0)).unwrap();

    let report = scheduler.crawl(None).unwrap();

    assert_eq!(service.payloads(), vec![payload(B), payload(C)]);
    assert!(
        service
            .requests
            .borrow()
            .iter()
            .all(|request| request.route == DispatchRoute::Full)
    );
    assert_eq!(report.passes, 3);
    assert_eq!(store.len(), 3);
}

#[test]
fn in_flight_addresses_are_not_dispatched_twice() {
    // The service answers but never persists, so the store alone cannot break the
    // A -> B -> A cycle.
    let store = store(vec![session("Vault", A, &[("token", B)])]);
    let service = FakeService::returning(vec![session("Token", B, &[("vault", A), ("feed", D)])]);
    let mut scheduler = CrawlScheduler::new(store, &service, Some(0)).unwrap();

    let report = scheduler.crawl(None).unwrap();

    assert_eq!(service.payloads(), vec![payload(B), payload(D)]);
    assert_eq!(report.dispatched.len(), 2);
}

#[test]
fn requested_target_is_analyzed_through_full_route() {
    let store = store(vec![]);
    let service = FakeService::persisting(
        Arc::clone(&store),
        vec![session("Vault", A, &[("token", B)])],
    );
    let mut scheduler = CrawlScheduler::new(Arc::clone(&store), &service, Some(1)).unwrap();

    let target = payload(&A.to_lowercase());
    scheduler.crawl(Some(target.as_str())).unwrap();

    let requests = service.requests.borrow();
    assert_eq!(requests.len(), 2);
    assert_eq!((requests[0].payload(), requests[0].route), (payload(A), DispatchRoute::Full));
    assert_eq!(
        (requests[1].payload(), requests[1].route),
        (payload(B), DispatchRoute::Lightweight)
    );
}

#[test]
fn dispatch_failure_does_not_stop_the_frontier() {
    let store = store(vec![session("Vault", A, &[("feed", C), ("token", B)])]);
    let mut service = FakeService::recording();
    service.failing.push(payload(C));
    let mut scheduler = CrawlScheduler::new(store, &service, Some(1)).unwrap();

    let report = scheduler.crawl(None).unwrap();

    assert_eq!(service.payloads(), vec![payload(C), payload(B)]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, payload(C));
    assert!(report.failures[0].error.contains("HTTP 500"));
}

#[test]
fn unsupported_level_is_rejected() {
    let service = FakeService::recording();
    let result = CrawlScheduler::new(store(vec![]), &service, Some(2));
    assert!(matches!(result, Err(NetmapError::UnsupportedCrawlLevel(2))));
}

#[test]
fn seven_dispatches_take_at_least_one_second() {
    let dependencies: Vec<String> = (1..=7)
        .map(|i| format!("0x{}", i.to_string().repeat(40)))
        .collect();
    let external: Vec<(String, &str)> = dependencies
        .iter()
        .enumerate()
        .map(|(i, address)| (format!("dep{i}"), address.as_str()))
        .collect();
    let external: Vec<(&str, &str)> = external
        .iter()
        .map(|(name, address)| (name.as_str(), *address))
        .collect();
    let store = store(vec![session("Router", A, &external)]);
    let service = FakeService::recording();
    let mut scheduler = CrawlScheduler::new(store, &service, Some(1))
        .unwrap()
        .with_rate_limiter(RateLimiter::new(5, Duration::from_secs(1)));

    let start = Instant::now();
    let report = scheduler.crawl(None).unwrap();

    assert_eq!(report.dispatched.len(), 7);
    assert!(start.elapsed() >= Duration::from_secs(1));
}
