//! Hand-off of targets to the analysis service.
//!
//! The service downloads, analyzes, enriches and persists a contract when given its
//! `network:address`. It exposes two routes: the full analysis route and a lightweight
//! session-generation route that never crawls on its own.

use crate::crawl::ledger::FailureLedger;
use crate::errors::{NetmapError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use session_store::{Session, SessionKey};
use std::time::Duration;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRoute {
    Full,
    Lightweight,
}

impl DispatchRoute {
    pub fn path(self) -> &'static str {
        match self {
            DispatchRoute::Full => "/",
            DispatchRoute::Lightweight => "/generate_session_data",
        }
    }
}

/// One unit of crawl work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRequest {
    pub key: SessionKey,
    pub route: DispatchRoute,
    /// Key of the session whose `external_addresses` referenced the target, `None` for
    /// the requested target itself.
    pub referenced_by: Option<String>,
    pub variable_name: Option<String>,
}

impl DispatchRequest {
    pub fn target(key: SessionKey) -> Self {
        Self {
            key,
            route: DispatchRoute::Full,
            referenced_by: None,
            variable_name: None,
        }
    }

    /// The `network:address` string sent to the service.
    pub fn payload(&self) -> String {
        self.key.to_string()
    }
}

pub trait Dispatcher {
    /// Requests analysis of `request.key` and blocks until the service answers. Returns
    /// the produced session when the response carries one.
    fn dispatch(&self, request: &DispatchRequest) -> Result<Option<Session>>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for &D {
    fn dispatch(&self, request: &DispatchRequest) -> Result<Option<Session>> {
        (**self).dispatch(request)
    }
}

/// Blocking HTTP client for the analysis service. Every failure is appended to the
/// failure ledger before it is returned.
pub struct HttpDispatcher {
    client: reqwest::blocking::Client,
    base_url: String,
    ledger: FailureLedger,
}

impl HttpDispatcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration, ledger: FailureLedger) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetmapError::Io(std::io::Error::other(e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            ledger,
        })
    }

    pub fn url(&self, route: DispatchRoute) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), route.path())
    }

    pub fn ledger(&self) -> &FailureLedger {
        &self.ledger
    }

    fn send(&self, request: &DispatchRequest) -> std::result::Result<String, String> {
        let payload = request.payload();
        let builder = self.client.post(self.url(request.route));
        let builder = match request.route {
            DispatchRoute::Full => builder.form(&[("path", payload.as_str())]),
            DispatchRoute::Lightweight => builder.json(&json!({ "path": payload })),
        };

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status();
        let body = response.text().map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("HTTP {status}: {body}"));
        }
        Ok(body)
    }

    fn fail(&self, request: &DispatchRequest, reason: String) -> NetmapError {
        let payload = request.payload();
        if let Err(e) = self.ledger.record(request.route, &payload, &reason) {
            error!(
                "Could not write failure ledger {}: {}",
                self.ledger.path().display(),
                e
            );
        }
        NetmapError::Dispatch {
            target: payload,
            reason,
        }
    }
}

impl Dispatcher for HttpDispatcher {
    fn dispatch(&self, request: &DispatchRequest) -> Result<Option<Session>> {
        info!(
            "Dispatching {} via {}",
            request.payload(),
            self.url(request.route)
        );
        let body = self
            .send(request)
            .map_err(|reason| self.fail(request, reason))?;

        Ok(session_from_body(request, &body))
    }
}

/// Both routes answer a successful request with the session document as JSON. A body
/// that does not parse still counts as dispatched, the session is then picked up from
/// the store instead.
fn session_from_body(request: &DispatchRequest, body: &str) -> Option<Session> {
    match serde_json::from_str::<Session>(body) {
        Ok(session) => Some(session),
        Err(e) => {
            debug!("Response for {} is not a session: {}", request.payload(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    #[test]
    fn test_route_urls() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FailureLedger::new(temp_dir.path().join("fails.jsonl"));
        let dispatcher =
            HttpDispatcher::new("http://127.0.0.1:5000/", Duration::from_secs(1), ledger).unwrap();

        assert_eq!(dispatcher.url(DispatchRoute::Full), "http://127.0.0.1:5000/");
        assert_eq!(
            dispatcher.url(DispatchRoute::Lightweight),
            "http://127.0.0.1:5000/generate_session_data"
        );
    }

    #[test]
    fn test_payload_uses_checksummed_key() {
        let key = SessionKey::parse(&format!("mainet:{}", WETH.to_lowercase())).unwrap();
        assert_eq!(DispatchRequest::target(key).payload(), format!("mainet:{WETH}"));
    }

    #[test]
    fn test_full_route_json_response_is_a_session() {
        let request = DispatchRequest::target(SessionKey::parse(WETH).unwrap());
        let body = json!({
            "network_info": {"contract_name": "WETH9", "contract_address": WETH, "contract_network": "mainet"},
            "contract_data": {"external_addresses": {}},
        })
        .to_string();

        let session = session_from_body(&request, &body).unwrap();
        assert_eq!(session.contract_name(), "WETH9");
        assert_eq!(session.contract_address(), WETH);
    }

    #[test]
    fn test_unparsable_response_falls_back_to_none() {
        let request = DispatchRequest::target(SessionKey::parse(WETH).unwrap());
        assert!(session_from_body(&request, "Invalid URL target").is_none());
    }

    #[test]
    fn test_unreachable_service_is_recorded() {
        let temp_dir = TempDir::new().unwrap();
        let ledger = FailureLedger::new(temp_dir.path().join("fails.jsonl"));
        let dispatcher =
            HttpDispatcher::new("http://127.0.0.1:9", Duration::from_millis(200), ledger).unwrap();

        let request = DispatchRequest {
            route: DispatchRoute::Lightweight,
            ..DispatchRequest::target(SessionKey::parse(WETH).unwrap())
        };
        let err = dispatcher.dispatch(&request).unwrap_err();
        assert!(matches!(err, NetmapError::Dispatch { .. }));

        let records = dispatcher.ledger().read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload, format!("mainet:{WETH}"));
        assert_eq!(records[0].route, DispatchRoute::Lightweight);
    }
}
