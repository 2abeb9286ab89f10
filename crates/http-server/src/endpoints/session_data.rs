use crate::AppState;
use crate::endpoints::shared::error_response;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use session_store::SessionStore;
use tracing::{error, info};

pub const SESSION_DATA_PATH: &str = "/get_session_data";

#[derive(Deserialize, Serialize, Default, Clone, Debug)]
pub struct SessionDataQueryRequest {
    /// Address, `network:address` key or any part of a session directory name.
    #[serde(default)]
    pub path: String,
}

/// Returns the session document of the first directory matching `path`.
pub async fn session_data_handler(
    State(state): State<AppState>,
    Query(query_params): Query<SessionDataQueryRequest>,
) -> impl IntoResponse {
    let query = query_params.path.trim().to_string();
    if query.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "empty_path");
    }

    info!("Received session data request path=\"{}\"", query);

    let store = state.store.clone();
    let lookup_query = query.clone();
    let found = tokio::task::spawn_blocking(move || store.find(&lookup_query)).await;

    match found {
        Ok(Ok((_, session))) => (StatusCode::OK, Json(session)).into_response(),
        Ok(Err(e)) if e.is_absent() => {
            info!("No session for {}: {}", query, e);
            error_response(StatusCode::NOT_FOUND, "Session data not found")
        }
        Ok(Err(e)) => {
            error!("Failed to load session for {}: {}", query, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load session: {e}"),
            )
        }
        Err(e) => {
            error!("Session lookup task panicked: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "session_lookup_failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::shared::StatusResponse;
    use crate::router;
    use crate::testing::{POOL, ROUTER, build_app_state, session};
    use axum_test::TestServer;
    use session_store::Session;

    #[tokio::test]
    async fn test_get_session_data_by_partial_address() {
        let (state, _temp_dir) = build_app_state();
        state
            .store
            .save(&session("Pool", POOL, &[("router", ROUTER)]))
            .unwrap();
        let server = TestServer::new(router(state)).unwrap();

        let response = server
            .get(SESSION_DATA_PATH)
            .add_query_param("path", &POOL[2..12].to_lowercase())
            .await;

        response.assert_status_ok();
        let body: Session = response.json();
        assert_eq!(body.contract_name(), "Pool");
        assert_eq!(
            body.external_addresses().collect::<Vec<_>>(),
            vec![("router", ROUTER)]
        );
    }

    #[tokio::test]
    async fn test_get_session_data_not_found() {
        let (state, _temp_dir) = build_app_state();
        let server = TestServer::new(router(state)).unwrap();

        let response = server
            .get(SESSION_DATA_PATH)
            .add_query_param("path", ROUTER)
            .await;

        response.assert_status_not_found();
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "Session data not found");
    }

    #[tokio::test]
    async fn test_get_session_data_requires_path() {
        let (state, _temp_dir) = build_app_state();
        let server = TestServer::new(router(state)).unwrap();

        let response = server.get(SESSION_DATA_PATH).await;

        response.assert_status_bad_request();
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "empty_path");
    }
}
