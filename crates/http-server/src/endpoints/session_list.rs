use crate::AppState;
use crate::endpoints::shared::error_response;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::error;

pub const SESSION_LIST_PATH: &str = "/list_sessions";

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct SessionListSuccessResponse {
    /// Session directory name to its absolute path, including directories that do not
    /// hold a session document yet.
    pub sessions: BTreeMap<String, String>,
}

/// Lists every session directory of the data directory.
pub async fn session_list_handler(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.store.clone();
    let listed = tokio::task::spawn_blocking(move || store.session_directories()).await;

    match listed {
        Ok(Ok(directories)) => (
            StatusCode::OK,
            Json(SessionListSuccessResponse {
                sessions: directories
                    .into_iter()
                    .map(|(name, path)| (name, path.display().to_string()))
                    .collect(),
            }),
        )
            .into_response(),
        Ok(Err(e)) => {
            error!("Failed to list sessions: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list sessions: {e}"),
            )
        }
        Err(e) => {
            error!("Session listing task panicked: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "session_listing_failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router;
    use crate::testing::{POOL, ROUTER, build_app_state, session};
    use axum_test::TestServer;
    use session_store::SessionStore;

    #[tokio::test]
    async fn test_list_sessions_empty() {
        let (state, _temp_dir) = build_app_state();
        let server = TestServer::new(router(state)).unwrap();

        let response = server.get(SESSION_LIST_PATH).await;

        response.assert_status_ok();
        let body: SessionListSuccessResponse = response.json();
        assert!(body.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_list_sessions_includes_incomplete_directories() {
        let (state, _temp_dir) = build_app_state();
        state.store.save(&session("Pool", POOL, &[])).unwrap();
        state
            .store
            .data_directory()
            .ensure_session_directory(&format!("mainet:{ROUTER}:Router"))
            .unwrap();
        let server = TestServer::new(router(state)).unwrap();

        let response = server.get(SESSION_LIST_PATH).await;

        response.assert_status_ok();
        let body: SessionListSuccessResponse = response.json();
        assert_eq!(body.sessions.len(), 2);
        assert!(body.sessions.keys().any(|name| name.contains(POOL)));
        assert!(
            body.sessions
                .values()
                .all(|path| path.contains("sessions"))
        );
    }
}
