pub mod endpoints;

#[cfg(test)]
pub mod testing;

use crate::endpoints::{
    health::{HEALTH_PATH, health_handler},
    protocol_view::{PROTOCOL_VIEW_PATH, protocol_view_handler},
    session_data::{SESSION_DATA_PATH, session_data_handler},
    session_list::{SESSION_LIST_PATH, session_list_handler},
};

use anyhow::Result;
use axum::{Router, routing::get};
use session_store::FsSessionStore;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FsSessionStore>,
}

impl AppState {
    pub fn new(store: FsSessionStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_handler))
        .route(SESSION_LIST_PATH, get(session_list_handler))
        .route(SESSION_DATA_PATH, get(session_data_handler))
        .route(PROTOCOL_VIEW_PATH, get(protocol_view_handler))
        .with_state(state)
}

pub async fn run(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    tracing::info!("HTTP server shut down gracefully");
    result.map_err(Into::into)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
