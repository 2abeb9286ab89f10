use crate::AppState;
use crate::endpoints::shared::error_response;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use netmap::graph::{AnalysisOptions, GraphStatistics, NodeLinkGraph, ProtocolGraphBuilder, analyze};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const PROTOCOL_VIEW_PATH: &str = "/protocol_view";

#[derive(Deserialize, Serialize, Default, Clone, Debug)]
pub struct ProtocolViewQueryRequest {
    #[serde(default)]
    pub exclude_zero: bool,
}

#[derive(Serialize, Debug)]
pub struct ProtocolViewSuccessResponse {
    pub graph: NodeLinkGraph,
    pub statistics: GraphStatistics,
}

/// Rebuilds the protocol graph from every stored session and returns it in node-link
/// form together with its statistics.
pub async fn protocol_view_handler(
    State(state): State<AppState>,
    Query(query_params): Query<ProtocolViewQueryRequest>,
) -> impl IntoResponse {
    let store = state.store.clone();
    let options = AnalysisOptions {
        exclude_zero_address: query_params.exclude_zero,
        ..Default::default()
    };

    let built = tokio::task::spawn_blocking(move || {
        ProtocolGraphBuilder::from_store(store.as_ref()).map(|graph| {
            let statistics = analyze(&graph, &options);
            ProtocolViewSuccessResponse {
                graph: graph.to_node_link(),
                statistics,
            }
        })
    })
    .await;

    match built {
        Ok(Ok(view)) => {
            info!(
                "Protocol view built with {} nodes and {} edges",
                view.statistics.node_count, view.statistics.edge_count
            );
            (StatusCode::OK, Json(view)).into_response()
        }
        Ok(Err(e)) => {
            error!("Failed to build protocol graph: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to build protocol graph: {e}"),
            )
        }
        Err(e) => {
            error!("Protocol graph task panicked: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "protocol_graph_failed")
        }
    }
}
