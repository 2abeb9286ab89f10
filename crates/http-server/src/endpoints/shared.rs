use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct StatusResponse {
    pub status: String,
}

pub fn error_response(code: StatusCode, status: impl Into<String>) -> Response {
    (
        code,
        Json(StatusResponse {
            status: status.into(),
        }),
    )
        .into_response()
}
