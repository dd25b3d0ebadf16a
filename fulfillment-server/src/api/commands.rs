//! Command API
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/commands | POST | 执行 FulfillmentCommand |
//!
//! The body is always a `CommandResponse`; a refused command carries the
//! HTTP status of its error code.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};

use crate::core::ServerState;
use crate::utils::ErrorCode;
use shared::order::{CommandResponse, FulfillmentCommand};

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/commands", post(execute))
}

pub async fn execute(
    State(state): State<ServerState>,
    Json(cmd): Json<FulfillmentCommand>,
) -> Response {
    let response = state.manager.execute_command(cmd);
    (status_of(&response), Json(response)).into_response()
}

fn status_of(response: &CommandResponse) -> StatusCode {
    match &response.error {
        Some(error) => ErrorCode::from(error.code).http_status(),
        None => StatusCode::OK,
    }
}
