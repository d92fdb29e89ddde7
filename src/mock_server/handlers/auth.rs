//! Login endpoint handler and bearer token checks.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// POST /login
pub async fn login(
    State(state): State<Arc<RwLock<MockState>>>,
    Json(body): Json<LoginBody>,
) -> impl IntoResponse {
    let mut state = state.write().await;

    match state.login(&body.email, &body.password) {
        Some(token) => (
            StatusCode::OK,
            Json(serde_json::json!({ "access_token": token })),
        )
            .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Invalid email or password" })),
        )
            .into_response(),
    }
}

/// Reject requests that don't carry a token issued by this server.
pub fn require_token(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) if state.is_authorized(token) => Ok(()),
        _ => Err((
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": "Missing or invalid access token" })),
        )
            .into_response()),
    }
}
