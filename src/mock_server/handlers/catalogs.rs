//! Catalog endpoint handler.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tokio::sync::RwLock;

use super::auth::require_token;
use crate::mock_server::state::MockState;

/// GET /catalogs/{name}
pub async fn get_catalog(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = state.read().await;
    if let Err(rejection) = require_token(&state, &headers) {
        return rejection;
    }

    if state.forbidden_catalogs.contains(&name) {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "message": format!("Your subscription does not include the {name} catalog")
            })),
        )
            .into_response();
    }

    match state.catalogs.get(&name) {
        Some(entries) => (StatusCode::OK, Json(entries.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("Unknown catalog: {name}") })),
        )
            .into_response(),
    }
}
