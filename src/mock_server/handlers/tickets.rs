//! Ticket collection and ticket detail handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use tokio::sync::RwLock;

use super::auth::require_token;
use crate::mock_server::state::MockState;
use crate::{Record, Resource, PAGE_START_PARAM};

/// GET /{resource}
pub async fn list_collection(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(resource): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Ok(resource) = resource.parse::<Resource>() else {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("Unknown resource: {resource}") })),
        )
            .into_response();
    };

    let page_start: u64 = match query.get(PAGE_START_PARAM).map(|v| v.parse()) {
        None => 0,
        Some(Ok(start)) => start,
        Some(Err(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "message": "page_start must be a number" })),
            )
                .into_response()
        }
    };

    let mut state = state.write().await;
    if let Err(rejection) = require_token(&state, &headers) {
        return rejection;
    }
    state.record_page_request(resource, page_start);

    let all = state.list(
        resource,
        query.get("since").map(String::as_str),
        query.get("until").map(String::as_str),
    );

    let start = usize::try_from(page_start).unwrap_or(usize::MAX);
    let page: Vec<Record> = all
        .into_iter()
        .skip(start)
        .take(state.page_size)
        .cloned()
        .collect();

    if page.is_empty() && state.end_with_no_content {
        return StatusCode::NO_CONTENT.into_response();
    }

    (StatusCode::OK, Json(page)).into_response()
}

/// GET /ticket/{id}
pub async fn get_ticket(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let state = state.read().await;
    if let Err(rejection) = require_token(&state, &headers) {
        return rejection;
    }

    // Parse the ID as u64
    let id: u64 = match id.parse() {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "message": "Ticket ID must be a number" })),
            )
                .into_response()
        }
    };

    match state.tickets.get(&id) {
        Some(ticket) => (StatusCode::OK, Json(ticket.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": format!("No ticket found with ID: {id}") })),
        )
            .into_response(),
    }
}
