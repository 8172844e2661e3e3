// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::AppState;

/// Health check endpoint response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub routers: usize,
    pub connected: usize,
}

/// GET /health
///
/// Returns "ok", the application version and how many routers are connected.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.monitor.snapshot();
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        routers: snapshot.routers.len(),
        connected: snapshot.routers.iter().filter(|r| r.is_connected()).count(),
    };

    (StatusCode::OK, Json(response))
}
