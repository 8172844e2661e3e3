// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod health;
mod metrics;
mod routers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AppError;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use routers::{
    add_router, charts, clear_logs, connect, disable_interface, disconnect, enable_interface,
    list_routers, refresh_details, refresh_logs, remove_router, select_router,
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Config(_) | Self::Json(_) | Self::AddrParse(_) => StatusCode::BAD_REQUEST,
            Self::NotConnected(_) => StatusCode::CONFLICT,
            Self::Unsupported(_) => StatusCode::NOT_IMPLEMENTED,
            Self::MonitorStopped => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Auth(_) | Self::RouterOs(_) => StatusCode::BAD_GATEWAY,
            Self::Io(_) | Self::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
