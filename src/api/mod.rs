// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! HTTP API module for RouterOS Monitor
//!
//! Provides REST API endpoints for health checks, Prometheus metrics and
//! control of the monitored routers.
//!
//! # Endpoints
//! - `GET /health` — health check
//! - `GET /metrics` — Prometheus metrics
//! - `GET /routers` — monitor snapshot
//! - `POST /routers` — add a router
//! - `DELETE /routers/{id}` — remove a router
//! - `POST /routers/{id}/select` — select a router
//! - `POST /routers/connect`, `POST /routers/disconnect` — selected router session
//! - `POST /routers/refresh` — reload details of the selected router
//! - `POST /routers/logs/refresh`, `POST /routers/logs/clear`
//! - `POST /routers/interfaces/{name}/enable`, `.../disable`
//! - `GET /charts` — chart series of the selected router

pub mod handlers;
mod state;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

pub use state::AppState;

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route(
            "/routers",
            get(handlers::list_routers).post(handlers::add_router),
        )
        .route("/routers/{id}", delete(handlers::remove_router))
        .route("/routers/{id}/select", post(handlers::select_router))
        .route("/routers/connect", post(handlers::connect))
        .route("/routers/disconnect", post(handlers::disconnect))
        .route("/routers/refresh", post(handlers::refresh_details))
        .route("/routers/logs/refresh", post(handlers::refresh_logs))
        .route("/routers/logs/clear", post(handlers::clear_logs))
        .route(
            "/routers/interfaces/{name}/enable",
            post(handlers::enable_interface),
        )
        .route(
            "/routers/interfaces/{name}/disable",
            post(handlers::disable_interface),
        )
        .route("/charts", get(handlers::charts))
        .with_state(state)
}
