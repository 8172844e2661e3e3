// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Router list and monitor command endpoints
//!
//! Commands are queued to the monitor and answered with `202 Accepted`; the
//! outcome shows up in the snapshot's status message. Commands that are not
//! available in the current state are refused with `409 Conflict`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::api::AppState;
use crate::config::RouterConfig;
use crate::error::AppError;
use crate::model::{RouterDevice, RouterId};
use crate::monitor::{Charts, Command, MonitorSnapshot};

type HandlerResult = Result<Response, AppError>;

fn refused(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn submit(state: &AppState, command: Command) -> HandlerResult {
    state.monitor.send(command)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "accepted" }))).into_response())
}

fn submit_if_connected(state: &AppState, command: Command) -> HandlerResult {
    let snapshot = state.monitor.snapshot();
    if !snapshot.selected().is_some_and(RouterDevice::is_connected) {
        return Ok(refused(StatusCode::CONFLICT, "No connected router selected"));
    }
    submit(state, command)
}

fn submit_for_known(state: &AppState, id: RouterId, command: Command) -> HandlerResult {
    if state.monitor.snapshot().router(id).is_none() {
        return Ok(refused(StatusCode::NOT_FOUND, format!("Unknown router {id}")));
    }
    submit(state, command)
}

/// GET /routers
pub async fn list_routers(State(state): State<Arc<AppState>>) -> Json<MonitorSnapshot> {
    Json(state.monitor.snapshot())
}

/// POST /routers
pub async fn add_router(
    State(state): State<Arc<AppState>>,
    Json(config): Json<RouterConfig>,
) -> HandlerResult {
    let id = state.monitor.add_router(RouterDevice::new(&config)).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// DELETE /routers/{id}
pub async fn remove_router(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> HandlerResult {
    let id = RouterId(id);
    submit_for_known(&state, id, Command::RemoveRouter(id))
}

/// POST /routers/{id}/select
pub async fn select_router(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> HandlerResult {
    let id = RouterId(id);
    submit_for_known(&state, id, Command::SelectRouter(Some(id)))
}

/// POST /routers/connect
pub async fn connect(State(state): State<Arc<AppState>>) -> HandlerResult {
    if !state.monitor.snapshot().can_connect {
        return Ok(refused(
            StatusCode::CONFLICT,
            "Connect is not available: no router selected, already connected or connecting",
        ));
    }
    submit(&state, Command::Connect)
}

/// POST /routers/disconnect
pub async fn disconnect(State(state): State<Arc<AppState>>) -> HandlerResult {
    if !state.monitor.snapshot().can_disconnect {
        return Ok(refused(StatusCode::CONFLICT, "No connected router selected"));
    }
    submit(&state, Command::Disconnect)
}

/// POST /routers/refresh
pub async fn refresh_details(State(state): State<Arc<AppState>>) -> HandlerResult {
    submit_if_connected(&state, Command::RefreshDetails)
}

/// POST /routers/logs/refresh
pub async fn refresh_logs(State(state): State<Arc<AppState>>) -> HandlerResult {
    submit_if_connected(&state, Command::RefreshLogs)
}

/// POST /routers/logs/clear
pub async fn clear_logs(State(state): State<Arc<AppState>>) -> HandlerResult {
    submit_if_connected(&state, Command::ClearLogs)
}

/// POST /routers/interfaces/{name}/enable
pub async fn enable_interface(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> HandlerResult {
    submit_if_connected(
        &state,
        Command::SetInterfaceEnabled {
            interface: name,
            enabled: true,
        },
    )
}

/// POST /routers/interfaces/{name}/disable
pub async fn disable_interface(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> HandlerResult {
    submit_if_connected(
        &state,
        Command::SetInterfaceEnabled {
            interface: name,
            enabled: false,
        },
    )
}

/// GET /charts
pub async fn charts(State(state): State<Arc<AppState>>) -> Json<Charts> {
    Json(state.monitor.snapshot().charts)
}
