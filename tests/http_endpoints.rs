// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use axum::Router;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use routeros_monitor::model::{ConnectionStatus, RouterDevice};
use routeros_monitor::{
    AppState, Config, MetricsRegistry, Monitor, MonitorHandle, MonitorSettings, RetrySettings,
    RouterConfig, RouterOsApi, Services, create_router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    monitor: MonitorHandle,
    _shutdown: watch::Sender<bool>,
}

fn make_app() -> TestApp {
    let config = Config::default();
    let metrics = MetricsRegistry::new();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let services = Services {
        api: Arc::new(RouterOsApi::new(RetrySettings::default())),
        snmp: None,
    };
    let (monitor, _task) = Monitor::spawn(
        MonitorSettings::from_config(&config),
        services,
        metrics.clone(),
        shutdown_rx,
    );
    let state = Arc::new(AppState {
        config,
        metrics,
        monitor: monitor.clone(),
    });
    TestApp {
        app: create_router(state),
        monitor,
        _shutdown: shutdown,
    }
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header(header::CONTENT_TYPE, "application/json");
    }
    let response = app
        .clone()
        .oneshot(request.body(body.unwrap_or_default().to_string()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

/// A local port with nothing listening on it
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

async fn add(monitor: &MonitorHandle, name: &str, port: u16) -> u32 {
    let mut config = RouterConfig::new(name, "127.0.0.1", "admin", "");
    config.api_port = port;
    monitor.add_router(RouterDevice::new(&config)).await.unwrap().0
}

// --- /health and /metrics ---

#[tokio::test]
async fn health_reports_router_counts() {
    let t = make_app();
    add(&t.monitor, "core", 8728).await;

    let (status, body) = send(&t.app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["routers"], 1);
    assert_eq!(body["connected"], 0);
}

#[tokio::test]
async fn metrics_returns_openmetrics_with_router_series() {
    let t = make_app();
    add(&t.monitor, "myrouter", 8728).await;

    let response = t
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("openmetrics-text"), "got {content_type}");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body = String::from_utf8(body.to_vec()).unwrap();
    assert!(body.contains("mikrotik_router_connected{router=\"myrouter\"} 0"));
    assert!(body.contains("mikrotik_interface_rx_bits_per_second"));
}

// --- /routers ---

#[tokio::test]
async fn list_routers_returns_snapshot_without_passwords() {
    let t = make_app();
    add(&t.monitor, "core", 8728).await;

    let (status, body) = send(&t.app, "GET", "/routers", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["routers"][0]["name"], "core");
    assert_eq!(body["routers"][0]["status"], "disconnected");
    assert!(body["routers"][0].get("password").is_none());
    assert_eq!(body["selected_router"], 1);
    assert_eq!(body["can_connect"], true);
    assert_eq!(body["can_disconnect"], false);
}

#[tokio::test]
async fn add_router_creates_and_rejects_duplicates() {
    let t = make_app();
    let payload = r#"{"name":"edge","hostname":"192.168.88.1","username":"monitor","password":"pw"}"#;

    let (status, body) = send(&t.app, "POST", "/routers", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["id"], 1);

    let snapshot = t.monitor.snapshot();
    let router = &snapshot.routers[0];
    assert_eq!(router.api_port, 8728);
    assert!(router.use_api);

    let (status, body) = send(&t.app, "POST", "/routers", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn add_router_rejects_invalid_payloads() {
    let t = make_app();

    let (status, _) = send(&t.app, "POST", "/routers", Some("{not json")).await;
    assert!(status.is_client_error());

    let empty_host = r#"{"name":"edge","hostname":""}"#;
    let (status, _) = send(&t.app, "POST", "/routers", Some(empty_host)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.monitor.snapshot().routers.is_empty());
}

#[tokio::test]
async fn remove_and_select_unknown_router_is_not_found() {
    let t = make_app();

    let (status, _) = send(&t.app, "DELETE", "/routers/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&t.app, "POST", "/routers/42/select", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn select_and_remove_router() {
    let t = make_app();
    add(&t.monitor, "core", 8728).await;
    let edge = add(&t.monitor, "edge", 8728).await;

    let (status, _) = send(&t.app, "POST", &format!("/routers/{edge}/select"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    t.monitor
        .wait_until(|s| s.selected_router.map(|id| id.0) == Some(edge))
        .await
        .unwrap();

    let (status, _) = send(&t.app, "DELETE", &format!("/routers/{edge}"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    let snapshot = t.monitor.wait_until(|s| s.routers.len() == 1).await.unwrap();
    assert_eq!(snapshot.selected_router, None);
}

// --- commands ---

#[tokio::test]
async fn commands_needing_a_session_are_refused() {
    let t = make_app();

    let (status, _) = send(&t.app, "POST", "/routers/connect", None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    add(&t.monitor, "core", 8728).await;
    for uri in [
        "/routers/disconnect",
        "/routers/refresh",
        "/routers/logs/refresh",
        "/routers/logs/clear",
        "/routers/interfaces/ether1/disable",
    ] {
        let (status, body) = send(&t.app, "POST", uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT, "{uri}");
        assert!(json(&body)["error"].is_string());
    }
}

#[tokio::test]
async fn connect_to_unreachable_router_ends_in_error() {
    let t = make_app();
    let port = closed_port().await;
    add(&t.monitor, "offline", port).await;

    let (status, _) = send(&t.app, "POST", "/routers/connect", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let snapshot = tokio::time::timeout(
        Duration::from_secs(10),
        t.monitor.wait_until(|s| {
            s.selected()
                .is_some_and(|r| r.status() == ConnectionStatus::Error)
        }),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(snapshot.can_connect);
    assert_eq!(snapshot.selected().unwrap().connection_attempts, 1);
    assert!(snapshot.status_message.starts_with("Failed to connect"));
}

#[tokio::test]
async fn charts_are_empty_before_polling() {
    let t = make_app();

    let (status, body) = send(&t.app, "GET", "/charts", None).await;
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["cpu"]["points"].as_array().unwrap().len(), 0);
    assert_eq!(body["rx_rate"]["points"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let t = make_app();
    let (status, _) = send(&t.app, "GET", "/nonexistent", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
