// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use routeros_monitor::model::RouterDevice;
use routeros_monitor::{
    AppState, Command, Config, LAST_SELECTED_ROUTER, MetricsRegistry, Monitor, MonitorHandle,
    MonitorSettings, Result, RouterOsApi, Services, SettingsStore, create_router,
};

#[tokio::main]
async fn main() -> Result<()> {
    let mut config = Config::load()?;

    setup_tracing(config.log_filter.as_deref());
    config.retain_valid_routers();

    tracing::info!(
        "Loaded configuration for {} router(s)",
        config.routers.len()
    );
    for router in &config.routers {
        tracing::info!(
            "  - Router '{}' at {}:{}",
            router.name,
            router.hostname,
            router.api_port
        );
    }

    // Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let metrics = MetricsRegistry::new();
    let services = Services {
        api: Arc::new(RouterOsApi::new(config.retry)),
        snmp: None,
    };
    let (monitor, monitor_task) = Monitor::spawn(
        MonitorSettings::from_config(&config),
        services,
        metrics.clone(),
        shutdown_rx.clone(),
    );

    let mut settings = SettingsStore::open(&config.settings_path);
    add_configured_routers(&config, &settings, &monitor).await?;

    let state = Arc::new(AppState {
        config: config.clone(),
        metrics,
        monitor: monitor.clone(),
    });
    let app = create_router(state);

    let addr: SocketAddr = config.server_addr.parse().map_err(|e| {
        tracing::error!("Invalid server address: {}", e);
        e
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind address: {}", e);
        e
    })?;

    tracing::info!("RouterOS Monitor starting on {}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  - GET  /health            - Health check");
    tracing::info!("  - GET  /metrics           - Prometheus metrics");
    tracing::info!("  - GET  /routers           - Monitor snapshot");
    tracing::info!("  - POST /routers/connect   - Connect the selected router");
    tracing::info!("  - GET  /charts            - Chart series");

    let mut server_shutdown = shutdown_rx.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
            tracing::info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    // the server may also stop on its own; make sure the monitor follows
    let _ = shutdown_tx.send(true);
    let last_selected = monitor.snapshot().selected().map(|r| r.name.clone());
    if monitor_task.await.is_err() {
        tracing::error!("Monitor task panicked");
    }

    if let Some(name) = last_selected {
        settings.set_setting(LAST_SELECTED_ROUTER, name)?;
        if let Err(e) = settings.save_settings().await {
            tracing::warn!(
                "Failed to save settings to '{}': {}",
                settings.path().display(),
                e
            );
        }
    }

    Ok(())
}

/// Adds the configured routers, restores the last selection and connects
/// the first `auto_connect` router
async fn add_configured_routers(
    config: &Config,
    settings: &SettingsStore,
    monitor: &MonitorHandle,
) -> Result<()> {
    let remembered: String = settings.get_setting(LAST_SELECTED_ROUTER, String::new());
    let mut selected = None;
    let mut auto_connect = None;

    for router in &config.routers {
        let id = monitor.add_router(RouterDevice::new(router)).await?;
        if router.name == remembered {
            selected = Some(id);
        }
        if router.auto_connect && auto_connect.is_none() {
            auto_connect = Some(id);
        }
    }

    if let Some(id) = auto_connect {
        monitor.send(Command::SelectRouter(Some(id)))?;
        monitor.send(Command::Connect)?;
    } else if let Some(id) = selected {
        tracing::info!("Restoring last selected router {}", id);
        monitor.send(Command::SelectRouter(Some(id)))?;
    }
    Ok(())
}

fn setup_tracing(config_filter: Option<&str>) {
    // RUST_LOG wins, then the config's log_filter, then "info"
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| {
            config_filter
                .map(tracing_subscriber::EnvFilter::try_new)
                .unwrap_or_else(|| Ok(tracing_subscriber::EnvFilter::new("info")))
        })
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
