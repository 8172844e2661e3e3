// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # RouterOS Monitor
//!
//! Live monitor for MikroTik RouterOS devices.
//!
//! This library connects to routers over the RouterOS API, polls the selected
//! router for resources and interface counters, derives traffic rates and
//! exposes the state over HTTP and in Prometheus format.
//!
//! ## Main modules
//! - `api`: HTTP API handlers
//! - `cloud`: MikroTik Cloud browsing and device import
//! - `config`: configuration management
//! - `error`: error types
//! - `format`: human-readable speeds, sizes and uptimes
//! - `metrics`: Prometheus registry
//! - `mikrotik`: RouterOS API client
//! - `model`: router and record types
//! - `monitor`: the state-owning monitor task
//! - `observable`: change-notifying value cells
//! - `service`: router, SNMP and cloud service traits
//! - `settings`: persistent user settings
//! - `prelude`: commonly used types and traits

mod api;
mod cloud;
mod config;
mod error;
mod format;
mod metrics;
mod mikrotik;
pub mod model;
mod monitor;
mod observable;
mod service;
mod settings;
pub mod prelude;

// Re-export commonly used types
/// Application configuration
pub use config::{Config, RetryPolicy, RetrySettings, RouterConfig};

/// Application error and result type
pub use error::{AppError, Result};

/// HTTP API router and state
pub use api::{AppState, create_router};

/// Cloud registry browsing
pub use cloud::CloudBrowser;

/// Display formatting helpers
pub use format::{format_bytes, format_speed, format_uptime, parse_uptime_to_seconds};

/// Metrics registry and labels
pub use metrics::{InterfaceLabels, MetricsRegistry, RouterLabels};

/// RouterOS API client and session bookkeeping
pub use mikrotik::{RouterOsApi, SessionManager};

/// RouterOS wire protocol encoding (public for tests)
pub use mikrotik::{encode_length, encode_sentence};

/// Monitor task, its handle and published state
pub use monitor::{
    ChartPoint, ChartSeries, Charts, Command, DataSource, Monitor, MonitorHandle, MonitorSettings,
    MonitorSnapshot, Sample, Services,
};

/// Change notifications
pub use observable::{Observable, PropertyChanged};

/// Service traits
pub use service::{CloudService, RouterApi, SnmpService};

/// Settings persistence
pub use settings::{LAST_SELECTED_ROUTER, SettingsStore};
