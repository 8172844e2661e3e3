// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Application state shared across HTTP handlers

use crate::config::Config;
use crate::metrics::MetricsRegistry;
use crate::monitor::MonitorHandle;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub metrics: MetricsRegistry,
    pub monitor: MonitorHandle,
}
