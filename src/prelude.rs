// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for convenient use.
//! Users of the library can import everything they need with:
//!
//! ```rust
//! use routeros_monitor::prelude::*;
//! ```

// Core types
pub use crate::config::{Config, RetryPolicy, RetrySettings, RouterConfig};
pub use crate::error::{AppError, Result};

// Domain model
pub use crate::model::{
    ConnectionHealth, ConnectionStatus, InterfaceStats, NetworkInterface, RouterDevice, RouterId,
    SystemInfo, SystemResources,
};

// Monitor
pub use crate::monitor::{Command, Monitor, MonitorHandle, MonitorSettings, MonitorSnapshot, Services};

// Services
pub use crate::mikrotik::RouterOsApi;
pub use crate::service::{CloudService, RouterApi, SnmpService};

// Metrics types
pub use crate::metrics::{InterfaceLabels, MetricsRegistry, RouterLabels, SystemInfoLabels};
