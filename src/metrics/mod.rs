// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Prometheus metrics for monitored routers
//!
//! The monitor pushes connection state and poll samples into the registry;
//! `/metrics` encodes it in the OpenMetrics text format.

mod labels;
mod registry;

/// Labels for interfaces, routers, and system info
pub use labels::{InterfaceLabels, RouterLabels, SystemInfoLabels};

/// Prometheus metrics registry
pub use registry::MetricsRegistry;
