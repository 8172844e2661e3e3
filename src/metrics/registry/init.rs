// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Registry initialization and metric registration

use crate::metrics::labels::{InterfaceLabels, RouterLabels, SystemInfoLabels};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{MetricsRegistry, RateGauge};

impl MetricsRegistry {
    #[allow(clippy::similar_names)] // rx/tx naming pattern is intentional
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let router_connected = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_router_connected",
            "Whether the router has a live session (1) or not (0)",
            router_connected.clone(),
        );
        let router_connection_attempts = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_router_connection_attempts",
            "Connection attempts made to the router since it was added",
            router_connection_attempts.clone(),
        );
        let poll_samples = Family::<RouterLabels, Counter>::default();
        registry.register(
            "mikrotik_poll_samples",
            "Poll samples applied for the router",
            poll_samples.clone(),
        );

        let connection_consecutive_errors = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_connection_consecutive_errors",
            "Failed connects and commands since the last success",
            connection_consecutive_errors.clone(),
        );
        let connection_last_success_timestamp_seconds = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_connection_last_success_timestamp_seconds",
            "Unix timestamp of the last successful connect or command",
            connection_last_success_timestamp_seconds.clone(),
        );

        let system_cpu_load = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_system_cpu_load",
            "CPU load percent",
            system_cpu_load.clone(),
        );
        let system_free_memory = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_system_free_memory_bytes",
            "Free memory in bytes",
            system_free_memory.clone(),
        );
        let system_total_memory = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_system_total_memory_bytes",
            "Total memory in bytes",
            system_total_memory.clone(),
        );
        let system_uptime_seconds = Family::<RouterLabels, Gauge>::default();
        registry.register(
            "mikrotik_system_uptime_seconds",
            "System uptime in seconds",
            system_uptime_seconds.clone(),
        );
        let system_info = Family::<SystemInfoLabels, Gauge>::default();
        registry.register(
            "mikrotik_system_info",
            "System information (version and board) as labels",
            system_info.clone(),
        );

        let interface_rx_bps = Family::<InterfaceLabels, RateGauge>::default();
        registry.register(
            "mikrotik_interface_rx_bits_per_second",
            "Receive rate of the interface in bits per second",
            interface_rx_bps.clone(),
        );
        let interface_tx_bps = Family::<InterfaceLabels, RateGauge>::default();
        registry.register(
            "mikrotik_interface_tx_bits_per_second",
            "Transmit rate of the interface in bits per second",
            interface_tx_bps.clone(),
        );
        let interface_running = Family::<InterfaceLabels, Gauge>::default();
        registry.register(
            "mikrotik_interface_running",
            "Whether the interface is running (1) or not (0)",
            interface_running.clone(),
        );

        Self {
            registry: Arc::new(Mutex::new(registry)),
            router_connected,
            router_connection_attempts,
            poll_samples,
            connection_consecutive_errors,
            connection_last_success_timestamp_seconds,
            system_cpu_load,
            system_free_memory,
            system_total_memory,
            system_uptime_seconds,
            system_info,
            interface_rx_bps,
            interface_tx_bps,
            interface_running,
            prev_interfaces: Arc::new(Mutex::new(HashMap::new())),
            prev_system_info: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}
