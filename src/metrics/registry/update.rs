// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metric updates from router state

use crate::format::parse_uptime_to_seconds;
use crate::metrics::labels::{InterfaceLabels, RouterLabels, SystemInfoLabels};
use crate::model::{ConnectionHealth, RouterDevice};
use std::collections::HashSet;

use super::MetricsRegistry;

fn to_gauge(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl MetricsRegistry {
    /// Connection status and attempt count of a router
    pub fn update_router_status(&self, device: &RouterDevice) {
        let labels = RouterLabels::new(&device.name);
        self.router_connected
            .get_or_create(&labels)
            .set(i64::from(device.is_connected()));
        self.router_connection_attempts
            .get_or_create(&labels)
            .set(i64::from(device.connection_attempts));
    }

    /// Session health reported by the API client
    pub fn update_connection_health(&self, router_name: &str, health: &ConnectionHealth) {
        let labels = RouterLabels::new(router_name);
        self.connection_consecutive_errors
            .get_or_create(&labels)
            .set(i64::from(health.consecutive_errors));
        if let Some(secs) = health.last_success {
            self.connection_last_success_timestamp_seconds
                .get_or_create(&labels)
                .set(to_gauge(secs));
        }
    }

    /// Publishes version and board labels, replacing the previous set
    pub async fn update_system_info(&self, device: &RouterDevice) {
        let Some(info) = &device.system_info else {
            return;
        };
        let labels = SystemInfoLabels {
            router: device.name.clone(),
            version: info.version.clone(),
            board: info.board_name.clone(),
        };

        let mut prev = self.prev_system_info.lock().await;
        if let Some(old) = prev.get(&device.name).filter(|old| **old != labels) {
            self.system_info.remove(old);
        }
        self.system_info.get_or_create(&labels).set(1);
        prev.insert(device.name.clone(), labels);
    }

    /// Applies the router's latest poll: system gauges and per-interface rates
    ///
    /// Interfaces that disappeared since the previous sample lose their series.
    #[allow(clippy::similar_names)] // rx/tx naming pattern is intentional
    pub async fn update_sample(&self, device: &RouterDevice) {
        let router = RouterLabels::new(&device.name);
        self.poll_samples.get_or_create(&router).inc();

        if let Some(res) = &device.resources {
            self.system_cpu_load
                .get_or_create(&router)
                .set(to_gauge(res.cpu_load));
            self.system_free_memory
                .get_or_create(&router)
                .set(to_gauge(res.free_memory));
            self.system_total_memory
                .get_or_create(&router)
                .set(to_gauge(res.total_memory));
            self.system_uptime_seconds
                .get_or_create(&router)
                .set(to_gauge(parse_uptime_to_seconds(&res.uptime)));
        }

        let current: HashSet<InterfaceLabels> = device
            .interfaces
            .iter()
            .map(|iface| {
                let labels = InterfaceLabels {
                    router: device.name.clone(),
                    interface: iface.name.clone(),
                };
                self.interface_rx_bps.get_or_create(&labels).set(iface.rx_bps);
                self.interface_tx_bps.get_or_create(&labels).set(iface.tx_bps);
                self.interface_running
                    .get_or_create(&labels)
                    .set(i64::from(iface.running));
                labels
            })
            .collect();

        let mut prev = self.prev_interfaces.lock().await;
        if let Some(old) = prev.get(&device.name) {
            let stale: Vec<&InterfaceLabels> = old.difference(&current).collect();
            for labels in &stale {
                self.remove_interface(labels);
            }
            if !stale.is_empty() {
                tracing::debug!(
                    "Removed {} stale interface label sets for '{}'",
                    stale.len(),
                    device.name
                );
            }
        }
        prev.insert(device.name.clone(), current);
    }

    /// Drops every series of a router that is no longer monitored
    pub async fn remove_router(&self, router_name: &str) {
        let labels = RouterLabels::new(router_name);
        self.router_connected.remove(&labels);
        self.router_connection_attempts.remove(&labels);
        self.poll_samples.remove(&labels);
        self.connection_consecutive_errors.remove(&labels);
        self.connection_last_success_timestamp_seconds.remove(&labels);
        self.system_cpu_load.remove(&labels);
        self.system_free_memory.remove(&labels);
        self.system_total_memory.remove(&labels);
        self.system_uptime_seconds.remove(&labels);

        if let Some(info) = self.prev_system_info.lock().await.remove(router_name) {
            self.system_info.remove(&info);
        }
        if let Some(interfaces) = self.prev_interfaces.lock().await.remove(router_name) {
            for labels in &interfaces {
                self.remove_interface(labels);
            }
        }
        tracing::debug!("Removed metrics for router '{}'", router_name);
    }

    fn remove_interface(&self, labels: &InterfaceLabels) {
        self.interface_rx_bps.remove(labels);
        self.interface_tx_bps.remove(labels);
        self.interface_running.remove(labels);
    }
}
