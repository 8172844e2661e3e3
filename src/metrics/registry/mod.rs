// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Metrics registry and update logic

mod init;
mod scrape;
mod update;

use crate::metrics::labels::{InterfaceLabels, RouterLabels, SystemInfoLabels};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::sync::Mutex;

type RateGauge = Gauge<f64, AtomicU64>;

#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Arc<Mutex<Registry>>,
    // connection state
    router_connected: Family<RouterLabels, Gauge>,
    router_connection_attempts: Family<RouterLabels, Gauge>,
    poll_samples: Family<RouterLabels, Counter>,
    connection_consecutive_errors: Family<RouterLabels, Gauge>,
    connection_last_success_timestamp_seconds: Family<RouterLabels, Gauge>,
    // system gauges
    system_cpu_load: Family<RouterLabels, Gauge>,
    system_free_memory: Family<RouterLabels, Gauge>,
    system_total_memory: Family<RouterLabels, Gauge>,
    system_uptime_seconds: Family<RouterLabels, Gauge>,
    system_info: Family<SystemInfoLabels, Gauge>,
    // interface gauges
    interface_rx_bps: Family<InterfaceLabels, RateGauge>,
    interface_tx_bps: Family<InterfaceLabels, RateGauge>,
    interface_running: Family<InterfaceLabels, Gauge>,
    prev_interfaces: Arc<Mutex<HashMap<String, HashSet<InterfaceLabels>>>>,
    prev_system_info: Arc<Mutex<HashMap<String, SystemInfoLabels>>>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;
    use crate::model::{
        ConnectionHealth, InterfaceStats, RouterDevice, SystemInfo, SystemResources,
    };
    use std::time::{Duration, Instant, SystemTime};

    fn device(name: &str) -> RouterDevice {
        RouterDevice::new(&RouterConfig::new(name, "10.0.0.1", "admin", ""))
    }

    fn stats(name: &str, rx: u64, tx: u64) -> InterfaceStats {
        InterfaceStats {
            name: name.to_string(),
            rx_bytes: rx,
            tx_bytes: tx,
            rx_packets: 0,
            tx_packets: 0,
            rx_errors: 0,
            tx_errors: 0,
            running: true,
        }
    }

    fn resources() -> SystemResources {
        SystemResources {
            uptime: "1d2h".to_string(),
            cpu_load: 12,
            free_memory: 256,
            total_memory: 1024,
            ..SystemResources::default()
        }
    }

    #[tokio::test]
    async fn test_router_status_gauges() {
        let metrics = MetricsRegistry::new();
        let mut d = device("core");
        d.begin_connect();
        d.mark_connected(SystemTime::now());

        metrics.update_router_status(&d);

        let labels = RouterLabels::new("core");
        assert_eq!(metrics.router_connected.get_or_create(&labels).get(), 1);
        assert_eq!(metrics.router_connection_attempts.get_or_create(&labels).get(), 1);

        d.mark_disconnected();
        metrics.update_router_status(&d);
        assert_eq!(metrics.router_connected.get_or_create(&labels).get(), 0);
    }

    #[tokio::test]
    async fn test_connection_health_gauges() {
        let metrics = MetricsRegistry::new();
        metrics.update_connection_health(
            "core",
            &ConnectionHealth {
                consecutive_errors: 3,
                last_success: Some(1_700_000_000),
            },
        );

        let output = metrics.encode_metrics().await.unwrap();
        assert!(output.contains("mikrotik_connection_consecutive_errors{router=\"core\"} 3"));
        assert!(output.contains(
            "mikrotik_connection_last_success_timestamp_seconds{router=\"core\"} 1700000000"
        ));

        // a router that never answered gets no timestamp series
        metrics.update_connection_health("edge", &ConnectionHealth::default());
        let output = metrics.encode_metrics().await.unwrap();
        assert!(output.contains("mikrotik_connection_consecutive_errors{router=\"edge\"} 0"));
        assert!(
            !output.contains("mikrotik_connection_last_success_timestamp_seconds{router=\"edge\"}")
        );

        metrics.remove_router("core").await;
        let output = metrics.encode_metrics().await.unwrap();
        assert!(!output.contains("router=\"core\""));
    }

    #[tokio::test]
    async fn test_update_sample_sets_system_and_interface_gauges() {
        let metrics = MetricsRegistry::new();
        let mut d = device("core");
        d.resources = Some(resources());
        let t0 = Instant::now();
        d.apply_interface_statistics(&[stats("ether1", 0, 0)], t0);
        d.apply_interface_statistics(&[stats("ether1", 1_000, 500)], t0 + Duration::from_secs(1));

        metrics.update_sample(&d).await;

        let router = RouterLabels::new("core");
        assert_eq!(metrics.system_cpu_load.get_or_create(&router).get(), 12);
        assert_eq!(metrics.system_total_memory.get_or_create(&router).get(), 1024);
        assert_eq!(
            metrics.system_uptime_seconds.get_or_create(&router).get(),
            93_600
        );
        assert_eq!(metrics.poll_samples.get_or_create(&router).get(), 1);

        let iface = InterfaceLabels {
            router: "core".to_string(),
            interface: "ether1".to_string(),
        };
        assert_eq!(metrics.interface_rx_bps.get_or_create(&iface).get(), 8_000.0);
        assert_eq!(metrics.interface_tx_bps.get_or_create(&iface).get(), 4_000.0);
        assert_eq!(metrics.interface_running.get_or_create(&iface).get(), 1);
    }

    #[tokio::test]
    async fn test_vanished_interfaces_are_removed() {
        let metrics = MetricsRegistry::new();
        let mut d = device("core");
        let now = Instant::now();
        d.apply_interface_statistics(&[stats("ether1", 0, 0), stats("ether2", 0, 0)], now);
        metrics.update_sample(&d).await;

        d.apply_interface_statistics(&[stats("ether1", 0, 0)], now);
        metrics.update_sample(&d).await;

        let output = metrics.encode_metrics().await.unwrap();
        assert!(output.contains("interface=\"ether1\""));
        assert!(!output.contains("interface=\"ether2\""));
    }

    #[tokio::test]
    async fn test_system_info_replaces_previous_labels() {
        let metrics = MetricsRegistry::new();
        let mut d = device("core");
        d.system_info = Some(SystemInfo {
            version: "7.14".to_string(),
            board_name: "RB5009".to_string(),
            ..SystemInfo::default()
        });
        metrics.update_system_info(&d).await;

        d.system_info = Some(SystemInfo {
            version: "7.15".to_string(),
            board_name: "RB5009".to_string(),
            ..SystemInfo::default()
        });
        metrics.update_system_info(&d).await;

        let output = metrics.encode_metrics().await.unwrap();
        assert!(output.contains("version=\"7.15\""));
        assert!(!output.contains("version=\"7.14\""));
    }

    #[tokio::test]
    async fn test_remove_router_drops_all_series() {
        let metrics = MetricsRegistry::new();
        let mut d = device("edge");
        d.resources = Some(resources());
        d.system_info = Some(SystemInfo::default());
        d.apply_interface_statistics(&[stats("ether1", 0, 0)], Instant::now());
        metrics.update_router_status(&d);
        metrics.update_system_info(&d).await;
        metrics.update_sample(&d).await;

        metrics.remove_router("edge").await;

        let output = metrics.encode_metrics().await.unwrap();
        assert!(!output.contains("router=\"edge\""));
    }

    #[tokio::test]
    async fn test_encode_contains_registered_names() {
        let metrics = MetricsRegistry::new();
        let d = device("core");
        metrics.update_router_status(&d);

        let output = metrics.encode_metrics().await.unwrap();
        assert!(output.contains("mikrotik_router_connected"));
        assert!(output.contains("mikrotik_router_connection_attempts"));
        assert!(output.ends_with("# EOF\n"));
    }
}
