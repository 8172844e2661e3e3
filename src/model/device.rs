// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Router device record and connection status

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Instant, SystemTime};

use super::interface::{InterfaceStats, NetworkInterface};
use super::records::{
    DhcpLease, FirewallRule, LogEntry, QosRule, SystemInfo, SystemResources, TrafficFlow,
    VpnTunnel,
};
use crate::config::RouterConfig;

/// Identifier assigned by the monitor when a router is added
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouterId(pub u32);

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session state of a router
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Error => "Error",
        };
        f.write_str(s)
    }
}

/// A monitored router: connection parameters plus last-known state
///
/// `is_connected` is derived from `status`, so the pair can never disagree.
#[derive(Debug, Clone, Serialize)]
pub struct RouterDevice {
    pub id: RouterId,
    pub name: String,
    pub hostname: String,
    /// SNMP agent port
    pub port: u16,
    pub api_port: u16,
    pub api_ssl_port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub use_api: bool,
    pub use_ssh: bool,
    pub use_snmp: bool,
    pub use_ssl: bool,
    status: ConnectionStatus,
    pub last_connected: Option<SystemTime>,
    pub connection_attempts: u32,
    pub resources: Option<SystemResources>,
    pub system_info: Option<SystemInfo>,
    pub interfaces: Vec<NetworkInterface>,
    pub logs: Vec<LogEntry>,
    pub firewall_rules: Vec<FirewallRule>,
    pub dhcp_leases: Vec<DhcpLease>,
    pub vpn_tunnels: Vec<VpnTunnel>,
    pub qos_rules: Vec<QosRule>,
    pub traffic_flows: Vec<TrafficFlow>,
}

impl RouterDevice {
    /// Creates a disconnected device from its configuration
    ///
    /// The id stays unassigned until the monitor adds the device.
    #[must_use]
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            id: RouterId::default(),
            name: config.name.clone(),
            hostname: config.hostname.clone(),
            port: config.port,
            api_port: config.api_port,
            api_ssl_port: config.api_ssl_port,
            username: config.username.clone(),
            password: config.password.clone(),
            use_api: config.use_api,
            use_ssh: config.use_ssh,
            use_snmp: config.use_snmp,
            use_ssl: config.use_ssl,
            status: ConnectionStatus::Disconnected,
            last_connected: None,
            connection_attempts: 0,
            resources: None,
            system_info: None,
            interfaces: Vec::new(),
            logs: Vec::new(),
            firewall_rules: Vec::new(),
            dhcp_leases: Vec::new(),
            vpn_tunnels: Vec::new(),
            qos_rules: Vec::new(),
            traffic_flows: Vec::new(),
        }
    }

    /// Connection parameters of this device
    #[must_use]
    pub fn to_config(&self) -> RouterConfig {
        RouterConfig {
            name: self.name.clone(),
            hostname: self.hostname.clone(),
            api_port: self.api_port,
            api_ssl_port: self.api_ssl_port,
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            use_api: self.use_api,
            use_ssh: self.use_ssh,
            use_snmp: self.use_snmp,
            use_ssl: self.use_ssl,
            auto_connect: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    /// `host:port` of the RouterOS API service
    #[must_use]
    pub fn api_address(&self) -> String {
        let port = if self.use_ssl {
            self.api_ssl_port
        } else {
            self.api_port
        };
        if self.hostname.parse::<std::net::Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.hostname, port)
        } else {
            format!("{}:{}", self.hostname, port)
        }
    }

    pub fn begin_connect(&mut self) {
        self.status = ConnectionStatus::Connecting;
        self.connection_attempts = self.connection_attempts.saturating_add(1);
    }

    pub fn mark_connected(&mut self, at: SystemTime) {
        self.status = ConnectionStatus::Connected;
        self.last_connected = Some(at);
    }

    pub fn mark_failed(&mut self) {
        self.status = ConnectionStatus::Error;
    }

    /// Drops live session data; counters restart from a fresh baseline on reconnect
    pub fn mark_disconnected(&mut self) {
        self.status = ConnectionStatus::Disconnected;
        for iface in &mut self.interfaces {
            iface.reset_rates();
        }
    }

    /// Merges a statistics poll into the interface list, deriving rates
    ///
    /// Interfaces missing from the poll are dropped.
    pub fn apply_interface_statistics(&mut self, stats: &[InterfaceStats], now: Instant) {
        self.interfaces
            .retain(|iface| stats.iter().any(|s| s.name == iface.name));
        for sample in stats {
            match self.interfaces.iter_mut().find(|i| i.name == sample.name) {
                Some(iface) => iface.record_sample(sample, now),
                None => {
                    let mut iface = NetworkInterface::from(sample);
                    iface.record_sample(sample, now);
                    self.interfaces.push(iface);
                }
            }
        }
    }

    /// Replaces interface metadata (type, MAC, MTU...) keeping rate bookkeeping
    pub fn replace_interfaces(&mut self, fresh: Vec<NetworkInterface>) {
        let mut merged = Vec::with_capacity(fresh.len());
        for mut iface in fresh {
            if let Some(old) = self.interfaces.iter().find(|i| i.name == iface.name) {
                iface.carry_rates_from(old);
            }
            merged.push(iface);
        }
        self.interfaces = merged;
    }

    /// Sum of receive rates across interfaces, bits per second
    #[must_use]
    pub fn total_rx_bps(&self) -> f64 {
        self.interfaces.iter().map(|i| i.rx_bps).sum()
    }

    /// Sum of transmit rates across interfaces, bits per second
    #[must_use]
    pub fn total_tx_bps(&self) -> f64 {
        self.interfaces.iter().map(|i| i.tx_bps).sum()
    }
}
