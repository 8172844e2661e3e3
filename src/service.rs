// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Service contracts consumed by the monitor
//!
//! The monitor only talks to routers and the cloud registry through these
//! traits. `RouterOsApi` implements [`RouterApi`]; SNMP and cloud backends are
//! plugged in by whoever composes the application.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::error::Result;
use crate::model::{
    CloudDevice, CloudSite, ConnectionHealth, DhcpLease, FirewallRule, InterfaceStats, LogEntry,
    NetworkInterface, QosRule, RouterDevice, RouterId, SystemInfo, SystemResources, TrafficFlow,
    VpnTunnel, create_router_device_from_cloud_device,
};

/// Session-oriented management API of a router
pub trait RouterApi: Send + Sync {
    /// Opens (or replaces) the session for `device`
    fn connect<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<()>>;

    /// Closes the session if there is one
    fn disconnect<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, ()>;

    fn get_system_info<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<SystemInfo>>;

    fn get_system_resources<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<SystemResources>>;

    /// Interfaces with metadata (type, MAC, MTU, flags)
    fn get_network_interfaces<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<NetworkInterface>>>;

    /// Counter-only view of the interfaces, used by the poller
    fn get_interface_statistics<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<InterfaceStats>>>;

    fn get_dhcp_leases<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<Vec<DhcpLease>>>;

    /// The newest `max_count` log entries, oldest first
    fn get_log_entries<'a>(
        &'a self,
        device: &'a RouterDevice,
        max_count: usize,
    ) -> BoxFuture<'a, Result<Vec<LogEntry>>>;

    fn clear_log_entries<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<()>>;

    fn enable_network_interface<'a>(
        &'a self,
        device: &'a RouterDevice,
        interface: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    fn disable_network_interface<'a>(
        &'a self,
        device: &'a RouterDevice,
        interface: &'a str,
    ) -> BoxFuture<'a, Result<()>>;

    fn get_firewall_rules<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<FirewallRule>>>;

    fn get_vpn_tunnels<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<Vec<VpnTunnel>>>;

    fn get_qos_rules<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<Vec<QosRule>>>;

    fn get_traffic_flows<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<TrafficFlow>>>;

    /// Session health of a router; `None` when the client keeps no record
    fn connection_health(&self, _router: RouterId) -> BoxFuture<'_, Option<ConnectionHealth>> {
        async { None }.boxed()
    }
}

/// SNMP data path for devices monitored without the RouterOS API
pub trait SnmpService: Send + Sync {
    fn get_system_info<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<SystemInfo>>;

    fn get_interface_statistics<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<InterfaceStats>>>;
}

/// MikroTik Cloud device registry
pub trait CloudService: Send + Sync {
    /// Returns `Ok(false)` when the credentials are rejected
    fn authenticate<'a>(&'a self, username: &'a str, password: &'a str) -> BoxFuture<'a, Result<bool>>;

    fn get_devices(&self) -> BoxFuture<'_, Result<Vec<CloudDevice>>>;

    fn get_sites(&self) -> BoxFuture<'_, Result<Vec<CloudSite>>>;

    fn get_devices_by_site<'a>(&'a self, site_id: &'a str) -> BoxFuture<'a, Result<Vec<CloudDevice>>>;

    fn create_router_device_from_cloud_device(
        &self,
        device: &CloudDevice,
        username: &str,
        password: &str,
    ) -> RouterDevice {
        create_router_device_from_cloud_device(device, username, password)
    }
}
