// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! High-level RouterOS API client

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::Arc;

use super::connection::{
    Sentence, parse_dhcp_leases, parse_firewall_rules, parse_interface_stats, parse_interfaces,
    parse_log_entries, parse_qos_rules, parse_system_info, parse_system_resources,
    parse_traffic_flows, parse_vpn_tunnels,
};
use super::session::SessionManager;
use crate::config::RetrySettings;
use crate::error::{AppError, Result};
use crate::model::{
    ConnectionHealth, DhcpLease, FirewallRule, InterfaceStats, LogEntry, NetworkInterface, QosRule,
    RouterDevice, RouterId, SystemInfo, SystemResources, TrafficFlow, VpnTunnel,
};
use crate::service::RouterApi;

const INTERFACE_STATS_PROPLIST: &str =
    "=.proplist=name,rx-byte,tx-byte,rx-packet,tx-packet,rx-error,tx-error,running";

/// `RouterApi` over the native RouterOS API protocol
///
/// Provides methods to open sessions to `MikroTik` routers and query
/// system, interface, log and firewall state.
#[derive(Clone)]
pub struct RouterOsApi {
    sessions: Arc<SessionManager>,
}

impl RouterOsApi {
    #[must_use]
    pub fn new(retry: RetrySettings) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(retry)),
        }
    }

    /// Session bookkeeping, exposed for health reporting
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    async fn print(&self, device: &RouterDevice, path: &str) -> Result<Vec<Sentence>> {
        self.sessions.run(device, path, &[]).await
    }

    async fn set_interface_state(
        &self,
        device: &RouterDevice,
        interface: &str,
        enabled: bool,
    ) -> Result<()> {
        let path = if enabled {
            "/interface/enable"
        } else {
            "/interface/disable"
        };
        self.sessions
            .run(device, path, &[format!("=numbers={interface}")])
            .await?;
        tracing::info!(
            "Interface '{}' on '{}' {}",
            interface,
            device.name,
            if enabled { "enabled" } else { "disabled" }
        );
        Ok(())
    }
}

impl RouterApi for RouterOsApi {
    fn connect<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<()>> {
        async move { self.sessions.open(device).await }.boxed()
    }

    fn disconnect<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, ()> {
        async move {
            self.sessions.close(device.id).await;
            self.sessions.forget(device.id).await;
        }
        .boxed()
    }

    fn get_system_info<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<SystemInfo>> {
        async move {
            let resource = self.print(device, "/system/resource/print").await?;
            let identity = self.print(device, "/system/identity/print").await?;
            // CHR and x86 installs have no routerboard menu
            let routerboard = match self.print(device, "/system/routerboard/print").await {
                Ok(s) => s,
                Err(AppError::RouterOs(msg)) => {
                    tracing::debug!("No routerboard info for '{}': {}", device.name, msg);
                    Vec::new()
                }
                Err(e) => return Err(e),
            };
            Ok(parse_system_info(&resource, &identity, &routerboard))
        }
        .boxed()
    }

    fn get_system_resources<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<SystemResources>> {
        async move {
            let sentences = self.print(device, "/system/resource/print").await?;
            Ok(parse_system_resources(&sentences))
        }
        .boxed()
    }

    fn get_network_interfaces<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<NetworkInterface>>> {
        async move {
            let sentences = self.print(device, "/interface/print").await?;
            Ok(parse_interfaces(&sentences))
        }
        .boxed()
    }

    fn get_interface_statistics<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<InterfaceStats>>> {
        async move {
            let sentences = self
                .sessions
                .run(device, "/interface/print", &[INTERFACE_STATS_PROPLIST.to_string()])
                .await?;
            Ok(parse_interface_stats(&sentences))
        }
        .boxed()
    }

    fn get_dhcp_leases<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<Vec<DhcpLease>>> {
        async move {
            let sentences = self.print(device, "/ip/dhcp-server/lease/print").await?;
            Ok(parse_dhcp_leases(&sentences))
        }
        .boxed()
    }

    fn get_log_entries<'a>(
        &'a self,
        device: &'a RouterDevice,
        max_count: usize,
    ) -> BoxFuture<'a, Result<Vec<LogEntry>>> {
        async move {
            let sentences = self.print(device, "/log/print").await?;
            Ok(parse_log_entries(&sentences, max_count))
        }
        .boxed()
    }

    /// RouterOS has no command to clear the log; shrinking the memory buffer
    /// to one line and restoring it discards the stored entries.
    fn clear_log_entries<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<()>> {
        async move {
            let actions = self
                .sessions
                .run(device, "/system/logging/action/print", &["?name=memory".to_string()])
                .await?;
            let lines = actions
                .first()
                .and_then(|a| a.get("memory-lines"))
                .cloned()
                .unwrap_or_else(|| "1000".to_string());

            let set = "/system/logging/action/set";
            self.sessions
                .run(
                    device,
                    set,
                    &["=numbers=memory".to_string(), "=memory-lines=1".to_string()],
                )
                .await?;
            self.sessions
                .run(
                    device,
                    set,
                    &["=numbers=memory".to_string(), format!("=memory-lines={lines}")],
                )
                .await?;
            tracing::info!("Cleared log buffer on '{}'", device.name);
            Ok(())
        }
        .boxed()
    }

    fn enable_network_interface<'a>(
        &'a self,
        device: &'a RouterDevice,
        interface: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        self.set_interface_state(device, interface, true).boxed()
    }

    fn disable_network_interface<'a>(
        &'a self,
        device: &'a RouterDevice,
        interface: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        self.set_interface_state(device, interface, false).boxed()
    }

    fn get_firewall_rules<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<FirewallRule>>> {
        async move {
            let sentences = self.print(device, "/ip/firewall/filter/print").await?;
            Ok(parse_firewall_rules(&sentences))
        }
        .boxed()
    }

    fn get_vpn_tunnels<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<Vec<VpnTunnel>>> {
        async move {
            let sentences = self.print(device, "/ppp/active/print").await?;
            Ok(parse_vpn_tunnels(&sentences))
        }
        .boxed()
    }

    fn get_qos_rules<'a>(&'a self, device: &'a RouterDevice) -> BoxFuture<'a, Result<Vec<QosRule>>> {
        async move {
            let sentences = self.print(device, "/queue/simple/print").await?;
            Ok(parse_qos_rules(&sentences))
        }
        .boxed()
    }

    fn get_traffic_flows<'a>(
        &'a self,
        device: &'a RouterDevice,
    ) -> BoxFuture<'a, Result<Vec<TrafficFlow>>> {
        async move {
            let sentences = self.print(device, "/ip/firewall/connection/print").await?;
            Ok(parse_traffic_flows(&sentences))
        }
        .boxed()
    }

    fn connection_health(&self, router: RouterId) -> BoxFuture<'_, Option<ConnectionHealth>> {
        async move { self.sessions.connection_health(router).await }.boxed()
    }
}
