// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Router-reported records

use serde::Serialize;

/// System resource snapshot, overwritten on every refresh
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemResources {
    pub uptime: String,
    pub cpu_load: u64,
    pub free_memory: u64,
    pub total_memory: u64,
    pub free_hdd_space: u64,
    pub total_hdd_space: u64,
    pub cpu_count: u32,
    pub cpu_frequency: u32,
}

impl SystemResources {
    /// Used memory as a percentage of total memory
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn memory_usage_percent(&self) -> f64 {
        if self.total_memory == 0 {
            return 0.0;
        }
        let used = self.total_memory.saturating_sub(self.free_memory);
        used as f64 * 100.0 / self.total_memory as f64
    }

    /// Used storage as a percentage of total storage
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn disk_usage_percent(&self) -> f64 {
        if self.total_hdd_space == 0 {
            return 0.0;
        }
        let used = self.total_hdd_space.saturating_sub(self.free_hdd_space);
        used as f64 * 100.0 / self.total_hdd_space as f64
    }
}

/// Session health of one router as tracked by the API client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionHealth {
    /// Failed connects and commands since the last success
    pub consecutive_errors: u32,
    /// Unix time in seconds of the last successful connect or command
    pub last_success: Option<u64>,
}

/// Mostly static identification of a router
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SystemInfo {
    pub identity: String,
    pub version: String,
    pub board_name: String,
    pub architecture: String,
    pub serial_number: String,
    pub firmware: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub id: String,
    pub time: String,
    pub topics: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallRule {
    pub id: String,
    pub chain: String,
    pub action: String,
    pub protocol: String,
    pub src_address: String,
    pub dst_address: String,
    pub dst_port: String,
    pub disabled: bool,
    pub comment: String,
    pub bytes: u64,
    pub packets: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DhcpLease {
    pub id: String,
    pub address: String,
    pub mac_address: String,
    pub host_name: String,
    pub server: String,
    pub status: String,
    pub expires_after: String,
    pub dynamic: bool,
}

/// Active PPP/VPN session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VpnTunnel {
    pub id: String,
    pub name: String,
    pub service: String,
    pub caller_id: String,
    pub address: String,
    pub uptime: String,
}

/// Simple queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QosRule {
    pub id: String,
    pub name: String,
    pub target: String,
    pub max_limit: String,
    pub rate: String,
    pub disabled: bool,
}

/// Tracked connections aggregated by source, destination and protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrafficFlow {
    pub src_address: String,
    pub dst_address: String,
    pub protocol: String,
    pub connection_count: u64,
    pub orig_bytes: u64,
    pub repl_bytes: u64,
}
