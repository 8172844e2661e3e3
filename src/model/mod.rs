// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Domain records for monitored routers
//!
//! `RouterDevice` owns everything the monitor knows about one router; the
//! remaining types are router-reported records replaced wholesale on refresh.

mod cloud;
mod device;
mod interface;
mod records;

pub use cloud::{
    CloudDevice, CloudDeviceDto, CloudSite, CloudSiteDto, SiteStatus,
    create_router_device_from_cloud_device,
};
pub use device::{ConnectionStatus, RouterDevice, RouterId};
pub use interface::{InterfaceStats, NetworkInterface, bit_rate};
pub use records::{
    ConnectionHealth, DhcpLease, FirewallRule, LogEntry, QosRule, SystemInfo, SystemResources, TrafficFlow,
    VpnTunnel,
};
