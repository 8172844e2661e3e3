// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! MikroTik Cloud registry records and their wire-shaped DTOs

use serde::{Deserialize, Serialize};
use std::fmt;

use super::device::RouterDevice;
use crate::config::RouterConfig;

/// Device as returned by the cloud API
///
/// `CloudService` implementations deserialize the registry's JSON into this
/// and convert it with `CloudDevice::from`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDeviceDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub version: String,
}

/// Site as returned by the cloud API, converted with `CloudSite::from`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSiteDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub device_count: u32,
    #[serde(default)]
    pub online_device_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudDevice {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub model: String,
    pub site_id: Option<String>,
    pub ip_address: Option<String>,
    pub online: bool,
    pub version: String,
}

impl From<CloudDeviceDto> for CloudDevice {
    fn from(dto: CloudDeviceDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            serial_number: dto.serial_number,
            model: dto.model,
            site_id: dto.site_id,
            ip_address: dto.ip_address.filter(|ip| !ip.trim().is_empty()),
            online: dto.is_online,
            version: dto.version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudSite {
    pub id: String,
    pub name: String,
    pub device_count: u32,
    pub online_device_count: u32,
}

impl From<CloudSiteDto> for CloudSite {
    fn from(dto: CloudSiteDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            device_count: dto.device_count,
            online_device_count: dto.online_device_count,
        }
    }
}

/// Online summary of a cloud site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteStatus {
    Empty,
    AllOnline,
    AllOffline,
    PartiallyOnline,
}

impl fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Empty => "Empty",
            Self::AllOnline => "All Online",
            Self::AllOffline => "All Offline",
            Self::PartiallyOnline => "Partially Online",
        };
        f.write_str(s)
    }
}

impl CloudSite {
    #[must_use]
    pub fn status(&self) -> SiteStatus {
        if self.device_count == 0 {
            SiteStatus::Empty
        } else if self.online_device_count >= self.device_count {
            SiteStatus::AllOnline
        } else if self.online_device_count == 0 {
            SiteStatus::AllOffline
        } else {
            SiteStatus::PartiallyOnline
        }
    }
}

/// Builds a monitorable router from a cloud registry entry
///
/// The cloud does not hand out credentials, so the device gets the given
/// login. Devices without a reported address fall back to their name as hostname.
#[must_use]
pub fn create_router_device_from_cloud_device(
    device: &CloudDevice,
    username: &str,
    password: &str,
) -> RouterDevice {
    let hostname = device
        .ip_address
        .clone()
        .unwrap_or_else(|| device.name.clone());
    let config = RouterConfig::new(&device.name, &hostname, username, password);
    RouterDevice::new(&config)
}
