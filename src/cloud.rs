// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Browsing the MikroTik Cloud registry and importing its devices

use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::model::{CloudDevice, CloudSite, RouterId};
use crate::monitor::MonitorHandle;
use crate::service::CloudService;

/// Login, site and device selection state over a [`CloudService`]
pub struct CloudBrowser {
    service: Arc<dyn CloudService>,
    authenticated: bool,
    sites: Vec<CloudSite>,
    selected_site: Option<String>,
    devices: Vec<CloudDevice>,
}

impl CloudBrowser {
    pub fn new(service: Arc<dyn CloudService>) -> Self {
        Self {
            service,
            authenticated: false,
            sites: Vec::new(),
            selected_site: None,
            devices: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    #[must_use]
    pub fn sites(&self) -> &[CloudSite] {
        &self.sites
    }

    #[must_use]
    pub fn selected_site(&self) -> Option<&str> {
        self.selected_site.as_deref()
    }

    #[must_use]
    pub fn devices(&self) -> &[CloudDevice] {
        &self.devices
    }

    /// Authenticates and, on success, loads the site list
    ///
    /// Returns `Ok(false)` for rejected credentials.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<bool> {
        self.authenticated = false;
        self.sites.clear();
        self.selected_site = None;
        self.devices.clear();

        if !self.service.authenticate(username, password).await? {
            tracing::warn!("Cloud login rejected for '{}'", username);
            return Ok(false);
        }
        self.authenticated = true;
        self.sites = self.service.get_sites().await?;
        tracing::info!("Cloud login succeeded, {} sites available", self.sites.len());
        Ok(true)
    }

    /// Loads the devices of one site
    pub async fn select_site(&mut self, site_id: &str) -> Result<&[CloudDevice]> {
        self.ensure_authenticated()?;
        self.devices = self.service.get_devices_by_site(site_id).await?;
        self.selected_site = Some(site_id.to_string());
        tracing::debug!("Loaded {} devices of site '{}'", self.devices.len(), site_id);
        Ok(&self.devices)
    }

    /// Loads every device of the account regardless of site
    pub async fn load_all_devices(&mut self) -> Result<&[CloudDevice]> {
        self.ensure_authenticated()?;
        self.devices = self.service.get_devices().await?;
        self.selected_site = None;
        Ok(&self.devices)
    }

    /// Hands a listed device to the monitor with the given login
    pub async fn import_device(
        &self,
        device_id: &str,
        username: &str,
        password: &str,
        monitor: &MonitorHandle,
    ) -> Result<RouterId> {
        let cloud = self
            .devices
            .iter()
            .find(|d| d.id == device_id)
            .ok_or_else(|| AppError::Config(format!("Unknown cloud device '{device_id}'")))?;
        let device = self
            .service
            .create_router_device_from_cloud_device(cloud, username, password);
        let id = monitor.add_router(device).await?;
        tracing::info!("Imported cloud device '{}' as router {}", cloud.name, id);
        Ok(id)
    }

    fn ensure_authenticated(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(AppError::Auth("not logged in to the cloud".to_string()))
        }
    }
}
