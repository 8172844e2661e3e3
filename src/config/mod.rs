// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for RouterOS Monitor application
//!
//! Loads `appsettings.json` and applies environment variable overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, Result};


/// Default configuration values
pub mod defaults {
    pub const SERVER_ADDR: &str = "0.0.0.0:9090";
    pub const APPSETTINGS_PATH: &str = "appsettings.json";
    pub const SETTINGS_PATH: &str = "settings.json";
    pub const ROUTEROS_USERNAME: &str = "admin";
    pub const ROUTEROS_PASSWORD: &str = "";
    pub const API_PORT: u16 = 8728;
    pub const API_SSL_PORT: u16 = 8729;
    pub const SNMP_PORT: u16 = 161;
    pub const REFRESH_INTERVAL_MS: u64 = 1000;
    pub const CHART_CAPACITY: usize = 60;
    pub const LOG_FETCH_LIMIT: usize = 100;
    pub const RETRY_COUNT: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 2000;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const APPSETTINGS_PATH: &str = "APPSETTINGS_PATH";
    pub const SERVER_ADDR: &str = "SERVER_ADDR";
    pub const ROUTERS_CONFIG: &str = "ROUTERS_CONFIG";
    pub const REFRESH_INTERVAL_MS: &str = "REFRESH_INTERVAL_MS";
    pub const SETTINGS_PATH: &str = "SETTINGS_PATH";
}

/// Configuration for a single MikroTik router
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub name: String,
    pub hostname: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_api_ssl_port")]
    pub api_ssl_port: u16,
    /// SNMP agent port
    #[serde(default = "default_snmp_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_true")]
    pub use_api: bool,
    #[serde(default)]
    pub use_ssh: bool,
    #[serde(default)]
    pub use_snmp: bool,
    #[serde(default)]
    pub use_ssl: bool,
    /// Connect this router as soon as the monitor starts
    #[serde(default)]
    pub auto_connect: bool,
}

fn default_api_port() -> u16 {
    defaults::API_PORT
}

fn default_api_ssl_port() -> u16 {
    defaults::API_SSL_PORT
}

fn default_snmp_port() -> u16 {
    defaults::SNMP_PORT
}

fn default_username() -> String {
    defaults::ROUTEROS_USERNAME.to_string()
}

fn default_true() -> bool {
    true
}

impl RouterConfig {
    /// Builds an API-only router entry with default ports
    #[must_use]
    pub fn new(name: &str, hostname: &str, username: &str, password: &str) -> Self {
        Self {
            name: name.to_string(),
            hostname: hostname.to_string(),
            api_port: defaults::API_PORT,
            api_ssl_port: defaults::API_SSL_PORT,
            port: defaults::SNMP_PORT,
            username: username.to_string(),
            password: password.to_string(),
            use_api: true,
            use_ssh: false,
            use_snmp: false,
            use_ssl: false,
            auto_connect: false,
        }
    }

    /// Validates router configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Router name cannot be empty".to_string());
        }

        if self.hostname.trim().is_empty() {
            return Err(format!("Hostname cannot be empty for router '{}'", self.name));
        }

        // Ports live in their own fields
        if self.hostname.contains(':') && self.hostname.parse::<std::net::Ipv6Addr>().is_err() {
            return Err(format!(
                "Invalid hostname '{}': set the port with 'api_port' instead",
                self.hostname
            ));
        }

        if self.api_port == 0 {
            return Err(format!("API port cannot be 0 for router '{}'", self.name));
        }

        if !(self.use_api || self.use_ssh || self.use_snmp) {
            return Err(format!(
                "Router '{}' has no transport enabled (use_api, use_ssh, use_snmp)",
                self.name
            ));
        }

        if self.username.trim().is_empty() {
            return Err(format!(
                "Username cannot be empty for router '{}'",
                self.name
            ));
        }

        Ok(())
    }
}

/// How failed connection attempts are repeated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicy {
    /// Single attempt
    #[default]
    None,
    /// Constant delay between attempts
    Fixed,
    /// Delay doubles after each failed attempt, capped at five minutes
    Exponential,
}

/// Connection retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(rename = "connection_retry_policy", default)]
    pub policy: RetryPolicy,
    #[serde(rename = "connection_retry_count", default = "default_retry_count")]
    pub count: u32,
    #[serde(rename = "connection_retry_delay_ms", default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_retry_count() -> u32 {
    defaults::RETRY_COUNT
}

fn default_retry_delay_ms() -> u64 {
    defaults::RETRY_DELAY_MS
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::None,
            count: defaults::RETRY_COUNT,
            delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

impl RetrySettings {
    /// Total number of connection attempts, including the first one
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        match self.policy {
            RetryPolicy::None => 1,
            RetryPolicy::Fixed | RetryPolicy::Exponential => self.count.saturating_add(1),
        }
    }

    /// Delay to wait after the given failed attempt (0-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = Duration::from_millis(self.delay_ms);
        match self.policy {
            RetryPolicy::None => Duration::ZERO,
            RetryPolicy::Fixed => base,
            RetryPolicy::Exponential => {
                let cap = Duration::from_secs(300);
                2u32.checked_pow(attempt)
                    .map_or(cap, |factor| base.saturating_mul(factor))
                    .min(cap)
            }
        }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_addr: String,
    pub routers: Vec<RouterConfig>,
    pub refresh_interval_ms: u64,
    pub chart_capacity: usize,
    pub log_fetch_limit: usize,
    #[serde(flatten)]
    pub retry: RetrySettings,
    /// Fallback `tracing` filter when `RUST_LOG` is not set
    pub log_filter: Option<String>,
    pub settings_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_addr: defaults::SERVER_ADDR.to_string(),
            routers: vec![],
            refresh_interval_ms: defaults::REFRESH_INTERVAL_MS,
            chart_capacity: defaults::CHART_CAPACITY,
            log_fetch_limit: defaults::LOG_FETCH_LIMIT,
            retry: RetrySettings::default(),
            log_filter: None,
            settings_path: defaults::SETTINGS_PATH.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from `appsettings.json` and environment variables
    ///
    /// A missing settings file is not an error; a malformed one is. Router
    /// entries are not validated here so that `retain_valid_routers` can log
    /// once tracing is set up.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(env_vars::APPSETTINGS_PATH)
            .unwrap_or_else(|_| defaults::APPSETTINGS_PATH.to_string());

        let mut config = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)?;
            Self::from_json(&raw).map_err(|e| {
                AppError::Config(format!("Failed to parse '{path}': {e}"))
            })?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses configuration from a JSON document, filling missing keys with defaults
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(raw)?;
        if config.refresh_interval_ms == 0 {
            return Err(AppError::Config(
                "refresh_interval_ms must be greater than 0".to_string(),
            ));
        }
        if config.chart_capacity == 0 {
            return Err(AppError::Config(
                "chart_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(config)
    }

    /// Environment variables take precedence over the settings file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var(env_vars::SERVER_ADDR) {
            self.server_addr = addr;
        }

        if let Ok(path) = std::env::var(env_vars::SETTINGS_PATH) {
            self.settings_path = path;
        }

        if let Some(ms) = std::env::var(env_vars::REFRESH_INTERVAL_MS)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
        {
            self.refresh_interval_ms = ms;
        }

        if let Ok(config_json) = std::env::var(env_vars::ROUTERS_CONFIG) {
            match serde_json::from_str(&config_json) {
                Ok(routers) => self.routers = routers,
                Err(e) => {
                    tracing::warn!("Failed to parse ROUTERS_CONFIG: {}. Keeping file routers.", e);
                }
            }
        } else if let Ok(hostname) = std::env::var("ROUTEROS_ADDRESS") {
            // Legacy single-router variables
            let username = std::env::var("ROUTEROS_USERNAME")
                .unwrap_or_else(|_| defaults::ROUTEROS_USERNAME.to_string());
            let password = std::env::var("ROUTEROS_PASSWORD")
                .unwrap_or_else(|_| defaults::ROUTEROS_PASSWORD.to_string());
            let mut router = RouterConfig::new("default", &hostname, &username, &password);
            router.auto_connect = true;
            self.routers = vec![router];
        }
    }

    /// Drops invalid or duplicate router entries, logging each one
    pub fn retain_valid_routers(&mut self) {
        let mut seen = HashSet::new();
        self.routers.retain(|router| {
            if let Err(e) = router.validate() {
                tracing::error!("Invalid router configuration: {}", e);
                tracing::warn!("Skipping invalid router: {}", router.name);
                return false;
            }
            if !seen.insert(router.name.clone()) {
                tracing::warn!("Skipping duplicate router name: {}", router.name);
                return false;
            }
            true
        });
    }

    /// Poll interval for the selected router
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
