// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Router monitor
//!
//! A single task owns the router list, the selection, the chart series and
//! the poller. HTTP handlers, connect completions and poll samples all reach
//! it as messages on one channel; readers get a `watch` snapshot.

mod chart;
mod poller;


use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::metrics::MetricsRegistry;
use crate::model::{
    DhcpLease, FirewallRule, LogEntry, NetworkInterface, QosRule, RouterDevice, RouterId,
    SystemInfo, TrafficFlow, VpnTunnel,
};
use crate::observable::{Observable, PropertyChanged, change_channel};
use crate::service::{RouterApi, SnmpService};

pub use chart::{ChartPoint, ChartSeries, Charts};
pub use poller::{DataSource, Sample};

use poller::{PollerHandle, start_poller, unix_timestamp};

/// Requests accepted by the monitor
///
/// Everything except `AddRouter`, `RemoveRouter` and `SelectRouter` acts on
/// the selected router.
#[derive(Debug)]
pub enum Command {
    AddRouter {
        device: Box<RouterDevice>,
        reply: Option<oneshot::Sender<Result<RouterId>>>,
    },
    RemoveRouter(RouterId),
    SelectRouter(Option<RouterId>),
    Connect,
    Disconnect,
    RefreshDetails,
    RefreshLogs,
    ClearLogs,
    SetInterfaceEnabled {
        interface: String,
        enabled: bool,
    },
}

/// Router services the monitor drives
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn RouterApi>,
    pub snmp: Option<Arc<dyn SnmpService>>,
}

/// Tunables taken from the application config
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub refresh_interval: Duration,
    pub chart_capacity: usize,
    pub log_fetch_limit: usize,
}

impl MonitorSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            chart_capacity: config.chart_capacity,
            log_fetch_limit: config.log_fetch_limit,
        }
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// State published to readers after every handled message
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub routers: Vec<RouterDevice>,
    pub selected_router: Option<RouterId>,
    pub is_connecting: bool,
    pub is_refreshing: bool,
    pub status_message: String,
    pub can_connect: bool,
    pub can_disconnect: bool,
    pub charts: Charts,
}

impl MonitorSnapshot {
    #[must_use]
    pub fn router(&self, id: RouterId) -> Option<&RouterDevice> {
        self.routers.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn selected(&self) -> Option<&RouterDevice> {
        self.selected_router.and_then(|id| self.router(id))
    }
}

/// Results fetched by a details refresh; `None` means the fetch failed
#[derive(Debug, Default)]
struct RouterDetails {
    system_info: Option<SystemInfo>,
    interfaces: Option<Vec<NetworkInterface>>,
    dhcp_leases: Option<Vec<DhcpLease>>,
    firewall_rules: Option<Vec<FirewallRule>>,
    vpn_tunnels: Option<Vec<VpnTunnel>>,
    qos_rules: Option<Vec<QosRule>>,
    traffic_flows: Option<Vec<TrafficFlow>>,
    logs: Option<Vec<LogEntry>>,
    errors: Vec<String>,
}

#[derive(Debug)]
enum Operation {
    ClearLogs,
    SetInterface { interface: String, enabled: bool },
}

#[derive(Debug)]
enum Message {
    Command(Command),
    ConnectFinished {
        device: Box<RouterDevice>,
        outcome: Result<Option<SystemInfo>>,
    },
    Sampled(Sample),
    SessionLost {
        router: RouterId,
        epoch: u64,
        reason: String,
    },
    DetailsLoaded {
        router: RouterId,
        details: Box<RouterDetails>,
    },
    LogsLoaded {
        router: RouterId,
        outcome: Result<Vec<LogEntry>>,
    },
    OperationFinished {
        router: RouterId,
        operation: Operation,
        outcome: Result<()>,
    },
}

/// Cloneable front end of the monitor task
#[derive(Clone)]
pub struct MonitorHandle {
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Receiver<MonitorSnapshot>,
    changes: broadcast::Sender<PropertyChanged>,
}

impl MonitorHandle {
    /// Queues a command; fails only when the monitor has stopped
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Message::Command(command))
            .map_err(|_| AppError::MonitorStopped)
    }

    /// Adds a router and returns its assigned id
    pub async fn add_router(&self, device: RouterDevice) -> Result<RouterId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::AddRouter {
            device: Box::new(device),
            reply: Some(reply),
        })?;
        rx.await.map_err(|_| AppError::MonitorStopped)?
    }

    #[must_use]
    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_snapshot(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot.clone()
    }

    /// Notifications for the bound properties (selection, busy flags, status)
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<PropertyChanged> {
        self.changes.subscribe()
    }

    /// Waits until a published snapshot satisfies `predicate`
    pub async fn wait_until(
        &self,
        predicate: impl FnMut(&MonitorSnapshot) -> bool,
    ) -> Result<MonitorSnapshot> {
        let mut rx = self.snapshot.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| AppError::MonitorStopped)?;
        Ok(snapshot.clone())
    }
}

pub struct Monitor {
    routers: Vec<RouterDevice>,
    next_id: u32,
    selected_router: Observable<Option<RouterId>>,
    is_connecting: Observable<bool>,
    is_refreshing: Observable<bool>,
    status_message: Observable<String>,
    charts: Charts,
    poller: Option<PollerHandle>,
    next_epoch: u64,
    pending_connect: Option<JoinHandle<()>>,
    services: Services,
    metrics: MetricsRegistry,
    settings: MonitorSettings,
    tx: mpsc::UnboundedSender<Message>,
    snapshot: watch::Sender<MonitorSnapshot>,
}

impl Monitor {
    fn new(
        settings: MonitorSettings,
        services: Services,
        metrics: MetricsRegistry,
    ) -> (Self, mpsc::UnboundedReceiver<Message>, MonitorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let changes = change_channel();

        let mut monitor = Self {
            routers: Vec::new(),
            next_id: 0,
            selected_router: Observable::new("selected_router", None, changes.clone()),
            is_connecting: Observable::new("is_connecting", false, changes.clone()),
            is_refreshing: Observable::new("is_refreshing", false, changes.clone()),
            status_message: Observable::new("status_message", "Ready".to_string(), changes.clone()),
            charts: Charts::new(settings.chart_capacity),
            poller: None,
            next_epoch: 0,
            pending_connect: None,
            services,
            metrics,
            settings,
            tx: tx.clone(),
            snapshot: watch::channel(MonitorSnapshot {
                routers: Vec::new(),
                selected_router: None,
                is_connecting: false,
                is_refreshing: false,
                status_message: String::new(),
                can_connect: false,
                can_disconnect: false,
                charts: Charts::default(),
            })
            .0,
        };
        monitor.publish();

        let handle = MonitorHandle {
            tx,
            snapshot: monitor.snapshot.subscribe(),
            changes,
        };
        (monitor, rx, handle)
    }

    /// Starts the monitor task
    ///
    /// The task runs until `shutdown` turns true, then stops the poller and
    /// closes every open session.
    pub fn spawn(
        settings: MonitorSettings,
        services: Services,
        metrics: MetricsRegistry,
        shutdown: watch::Receiver<bool>,
    ) -> (MonitorHandle, JoinHandle<()>) {
        let (monitor, rx, handle) = Self::new(settings, services, metrics);
        let task = tokio::spawn(monitor.run(rx, shutdown));
        (handle, task)
    }

    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Message>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        tracing::info!(
            "Monitor started (refresh every {:?}, {} chart points)",
            self.settings.refresh_interval,
            self.settings.chart_capacity
        );
        loop {
            tokio::select! {
                message = rx.recv() => match message {
                    Some(message) => self.handle(message).await,
                    None => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Monitor received shutdown signal");
                        break;
                    }
                }
            }
            self.publish();
        }
        self.stop().await;
        self.publish();
    }

    async fn handle(&mut self, message: Message) {
        match message {
            Message::Command(command) => self.handle_command(command).await,
            Message::ConnectFinished { device, outcome } => {
                self.connect_finished(*device, outcome).await;
            }
            Message::Sampled(sample) => self.sampled(sample).await,
            Message::SessionLost {
                router,
                epoch,
                reason,
            } => self.session_lost(router, epoch, &reason).await,
            Message::DetailsLoaded { router, details } => {
                self.details_loaded(router, *details).await;
            }
            Message::LogsLoaded { router, outcome } => self.logs_loaded(router, outcome),
            Message::OperationFinished {
                router,
                operation,
                outcome,
            } => self.operation_finished(router, operation, outcome),
        }
    }

    async fn handle_command(&mut self, command: Command) {
        tracing::trace!("Handling command: {:?}", command);
        match command {
            Command::AddRouter { device, reply } => {
                let result = self.add_router(*device);
                if let Err(e) = &result {
                    tracing::warn!("Rejected router: {}", e);
                    self.set_status(format!("Cannot add router: {e}"));
                }
                if let Some(reply) = reply {
                    // readers woken by the reply must already see the router
                    self.publish();
                    let _ = reply.send(result);
                }
            }
            Command::RemoveRouter(id) => self.remove_router(id).await,
            Command::SelectRouter(id) => self.select_router(id),
            Command::Connect => self.connect(),
            Command::Disconnect => self.disconnect().await,
            Command::RefreshDetails => self.refresh_details(),
            Command::RefreshLogs => self.refresh_logs(),
            Command::ClearLogs => self.clear_logs(),
            Command::SetInterfaceEnabled { interface, enabled } => {
                self.set_interface_enabled(interface, enabled);
            }
        }
    }

    fn publish(&self) {
        self.snapshot.send_replace(MonitorSnapshot {
            routers: self.routers.clone(),
            selected_router: *self.selected_router.get(),
            is_connecting: *self.is_connecting.get(),
            is_refreshing: *self.is_refreshing.get(),
            status_message: self.status_message.get().clone(),
            can_connect: self.can_connect(),
            can_disconnect: self.can_disconnect(),
            charts: self.charts.clone(),
        });
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message.set(message.into());
    }

    fn index_of(&self, id: RouterId) -> Option<usize> {
        self.routers.iter().position(|r| r.id == id)
    }

    fn selected_device(&self) -> Option<&RouterDevice> {
        self.selected_router
            .get()
            .and_then(|id| self.routers.iter().find(|r| r.id == id))
    }

    fn can_connect(&self) -> bool {
        !*self.is_connecting.get()
            && self
                .selected_device()
                .is_some_and(|d| !d.is_connected() && !d.is_connecting())
    }

    fn can_disconnect(&self) -> bool {
        self.selected_device().is_some_and(RouterDevice::is_connected)
    }

    fn data_source(&self, device: &RouterDevice) -> Option<DataSource> {
        if device.use_api {
            Some(DataSource::Api(self.services.api.clone()))
        } else if device.use_snmp {
            self.services.snmp.clone().map(DataSource::Snmp)
        } else {
            None
        }
    }

    /// The selected router when it is connected, for commands that need a session
    fn selected_connected(&mut self, action: &str) -> Option<RouterDevice> {
        match self.selected_device() {
            Some(d) if d.is_connected() => Some(d.clone()),
            Some(d) => {
                let message = format!("Cannot {action}: '{}' is not connected", d.name);
                self.set_status(message);
                None
            }
            None => {
                self.set_status(format!("Cannot {action}: no router selected"));
                None
            }
        }
    }

    /// Like `selected_connected`, restricted to routers reachable over the API
    fn selected_api_device(&mut self, action: &str) -> Option<RouterDevice> {
        let device = self.selected_connected(action)?;
        if device.use_api {
            Some(device)
        } else {
            self.set_status(format!(
                "Cannot {action}: '{}' is monitored over SNMP only",
                device.name
            ));
            None
        }
    }

    fn add_router(&mut self, mut device: RouterDevice) -> Result<RouterId> {
        device.to_config().validate().map_err(AppError::Config)?;
        if self.routers.iter().any(|r| r.name == device.name) {
            return Err(AppError::Config(format!(
                "Router '{}' already exists",
                device.name
            )));
        }

        self.next_id += 1;
        let id = RouterId(self.next_id);
        device.id = id;
        self.metrics.update_router_status(&device);
        tracing::info!("Added router '{}' ({}) as {}", device.name, device.hostname, id);
        self.set_status(format!("Added router '{}'", device.name));
        self.routers.push(device);

        if self.selected_router.get().is_none() {
            self.select_router(Some(id));
        }
        Ok(id)
    }

    async fn remove_router(&mut self, id: RouterId) {
        let Some(idx) = self.index_of(id) else {
            self.set_status(format!("Unknown router {id}"));
            return;
        };

        if self.poller.as_ref().is_some_and(|p| p.router == id) {
            self.stop_poller();
        }
        let device = self.routers.remove(idx);
        if device.use_api && (device.is_connected() || device.is_connecting()) {
            self.services.api.disconnect(&device).await;
        }
        self.metrics.remove_router(&device.name).await;

        if *self.selected_router.get() == Some(id) {
            self.charts.clear();
            self.selected_router.set(None);
        }
        tracing::info!("Removed router '{}'", device.name);
        self.set_status(format!("Removed router '{}'", device.name));
    }

    fn select_router(&mut self, id: Option<RouterId>) {
        if *self.selected_router.get() == id {
            return;
        }
        if let Some(unknown) = id.filter(|id| self.index_of(*id).is_none()) {
            self.set_status(format!("Unknown router {unknown}"));
            return;
        }

        self.stop_poller();
        self.charts.clear();
        self.selected_router.set(id);
        match self.selected_device().map(|d| d.name.clone()) {
            Some(name) => {
                tracing::debug!("Selected router '{}'", name);
                self.set_status(format!("Selected router '{name}'"));
            }
            None => self.set_status("No router selected"),
        }
        self.retarget_poller();
    }

    /// Keeps exactly one poller on the selected router while it is connected
    fn retarget_poller(&mut self) {
        let Some(device) = self
            .selected_device()
            .filter(|d| d.is_connected())
            .cloned()
        else {
            self.stop_poller();
            return;
        };
        if self.poller.as_ref().is_some_and(|p| p.router == device.id) {
            return;
        }
        self.stop_poller();

        let Some(source) = self.data_source(&device) else {
            tracing::debug!("No data source for '{}', not polling", device.name);
            return;
        };
        self.next_epoch += 1;
        self.poller = Some(start_poller(
            self.next_epoch,
            device,
            source,
            self.settings.refresh_interval,
            self.tx.clone(),
        ));
    }

    fn stop_poller(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }

    fn connect(&mut self) {
        if !self.can_connect() {
            tracing::debug!("Connect ignored: not available in the current state");
            return;
        }
        let Some(id) = *self.selected_router.get() else {
            return;
        };
        let Some(idx) = self.index_of(id) else {
            return;
        };

        let device = &mut self.routers[idx];
        device.begin_connect();
        self.metrics.update_router_status(device);
        let device = device.clone();

        self.is_connecting.set(true);
        self.set_status(format!("Connecting to '{}'...", device.name));
        tracing::info!("Connecting to router '{}' at {}", device.name, device.hostname);

        let services = self.services.clone();
        let tx = self.tx.clone();
        self.pending_connect = Some(tokio::spawn(async move {
            let outcome = open_session(&services, &device).await;
            let _ = tx.send(Message::ConnectFinished {
                device: Box::new(device),
                outcome,
            });
        }));
    }

    async fn connect_finished(&mut self, device: RouterDevice, outcome: Result<Option<SystemInfo>>) {
        self.pending_connect = None;
        self.is_connecting.set(false);

        let Some(idx) = self.index_of(device.id) else {
            // removed while connecting
            if outcome.is_ok() && device.use_api {
                self.services.api.disconnect(&device).await;
            }
            return;
        };

        let router = &mut self.routers[idx];
        match outcome {
            Ok(info) => {
                router.mark_connected(SystemTime::now());
                if info.is_some() {
                    router.system_info = info;
                }
                self.metrics.update_router_status(router);
                self.metrics.update_system_info(router).await;
                tracing::info!("Connected to router '{}'", router.name);
                let message = format!("Connected to '{}'", router.name);
                self.set_status(message);
                self.retarget_poller();
                if *self.selected_router.get() == Some(device.id) {
                    self.refresh_details();
                }
            }
            Err(e) => {
                router.mark_failed();
                self.metrics.update_router_status(router);
                tracing::warn!("Failed to connect to router '{}': {}", router.name, e);
                let message = format!("Failed to connect to '{}': {}", router.name, e);
                self.set_status(message);
            }
        }
        self.publish_health(device.id).await;
    }

    /// Mirrors the API client's session health into the metrics
    async fn publish_health(&self, id: RouterId) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        if let Some(health) = self.services.api.connection_health(id).await {
            self.metrics
                .update_connection_health(&self.routers[idx].name, &health);
        }
    }

    async fn disconnect(&mut self) {
        if !self.can_disconnect() {
            tracing::debug!("Disconnect ignored: selected router is not connected");
            return;
        }
        let Some(idx) = self.selected_router.get().and_then(|id| self.index_of(id)) else {
            return;
        };

        self.stop_poller();
        if self.routers[idx].use_api {
            self.services.api.disconnect(&self.routers[idx]).await;
        }
        let router = &mut self.routers[idx];
        router.mark_disconnected();
        self.metrics.update_router_status(router);
        tracing::info!("Disconnected from router '{}'", router.name);
        let message = format!("Disconnected from '{}'", router.name);
        self.set_status(message);
    }

    async fn session_lost(&mut self, router: RouterId, epoch: u64, reason: &str) {
        if !self.poller.as_ref().is_some_and(|p| p.epoch == epoch) {
            tracing::trace!("Ignoring session loss reported by stale poller {}", epoch);
            return;
        }
        self.stop_poller();

        let Some(idx) = self.index_of(router) else {
            return;
        };
        let device = &mut self.routers[idx];
        device.mark_disconnected();
        self.metrics.update_router_status(device);
        tracing::warn!("Lost connection to router '{}': {}", device.name, reason);
        let message = format!("Connection to '{}' lost: {}", device.name, reason);
        self.set_status(message);
        self.publish_health(router).await;
    }

    async fn sampled(&mut self, sample: Sample) {
        let current = self
            .poller
            .as_ref()
            .is_some_and(|p| p.epoch == sample.epoch && p.router == sample.router);
        if !current {
            tracing::trace!(
                "Dropping sample from stale poller {} for router {}",
                sample.epoch,
                sample.router
            );
            return;
        }
        let Some(idx) = self.index_of(sample.router) else {
            return;
        };

        let device = &mut self.routers[idx];
        if let Some(resources) = sample.resources {
            #[allow(clippy::cast_precision_loss)]
            self.charts
                .update_cpu_data(sample.timestamp, resources.cpu_load as f64);
            self.charts
                .update_memory_data(sample.timestamp, resources.memory_usage_percent());
            device.resources = Some(resources);
        }
        if let Some(stats) = &sample.interfaces {
            device.apply_interface_statistics(stats, sample.at);
            self.charts.update_network_data(
                sample.timestamp,
                device.total_rx_bps(),
                device.total_tx_bps(),
            );
        }
        self.metrics.update_sample(device).await;
        self.publish_health(sample.router).await;
    }

    fn refresh_details(&mut self) {
        let Some(device) = self.selected_connected("refresh") else {
            return;
        };
        if *self.is_refreshing.get() {
            tracing::debug!("Refresh of '{}' already in progress", device.name);
            return;
        }
        let Some(source) = self.data_source(&device) else {
            return;
        };

        self.is_refreshing.set(true);
        self.set_status(format!("Refreshing '{}'...", device.name));

        let limit = self.settings.log_fetch_limit;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let details = load_details(&source, &device, limit).await;
            let _ = tx.send(Message::DetailsLoaded {
                router: device.id,
                details: Box::new(details),
            });
        });
    }

    async fn details_loaded(&mut self, router: RouterId, details: RouterDetails) {
        self.is_refreshing.set(false);
        let Some(idx) = self.index_of(router) else {
            return;
        };
        let device = &mut self.routers[idx];
        if !device.is_connected() {
            tracing::debug!("Discarding details of '{}': no longer connected", device.name);
            return;
        }

        if details.system_info.is_some() {
            device.system_info = details.system_info;
        }
        if let Some(interfaces) = details.interfaces {
            device.replace_interfaces(interfaces);
        }
        if let Some(leases) = details.dhcp_leases {
            device.dhcp_leases = leases;
        }
        if let Some(rules) = details.firewall_rules {
            device.firewall_rules = rules;
        }
        if let Some(tunnels) = details.vpn_tunnels {
            device.vpn_tunnels = tunnels;
        }
        if let Some(rules) = details.qos_rules {
            device.qos_rules = rules;
        }
        if let Some(flows) = details.traffic_flows {
            device.traffic_flows = flows;
        }
        if let Some(logs) = details.logs {
            device.logs = logs;
        }
        self.metrics.update_system_info(device).await;

        let message = if details.errors.is_empty() {
            format!("Refreshed '{}'", device.name)
        } else {
            tracing::debug!(
                "Refresh of '{}' partially failed: {}",
                device.name,
                details.errors.join("; ")
            );
            format!(
                "Refreshed '{}' with errors: {}",
                device.name,
                details.errors.join("; ")
            )
        };
        self.set_status(message);
    }

    fn refresh_logs(&mut self) {
        let Some(device) = self.selected_api_device("load logs") else {
            return;
        };
        let api = self.services.api.clone();
        let limit = self.settings.log_fetch_limit;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = api.get_log_entries(&device, limit).await;
            let _ = tx.send(Message::LogsLoaded {
                router: device.id,
                outcome,
            });
        });
    }

    fn logs_loaded(&mut self, router: RouterId, outcome: Result<Vec<LogEntry>>) {
        let Some(idx) = self.index_of(router) else {
            return;
        };
        let device = &mut self.routers[idx];
        let message = match outcome {
            Ok(logs) => {
                let message = format!("Loaded {} log entries from '{}'", logs.len(), device.name);
                device.logs = logs;
                message
            }
            Err(e) => {
                tracing::debug!("Failed to load logs of '{}': {}", device.name, e);
                format!("Failed to load logs of '{}': {}", device.name, e)
            }
        };
        self.set_status(message);
    }

    fn clear_logs(&mut self) {
        let Some(device) = self.selected_api_device("clear logs") else {
            return;
        };
        self.spawn_operation(device, Operation::ClearLogs);
    }

    fn set_interface_enabled(&mut self, interface: String, enabled: bool) {
        let Some(device) = self.selected_api_device("change interface state") else {
            return;
        };
        if !device.interfaces.iter().any(|i| i.name == interface) {
            self.set_status(format!(
                "Unknown interface '{}' on '{}'",
                interface, device.name
            ));
            return;
        }
        self.spawn_operation(device, Operation::SetInterface { interface, enabled });
    }

    fn spawn_operation(&self, device: RouterDevice, operation: Operation) {
        let api = self.services.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = match &operation {
                Operation::ClearLogs => api.clear_log_entries(&device).await,
                Operation::SetInterface {
                    interface,
                    enabled: true,
                } => api.enable_network_interface(&device, interface).await,
                Operation::SetInterface {
                    interface,
                    enabled: false,
                } => api.disable_network_interface(&device, interface).await,
            };
            let _ = tx.send(Message::OperationFinished {
                router: device.id,
                operation,
                outcome,
            });
        });
    }

    fn operation_finished(&mut self, router: RouterId, operation: Operation, outcome: Result<()>) {
        let Some(idx) = self.index_of(router) else {
            return;
        };
        let device = &mut self.routers[idx];
        let message = match (operation, outcome) {
            (Operation::ClearLogs, Ok(())) => {
                device.logs.clear();
                format!("Cleared logs on '{}'", device.name)
            }
            (Operation::SetInterface { interface, enabled }, Ok(())) => {
                if let Some(iface) = device.interfaces.iter_mut().find(|i| i.name == interface) {
                    iface.disabled = !enabled;
                }
                let state = if enabled { "enabled" } else { "disabled" };
                format!("Interface '{interface}' {state} on '{}'", device.name)
            }
            (Operation::ClearLogs, Err(e)) => {
                tracing::warn!("Failed to clear logs on '{}': {}", device.name, e);
                format!("Failed to clear logs on '{}': {}", device.name, e)
            }
            (Operation::SetInterface { interface, .. }, Err(e)) => {
                tracing::warn!(
                    "Failed to change interface '{}' on '{}': {}",
                    interface,
                    device.name,
                    e
                );
                format!("Failed to change interface '{interface}': {e}")
            }
        };
        self.set_status(message);
    }

    async fn stop(&mut self) {
        self.stop_poller();
        // a connect still in flight may already hold a session
        if let Some(task) = self.pending_connect.take() {
            task.abort();
            let _ = task.await;
        }
        self.is_connecting.set(false);
        for device in &mut self.routers {
            if device.use_api && (device.is_connected() || device.is_connecting()) {
                self.services.api.disconnect(device).await;
            }
            device.mark_disconnected();
        }
        self.set_status("Stopped");
        tracing::info!("Monitor stopped");
    }
}

/// Opens the data path of `device`: an API session, or a first SNMP read
async fn open_session(services: &Services, device: &RouterDevice) -> Result<Option<SystemInfo>> {
    if device.use_api {
        services.api.connect(device).await?;
        return Ok(None);
    }
    if device.use_snmp {
        let snmp = services
            .snmp
            .as_ref()
            .ok_or_else(|| AppError::Unsupported("no SNMP service is configured".to_string()))?;
        return snmp.get_system_info(device).await.map(Some);
    }
    Err(AppError::Unsupported(format!(
        "router '{}' enables neither the API nor SNMP",
        device.name
    )))
}

fn keep<T>(result: Result<T>, what: &str, errors: &mut Vec<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(format!("{what}: {e}"));
            None
        }
    }
}

async fn load_details(source: &DataSource, device: &RouterDevice, log_limit: usize) -> RouterDetails {
    let mut details = RouterDetails::default();
    let errors = &mut details.errors;
    match source {
        DataSource::Api(api) => {
            details.system_info = keep(api.get_system_info(device).await, "system info", errors);
            details.interfaces = keep(api.get_network_interfaces(device).await, "interfaces", errors);
            details.dhcp_leases = keep(api.get_dhcp_leases(device).await, "DHCP leases", errors);
            details.firewall_rules =
                keep(api.get_firewall_rules(device).await, "firewall rules", errors);
            details.vpn_tunnels = keep(api.get_vpn_tunnels(device).await, "VPN tunnels", errors);
            details.qos_rules = keep(api.get_qos_rules(device).await, "queues", errors);
            details.traffic_flows =
                keep(api.get_traffic_flows(device).await, "traffic flows", errors);
            details.logs = keep(api.get_log_entries(device, log_limit).await, "logs", errors);
        }
        DataSource::Snmp(snmp) => {
            details.system_info = keep(snmp.get_system_info(device).await, "system info", errors);
        }
    }
    details
}
