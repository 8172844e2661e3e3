// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Periodic sampling of the selected router

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Message;
use crate::error::{AppError, Result};
use crate::model::{InterfaceStats, RouterDevice, RouterId, SystemResources};
use crate::service::{RouterApi, SnmpService};

/// Where a router's data comes from
#[derive(Clone)]
pub enum DataSource {
    Api(Arc<dyn RouterApi>),
    Snmp(Arc<dyn SnmpService>),
}

impl DataSource {
    async fn interface_statistics(&self, device: &RouterDevice) -> Result<Vec<InterfaceStats>> {
        match self {
            Self::Api(api) => api.get_interface_statistics(device).await,
            Self::Snmp(snmp) => snmp.get_interface_statistics(device).await,
        }
    }

    async fn system_resources(&self, device: &RouterDevice) -> Option<Result<SystemResources>> {
        match self {
            Self::Api(api) => Some(api.get_system_resources(device).await),
            // SNMP has no resource view here
            Self::Snmp(_) => None,
        }
    }

    /// Only API sessions can be lost; SNMP is connectionless
    fn loses_session(&self, error: &AppError) -> bool {
        matches!(self, Self::Api(_)) && error.is_session_lost()
    }
}

/// One poll result, tagged with the epoch of the poller that produced it
#[derive(Debug)]
pub struct Sample {
    pub router: RouterId,
    pub epoch: u64,
    pub resources: Option<SystemResources>,
    pub interfaces: Option<Vec<InterfaceStats>>,
    pub at: Instant,
    /// Unix seconds, used for chart points
    pub timestamp: u64,
}

/// A running poller task
pub(super) struct PollerHandle {
    pub(super) epoch: u64,
    pub(super) router: RouterId,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Signals the task to stop; samples already queued are dropped by epoch
    pub(super) fn stop(self) {
        let _ = self.shutdown.send(true);
        tracing::debug!("Stopped poller {} for router {}", self.epoch, self.router);
        drop(self.task);
    }

    #[cfg(test)]
    pub(super) fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub(super) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Starts sampling `device` every `interval`
///
/// The first tick fires immediately. Tick failures are logged and skipped;
/// a lost session is reported once and ends the task.
pub(super) fn start_poller(
    epoch: u64,
    device: RouterDevice,
    source: DataSource,
    interval: Duration,
    tx: mpsc::UnboundedSender<Message>,
) -> PollerHandle {
    let router = device.id;
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    tracing::debug!(
        "Starting poller {} for router '{}' every {:?}",
        epoch,
        device.name,
        interval
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::trace!("Poller {} received shutdown", epoch);
                        break;
                    }
                    continue;
                }
            }

            match poll_once(epoch, &device, &source).await {
                Ok(Some(sample)) => {
                    if tx.send(Message::Sampled(sample)).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!("Poller {} for '{}' lost its session: {}", epoch, device.name, e);
                    let _ = tx.send(Message::SessionLost {
                        router,
                        epoch,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }
        tracing::trace!("Poller {} for '{}' finished", epoch, device.name);
    });

    PollerHandle {
        epoch,
        router,
        shutdown,
        task,
    }
}

/// Fetches one sample
///
/// Returns `Ok(None)` when nothing could be read, and `Err` only for a lost session.
async fn poll_once(epoch: u64, device: &RouterDevice, source: &DataSource) -> Result<Option<Sample>> {
    let resources = match source.system_resources(device).await {
        Some(Ok(r)) => Some(r),
        Some(Err(e)) if source.loses_session(&e) => return Err(e),
        Some(Err(e)) => {
            tracing::debug!("Failed to read resources of '{}': {}", device.name, e);
            None
        }
        None => None,
    };

    let interfaces = match source.interface_statistics(device).await {
        Ok(stats) => Some(stats),
        Err(e) if source.loses_session(&e) => return Err(e),
        Err(e) => {
            tracing::debug!("Failed to read interface statistics of '{}': {}", device.name, e);
            None
        }
    };

    if resources.is_none() && interfaces.is_none() {
        return Ok(None);
    }

    Ok(Some(Sample {
        router: device.id,
        epoch,
        resources,
        interfaces,
        at: Instant::now(),
        timestamp: unix_timestamp(),
    }))
}
