// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Per-router RouterOS API sessions

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use super::connection::{RouterOsConnection, Sentence};
use crate::config::RetrySettings;
use crate::error::{AppError, Result};
use crate::model::{ConnectionHealth, RouterDevice, RouterId};

type SharedConnection = Arc<Mutex<RouterOsConnection>>;

/// Owns at most one live session per router
///
/// Commands on a session are serialized by its mutex; different routers run
/// independently.
pub struct SessionManager {
    sessions: Mutex<HashMap<RouterId, SharedConnection>>,
    connection_states: Mutex<HashMap<RouterId, ConnectionState>>,
    retry: RetrySettings,
}

/// Tracks connection health and error state
#[derive(Clone, Default)]
struct ConnectionState {
    consecutive_errors: u32,
    last_success_time: Option<SystemTime>,
}

impl ConnectionState {
    fn record_success(&mut self) {
        self.consecutive_errors = 0;
        self.last_success_time = Some(SystemTime::now());
    }

    fn record_error(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }

    fn health(&self) -> ConnectionHealth {
        ConnectionHealth {
            consecutive_errors: self.consecutive_errors,
            last_success: self
                .last_success_time
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs()),
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(RetrySettings::default())
    }
}

impl SessionManager {
    pub fn new(retry: RetrySettings) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            connection_states: Mutex::new(HashMap::new()),
            retry,
        }
    }

    /// Opens a session for `device`, replacing any existing one
    ///
    /// Failed attempts are repeated according to the retry settings, except
    /// for rejected credentials which are final.
    pub(super) async fn open(&self, device: &RouterDevice) -> Result<()> {
        let attempts = self.retry.max_attempts();
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry.delay_after(attempt - 1);
                tracing::debug!(
                    "Retrying connection to '{}' in {:?} (attempt {}/{})",
                    device.name,
                    delay,
                    attempt + 1,
                    attempts
                );
                tokio::time::sleep(delay).await;
            }

            match Self::establish(device).await {
                Ok(conn) => {
                    self.record_success(device.id).await;
                    let previous = self
                        .sessions
                        .lock()
                        .await
                        .insert(device.id, Arc::new(Mutex::new(conn)));
                    if let Some(old) = previous {
                        tracing::debug!("Replaced existing session for '{}'", device.name);
                        close_shared(old).await;
                    }
                    tracing::info!("Connected to router '{}' at {}", device.name, device.api_address());
                    return Ok(());
                }
                Err(e) => {
                    self.record_error(device.id).await;
                    tracing::debug!("Connection attempt to '{}' failed: {}", device.name, e);
                    if matches!(e, AppError::Auth(_) | AppError::Unsupported(_)) {
                        return Err(e);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::NotConnected(format!("No connection attempt made to '{}'", device.name))
        }))
    }

    async fn establish(device: &RouterDevice) -> Result<RouterOsConnection> {
        if !device.use_api {
            return Err(AppError::Unsupported(format!(
                "Router '{}' does not have the RouterOS API enabled",
                device.name
            )));
        }
        if device.use_ssl {
            return Err(AppError::Unsupported(
                "API-SSL sessions are not available; use the plain API port".to_string(),
            ));
        }

        let mut conn = RouterOsConnection::connect(&device.api_address()).await?;
        tracing::trace!("Connection established, attempting login");
        conn.login(&device.username, &device.password).await?;
        Ok(conn)
    }

    /// Drops the session for `id`, if any
    pub(super) async fn close(&self, id: RouterId) {
        let removed = self.sessions.lock().await.remove(&id);
        if let Some(conn) = removed {
            tracing::debug!("Closing session for router {}", id);
            close_shared(conn).await;
        }
    }

    pub(super) async fn is_open(&self, id: RouterId) -> bool {
        self.sessions.lock().await.contains_key(&id)
    }

    /// Runs one command on the router's session
    ///
    /// A transport failure drops the session, so later calls fail fast with
    /// `NotConnected` until the router is connected again.
    pub(super) async fn run(
        &self,
        device: &RouterDevice,
        path: &str,
        args: &[String],
    ) -> Result<Vec<Sentence>> {
        let session = self
            .sessions
            .lock()
            .await
            .get(&device.id)
            .cloned()
            .ok_or_else(|| AppError::NotConnected(device.name.clone()))?;

        let result = session.lock().await.command(path, args).await;

        match &result {
            Ok(_) => self.record_success(device.id).await,
            Err(e) => {
                self.record_error(device.id).await;
                if e.is_session_lost() {
                    tracing::debug!("Session for '{}' lost: {}", device.name, e);
                    let mut sessions = self.sessions.lock().await;
                    // a reconnect may already have replaced it
                    if sessions
                        .get(&device.id)
                        .is_some_and(|current| Arc::ptr_eq(current, &session))
                    {
                        sessions.remove(&device.id);
                    }
                }
            }
        }
        result
    }

    async fn record_success(&self, id: RouterId) {
        let mut states = self.connection_states.lock().await;
        states.entry(id).or_default().record_success();
    }

    async fn record_error(&self, id: RouterId) {
        let mut states = self.connection_states.lock().await;
        states.entry(id).or_default().record_error();
    }

    /// Health of the router's session, if anything was attempted yet
    pub async fn connection_health(&self, id: RouterId) -> Option<ConnectionHealth> {
        let states = self.connection_states.lock().await;
        states.get(&id).map(ConnectionState::health)
    }

    /// Forgets health bookkeeping of a removed router
    pub(super) async fn forget(&self, id: RouterId) {
        self.connection_states.lock().await.remove(&id);
    }

    /// Number of open sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

async fn close_shared(conn: SharedConnection) {
    // if a command still holds it, the stream closes when that command finishes
    if let Ok(mutex) = Arc::try_unwrap(conn) {
        mutex.into_inner().close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetryPolicy, RouterConfig};

    fn device(id: u32) -> RouterDevice {
        let mut d = RouterDevice::new(&RouterConfig::new("r", "127.0.0.1", "admin", ""));
        d.id = RouterId(id);
        d
    }

    fn health(consecutive_errors: u32) -> Option<ConnectionHealth> {
        Some(ConnectionHealth {
            consecutive_errors,
            last_success: None,
        })
    }

    #[test]
    fn test_connection_state_default() {
        let state = ConnectionState::default();
        assert_eq!(state.health(), ConnectionHealth::default());
    }

    #[test]
    fn test_connection_state_record_success_resets_errors() {
        let mut state = ConnectionState::default();
        state.consecutive_errors = 5;

        state.record_success();

        let health = state.health();
        assert_eq!(health.consecutive_errors, 0);
        assert!(health.last_success.is_some_and(|secs| secs > 0));
    }

    #[test]
    fn test_connection_state_record_error_keeps_last_success() {
        let mut state = ConnectionState::default();
        state.record_success();

        state.record_error();
        state.record_error();

        let health = state.health();
        assert_eq!(health.consecutive_errors, 2);
        assert!(health.last_success.is_some());
    }

    #[tokio::test]
    async fn test_run_without_session_is_not_connected() {
        let manager = SessionManager::default();
        let err = manager
            .run(&device(1), "/system/resource/print", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotConnected(_)));
        assert_eq!(manager.connection_health(RouterId(1)).await, None);
    }

    #[tokio::test]
    async fn test_open_rejects_ssl_without_retrying() {
        let manager = SessionManager::new(RetrySettings {
            policy: RetryPolicy::Fixed,
            count: 5,
            delay_ms: 10_000,
        });
        let mut d = device(2);
        d.use_ssl = true;

        let err = manager.open(&d).await.unwrap_err();

        assert!(matches!(err, AppError::Unsupported(_)));
        assert_eq!(manager.connection_health(RouterId(2)).await, health(1));
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_open_refused_counts_every_attempt() {
        // bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let manager = SessionManager::new(RetrySettings {
            policy: RetryPolicy::Fixed,
            count: 2,
            delay_ms: 1,
        });
        let mut d = device(3);
        d.api_port = port;

        assert!(manager.open(&d).await.is_err());
        assert_eq!(manager.connection_health(RouterId(3)).await, health(3));
        assert!(!manager.is_open(RouterId(3)).await);
    }

    #[tokio::test]
    async fn test_close_and_forget_unknown_router() {
        let manager = SessionManager::default();
        manager.close(RouterId(9)).await;
        manager.forget(RouterId(9)).await;
        assert_eq!(manager.session_count().await, 0);
    }
}
