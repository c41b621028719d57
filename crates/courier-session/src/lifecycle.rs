// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant connection lifecycle state machine.
//!
//! States: `idle -> connecting -> {qr_ready, connected}`;
//! `connected -> closed(reason)`; a logged-out or unauthorized close is
//! terminal (credentials wiped); any other close schedules exactly one retry
//! with exponential backoff until the attempt cap, after which the tenant
//! stays `disconnected` until an operator restart.
//!
//! Every transition for one tenant runs on that tenant's single event pump
//! task, so transitions are serialized without locks. Tenants are fully
//! independent partitions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use courier_config::model::SessionConfig;
use courier_core::error::CourierError;
use courier_core::traits::hooks::{ConnectivityListener, InboundSink};
use courier_core::traits::store::Store;
use courier_core::traits::transport::{Transport, TransportSession};
use courier_core::types::{
    ChannelStatePatch, ConnectionUpdate, SessionStatus, TenantId, TransportEvent,
};

use crate::registry::SessionRegistry;

/// Backoff delay for the given 0-indexed attempt: `min(initial * 2^n, max)`.
pub fn backoff_delay(initial_ms: u64, max_ms: u64, attempts: u32) -> Duration {
    let factor = 2u64.saturating_pow(attempts);
    Duration::from_millis(initial_ms.saturating_mul(factor).min(max_ms))
}

/// Drives the connection lifecycle of every tenant session.
///
/// All mutation of the [`SessionRegistry`] happens here; the executors only
/// read it. Message events are forwarded to the injected [`InboundSink`],
/// and `connected` transitions are announced to [`ConnectivityListener`]s.
pub struct SessionManager {
    registry: Arc<SessionRegistry>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn Store>,
    sink: Arc<dyn InboundSink>,
    listeners: Vec<Arc<dyn ConnectivityListener>>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        registry: Arc<SessionRegistry>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn Store>,
        sink: Arc<dyn InboundSink>,
        config: SessionConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            store,
            sink,
            listeners: Vec::new(),
            config,
        }
    }

    /// Registers a listener for `connected` transitions.
    ///
    /// Must be called before the manager is shared behind an `Arc`.
    pub fn add_connectivity_listener(&mut self, listener: Arc<dyn ConnectivityListener>) {
        self.listeners.push(listener);
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    fn retry_delay(&self, attempts: u32) -> Duration {
        backoff_delay(
            self.config.initial_retry_delay_ms,
            self.config.max_retry_delay_ms,
            attempts,
        )
    }

    /// Starts (or resumes) a tenant session.
    ///
    /// No-op when a handle already exists or a connect is in flight. When the
    /// retry counter has passed the cap, refuses without attempting a
    /// connection and persists the terminal condition instead. Preserves the
    /// retry counter: operator entry points reset it via [`operator_start`]
    /// or [`force_reconnect`](Self::force_reconnect).
    ///
    /// [`operator_start`]: Self::operator_start
    pub async fn start(self: &Arc<Self>, tenant: &TenantId) -> Result<(), CourierError> {
        if self.registry.has_handle(tenant) {
            debug!(tenant = %tenant, "session already has a live handle");
            return Ok(());
        }
        if self.registry.status(tenant) == SessionStatus::Connecting {
            debug!(tenant = %tenant, "session already connecting");
            return Ok(());
        }

        let retries = self.registry.retry_count(tenant);
        if retries > self.config.max_retry_attempts {
            warn!(tenant = %tenant, retries, "max retries exceeded, refusing to start");
            self.merge_state(
                tenant,
                ChannelStatePatch {
                    status: Some(SessionStatus::Disconnected),
                    qr: Some(None),
                    error: Some(Some("max retries exceeded".to_string())),
                    ..Default::default()
                },
            )
            .await;
            return Ok(());
        }

        info!(tenant = %tenant, attempt = retries + 1, "starting session");
        self.registry.set_status(tenant, SessionStatus::Connecting);

        match self.transport.connect(tenant).await {
            Ok(session) => {
                self.registry.set_handle(tenant, Arc::clone(&session.handle));
                self.spawn_pump(tenant.clone(), session);
                Ok(())
            }
            Err(e) => {
                error!(tenant = %tenant, error = %e, "failed to start session");
                self.registry.remove_handle(tenant);
                self.registry.set_status(tenant, SessionStatus::Error);
                self.merge_state(
                    tenant,
                    ChannelStatePatch {
                        status: Some(SessionStatus::Error),
                        error: Some(Some(e.to_string())),
                        ..Default::default()
                    },
                )
                .await;
                Ok(())
            }
        }
    }

    /// Operator-initiated start: resets the retry counter first.
    ///
    /// Returns false when the tenant was already connected (nothing to do).
    pub async fn operator_start(self: &Arc<Self>, tenant: &TenantId) -> Result<bool, CourierError> {
        if self.registry.has_handle(tenant)
            && self.registry.status(tenant) == SessionStatus::Connected
        {
            return Ok(false);
        }
        self.registry.set_retry_count(tenant, 0);
        self.start(tenant).await?;
        Ok(true)
    }

    /// Terminates the tenant's session and wipes its credentials. Idempotent.
    ///
    /// The retry counter is forced past the cap before teardown so any
    /// in-flight auto-retry fast-fails instead of resurrecting the session.
    pub async fn disconnect(&self, tenant: &TenantId) -> Result<(), CourierError> {
        info!(tenant = %tenant, "manual disconnect requested");

        self.registry
            .set_retry_count(tenant, self.config.max_retry_attempts + 1);
        self.registry.set_status(tenant, SessionStatus::Disconnected);

        if let Some(handle) = self.registry.remove_handle(tenant) {
            handle.end().await;
            if let Err(e) = handle.logout().await {
                debug!(tenant = %tenant, error = %e, "best-effort logout failed");
            }
        }

        if let Err(e) = self.transport.clear_credentials(tenant).await {
            warn!(tenant = %tenant, error = %e, "failed to clear credentials");
        }

        self.store
            .merge_channel_state(
                tenant,
                ChannelStatePatch {
                    status: Some(SessionStatus::Disconnected),
                    qr: Some(None),
                    connected_at: Some(None),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Tears down the current transport without touching credentials and
    /// immediately reconnects with a fresh retry budget.
    pub async fn force_reconnect(self: &Arc<Self>, tenant: &TenantId) -> Result<(), CourierError> {
        info!(tenant = %tenant, "force reconnect requested");
        if let Some(handle) = self.registry.remove_handle(tenant) {
            handle.end().await;
        }
        self.registry.set_retry_count(tenant, 0);
        self.registry.set_status(tenant, SessionStatus::Reconnecting);
        self.start(tenant).await
    }

    /// Restores sessions that were connected before the last restart.
    ///
    /// Returns the number of tenants for which a start was issued.
    pub async fn restore_sessions(self: &Arc<Self>) -> Result<usize, CourierError> {
        let tenants = self.store.connected_tenants().await?;
        let stagger = Duration::from_millis(self.config.restore_stagger_ms);
        let mut started = 0;
        for tenant in tenants {
            info!(tenant = %tenant, "restoring session");
            self.registry.set_retry_count(&tenant, 0);
            self.start(&tenant).await?;
            started += 1;
            tokio::time::sleep(stagger).await;
        }
        Ok(started)
    }

    /// Ends every live transport handle. Called on process shutdown.
    pub async fn shutdown(&self) {
        for (tenant, handle) in self.registry.live_handles() {
            debug!(tenant = %tenant, "ending session for shutdown");
            handle.end().await;
        }
    }

    fn spawn_pump(self: &Arc<Self>, tenant: TenantId, session: TransportSession) {
        let manager = Arc::clone(self);
        let TransportSession { handle, mut events } = session;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    TransportEvent::Connection(update) => {
                        let closed = matches!(update, ConnectionUpdate::Closed(_));
                        manager.handle_connection_update(&tenant, update).await;
                        if closed {
                            break;
                        }
                    }
                    TransportEvent::Message(event) => {
                        manager
                            .sink
                            .deliver(&tenant, Arc::clone(&handle), *event)
                            .await;
                    }
                }
            }
            debug!(tenant = %tenant, "session event pump ended");
        });
    }

    async fn handle_connection_update(
        self: &Arc<Self>,
        tenant: &TenantId,
        update: ConnectionUpdate,
    ) {
        match update {
            ConnectionUpdate::QrCode(code) => {
                info!(tenant = %tenant, "pairing code generated");
                self.registry.set_status(tenant, SessionStatus::QrReady);
                self.merge_state(
                    tenant,
                    ChannelStatePatch {
                        status: Some(SessionStatus::QrReady),
                        qr: Some(Some(code)),
                        ..Default::default()
                    },
                )
                .await;
            }
            ConnectionUpdate::Open => {
                info!(tenant = %tenant, "session connected");
                self.registry.set_status(tenant, SessionStatus::Connected);
                self.registry.set_retry_count(tenant, 0);
                self.merge_state(
                    tenant,
                    ChannelStatePatch {
                        status: Some(SessionStatus::Connected),
                        qr: Some(None),
                        error: Some(None),
                        connected_at: Some(Some(Utc::now())),
                        retry_count: Some(0),
                    },
                )
                .await;
                for listener in &self.listeners {
                    listener.tenant_connected(tenant).await;
                }
            }
            ConnectionUpdate::Closed(reason) => {
                self.registry.remove_handle(tenant);
                warn!(tenant = %tenant, reason = %reason, "connection closed");

                if reason.is_fatal() {
                    // Credentials can never be reused after a logout;
                    // the tenant must re-pair from scratch.
                    self.registry.set_status(tenant, SessionStatus::LoggedOut);
                    self.registry
                        .set_retry_count(tenant, self.config.max_retry_attempts + 1);
                    if let Err(e) = self.transport.clear_credentials(tenant).await {
                        warn!(tenant = %tenant, error = %e, "failed to clear credentials");
                    }
                    self.merge_state(
                        tenant,
                        ChannelStatePatch {
                            status: Some(SessionStatus::LoggedOut),
                            qr: Some(None),
                            error: Some(Some(reason.to_string())),
                            ..Default::default()
                        },
                    )
                    .await;
                    return;
                }

                let retries = self.registry.retry_count(tenant);
                if retries < self.config.max_retry_attempts {
                    let delay = self.retry_delay(retries);
                    info!(
                        tenant = %tenant,
                        delay_ms = delay.as_millis() as u64,
                        attempt = retries + 1,
                        "scheduling reconnect"
                    );
                    self.registry.set_status(tenant, SessionStatus::Reconnecting);
                    self.registry.set_retry_count(tenant, retries + 1);
                    self.merge_state(
                        tenant,
                        ChannelStatePatch {
                            status: Some(SessionStatus::Reconnecting),
                            retry_count: Some(retries + 1),
                            ..Default::default()
                        },
                    )
                    .await;

                    let manager = Arc::clone(self);
                    let tenant = tenant.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        if let Err(e) = manager.start(&tenant).await {
                            error!(tenant = %tenant, error = %e, "scheduled reconnect failed");
                        }
                    });
                } else {
                    warn!(tenant = %tenant, retries, "retry budget exhausted");
                    self.registry.set_status(tenant, SessionStatus::Disconnected);
                    self.merge_state(
                        tenant,
                        ChannelStatePatch {
                            status: Some(SessionStatus::Disconnected),
                            error: Some(Some("connection lost".to_string())),
                            ..Default::default()
                        },
                    )
                    .await;
                }
            }
        }
    }

    /// Persist a channel-state merge; store failures are logged, never
    /// propagated into the state machine.
    async fn merge_state(&self, tenant: &TenantId, patch: ChannelStatePatch) {
        if let Err(e) = self.store.merge_channel_state(tenant, patch).await {
            error!(tenant = %tenant, error = %e, "channel state persist failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_initial() {
        assert_eq!(backoff_delay(2000, 60_000, 0), Duration::from_millis(2000));
        assert_eq!(backoff_delay(2000, 60_000, 1), Duration::from_millis(4000));
        assert_eq!(backoff_delay(2000, 60_000, 2), Duration::from_millis(8000));
        assert_eq!(backoff_delay(2000, 60_000, 3), Duration::from_millis(16_000));
        assert_eq!(backoff_delay(2000, 60_000, 4), Duration::from_millis(32_000));
    }

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(backoff_delay(2000, 60_000, 5), Duration::from_millis(60_000));
        assert_eq!(backoff_delay(2000, 60_000, 10), Duration::from_millis(60_000));
        // Large attempt counts must not overflow.
        assert_eq!(backoff_delay(2000, 60_000, 64), Duration::from_millis(60_000));
    }
}
