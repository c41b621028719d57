// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport for deterministic lifecycle and dispatch testing.
//!
//! `MockTransport` implements [`Transport`] with per-tenant connect
//! counting, connect failure injection, and a [`SessionControl`] per
//! connect through which tests script connection updates and inbound
//! events. `MockTransportHandle` captures sends and supports per-address
//! failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use courier_core::error::CourierError;
use courier_core::traits::transport::{Transport, TransportHandle, TransportSession};
use courier_core::types::{
    CloseReason, ConnectionUpdate, InboundEvent, SendPayload, SendReceipt, TenantId,
    TransportEvent,
};

/// A captured outbound send.
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub address: String,
    pub payload: SendPayload,
    pub provider_message_id: String,
}

/// Mock handle capturing sends and serving canned media downloads.
pub struct MockTransportHandle {
    sent: Mutex<Vec<SentRecord>>,
    fail_addresses: Mutex<HashSet<String>>,
    fail_all: Mutex<bool>,
    counter: AtomicU64,
    ended: Mutex<bool>,
    logged_out: Mutex<bool>,
    media: Mutex<HashMap<String, Vec<u8>>>,
}

impl MockTransportHandle {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_addresses: Mutex::new(HashSet::new()),
            fail_all: Mutex::new(false),
            counter: AtomicU64::new(0),
            ended: Mutex::new(false),
            logged_out: Mutex::new(false),
            media: Mutex::new(HashMap::new()),
        }
    }

    /// All sends captured so far, in order.
    pub async fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Makes every send to `address` fail.
    pub async fn fail_address(&self, address: &str) {
        self.fail_addresses.lock().await.insert(address.to_string());
    }

    /// Makes every send fail.
    pub async fn fail_all_sends(&self) {
        *self.fail_all.lock().await = true;
    }

    /// Registers media bytes served for an event's provider message id.
    pub async fn set_media(&self, provider_message_id: &str, bytes: Vec<u8>) {
        self.media
            .lock()
            .await
            .insert(provider_message_id.to_string(), bytes);
    }

    pub async fn was_ended(&self) -> bool {
        *self.ended.lock().await
    }

    pub async fn was_logged_out(&self) -> bool {
        *self.logged_out.lock().await
    }
}

impl Default for MockTransportHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportHandle for MockTransportHandle {
    async fn send(
        &self,
        address: &str,
        payload: &SendPayload,
    ) -> Result<SendReceipt, CourierError> {
        if *self.fail_all.lock().await || self.fail_addresses.lock().await.contains(address) {
            return Err(CourierError::transport(format!("send to {address} failed")));
        }
        let id = format!("mock-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        self.sent.lock().await.push(SentRecord {
            address: address.to_string(),
            payload: payload.clone(),
            provider_message_id: id.clone(),
        });
        Ok(SendReceipt {
            provider_message_id: id,
        })
    }

    async fn download_media(&self, event: &InboundEvent) -> Result<Vec<u8>, CourierError> {
        self.media
            .lock()
            .await
            .get(&event.provider_message_id)
            .cloned()
            .ok_or_else(|| CourierError::transport("no media registered for event"))
    }

    async fn end(&self) {
        *self.ended.lock().await = true;
    }

    async fn logout(&self) -> Result<(), CourierError> {
        *self.logged_out.lock().await = true;
        Ok(())
    }
}

/// Scripting surface for one mock connect: the handle plus an event
/// injector feeding the session's pump.
#[derive(Clone)]
pub struct SessionControl {
    pub handle: Arc<MockTransportHandle>,
    events: mpsc::Sender<TransportEvent>,
}

impl SessionControl {
    pub async fn emit(&self, event: TransportEvent) {
        let _ = self.events.send(event).await;
    }

    pub async fn open(&self) {
        self.emit(TransportEvent::Connection(ConnectionUpdate::Open))
            .await;
    }

    pub async fn qr(&self, code: &str) {
        self.emit(TransportEvent::Connection(ConnectionUpdate::QrCode(
            code.to_string(),
        )))
        .await;
    }

    pub async fn close(&self, reason: CloseReason) {
        self.emit(TransportEvent::Connection(ConnectionUpdate::Closed(reason)))
            .await;
    }

    pub async fn message(&self, event: InboundEvent) {
        self.emit(TransportEvent::Message(Box::new(event))).await;
    }
}

#[derive(Default)]
struct TransportState {
    connects: HashMap<String, u32>,
    fail_connects: HashMap<String, u32>,
    controls: HashMap<String, Vec<SessionControl>>,
    cleared: Vec<String>,
}

/// Mock transport connector.
pub struct MockTransport {
    state: Mutex<TransportState>,
    auto_open: bool,
}

impl MockTransport {
    /// Connects stay silent until the test scripts events via
    /// [`SessionControl`].
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TransportState::default()),
            auto_open: false,
        }
    }

    /// Every connect immediately emits an `Open` connection update.
    pub fn auto_opening() -> Self {
        Self {
            state: Mutex::new(TransportState::default()),
            auto_open: true,
        }
    }

    /// Number of connects issued for this tenant.
    pub async fn connect_count(&self, tenant: &TenantId) -> u32 {
        self.state
            .lock()
            .await
            .connects
            .get(tenant.as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Makes the next `n` connects for this tenant fail.
    pub async fn fail_next_connects(&self, tenant: &TenantId, n: u32) {
        self.state
            .lock()
            .await
            .fail_connects
            .insert(tenant.0.clone(), n);
    }

    /// Scripting control for the most recent connect of this tenant.
    pub async fn session(&self, tenant: &TenantId) -> Option<SessionControl> {
        self.state
            .lock()
            .await
            .controls
            .get(tenant.as_str())
            .and_then(|c| c.last().cloned())
    }

    /// How many times credentials were cleared for this tenant.
    pub async fn cleared_count(&self, tenant: &TenantId) -> usize {
        self.state
            .lock()
            .await
            .cleared
            .iter()
            .filter(|t| t.as_str() == tenant.as_str())
            .count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self, tenant: &TenantId) -> Result<TransportSession, CourierError> {
        let mut state = self.state.lock().await;
        *state.connects.entry(tenant.0.clone()).or_insert(0) += 1;

        if let Some(remaining) = state.fail_connects.get_mut(tenant.as_str()) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CourierError::transport("mock connect refused"));
            }
        }

        let (tx, rx) = mpsc::channel(64);
        let handle = Arc::new(MockTransportHandle::new());
        let control = SessionControl {
            handle: Arc::clone(&handle),
            events: tx.clone(),
        };
        state
            .controls
            .entry(tenant.0.clone())
            .or_default()
            .push(control);
        drop(state);

        if self.auto_open {
            let _ = tx
                .send(TransportEvent::Connection(ConnectionUpdate::Open))
                .await;
        }

        Ok(TransportSession {
            handle: handle as Arc<dyn TransportHandle>,
            events: rx,
        })
    }

    async fn clear_credentials(&self, tenant: &TenantId) -> Result<(), CourierError> {
        self.state.lock().await.cleared.push(tenant.0.clone());
        Ok(())
    }
}
