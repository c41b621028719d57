// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loopback development adapters.
//!
//! The real wire protocol and object storage live outside this workspace.
//! These adapters make `courier serve` runnable on a laptop: the transport
//! connects instantly and acknowledges every send; the media store hands
//! back deterministic URLs without persisting anything.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

use courier_core::error::CourierError;
use courier_core::traits::media::ObjectStorage;
use courier_core::traits::transport::{Transport, TransportHandle, TransportSession};
use courier_core::types::{
    ConnectionUpdate, InboundEvent, SendPayload, SendReceipt, TenantId, TransportEvent,
};

/// Transport that connects instantly and acknowledges every send.
pub struct LoopbackTransport;

struct LoopbackHandle {
    tenant: TenantId,
    counter: AtomicU64,
}

#[async_trait]
impl TransportHandle for LoopbackHandle {
    async fn send(
        &self,
        address: &str,
        payload: &SendPayload,
    ) -> Result<SendReceipt, CourierError> {
        let id = format!(
            "loopback-{}-{}",
            self.tenant,
            self.counter.fetch_add(1, Ordering::SeqCst) + 1
        );
        match payload {
            SendPayload::Text { body } => {
                debug!(tenant = %self.tenant, address, chars = body.len(), "loopback text send");
            }
            SendPayload::Media { kind, url, .. } => {
                debug!(tenant = %self.tenant, address, kind = %kind, url, "loopback media send");
            }
        }
        Ok(SendReceipt {
            provider_message_id: id,
        })
    }

    async fn download_media(&self, _event: &InboundEvent) -> Result<Vec<u8>, CourierError> {
        Err(CourierError::transport("loopback transport carries no media"))
    }

    async fn end(&self) {
        debug!(tenant = %self.tenant, "loopback session ended");
    }

    async fn logout(&self) -> Result<(), CourierError> {
        Ok(())
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn connect(&self, tenant: &TenantId) -> Result<TransportSession, CourierError> {
        let (tx, rx) = mpsc::channel(64);
        let _ = tx
            .send(TransportEvent::Connection(ConnectionUpdate::Open))
            .await;
        info!(tenant = %tenant, "loopback transport connected");
        Ok(TransportSession {
            handle: Arc::new(LoopbackHandle {
                tenant: tenant.clone(),
                counter: AtomicU64::new(0),
            }),
            events: rx,
        })
    }

    async fn clear_credentials(&self, tenant: &TenantId) -> Result<(), CourierError> {
        debug!(tenant = %tenant, "loopback credentials cleared");
        Ok(())
    }
}

/// Media store that returns deterministic URLs without persisting bytes.
pub struct LoopbackMediaStore;

#[async_trait]
impl ObjectStorage for LoopbackMediaStore {
    async fn upload(
        &self,
        tenant: &TenantId,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, CourierError> {
        debug!(
            tenant = %tenant,
            file_name,
            mime_type,
            bytes = bytes.len(),
            "loopback media upload"
        );
        Ok(format!("https://media.localhost/{tenant}/{file_name}"))
    }
}
