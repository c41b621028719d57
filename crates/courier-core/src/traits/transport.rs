// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging transport collaborator traits.
//!
//! The wire protocol lives outside this workspace. The orchestrator sees a
//! connector that yields an authenticated handle plus an event stream, and
//! the handle itself for sends, media downloads, and teardown.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CourierError;
use crate::types::{InboundEvent, SendPayload, SendReceipt, TenantId, TransportEvent};

/// A live, per-tenant transport session.
///
/// `events` is closed by the transport once the connection has fully closed;
/// the lifecycle manager's pump task ends with it.
pub struct TransportSession {
    pub handle: Arc<dyn TransportHandle>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Connector for the messaging network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes a connection for the tenant using its stored credentials.
    ///
    /// Missing credentials are not an error: the transport emits a
    /// [`ConnectionUpdate::QrCode`](crate::types::ConnectionUpdate) event
    /// so the operator can complete pairing out of band.
    async fn connect(&self, tenant: &TenantId) -> Result<TransportSession, CourierError>;

    /// Destroys the tenant's locally stored credentials.
    async fn clear_credentials(&self, tenant: &TenantId) -> Result<(), CourierError>;
}

/// An authenticated channel handle for one tenant.
#[async_trait]
pub trait TransportHandle: Send + Sync {
    /// Sends a payload to the given address and returns the provider receipt.
    async fn send(
        &self,
        address: &str,
        payload: &SendPayload,
    ) -> Result<SendReceipt, CourierError>;

    /// Downloads the raw media bytes attached to an inbound event.
    async fn download_media(&self, event: &InboundEvent) -> Result<Vec<u8>, CourierError>;

    /// Terminates the connection without touching credentials.
    async fn end(&self);

    /// Invalidates the session on the remote side. Best effort.
    async fn logout(&self) -> Result<(), CourierError>;
}
