// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Seams between the lifecycle manager and the event-processing subsystems.

use std::sync::Arc;

use async_trait::async_trait;

use crate::traits::transport::TransportHandle;
use crate::types::{InboundEvent, TenantId};

/// Receives inbound message events from a tenant's session pump.
///
/// Delivery is fire-and-forget from the pump's perspective: implementations
/// own their error handling and must never propagate failures back into the
/// lifecycle manager.
#[async_trait]
pub trait InboundSink: Send + Sync {
    async fn deliver(
        &self,
        tenant: &TenantId,
        handle: Arc<dyn TransportHandle>,
        event: InboundEvent,
    );
}

/// Notified when a tenant's session reaches `connected`.
///
/// Used by the pending-message dispatcher to resume queued sends that were
/// skipped while the tenant was offline.
#[async_trait]
pub trait ConnectivityListener: Send + Sync {
    async fn tenant_connected(&self, tenant: &TenantId);
}
