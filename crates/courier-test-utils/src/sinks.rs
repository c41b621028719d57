// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound sinks for lifecycle tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::traits::hooks::InboundSink;
use courier_core::traits::transport::TransportHandle;
use courier_core::types::{InboundEvent, TenantId};

/// Sink that drops every event.
pub struct NoopSink;

#[async_trait]
impl InboundSink for NoopSink {
    async fn deliver(
        &self,
        _tenant: &TenantId,
        _handle: Arc<dyn TransportHandle>,
        _event: InboundEvent,
    ) {
    }
}

/// Sink that collects delivered events for assertions.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<(String, InboundEvent)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// (tenant id, event) pairs in delivery order.
    pub async fn events(&self) -> Vec<(String, InboundEvent)> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl InboundSink for CollectingSink {
    async fn deliver(
        &self,
        tenant: &TenantId,
        _handle: Arc<dyn TransportHandle>,
        event: InboundEvent,
    ) {
        self.events.lock().await.push((tenant.0.clone(), event));
    }
}
