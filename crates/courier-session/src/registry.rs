// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory registry of per-tenant session state.
//!
//! The registry is the single source of truth for "is tenant X connected".
//! All three partitions (handle, status, retry counter) are keyed by tenant
//! id; every access is partition-scoped, so no cross-tenant coordination
//! exists anywhere in the gateway.

use std::sync::Arc;

use dashmap::DashMap;

use courier_core::traits::transport::TransportHandle;
use courier_core::types::{SessionStatus, TenantId};

/// Maps tenant ids to their live transport handle, lifecycle status, and
/// retry counter.
///
/// Invariant: a tenant id maps to at most one live handle at any instant.
/// The handle is removed when the transport closes; the status outlives it.
#[derive(Default)]
pub struct SessionRegistry {
    handles: DashMap<String, Arc<dyn TransportHandle>>,
    statuses: DashMap<String, SessionStatus>,
    retries: DashMap<String, u32>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tenant's live handle, regardless of status.
    pub fn handle(&self, tenant: &TenantId) -> Option<Arc<dyn TransportHandle>> {
        self.handles.get(&tenant.0).map(|h| Arc::clone(&h))
    }

    /// The tenant's handle, only while the session is `connected`.
    pub fn connected_handle(&self, tenant: &TenantId) -> Option<Arc<dyn TransportHandle>> {
        (self.status(tenant) == SessionStatus::Connected)
            .then(|| self.handle(tenant))
            .flatten()
    }

    pub fn has_handle(&self, tenant: &TenantId) -> bool {
        self.handles.contains_key(&tenant.0)
    }

    pub fn set_handle(&self, tenant: &TenantId, handle: Arc<dyn TransportHandle>) {
        self.handles.insert(tenant.0.clone(), handle);
    }

    pub fn remove_handle(&self, tenant: &TenantId) -> Option<Arc<dyn TransportHandle>> {
        self.handles.remove(&tenant.0).map(|(_, h)| h)
    }

    /// Current lifecycle status; `not_started` for unknown tenants.
    pub fn status(&self, tenant: &TenantId) -> SessionStatus {
        self.statuses
            .get(&tenant.0)
            .map(|s| *s)
            .unwrap_or(SessionStatus::NotStarted)
    }

    pub fn set_status(&self, tenant: &TenantId, status: SessionStatus) {
        self.statuses.insert(tenant.0.clone(), status);
    }

    /// Automatic reconnect attempts in the current failure episode.
    pub fn retry_count(&self, tenant: &TenantId) -> u32 {
        self.retries.get(&tenant.0).map(|r| *r).unwrap_or(0)
    }

    pub fn set_retry_count(&self, tenant: &TenantId, count: u32) {
        self.retries.insert(tenant.0.clone(), count);
    }

    /// Snapshot of all live handles, for shutdown teardown.
    pub fn live_handles(&self) -> Vec<(TenantId, Arc<dyn TransportHandle>)> {
        self.handles
            .iter()
            .map(|entry| (TenantId(entry.key().clone()), Arc::clone(entry.value())))
            .collect()
    }

    /// Number of live handles across all tenants.
    pub fn live_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use courier_core::error::CourierError;
    use courier_core::types::{InboundEvent, SendPayload, SendReceipt};

    struct DummyHandle;

    #[async_trait]
    impl TransportHandle for DummyHandle {
        async fn send(
            &self,
            _address: &str,
            _payload: &SendPayload,
        ) -> Result<SendReceipt, CourierError> {
            Ok(SendReceipt {
                provider_message_id: "x".into(),
            })
        }

        async fn download_media(&self, _event: &InboundEvent) -> Result<Vec<u8>, CourierError> {
            Ok(Vec::new())
        }

        async fn end(&self) {}

        async fn logout(&self) -> Result<(), CourierError> {
            Ok(())
        }
    }

    #[test]
    fn unknown_tenant_defaults() {
        let registry = SessionRegistry::new();
        let tenant = TenantId::from("t1");
        assert_eq!(registry.status(&tenant), SessionStatus::NotStarted);
        assert_eq!(registry.retry_count(&tenant), 0);
        assert!(registry.handle(&tenant).is_none());
    }

    #[test]
    fn connected_handle_requires_connected_status() {
        let registry = SessionRegistry::new();
        let tenant = TenantId::from("t1");
        registry.set_handle(&tenant, Arc::new(DummyHandle));

        registry.set_status(&tenant, SessionStatus::Connecting);
        assert!(registry.connected_handle(&tenant).is_none());

        registry.set_status(&tenant, SessionStatus::Connected);
        assert!(registry.connected_handle(&tenant).is_some());
    }

    #[test]
    fn status_survives_handle_removal() {
        let registry = SessionRegistry::new();
        let tenant = TenantId::from("t1");
        registry.set_handle(&tenant, Arc::new(DummyHandle));
        registry.set_status(&tenant, SessionStatus::Connected);

        registry.remove_handle(&tenant);
        assert!(registry.handle(&tenant).is_none());
        assert_eq!(registry.status(&tenant), SessionStatus::Connected);
    }
}
