// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-message dispatcher.
//!
//! Consumes the pending-message change feed and sends each self-authored
//! queued message through the tenant's connected transport. A disconnected
//! tenant leaves the message `pending`; the dispatcher also listens for
//! `connected` transitions and resumes that tenant's queue.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use courier_core::error::CourierError;
use courier_core::traits::hooks::ConnectivityListener;
use courier_core::traits::store::{ChangeStream, Store};
use courier_core::types::{
    InboxMessage, MessagePatch, MessageStatus, QueuedChange, SendPayload, TenantId,
};
use courier_session::SessionRegistry;

/// Builds the outbound payload for a queued message.
///
/// Returns `None` when the message has neither text nor media; such a
/// message is reset to `pending` as a defensive no-op.
fn build_payload(message: &InboxMessage) -> Option<SendPayload> {
    match (&message.media_url, message.media_kind) {
        (Some(url), Some(kind)) => Some(SendPayload::Media {
            kind,
            url: url.clone(),
            caption: (!message.text.is_empty()).then(|| message.text.clone()),
            file_name: None,
            mime_type: None,
        }),
        _ => (!message.text.is_empty()).then(|| SendPayload::text(message.text.clone())),
    }
}

/// Dispatches individually queued outbound messages.
pub struct PendingDispatcher {
    store: Arc<dyn Store>,
    registry: Arc<SessionRegistry>,
}

impl PendingDispatcher {
    pub fn new(store: Arc<dyn Store>, registry: Arc<SessionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Consumes the feed until it ends. Only additions are dispatched;
    /// modifications are observational.
    pub async fn run(self: Arc<Self>, mut feed: ChangeStream<QueuedChange>) {
        while let Some(batch) = feed.next().await {
            for change in batch.added {
                let dispatcher = Arc::clone(&self);
                tokio::spawn(async move {
                    dispatcher.dispatch(change).await;
                });
            }
        }
        debug!("pending message feed ended");
    }

    /// Dispatches one observed message; store failures are logged.
    pub async fn dispatch(&self, change: QueuedChange) {
        let tenant = change.tenant.clone();
        let message_id = change.message.id.clone();
        if let Err(e) = self.try_dispatch(change).await {
            error!(
                tenant = %tenant,
                message_id = %message_id,
                error = %e,
                "pending message dispatch failed"
            );
        }
    }

    async fn try_dispatch(&self, change: QueuedChange) -> Result<(), CourierError> {
        let QueuedChange {
            tenant,
            thread_id,
            message,
        } = change;

        if !message.from_me || message.status != MessageStatus::Pending {
            return Ok(());
        }

        // No connected transport: leave the message pending; it is retried
        // on the tenant's next connected transition.
        let Some(handle) = self.registry.connected_handle(&tenant) else {
            debug!(
                tenant = %tenant,
                message_id = %message.id,
                "tenant not connected, leaving message pending"
            );
            return Ok(());
        };

        // Duplicate-dispatch guard for overlapping feed deliveries.
        if !self
            .store
            .mark_message_sending(&tenant, &thread_id, &message.id)
            .await?
        {
            debug!(
                tenant = %tenant,
                message_id = %message.id,
                "message already picked up elsewhere"
            );
            return Ok(());
        }

        let Some(thread) = self.store.thread(&tenant, &thread_id).await? else {
            warn!(tenant = %tenant, thread_id = %thread_id, "thread not found for queued message");
            self.store
                .update_message(
                    &tenant,
                    &thread_id,
                    &message.id,
                    MessagePatch {
                        status: Some(MessageStatus::Failed),
                        error: Some("chat not found".to_string()),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(());
        };

        let Some(payload) = build_payload(&message) else {
            warn!(
                tenant = %tenant,
                message_id = %message.id,
                "queued message has neither text nor media, resetting"
            );
            self.store
                .update_message(
                    &tenant,
                    &thread_id,
                    &message.id,
                    MessagePatch {
                        status: Some(MessageStatus::Pending),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(());
        };

        match handle.send(&thread.contact_phone, &payload).await {
            Ok(receipt) => {
                debug!(
                    tenant = %tenant,
                    message_id = %message.id,
                    provider_id = %receipt.provider_message_id,
                    "queued message sent"
                );
                self.store
                    .update_message(
                        &tenant,
                        &thread_id,
                        &message.id,
                        MessagePatch {
                            status: Some(MessageStatus::Sent),
                            provider_message_id: Some(receipt.provider_message_id),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
            Err(e) => {
                warn!(
                    tenant = %tenant,
                    message_id = %message.id,
                    error = %e,
                    "queued message send failed"
                );
                self.store
                    .update_message(
                        &tenant,
                        &thread_id,
                        &message.id,
                        MessagePatch {
                            status: Some(MessageStatus::Failed),
                            error: Some(e.to_string()),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ConnectivityListener for PendingDispatcher {
    /// On reconnect, re-query and dispatch everything the tenant left
    /// pending while offline.
    async fn tenant_connected(&self, tenant: &TenantId) {
        match self.store.pending_messages(tenant).await {
            Ok(pending) if pending.is_empty() => {}
            Ok(pending) => {
                info!(
                    tenant = %tenant,
                    count = pending.len(),
                    "resuming queued sends after reconnect"
                );
                for change in pending {
                    self.dispatch(change).await;
                }
            }
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "failed to query pending messages");
            }
        }
    }
}
