// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document-store collaborator trait.
//!
//! A typed facade over the platform's document store: point reads, partial
//! merges, and live change-feed subscriptions. The production backend is
//! external to this workspace; `courier-store` ships an in-memory reference
//! implementation for the dev server and tests.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::CourierError;
use crate::types::{
    CampaignChange, CampaignPatch, ChangeBatch, ChannelSettings, ChannelStatePatch, Contact,
    MessagePatch, NewMessage, NewThread, QueuedChange, TenantId, Thread, WebhookIntegration,
};

/// A lazy, infinite sequence of change batches from a feed subscription.
pub type ChangeStream<T> = Pin<Box<dyn Stream<Item = ChangeBatch<T>> + Send>>;

/// Persistence collaborator for tenant channel state, inbox, campaigns,
/// and queued outbound messages.
#[async_trait]
pub trait Store: Send + Sync {
    // --- channel state ---

    /// Merges a partial update into the tenant's channel-state document.
    async fn merge_channel_state(
        &self,
        tenant: &TenantId,
        patch: ChannelStatePatch,
    ) -> Result<(), CourierError>;

    /// Reads the tenant's channel settings (auto-reply flag).
    async fn channel_settings(&self, tenant: &TenantId) -> Result<ChannelSettings, CourierError>;

    /// Lists tenants whose persisted channel status is `connected`.
    ///
    /// Used at startup to restore sessions that were live before a restart.
    async fn connected_tenants(&self) -> Result<Vec<TenantId>, CourierError>;

    // --- contacts ---

    /// Lists all contacts of a tenant.
    async fn contacts(&self, tenant: &TenantId) -> Result<Vec<Contact>, CourierError>;

    // --- inbox threads ---

    /// Finds the inbox thread for a contact phone, if one exists.
    async fn find_thread_by_phone(
        &self,
        tenant: &TenantId,
        phone: &str,
    ) -> Result<Option<Thread>, CourierError>;

    /// Creates a new inbox thread and returns its id.
    async fn create_thread(
        &self,
        tenant: &TenantId,
        thread: NewThread,
    ) -> Result<String, CourierError>;

    /// Updates a thread's preview and timestamps, optionally bumping the
    /// unread counter.
    async fn touch_thread(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        preview: &str,
        increment_unread: bool,
    ) -> Result<(), CourierError>;

    /// Point-reads a thread by id.
    async fn thread(
        &self,
        tenant: &TenantId,
        thread_id: &str,
    ) -> Result<Option<Thread>, CourierError>;

    // --- inbox messages ---

    /// Returns true if the thread already holds a record with this provider
    /// message id. Guards the idempotent insert.
    async fn message_exists(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        provider_message_id: &str,
    ) -> Result<bool, CourierError>;

    /// Appends a message record to a thread and returns its id.
    async fn append_message(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message: NewMessage,
    ) -> Result<String, CourierError>;

    /// Merges a partial update into a message record.
    async fn update_message(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message_id: &str,
        patch: MessagePatch,
    ) -> Result<(), CourierError>;

    /// Atomically moves a message from `pending` to `sending`.
    ///
    /// Returns false when the message is no longer pending; the caller must
    /// not dispatch it.
    async fn mark_message_sending(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message_id: &str,
    ) -> Result<bool, CourierError>;

    /// Lists a tenant's self-authored messages still in `pending`.
    async fn pending_messages(&self, tenant: &TenantId)
    -> Result<Vec<QueuedChange>, CourierError>;

    /// Subscribes to self-authored messages entering `pending`.
    async fn watch_pending_messages(&self) -> ChangeStream<QueuedChange>;

    // --- campaigns ---

    /// Merges a partial update into a campaign record.
    async fn update_campaign(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        patch: CampaignPatch,
    ) -> Result<(), CourierError>;

    /// Atomically moves a campaign from `pending`/`scheduled` to `running`.
    ///
    /// Returns false when the campaign already left those states; the losing
    /// racer must not execute it. This write is the mutual-exclusion gate
    /// against duplicate concurrent execution.
    async fn mark_campaign_running(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Result<bool, CourierError>;

    /// Subscribes to campaigns entering `pending` or `scheduled`.
    async fn watch_campaigns(&self) -> ChangeStream<CampaignChange>;

    // --- integrations ---

    /// Lists the tenant's connected webhook integrations.
    async fn webhook_integrations(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<WebhookIntegration>, CourierError>;
}
