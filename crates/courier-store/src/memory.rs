// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `MemoryStore`: tenant-partitioned maps behind one async mutex, plus
//! unbounded fan-out channels for the two change feeds.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use courier_core::error::CourierError;
use courier_core::traits::store::{ChangeStream, Store};
use courier_core::types::{
    Campaign, CampaignChange, CampaignPatch, CampaignStatus, ChangeBatch, ChannelSettings,
    ChannelStatePatch, Contact, InboxMessage, MessagePatch, MessageStatus, NewMessage, NewThread,
    QueuedChange, SessionStatus, TenantId, Thread, WebhookIntegration,
};

/// Persisted per-tenant channel-state document.
#[derive(Debug, Clone, Default)]
pub struct ChannelState {
    pub status: Option<SessionStatus>,
    pub qr: Option<String>,
    pub error: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub retry_count: Option<u32>,
}

#[derive(Default)]
struct TenantData {
    channel_state: ChannelState,
    /// Every persisted status transition, oldest first. Test observability.
    status_history: Vec<SessionStatus>,
    settings: ChannelSettings,
    contacts: Vec<Contact>,
    threads: HashMap<String, Thread>,
    /// thread id -> message records, oldest first.
    messages: HashMap<String, Vec<InboxMessage>>,
    campaigns: HashMap<String, Campaign>,
    campaign_history: HashMap<String, Vec<CampaignStatus>>,
    integrations: Vec<WebhookIntegration>,
}

#[derive(Default)]
struct Inner {
    tenants: HashMap<String, TenantData>,
}

impl Inner {
    fn tenant_mut(&mut self, tenant: &TenantId) -> &mut TenantData {
        self.tenants.entry(tenant.0.clone()).or_default()
    }

    fn tenant(&self, tenant: &TenantId) -> Option<&TenantData> {
        self.tenants.get(&tenant.0)
    }
}

/// In-memory document store with change-feed support.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    campaign_subs: Arc<Mutex<Vec<mpsc::UnboundedSender<ChangeBatch<CampaignChange>>>>>,
    pending_subs: Arc<Mutex<Vec<mpsc::UnboundedSender<ChangeBatch<QueuedChange>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // --- seed & inspection helpers (dev server and tests) ---

    /// Adds a contact to the tenant's address book.
    pub async fn insert_contact(&self, tenant: &TenantId, contact: Contact) {
        self.inner.lock().await.tenant_mut(tenant).contacts.push(contact);
    }

    /// Sets the tenant's channel settings (auto-reply flag).
    pub async fn set_channel_settings(&self, tenant: &TenantId, settings: ChannelSettings) {
        self.inner.lock().await.tenant_mut(tenant).settings = settings;
    }

    /// Registers a webhook integration for the tenant.
    pub async fn add_webhook_integration(&self, tenant: &TenantId, webhook: WebhookIntegration) {
        self.inner
            .lock()
            .await
            .tenant_mut(tenant)
            .integrations
            .push(webhook);
    }

    /// Inserts a campaign record; emits a feed observation when it enters
    /// `pending` or `scheduled`.
    pub async fn create_campaign(&self, tenant: &TenantId, campaign: Campaign) {
        let change = {
            let mut inner = self.inner.lock().await;
            let data = inner.tenant_mut(tenant);
            data.campaign_history
                .entry(campaign.id.clone())
                .or_default()
                .push(campaign.status);
            data.campaigns.insert(campaign.id.clone(), campaign.clone());
            matches!(
                campaign.status,
                CampaignStatus::Pending | CampaignStatus::Scheduled
            )
            .then(|| CampaignChange {
                tenant: tenant.clone(),
                campaign,
            })
        };
        if let Some(change) = change {
            self.emit_campaign(ChangeBatch::added(vec![change])).await;
        }
    }

    /// Point-reads a campaign record.
    pub async fn campaign(&self, tenant: &TenantId, campaign_id: &str) -> Option<Campaign> {
        self.inner
            .lock()
            .await
            .tenant(tenant)
            .and_then(|d| d.campaigns.get(campaign_id).cloned())
    }

    /// Every status a campaign has passed through, oldest first.
    pub async fn campaign_status_history(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Vec<CampaignStatus> {
        self.inner
            .lock()
            .await
            .tenant(tenant)
            .and_then(|d| d.campaign_history.get(campaign_id).cloned())
            .unwrap_or_default()
    }

    /// Appends a message record directly (the CRUD layer's queue path);
    /// emits a pending-feed observation for self-authored pending messages.
    pub async fn queue_message(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message: NewMessage,
    ) -> String {
        let record = new_record(message);
        let id = record.id.clone();
        let change = {
            let mut inner = self.inner.lock().await;
            let data = inner.tenant_mut(tenant);
            let queued = (record.from_me && record.status == MessageStatus::Pending).then(|| {
                QueuedChange {
                    tenant: tenant.clone(),
                    thread_id: thread_id.to_string(),
                    message: record.clone(),
                }
            });
            data.messages
                .entry(thread_id.to_string())
                .or_default()
                .push(record);
            queued
        };
        if let Some(change) = change {
            self.emit_pending(ChangeBatch::added(vec![change])).await;
        }
        id
    }

    /// All message records in a thread, oldest first.
    pub async fn messages(&self, tenant: &TenantId, thread_id: &str) -> Vec<InboxMessage> {
        self.inner
            .lock()
            .await
            .tenant(tenant)
            .and_then(|d| d.messages.get(thread_id).cloned())
            .unwrap_or_default()
    }

    /// All inbox threads of a tenant.
    pub async fn threads(&self, tenant: &TenantId) -> Vec<Thread> {
        self.inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| d.threads.values().cloned().collect())
            .unwrap_or_default()
    }

    /// The tenant's persisted channel-state document.
    pub async fn channel_state(&self, tenant: &TenantId) -> ChannelState {
        self.inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| d.channel_state.clone())
            .unwrap_or_default()
    }

    /// Every persisted session status transition, oldest first.
    pub async fn status_history(&self, tenant: &TenantId) -> Vec<SessionStatus> {
        self.inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| d.status_history.clone())
            .unwrap_or_default()
    }

    async fn emit_campaign(&self, batch: ChangeBatch<CampaignChange>) {
        let mut subs = self.campaign_subs.lock().await;
        subs.retain(|tx| tx.send(batch.clone()).is_ok());
    }

    async fn emit_pending(&self, batch: ChangeBatch<QueuedChange>) {
        let mut subs = self.pending_subs.lock().await;
        subs.retain(|tx| tx.send(batch.clone()).is_ok());
    }
}

fn new_record(message: NewMessage) -> InboxMessage {
    InboxMessage {
        id: uuid::Uuid::new_v4().to_string(),
        text: message.text,
        from_me: message.from_me,
        status: message.status,
        media_url: message.media_url,
        media_kind: message.media_kind,
        provider_message_id: message.provider_message_id,
        action: message.action,
        error: None,
        created_at: Utc::now(),
    }
}

fn receiver_stream<T: Send + 'static>(
    rx: mpsc::UnboundedReceiver<ChangeBatch<T>>,
) -> ChangeStream<T> {
    Box::pin(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|batch| (batch, rx))
    }))
}

#[async_trait]
impl Store for MemoryStore {
    async fn merge_channel_state(
        &self,
        tenant: &TenantId,
        patch: ChannelStatePatch,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        let data = inner.tenant_mut(tenant);
        if let Some(status) = patch.status {
            data.channel_state.status = Some(status);
            data.status_history.push(status);
        }
        if let Some(qr) = patch.qr {
            data.channel_state.qr = qr;
        }
        if let Some(error) = patch.error {
            data.channel_state.error = error;
        }
        if let Some(connected_at) = patch.connected_at {
            data.channel_state.connected_at = connected_at;
        }
        if let Some(retry_count) = patch.retry_count {
            data.channel_state.retry_count = Some(retry_count);
        }
        Ok(())
    }

    async fn channel_settings(&self, tenant: &TenantId) -> Result<ChannelSettings, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| d.settings.clone())
            .unwrap_or_default())
    }

    async fn connected_tenants(&self) -> Result<Vec<TenantId>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenants
            .iter()
            .filter(|(_, d)| d.channel_state.status == Some(SessionStatus::Connected))
            .map(|(id, _)| TenantId(id.clone()))
            .collect())
    }

    async fn contacts(&self, tenant: &TenantId) -> Result<Vec<Contact>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| d.contacts.clone())
            .unwrap_or_default())
    }

    async fn find_thread_by_phone(
        &self,
        tenant: &TenantId,
        phone: &str,
    ) -> Result<Option<Thread>, CourierError> {
        Ok(self.inner.lock().await.tenant(tenant).and_then(|d| {
            d.threads
                .values()
                .find(|t| t.contact_phone == phone)
                .cloned()
        }))
    }

    async fn create_thread(
        &self,
        tenant: &TenantId,
        thread: NewThread,
    ) -> Result<String, CourierError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let record = Thread {
            id: id.clone(),
            contact_phone: thread.contact_phone,
            contact_name: thread.contact_name,
            last_message: thread.last_message,
            unread_count: thread.unread_count,
            status: "open".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .await
            .tenant_mut(tenant)
            .threads
            .insert(id.clone(), record);
        debug!(tenant = %tenant, thread_id = %id, "inbox thread created");
        Ok(id)
    }

    async fn touch_thread(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        preview: &str,
        increment_unread: bool,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        let data = inner.tenant_mut(tenant);
        if let Some(thread) = data.threads.get_mut(thread_id) {
            thread.last_message = preview.to_string();
            thread.updated_at = Utc::now();
            if increment_unread {
                thread.unread_count += 1;
            }
        }
        Ok(())
    }

    async fn thread(
        &self,
        tenant: &TenantId,
        thread_id: &str,
    ) -> Result<Option<Thread>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenant(tenant)
            .and_then(|d| d.threads.get(thread_id).cloned()))
    }

    async fn message_exists(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        provider_message_id: &str,
    ) -> Result<bool, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenant(tenant)
            .and_then(|d| d.messages.get(thread_id))
            .map(|msgs| {
                msgs.iter()
                    .any(|m| m.provider_message_id.as_deref() == Some(provider_message_id))
            })
            .unwrap_or(false))
    }

    async fn append_message(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message: NewMessage,
    ) -> Result<String, CourierError> {
        let record = new_record(message);
        let id = record.id.clone();
        self.inner
            .lock()
            .await
            .tenant_mut(tenant)
            .messages
            .entry(thread_id.to_string())
            .or_default()
            .push(record);
        Ok(id)
    }

    async fn update_message(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message_id: &str,
        patch: MessagePatch,
    ) -> Result<(), CourierError> {
        let change = {
            let mut inner = self.inner.lock().await;
            let data = inner.tenant_mut(tenant);
            let Some(record) = data
                .messages
                .get_mut(thread_id)
                .and_then(|msgs| msgs.iter_mut().find(|m| m.id == message_id))
            else {
                return Ok(());
            };
            if let Some(status) = patch.status {
                record.status = status;
            }
            if let Some(provider_id) = patch.provider_message_id {
                record.provider_message_id = Some(provider_id);
            }
            if let Some(error) = patch.error {
                record.error = Some(error);
            }
            // A reset back to pending re-enters the feed's filter set as a
            // modification, not an addition.
            (record.from_me && record.status == MessageStatus::Pending).then(|| QueuedChange {
                tenant: tenant.clone(),
                thread_id: thread_id.to_string(),
                message: record.clone(),
            })
        };
        if let Some(change) = change {
            self.emit_pending(ChangeBatch::modified(vec![change])).await;
        }
        Ok(())
    }

    async fn mark_message_sending(
        &self,
        tenant: &TenantId,
        thread_id: &str,
        message_id: &str,
    ) -> Result<bool, CourierError> {
        let mut inner = self.inner.lock().await;
        let data = inner.tenant_mut(tenant);
        let Some(record) = data
            .messages
            .get_mut(thread_id)
            .and_then(|msgs| msgs.iter_mut().find(|m| m.id == message_id))
        else {
            return Ok(false);
        };
        if record.status != MessageStatus::Pending {
            return Ok(false);
        }
        record.status = MessageStatus::Sending;
        Ok(true)
    }

    async fn pending_messages(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<QueuedChange>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| {
                d.messages
                    .iter()
                    .flat_map(|(thread_id, msgs)| {
                        msgs.iter()
                            .filter(|m| m.from_me && m.status == MessageStatus::Pending)
                            .map(|m| QueuedChange {
                                tenant: tenant.clone(),
                                thread_id: thread_id.clone(),
                                message: m.clone(),
                            })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn watch_pending_messages(&self) -> ChangeStream<QueuedChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Initial snapshot: everything currently matching the filter.
        let snapshot: Vec<QueuedChange> = {
            let inner = self.inner.lock().await;
            inner
                .tenants
                .iter()
                .flat_map(|(tenant_id, d)| {
                    d.messages.iter().flat_map(move |(thread_id, msgs)| {
                        msgs.iter()
                            .filter(|m| m.from_me && m.status == MessageStatus::Pending)
                            .map(move |m| QueuedChange {
                                tenant: TenantId(tenant_id.clone()),
                                thread_id: thread_id.clone(),
                                message: m.clone(),
                            })
                    })
                })
                .collect()
        };
        if !snapshot.is_empty() {
            let _ = tx.send(ChangeBatch::added(snapshot));
        }
        self.pending_subs.lock().await.push(tx);
        receiver_stream(rx)
    }

    async fn update_campaign(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
        patch: CampaignPatch,
    ) -> Result<(), CourierError> {
        let mut inner = self.inner.lock().await;
        let data = inner.tenant_mut(tenant);
        let Some(campaign) = data.campaigns.get_mut(campaign_id) else {
            return Ok(());
        };
        if let Some(status) = patch.status {
            campaign.status = status;
            data.campaign_history
                .entry(campaign_id.to_string())
                .or_default()
                .push(status);
        }
        if let Some(sent) = patch.sent_count {
            campaign.sent_count = sent;
        }
        if let Some(failed) = patch.failed_count {
            campaign.failed_count = failed;
        }
        if let Some(error) = patch.error {
            campaign.error = Some(error);
        }
        if let Some(completed_at) = patch.completed_at {
            campaign.completed_at = Some(completed_at);
        }
        Ok(())
    }

    async fn mark_campaign_running(
        &self,
        tenant: &TenantId,
        campaign_id: &str,
    ) -> Result<bool, CourierError> {
        let mut inner = self.inner.lock().await;
        let data = inner.tenant_mut(tenant);
        let Some(campaign) = data.campaigns.get_mut(campaign_id) else {
            return Ok(false);
        };
        if !matches!(
            campaign.status,
            CampaignStatus::Pending | CampaignStatus::Scheduled
        ) {
            return Ok(false);
        }
        campaign.status = CampaignStatus::Running;
        data.campaign_history
            .entry(campaign_id.to_string())
            .or_default()
            .push(CampaignStatus::Running);
        Ok(true)
    }

    async fn watch_campaigns(&self) -> ChangeStream<CampaignChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        let snapshot: Vec<CampaignChange> = {
            let inner = self.inner.lock().await;
            inner
                .tenants
                .iter()
                .flat_map(|(tenant_id, d)| {
                    d.campaigns
                        .values()
                        .filter(|c| {
                            matches!(
                                c.status,
                                CampaignStatus::Pending | CampaignStatus::Scheduled
                            )
                        })
                        .map(move |c| CampaignChange {
                            tenant: TenantId(tenant_id.clone()),
                            campaign: c.clone(),
                        })
                })
                .collect()
        };
        if !snapshot.is_empty() {
            let _ = tx.send(ChangeBatch::added(snapshot));
        }
        self.campaign_subs.lock().await.push(tx);
        receiver_stream(rx)
    }

    async fn webhook_integrations(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<WebhookIntegration>, CourierError> {
        Ok(self
            .inner
            .lock()
            .await
            .tenant(tenant)
            .map(|d| d.integrations.clone())
            .unwrap_or_default())
    }
}
