// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The inbound event pipeline.
//!
//! Each delivered transport event runs through one logical unit of work:
//! guard, dedup, classify, plugin chain, AI auto-reply, inbox upsert, media
//! persistence, idempotent insert, webhook fan-out. Downstream dependency
//! failures (bridge, media, webhooks) are logged and swallowed; they never
//! block the primary message flow.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use courier_config::model::InboundConfig;
use courier_core::error::CourierError;
use courier_core::traits::bridge::AiBridge;
use courier_core::traits::hooks::InboundSink;
use courier_core::traits::media::ObjectStorage;
use courier_core::traits::plugin::{InboundPlugin, PluginContext};
use courier_core::traits::store::Store;
use courier_core::traits::transport::TransportHandle;
use courier_core::types::{
    InboundEvent, MediaKind, MessageStatus, NewMessage, NewThread, SendPayload, TenantId,
};

use crate::classify::{Classified, classify};
use crate::ttl_cache::TtlCache;

/// Webhook deliveries are best-effort; cap how long one may hang around.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Processes inbound transport events for all tenants.
pub struct InboundPipeline {
    store: Arc<dyn Store>,
    media_store: Arc<dyn ObjectStorage>,
    bridge: Arc<dyn AiBridge>,
    plugins: Vec<Arc<dyn InboundPlugin>>,
    dedup: TtlCache<String, ()>,
    actions: TtlCache<String, String>,
    http: reqwest::Client,
}

impl InboundPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        media_store: Arc<dyn ObjectStorage>,
        bridge: Arc<dyn AiBridge>,
        plugins: Vec<Arc<dyn InboundPlugin>>,
        config: &InboundConfig,
    ) -> Self {
        Self {
            store,
            media_store,
            bridge,
            plugins,
            dedup: TtlCache::new(Duration::from_secs(config.dedup_window_secs)),
            actions: TtlCache::new(Duration::from_secs(config.action_tag_ttl_secs)),
            http: reqwest::Client::new(),
        }
    }

    /// Runs the full pipeline for one event.
    pub async fn process(
        &self,
        tenant: &TenantId,
        handle: &Arc<dyn TransportHandle>,
        event: InboundEvent,
    ) -> Result<(), CourierError> {
        // Empty and broadcast/system events carry nothing to route.
        let Some(payload) = event.payload.as_ref() else {
            return Ok(());
        };
        if event.system {
            return Ok(());
        }

        // The transport redelivers; remember each id for the dedup window.
        if !self
            .dedup
            .insert_if_absent(event.provider_message_id.clone(), ())
        {
            debug!(
                tenant = %tenant,
                message_id = %event.provider_message_id,
                "duplicate delivery discarded"
            );
            return Ok(());
        }

        let classified = classify(payload, Utc::now().timestamp_millis());
        if classified.is_reaction {
            debug!(tenant = %tenant, "reaction event ignored");
            return Ok(());
        }
        let text = classified.text.clone();

        debug!(
            tenant = %tenant,
            from_me = event.from_me,
            contact = %event.contact_phone,
            "inbound event"
        );

        if self.offer_to_plugins(tenant, handle, &event, &text).await {
            return Ok(());
        }

        if !event.from_me && !text.is_empty() {
            self.maybe_auto_reply(tenant, handle, &event, &text).await;
        }

        let thread_id = self.upsert_thread(tenant, &event, &classified, &text).await?;

        let media_url = self.persist_media(tenant, handle, &event, &classified).await;

        // A second delivery path (e.g. the echo of a self-sent message) must
        // not create a duplicate record.
        if self
            .store
            .message_exists(tenant, &thread_id, &event.provider_message_id)
            .await?
        {
            debug!(
                tenant = %tenant,
                message_id = %event.provider_message_id,
                "record already exists, skipping duplicate insert"
            );
        } else {
            let action = event
                .from_me
                .then(|| self.actions.take(&event.provider_message_id))
                .flatten();
            self.store
                .append_message(
                    tenant,
                    &thread_id,
                    NewMessage {
                        text: text.clone(),
                        from_me: event.from_me,
                        status: MessageStatus::Delivered,
                        media_url: media_url.clone(),
                        media_kind: classified.media.as_ref().map(|m| m.kind),
                        provider_message_id: Some(event.provider_message_id.clone()),
                        action,
                    },
                )
                .await?;
        }

        if !event.from_me {
            self.fan_out(
                tenant,
                &event,
                &text,
                media_url.as_deref(),
                classified.media.as_ref().map(|m| m.kind),
            )
            .await;
        }

        Ok(())
    }

    /// Offers the event to the plugin chain; true when a plugin claimed it.
    async fn offer_to_plugins(
        &self,
        tenant: &TenantId,
        handle: &Arc<dyn TransportHandle>,
        event: &InboundEvent,
        text: &str,
    ) -> bool {
        let ctx = PluginContext {
            tenant,
            event,
            text,
            handle,
        };
        for plugin in &self.plugins {
            match plugin.handle(&ctx).await {
                Ok(true) => {
                    info!(tenant = %tenant, plugin = plugin.name(), "event claimed by plugin");
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        tenant = %tenant,
                        plugin = plugin.name(),
                        error = %e,
                        "plugin failed, treating as not claimed"
                    );
                }
            }
        }
        false
    }

    /// Forwards unclaimed inbound text to the AI bridge when the tenant has
    /// auto-reply enabled. All failures are swallowed.
    async fn maybe_auto_reply(
        &self,
        tenant: &TenantId,
        handle: &Arc<dyn TransportHandle>,
        event: &InboundEvent,
        text: &str,
    ) {
        let settings = match self.store.channel_settings(tenant).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "failed to read channel settings");
                return;
            }
        };
        if !settings.auto_reply_enabled {
            return;
        }

        debug!(tenant = %tenant, "forwarding inbound text to bridge");
        let reply = match self
            .bridge
            .complete(tenant, text, &event.contact_phone)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "bridge call failed");
                return;
            }
        };
        let Some(body) = reply.reply else {
            return;
        };

        let payload = match reply.image_url {
            Some(url) => SendPayload::Media {
                kind: MediaKind::Image,
                url,
                caption: Some(body),
                file_name: None,
                mime_type: None,
            },
            None => SendPayload::text(body),
        };
        match handle.send(&event.chat_address, &payload).await {
            Ok(receipt) => {
                // Tag the upcoming echo of this exact message.
                if let Some(action) = reply.action {
                    self.actions.insert(receipt.provider_message_id, action);
                }
            }
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "auto-reply send failed");
            }
        }
    }

    /// Resolves or creates the inbox thread for the event's contact.
    async fn upsert_thread(
        &self,
        tenant: &TenantId,
        event: &InboundEvent,
        classified: &Classified,
        text: &str,
    ) -> Result<String, CourierError> {
        let preview = classified
            .media
            .as_ref()
            .map(|m| format!("[{}]", m.kind))
            .unwrap_or_else(|| text.to_string());

        match self
            .store
            .find_thread_by_phone(tenant, &event.contact_phone)
            .await?
        {
            Some(thread) => {
                self.store
                    .touch_thread(tenant, &thread.id, &preview, !event.from_me)
                    .await?;
                Ok(thread.id)
            }
            None => {
                self.store
                    .create_thread(
                        tenant,
                        NewThread {
                            contact_phone: event.contact_phone.clone(),
                            contact_name: event
                                .push_name
                                .clone()
                                .unwrap_or_else(|| event.contact_phone.clone()),
                            last_message: preview,
                            unread_count: if event.from_me { 0 } else { 1 },
                        },
                    )
                    .await
            }
        }
    }

    /// Downloads and persists event media; degrades to None on failure.
    async fn persist_media(
        &self,
        tenant: &TenantId,
        handle: &Arc<dyn TransportHandle>,
        event: &InboundEvent,
        classified: &Classified,
    ) -> Option<String> {
        let descriptor = classified.media.as_ref()?;
        let bytes = match handle.download_media(event).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "media download failed");
                return None;
            }
        };
        match self
            .media_store
            .upload(tenant, &descriptor.file_name, bytes, &descriptor.mime_type)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "media upload failed");
                None
            }
        }
    }

    /// Fans an inbound message out to configured webhooks. Fire-and-forget.
    async fn fan_out(
        &self,
        tenant: &TenantId,
        event: &InboundEvent,
        text: &str,
        media_url: Option<&str>,
        media_kind: Option<MediaKind>,
    ) {
        let integrations = match self.store.webhook_integrations(tenant).await {
            Ok(integrations) => integrations,
            Err(e) => {
                warn!(tenant = %tenant, error = %e, "failed to list webhook integrations");
                return;
            }
        };

        for hook in integrations {
            let body = serde_json::json!({
                "event": "new_message",
                "contact": {
                    "name": event.push_name,
                    "phone": event.contact_phone,
                },
                "message": {
                    "text": text,
                    "media_url": media_url,
                    "type": media_kind.map(|k| k.to_string()).unwrap_or_else(|| "text".to_string()),
                    "timestamp": Utc::now().to_rfc3339(),
                },
            });
            let client = self.http.clone();
            let tenant = tenant.clone();
            tokio::spawn(async move {
                let result = client
                    .post(&hook.url)
                    .timeout(WEBHOOK_TIMEOUT)
                    .json(&body)
                    .send()
                    .await;
                if let Err(e) = result {
                    debug!(
                        tenant = %tenant,
                        provider = %hook.provider,
                        error = %e,
                        "webhook delivery failed"
                    );
                }
            });
        }
    }
}

#[async_trait]
impl InboundSink for InboundPipeline {
    async fn deliver(
        &self,
        tenant: &TenantId,
        handle: Arc<dyn TransportHandle>,
        event: InboundEvent,
    ) {
        if let Err(e) = self.process(tenant, &handle, event).await {
            error!(tenant = %tenant, error = %e, "inbound event processing failed");
        }
    }
}
