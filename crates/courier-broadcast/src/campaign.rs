// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast campaign executor.
//!
//! Consumes the campaign change feed and drives each eligible campaign
//! through: recipient resolution and tag filtering, the running
//! compare-and-set gate, strictly sequential throttled sends with
//! per-recipient failure isolation, periodic progress checkpoints, and a
//! terminal status write.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use courier_config::model::BroadcastConfig;
use courier_core::error::CourierError;
use courier_core::traits::store::{ChangeStream, Store};
use courier_core::types::{CampaignChange, CampaignPatch, CampaignStatus, Contact};
use courier_session::SessionRegistry;

use crate::template::{MessageTemplate, normalize_phone};

/// Keeps only contacts whose tag set intersects the filter (logical OR).
/// An empty filter selects every contact.
pub fn filter_recipients(contacts: Vec<Contact>, tags: &[String]) -> Vec<Contact> {
    if tags.is_empty() {
        return contacts;
    }
    contacts
        .into_iter()
        .filter(|c| c.tags.iter().any(|t| tags.contains(t)))
        .collect()
}

/// Executes broadcast campaigns observed on the store change feed.
pub struct CampaignExecutor {
    store: Arc<dyn Store>,
    registry: Arc<SessionRegistry>,
    config: BroadcastConfig,
}

impl CampaignExecutor {
    pub fn new(
        store: Arc<dyn Store>,
        registry: Arc<SessionRegistry>,
        config: BroadcastConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Consumes the feed until it ends. Each eligible campaign runs as its
    /// own task; campaigns of different tenants proceed concurrently.
    pub async fn run(self: Arc<Self>, mut feed: ChangeStream<CampaignChange>) {
        while let Some(batch) = feed.next().await {
            for change in batch.added.into_iter().chain(batch.modified) {
                self.observe(change);
            }
        }
        debug!("campaign feed ended");
    }

    fn observe(self: &Arc<Self>, change: CampaignChange) {
        match change.campaign.status {
            CampaignStatus::Pending => {}
            CampaignStatus::Scheduled => {
                // Act only once the schedule time has elapsed; otherwise
                // wait for the next observation of this record.
                let due = change
                    .campaign
                    .schedule_time
                    .is_some_and(|at| at <= Utc::now());
                if !due {
                    debug!(
                        tenant = %change.tenant,
                        campaign = %change.campaign.id,
                        "scheduled campaign not due yet"
                    );
                    return;
                }
            }
            _ => return,
        }

        let executor = Arc::clone(self);
        tokio::spawn(async move {
            let tenant = change.tenant.clone();
            let campaign_id = change.campaign.id.clone();
            if let Err(e) = executor.execute(change).await {
                error!(
                    tenant = %tenant,
                    campaign = %campaign_id,
                    error = %e,
                    "campaign execution failed"
                );
            }
        });
    }

    async fn execute(&self, change: CampaignChange) -> Result<(), CourierError> {
        let CampaignChange { tenant, campaign } = change;

        // The tenant must be connected at observation time; otherwise the
        // campaign stays pending for a later feed delivery.
        if self.registry.connected_handle(&tenant).is_none() {
            debug!(
                tenant = %tenant,
                campaign = %campaign.id,
                "tenant not connected, leaving campaign for later"
            );
            return Ok(());
        }

        let contacts = self.store.contacts(&tenant).await?;
        let recipients = filter_recipients(contacts, &campaign.filters.tags);
        if recipients.is_empty() {
            info!(
                tenant = %tenant,
                campaign = %campaign.id,
                "no recipients after filtering, failing campaign"
            );
            self.store
                .update_campaign(
                    &tenant,
                    &campaign.id,
                    CampaignPatch {
                        status: Some(CampaignStatus::Failed),
                        error: Some("no contacts matched the campaign filters".to_string()),
                        ..Default::default()
                    },
                )
                .await?;
            return Ok(());
        }

        // The running write doubles as the lock against a duplicate
        // observation of the same record.
        if !self
            .store
            .mark_campaign_running(&tenant, &campaign.id)
            .await?
        {
            debug!(
                tenant = %tenant,
                campaign = %campaign.id,
                "campaign already picked up elsewhere"
            );
            return Ok(());
        }

        info!(
            tenant = %tenant,
            campaign = %campaign.id,
            title = campaign.title.as_deref().unwrap_or(""),
            recipients = recipients.len(),
            "starting broadcast"
        );

        let template = MessageTemplate::build(&campaign.message, campaign.media_url.as_deref());
        let delay = Duration::from_millis(self.config.inter_send_delay_ms);
        let mut sent: u32 = 0;
        let mut failed: u32 = 0;
        let mut abort: Option<String> = None;

        // Strictly sequential, throttled: the transport's abuse limits make
        // this a correctness constraint, not an optimization target.
        for contact in &recipients {
            // Re-resolve the handle each iteration; a disconnect mid-run is
            // a hard stop for the remainder.
            let Some(handle) = self.registry.connected_handle(&tenant) else {
                abort = Some("socket disconnected".to_string());
                break;
            };

            let address = normalize_phone(&contact.phone, &self.config.default_country_code);
            let payload = template.render(contact.name.as_deref());
            match handle.send(&address, &payload).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        tenant = %tenant,
                        campaign = %campaign.id,
                        recipient = %address,
                        error = %e,
                        "broadcast send failed"
                    );
                }
            }

            if (sent + failed) % self.config.checkpoint_every == 0 {
                if let Err(e) = self
                    .store
                    .update_campaign(
                        &tenant,
                        &campaign.id,
                        CampaignPatch {
                            sent_count: Some(sent),
                            failed_count: Some(failed),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    warn!(
                        tenant = %tenant,
                        campaign = %campaign.id,
                        error = %e,
                        "progress checkpoint failed"
                    );
                }
            }

            tokio::time::sleep(delay).await;
        }

        match abort {
            Some(reason) => {
                warn!(
                    tenant = %tenant,
                    campaign = %campaign.id,
                    sent,
                    failed,
                    reason = %reason,
                    "broadcast aborted"
                );
                self.store
                    .update_campaign(
                        &tenant,
                        &campaign.id,
                        CampaignPatch {
                            status: Some(CampaignStatus::Failed),
                            sent_count: Some(sent),
                            failed_count: Some(failed),
                            error: Some(reason),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
            None => {
                info!(
                    tenant = %tenant,
                    campaign = %campaign.id,
                    sent,
                    failed,
                    "broadcast completed"
                );
                self.store
                    .update_campaign(
                        &tenant,
                        &campaign.id,
                        CampaignPatch {
                            status: Some(CampaignStatus::Completed),
                            sent_count: Some(sent),
                            failed_count: Some(failed),
                            completed_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(phone: &str, tags: &[&str]) -> Contact {
        Contact {
            phone: phone.to_string(),
            name: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn tag_filter_is_logical_or() {
        let contacts = vec![
            contact("1", &["A"]),
            contact("2", &["B"]),
            contact("3", &["A", "B"]),
            contact("4", &[]),
        ];
        let kept = filter_recipients(contacts, &["A".to_string()]);
        let phones: Vec<&str> = kept.iter().map(|c| c.phone.as_str()).collect();
        assert_eq!(phones, vec!["1", "3"]);
    }

    #[test]
    fn empty_filter_selects_everyone() {
        let contacts = vec![contact("1", &["A"]), contact("2", &[])];
        assert_eq!(filter_recipients(contacts, &[]).len(), 2);
    }
}
