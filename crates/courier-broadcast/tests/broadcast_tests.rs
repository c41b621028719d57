// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the campaign executor against the in-memory store
//! and a manually connected mock handle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use proptest::prelude::*;

use courier_broadcast::{CampaignExecutor, normalize_phone};
use courier_config::model::BroadcastConfig;
use courier_core::traits::store::Store;
use courier_core::types::{
    Campaign, CampaignFilters, CampaignStatus, Contact, SendPayload, SessionStatus, TenantId,
};
use courier_session::SessionRegistry;
use courier_store::MemoryStore;
use courier_test_utils::MockTransportHandle;

fn fast_config() -> BroadcastConfig {
    BroadcastConfig {
        inter_send_delay_ms: 1,
        checkpoint_every: 5,
        default_country_code: "91".to_string(),
    }
}

fn campaign(id: &str, status: CampaignStatus, message: &str, tags: &[&str]) -> Campaign {
    Campaign {
        id: id.to_string(),
        title: Some("launch".to_string()),
        status,
        schedule_time: None,
        filters: CampaignFilters {
            tags: tags.iter().map(|t| t.to_string()).collect(),
        },
        message: message.to_string(),
        media_url: None,
        sent_count: 0,
        failed_count: 0,
        error: None,
        completed_at: None,
    }
}

fn contact(phone: &str, name: Option<&str>, tags: &[&str]) -> Contact {
    Contact {
        phone: phone.to_string(),
        name: name.map(|n| n.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn connect_tenant(registry: &SessionRegistry, tenant: &TenantId) -> Arc<MockTransportHandle> {
    let handle = Arc::new(MockTransportHandle::new());
    registry.set_handle(tenant, Arc::clone(&handle) as _);
    registry.set_status(tenant, SessionStatus::Connected);
    handle
}

async fn spawn_executor(
    store: &Arc<MemoryStore>,
    registry: &Arc<SessionRegistry>,
    config: BroadcastConfig,
) {
    let executor = Arc::new(CampaignExecutor::new(
        Arc::clone(store) as Arc<dyn Store>,
        Arc::clone(registry),
        config,
    ));
    let feed = store.watch_campaigns().await;
    tokio::spawn(executor.run(feed));
}

async fn wait_for_status(
    store: &MemoryStore,
    tenant: &TenantId,
    campaign_id: &str,
    status: CampaignStatus,
) -> Campaign {
    for _ in 0..400 {
        if let Some(c) = store.campaign(tenant, campaign_id).await {
            if c.status == status {
                return c;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("campaign {campaign_id} never reached {status}");
}

#[tokio::test]
async fn partial_failures_are_counted_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    let handle = connect_tenant(&registry, &tenant);

    for i in 0..5u32 {
        store
            .insert_contact(&tenant, contact(&format!("987654321{i}"), None, &[]))
            .await;
    }
    // The third recipient's sends always fail.
    handle.fail_address("919876543212").await;

    spawn_executor(&store, &registry, fast_config()).await;
    store
        .create_campaign(&tenant, campaign("c1", CampaignStatus::Pending, "Hi {{name}}", &[]))
        .await;

    let done = wait_for_status(&store, &tenant, "c1", CampaignStatus::Completed).await;
    assert_eq!(done.sent_count, 4);
    assert_eq!(done.failed_count, 1);
    assert_eq!(handle.sent_count().await, 4);
}

#[tokio::test]
async fn tag_filter_and_name_substitution_drive_the_sends() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    let handle = connect_tenant(&registry, &tenant);

    store
        .insert_contact(&tenant, contact("9876543210", Some("Asha"), &["vip"]))
        .await;
    store
        .insert_contact(&tenant, contact("9876543211", None, &["trial"]))
        .await;
    store
        .insert_contact(&tenant, contact("9876543212", None, &["vip", "trial"]))
        .await;

    spawn_executor(&store, &registry, fast_config()).await;
    store
        .create_campaign(
            &tenant,
            campaign("c1", CampaignStatus::Pending, "Hi {{name}}", &["vip"]),
        )
        .await;

    let done = wait_for_status(&store, &tenant, "c1", CampaignStatus::Completed).await;
    assert_eq!(done.sent_count, 2);

    let sent = handle.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].address, "919876543210");
    assert_eq!(
        sent[0].payload,
        SendPayload::Text {
            body: "Hi Asha".to_string()
        }
    );
    assert_eq!(
        sent[1].payload,
        SendPayload::Text {
            body: "Hi Friend".to_string()
        }
    );
}

#[tokio::test]
async fn zero_recipients_fail_fast_without_running() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    connect_tenant(&registry, &tenant);

    store
        .insert_contact(&tenant, contact("9876543210", None, &["trial"]))
        .await;

    spawn_executor(&store, &registry, fast_config()).await;
    store
        .create_campaign(
            &tenant,
            campaign("c1", CampaignStatus::Pending, "Hi", &["vip"]),
        )
        .await;

    let done = wait_for_status(&store, &tenant, "c1", CampaignStatus::Failed).await;
    assert!(done.error.is_some());
    assert_eq!(done.sent_count, 0);

    let history = store.campaign_status_history(&tenant, "c1").await;
    assert!(
        !history.contains(&CampaignStatus::Running),
        "zero-recipient campaigns never pass through running: {history:?}"
    );
}

#[tokio::test]
async fn future_scheduled_campaign_is_ignored() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    let handle = connect_tenant(&registry, &tenant);
    store
        .insert_contact(&tenant, contact("9876543210", None, &[]))
        .await;

    spawn_executor(&store, &registry, fast_config()).await;
    let mut scheduled = campaign("c1", CampaignStatus::Scheduled, "Hi", &[]);
    scheduled.schedule_time = Some(Utc::now() + chrono::Duration::hours(1));
    store.create_campaign(&tenant, scheduled).await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    let current = store.campaign(&tenant, "c1").await.unwrap();
    assert_eq!(current.status, CampaignStatus::Scheduled);
    assert_eq!(handle.sent_count().await, 0);
}

#[tokio::test]
async fn due_scheduled_campaign_runs() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    connect_tenant(&registry, &tenant);
    store
        .insert_contact(&tenant, contact("9876543210", None, &[]))
        .await;

    spawn_executor(&store, &registry, fast_config()).await;
    let mut scheduled = campaign("c1", CampaignStatus::Scheduled, "Hi", &[]);
    scheduled.schedule_time = Some(Utc::now() - chrono::Duration::minutes(1));
    store.create_campaign(&tenant, scheduled).await;

    let done = wait_for_status(&store, &tenant, "c1", CampaignStatus::Completed).await;
    assert_eq!(done.sent_count, 1);
}

#[tokio::test]
async fn disconnected_tenant_leaves_campaign_pending() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    store
        .insert_contact(&tenant, contact("9876543210", None, &[]))
        .await;

    spawn_executor(&store, &registry, fast_config()).await;
    store
        .create_campaign(&tenant, campaign("c1", CampaignStatus::Pending, "Hi", &[]))
        .await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    let current = store.campaign(&tenant, "c1").await.unwrap();
    assert_eq!(current.status, CampaignStatus::Pending);
}

#[tokio::test]
async fn duplicate_observations_run_a_campaign_once() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    let handle = connect_tenant(&registry, &tenant);

    for i in 0..3u32 {
        store
            .insert_contact(&tenant, contact(&format!("987654321{i}"), None, &[]))
            .await;
    }

    // Two executors over two subscriptions model overlapping feed
    // deliveries of the same record.
    spawn_executor(&store, &registry, fast_config()).await;
    spawn_executor(&store, &registry, fast_config()).await;

    store
        .create_campaign(&tenant, campaign("c1", CampaignStatus::Pending, "Hi", &[]))
        .await;

    wait_for_status(&store, &tenant, "c1", CampaignStatus::Completed).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        handle.sent_count().await,
        3,
        "the running gate must keep the losing observer out"
    );
}

#[tokio::test]
async fn handle_loss_mid_run_hard_stops_the_batch() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(SessionRegistry::new());
    let tenant = TenantId::from("t1");
    let handle = connect_tenant(&registry, &tenant);

    for i in 0..8u32 {
        store
            .insert_contact(&tenant, contact(&format!("987654321{i}"), None, &[]))
            .await;
    }

    let config = BroadcastConfig {
        inter_send_delay_ms: 30,
        ..fast_config()
    };
    spawn_executor(&store, &registry, config).await;
    store
        .create_campaign(&tenant, campaign("c1", CampaignStatus::Pending, "Hi", &[]))
        .await;

    // Let a couple of sends happen, then drop connectivity.
    for _ in 0..200 {
        if handle.sent_count().await >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    registry.set_status(&tenant, SessionStatus::Disconnected);

    let done = wait_for_status(&store, &tenant, "c1", CampaignStatus::Failed).await;
    assert_eq!(done.error.as_deref(), Some("socket disconnected"));
    assert!(done.sent_count >= 2);
    assert!(
        (done.sent_count as usize) < 8,
        "the remainder of the batch must be aborted"
    );
}

proptest! {
    #[test]
    fn normalized_phones_are_digit_strings(raw in "[+0-9 ()-]{0,20}") {
        let normalized = normalize_phone(&raw, "91");
        prop_assert!(normalized.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn ten_digit_inputs_gain_the_country_code(digits in "[0-9]{10}") {
        let normalized = normalize_phone(&digits, "91");
        prop_assert_eq!(normalized, format!("91{}", digits));
    }
}
