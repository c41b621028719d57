// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the session lifecycle manager, driven through the
//! mock transport and the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_config::model::SessionConfig;
use courier_core::traits::hooks::ConnectivityListener;
use courier_core::traits::store::Store;
use courier_core::types::{CloseReason, SessionStatus, TenantId};
use courier_session::{SessionManager, SessionRegistry};
use courier_store::MemoryStore;
use courier_test_utils::{MockTransport, NoopSink};

fn fast_config() -> SessionConfig {
    SessionConfig {
        max_retry_attempts: 10,
        initial_retry_delay_ms: 10,
        max_retry_delay_ms: 100,
        restore_on_start: true,
        restore_stagger_ms: 1,
    }
}

struct Fixture {
    manager: Arc<SessionManager>,
    registry: Arc<SessionRegistry>,
    transport: Arc<MockTransport>,
    store: Arc<MemoryStore>,
}

fn fixture_with(transport: MockTransport, config: SessionConfig) -> Fixture {
    let registry = Arc::new(SessionRegistry::new());
    let transport = Arc::new(transport);
    let store = Arc::new(MemoryStore::new());
    let manager = Arc::new(SessionManager::new(
        Arc::clone(&registry),
        Arc::clone(&transport) as _,
        Arc::clone(&store) as _,
        Arc::new(NoopSink),
        config,
    ));
    Fixture {
        manager,
        registry,
        transport,
        store,
    }
}

/// Polls until `probe` returns true or a short deadline passes.
async fn wait_until<F, Fut>(mut probe: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if probe().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn second_start_creates_no_second_handle() {
    let f = fixture_with(MockTransport::auto_opening(), fast_config());
    let tenant = TenantId::from("t1");

    f.manager.operator_start(&tenant).await.unwrap();
    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::Connected }).await
    );

    // Second start while connected must not open a second transport.
    f.manager.start(&tenant).await.unwrap();
    f.manager.operator_start(&tenant).await.unwrap();
    assert_eq!(f.transport.connect_count(&tenant).await, 1);
    assert_eq!(f.registry.live_count(), 1);
}

#[tokio::test]
async fn start_past_retry_cap_is_refused_without_connecting() {
    let f = fixture_with(MockTransport::new(), fast_config());
    let tenant = TenantId::from("t1");

    f.registry.set_retry_count(&tenant, 11);
    f.manager.start(&tenant).await.unwrap();

    assert_eq!(f.transport.connect_count(&tenant).await, 0);
    let state = f.store.channel_state(&tenant).await;
    assert_eq!(state.status, Some(SessionStatus::Disconnected));
    assert_eq!(state.error.as_deref(), Some("max retries exceeded"));
}

#[tokio::test]
async fn transient_close_schedules_exactly_one_retry() {
    let f = fixture_with(MockTransport::new(), fast_config());
    let tenant = TenantId::from("t1");

    f.manager.operator_start(&tenant).await.unwrap();
    let session = f.transport.session(&tenant).await.unwrap();
    session.open().await;
    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::Connected }).await
    );

    session.close(CloseReason::Other("stream errored".into())).await;
    assert!(
        wait_until(|| async { f.transport.connect_count(&tenant).await == 2 }).await,
        "a reconnect should be attempted after backoff"
    );

    // Only one retry was scheduled for the single close.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(f.transport.connect_count(&tenant).await, 2);
    assert_eq!(f.registry.retry_count(&tenant), 1);

    // A successful reconnect resets the counter.
    f.transport.session(&tenant).await.unwrap().open().await;
    assert!(wait_until(|| async { f.registry.retry_count(&tenant) == 0 }).await);
}

#[tokio::test]
async fn logged_out_close_is_terminal_and_wipes_credentials() {
    let f = fixture_with(MockTransport::new(), fast_config());
    let tenant = TenantId::from("t1");

    f.manager.operator_start(&tenant).await.unwrap();
    let session = f.transport.session(&tenant).await.unwrap();
    session.open().await;
    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::Connected }).await
    );

    session.close(CloseReason::LoggedOut).await;
    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::LoggedOut }).await
    );
    assert_eq!(f.transport.cleared_count(&tenant).await, 1);

    // No auto-retry is ever scheduled after a fatal close.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(f.transport.connect_count(&tenant).await, 1);

    let state = f.store.channel_state(&tenant).await;
    assert_eq!(state.status, Some(SessionStatus::LoggedOut));
    assert!(state.error.is_some());
}

#[tokio::test]
async fn qr_event_persists_pairing_code() {
    let f = fixture_with(MockTransport::new(), fast_config());
    let tenant = TenantId::from("t1");

    f.manager.operator_start(&tenant).await.unwrap();
    let session = f.transport.session(&tenant).await.unwrap();
    session.qr("pair-me-1234").await;

    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::QrReady }).await
    );
    let state = f.store.channel_state(&tenant).await;
    assert_eq!(state.status, Some(SessionStatus::QrReady));
    assert_eq!(state.qr.as_deref(), Some("pair-me-1234"));
}

#[tokio::test]
async fn disconnect_is_idempotent_and_suppresses_retry() {
    let f = fixture_with(MockTransport::new(), fast_config());
    let tenant = TenantId::from("t1");

    f.manager.operator_start(&tenant).await.unwrap();
    let session = f.transport.session(&tenant).await.unwrap();
    session.open().await;
    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::Connected }).await
    );

    f.manager.disconnect(&tenant).await.unwrap();
    assert!(session.handle.was_ended().await);
    assert!(f.transport.cleared_count(&tenant).await >= 1);
    assert_eq!(f.registry.status(&tenant), SessionStatus::Disconnected);
    assert!(f.registry.retry_count(&tenant) > 10);

    // No auto-retry resurrects the session.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(f.transport.connect_count(&tenant).await, 1);

    // Second disconnect is a no-op, not an error.
    f.manager.disconnect(&tenant).await.unwrap();
    assert_eq!(f.registry.status(&tenant), SessionStatus::Disconnected);
}

#[tokio::test]
async fn force_reconnect_resets_exhausted_retry_budget() {
    let f = fixture_with(MockTransport::auto_opening(), fast_config());
    let tenant = TenantId::from("t1");

    f.registry.set_retry_count(&tenant, 11);
    f.manager.force_reconnect(&tenant).await.unwrap();

    assert_eq!(f.transport.connect_count(&tenant).await, 1);
    assert!(
        wait_until(|| async { f.registry.status(&tenant) == SessionStatus::Connected }).await
    );
    assert_eq!(f.registry.retry_count(&tenant), 0);
}

struct Recorder {
    connected: Mutex<Vec<String>>,
}

#[async_trait]
impl ConnectivityListener for Recorder {
    async fn tenant_connected(&self, tenant: &TenantId) {
        self.connected.lock().await.push(tenant.0.clone());
    }
}

#[tokio::test]
async fn connected_transition_notifies_listeners() {
    let registry = Arc::new(SessionRegistry::new());
    let transport = Arc::new(MockTransport::auto_opening());
    let store = Arc::new(MemoryStore::new());
    let recorder = Arc::new(Recorder {
        connected: Mutex::new(Vec::new()),
    });
    let mut manager = SessionManager::new(
        Arc::clone(&registry),
        Arc::clone(&transport) as _,
        Arc::clone(&store) as _,
        Arc::new(NoopSink),
        fast_config(),
    );
    manager.add_connectivity_listener(Arc::clone(&recorder) as _);
    let manager = Arc::new(manager);

    let tenant = TenantId::from("t1");
    manager.operator_start(&tenant).await.unwrap();

    assert!(
        wait_until(|| async { recorder.connected.lock().await.len() == 1 }).await
    );
    assert_eq!(recorder.connected.lock().await[0], "t1");
}

#[tokio::test]
async fn restore_starts_only_previously_connected_tenants() {
    let f = fixture_with(MockTransport::auto_opening(), fast_config());

    f.store
        .merge_channel_state(
            &TenantId::from("t1"),
            courier_core::types::ChannelStatePatch::status(SessionStatus::Connected),
        )
        .await
        .unwrap();
    f.store
        .merge_channel_state(
            &TenantId::from("t2"),
            courier_core::types::ChannelStatePatch::status(SessionStatus::Disconnected),
        )
        .await
        .unwrap();

    let restored = f.manager.restore_sessions().await.unwrap();
    assert_eq!(restored, 1);
    assert_eq!(f.transport.connect_count(&TenantId::from("t1")).await, 1);
    assert_eq!(f.transport.connect_count(&TenantId::from("t2")).await, 0);
}
