// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Wires the gateway together: in-memory store, loopback dev transport,
//! bridge client, inbound pipeline, session manager, campaign executor,
//! pending-message dispatcher, and the control API. Supports graceful
//! shutdown via signal handlers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use courier_broadcast::{CampaignExecutor, PendingDispatcher};
use courier_bridge::HttpBridge;
use courier_config::CourierConfig;
use courier_core::error::CourierError;
use courier_core::traits::hooks::{ConnectivityListener, InboundSink};
use courier_core::traits::media::ObjectStorage;
use courier_core::traits::store::Store;
use courier_core::traits::transport::Transport;
use courier_inbound::InboundPipeline;
use courier_session::{SessionManager, SessionRegistry};
use courier_store::MemoryStore;

use crate::control::{self, ControlState};
use crate::loopback::{LoopbackMediaStore, LoopbackTransport};
use crate::shutdown;

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.server.log_level);

    info!("starting courier serve");

    // The production document store, transport, and object storage are
    // external collaborators; the dev server runs against the in-memory
    // store and loopback adapters.
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let transport: Arc<dyn Transport> = Arc::new(LoopbackTransport);
    let media_store: Arc<dyn ObjectStorage> = Arc::new(LoopbackMediaStore);
    let bridge = Arc::new(HttpBridge::new(&config.bridge)?);

    let pipeline = Arc::new(InboundPipeline::new(
        Arc::clone(&store),
        Arc::clone(&media_store),
        bridge,
        Vec::new(),
        &config.inbound,
    ));

    let registry = Arc::new(SessionRegistry::new());
    let dispatcher = Arc::new(PendingDispatcher::new(
        Arc::clone(&store),
        Arc::clone(&registry),
    ));

    let mut manager = SessionManager::new(
        Arc::clone(&registry),
        transport,
        Arc::clone(&store),
        Arc::clone(&pipeline) as Arc<dyn InboundSink>,
        config.session.clone(),
    );
    manager.add_connectivity_listener(Arc::clone(&dispatcher) as Arc<dyn ConnectivityListener>);
    let manager = Arc::new(manager);

    let executor = Arc::new(CampaignExecutor::new(
        Arc::clone(&store),
        Arc::clone(&registry),
        config.broadcast.clone(),
    ));

    let campaign_feed = store.watch_campaigns().await;
    tokio::spawn(Arc::clone(&executor).run(campaign_feed));

    let pending_feed = store.watch_pending_messages().await;
    tokio::spawn(Arc::clone(&dispatcher).run(pending_feed));

    if config.session.restore_on_start {
        match manager.restore_sessions().await {
            Ok(0) => debug!("no sessions to restore"),
            Ok(count) => info!(count, "restored sessions"),
            Err(e) => warn!(error = %e, "session restore failed"),
        }
    }

    let shutdown_token = shutdown::install_signal_handler();

    let state = ControlState {
        manager: Arc::clone(&manager),
        media_store,
        api_key: config.server.api_key.clone(),
    };
    control::start_server(&config.server, state, shutdown_token).await?;

    info!("shutting down, ending live sessions");
    manager.shutdown().await;
    info!("courier serve stopped");

    Ok(())
}

/// Initializes the tracing subscriber from the configured log level,
/// honoring `RUST_LOG` when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
