// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned inbound plugins for chain tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::CourierError;
use courier_core::traits::plugin::{InboundPlugin, PluginContext};

/// Plugin that records every offered event id and claims (or declines)
/// them all.
pub struct RecordingPlugin {
    name: String,
    claims: bool,
    seen: Mutex<Vec<String>>,
}

impl RecordingPlugin {
    pub fn claiming(name: &str) -> Self {
        Self {
            name: name.to_string(),
            claims: true,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn declining(name: &str) -> Self {
        Self {
            name: name.to_string(),
            claims: false,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Provider message ids of every event offered to this plugin.
    pub async fn seen(&self) -> Vec<String> {
        self.seen.lock().await.clone()
    }
}

#[async_trait]
impl InboundPlugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, ctx: &PluginContext<'_>) -> Result<bool, CourierError> {
        self.seen
            .lock()
            .await
            .push(ctx.event.provider_message_id.clone());
        Ok(self.claims)
    }
}

/// Plugin whose handler always errors; the chain must treat it as
/// "not claimed".
pub struct FailingPlugin;

#[async_trait]
impl InboundPlugin for FailingPlugin {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(&self, _ctx: &PluginContext<'_>) -> Result<bool, CourierError> {
        Err(CourierError::Internal("plugin exploded".to_string()))
    }
}
