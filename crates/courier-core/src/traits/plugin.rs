// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound domain-plugin trait.
//!
//! Plugins form an ordered chain; the first plugin that claims an event
//! stops further processing. Plugins persist their own state through the
//! store collaborator they are constructed with.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CourierError;
use crate::traits::transport::TransportHandle;
use crate::types::{InboundEvent, TenantId};

/// Context handed to each plugin for one inbound event.
pub struct PluginContext<'a> {
    pub tenant: &'a TenantId,
    pub event: &'a InboundEvent,
    /// Text derived from the event payload (body, caption, or filename).
    pub text: &'a str,
    /// The tenant's live transport handle, for direct replies.
    pub handle: &'a Arc<dyn TransportHandle>,
}

/// A domain handler offered inbound events ahead of the generic auto-reply.
#[async_trait]
pub trait InboundPlugin: Send + Sync {
    /// Human-readable plugin name, for logs.
    fn name(&self) -> &str;

    /// Handles the event. Returns true to claim it and stop the chain.
    async fn handle(&self, ctx: &PluginContext<'_>) -> Result<bool, CourierError>;
}
