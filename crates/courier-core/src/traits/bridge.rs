// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI bridge collaborator trait.
//!
//! The bridge is an external completion service reached over HTTP. Calls
//! must complete within a bounded time so a slow dependency cannot stall a
//! tenant's inbound pipeline.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::TenantId;

/// Reply produced by the AI bridge for an inbound message.
#[derive(Debug, Clone, Default)]
pub struct BridgeReply {
    /// Text to send back to the contact, if any.
    pub reply: Option<String>,
    /// Image URL to attach to the reply.
    pub image_url: Option<String>,
    /// Application-level action tag to correlate with the sent message.
    pub action: Option<String>,
}

/// External completion service for tenant auto-replies.
#[async_trait]
pub trait AiBridge: Send + Sync {
    /// Requests a completion for an inbound text from a contact.
    async fn complete(
        &self,
        tenant: &TenantId,
        text: &str,
        contact_phone: &str,
    ) -> Result<BridgeReply, CourierError>;
}
