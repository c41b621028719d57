// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Courier workspace.
//!
//! The status enums here carry the exact wire strings persisted to the
//! document store; changing a serialized form is a breaking change for
//! every dashboard reading those fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of a tenant (one company owning one messaging channel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        TenantId(value.to_string())
    }
}

/// Lifecycle status of a tenant's messaging session.
///
/// Serialized forms are the persisted status field contract.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    QrReady,
    Connecting,
    Connected,
    Reconnecting,
    Disconnected,
    LoggedOut,
    Error,
}

/// Status of a broadcast campaign record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
}

impl CampaignStatus {
    /// A campaign in a terminal state is never re-run.
    pub fn is_terminal(self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Failed)
    }
}

/// Status of an inbox message record.
///
/// Outbound queued messages move `pending -> sending -> sent|failed`;
/// inbound records are written directly as `delivered`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Delivered,
}

/// Kind of a media attachment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

/// A tenant contact. Read-only to this core; owned by the CRUD layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Recipient filters attached to a campaign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignFilters {
    /// Keep contacts whose tag set intersects this set (logical OR).
    /// Empty means all contacts.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A bulk outbound send job targeting a filtered subset of contacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub status: CampaignStatus,
    #[serde(default)]
    pub schedule_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub filters: CampaignFilters,
    /// Template body; may contain `{{name}}`.
    pub message: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub sent_count: u32,
    #[serde(default)]
    pub failed_count: u32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Partial update applied to a campaign record.
#[derive(Debug, Clone, Default)]
pub struct CampaignPatch {
    pub status: Option<CampaignStatus>,
    pub sent_count: Option<u32>,
    pub failed_count: Option<u32>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// An inbox conversation thread, keyed by the contact phone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub contact_phone: String,
    pub contact_name: String,
    pub last_message: String,
    pub unread_count: u32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new inbox thread.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub contact_phone: String,
    pub contact_name: String,
    pub last_message: String,
    pub unread_count: u32,
}

/// A message record inside an inbox thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: String,
    pub text: String,
    pub from_me: bool,
    pub status: MessageStatus,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub media_kind: Option<MediaKind>,
    #[serde(default)]
    pub provider_message_id: Option<String>,
    /// Application-level tag attached via action correlation.
    #[serde(default)]
    pub action: Option<String>,
    /// Failure detail for operator visibility; set alongside `failed`.
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for appending a new message record to a thread.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub text: String,
    pub from_me: bool,
    pub status: MessageStatus,
    pub media_url: Option<String>,
    pub media_kind: Option<MediaKind>,
    pub provider_message_id: Option<String>,
    pub action: Option<String>,
}

/// Partial update applied to an inbox message record.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub status: Option<MessageStatus>,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

/// Partial merge into a tenant's persisted channel-state document.
///
/// Outer `None` leaves a field unchanged; `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ChannelStatePatch {
    pub status: Option<SessionStatus>,
    pub qr: Option<Option<String>>,
    pub error: Option<Option<String>>,
    pub connected_at: Option<Option<DateTime<Utc>>>,
    pub retry_count: Option<u32>,
}

impl ChannelStatePatch {
    /// Patch that only sets the status field.
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Per-tenant channel settings read from the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Whether unclaimed inbound text is forwarded to the AI bridge.
    #[serde(default)]
    pub auto_reply_enabled: bool,
}

/// A tenant-configured webhook integration target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookIntegration {
    pub provider: String,
    pub url: String,
}

// --- Transport-facing types ---

/// Why a transport connection closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The session was logged out from the remote side.
    LoggedOut,
    /// The credentials were rejected (401-class close).
    Unauthorized,
    /// Any other close (network drop, server restart, ...).
    Other(String),
}

impl CloseReason {
    /// Fatal closes destroy credentials and are never auto-retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CloseReason::LoggedOut | CloseReason::Unauthorized)
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::LoggedOut => f.write_str("logged out"),
            CloseReason::Unauthorized => f.write_str("unauthorized"),
            CloseReason::Other(reason) => f.write_str(reason),
        }
    }
}

/// Connection-state change reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionUpdate {
    /// An out-of-band pairing step is required; carries the pairing code.
    QrCode(String),
    /// The channel is authenticated and open.
    Open,
    /// The channel closed.
    Closed(CloseReason),
}

/// Payload of an inbound transport event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Text {
        body: String,
    },
    Image {
        caption: Option<String>,
    },
    Video {
        caption: Option<String>,
    },
    Document {
        caption: Option<String>,
        file_name: Option<String>,
        mime_type: Option<String>,
    },
    Reaction {
        emoji: String,
        target_id: String,
    },
}

/// An inbound event delivered by the transport.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    /// Provider-assigned message id; dedup key.
    pub provider_message_id: String,
    /// Opaque reply address for the originating chat.
    pub chat_address: String,
    /// Contact phone in bare-digit form.
    pub contact_phone: String,
    /// True for echoes of messages this side sent.
    pub from_me: bool,
    /// Display name pushed by the contact, if any.
    pub push_name: Option<String>,
    /// True for broadcast/system channel traffic.
    pub system: bool,
    pub payload: Option<EventPayload>,
}

/// Events emitted by a live transport session.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connection(ConnectionUpdate),
    Message(Box<InboundEvent>),
}

/// An outbound payload handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendPayload {
    Text {
        body: String,
    },
    Media {
        kind: MediaKind,
        url: String,
        caption: Option<String>,
        file_name: Option<String>,
        mime_type: Option<String>,
    },
}

impl SendPayload {
    pub fn text(body: impl Into<String>) -> Self {
        SendPayload::Text { body: body.into() }
    }
}

/// Receipt returned by the transport after a successful send.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub provider_message_id: String,
}

// --- Change feed types ---

/// One delivery from a store change-feed subscription.
#[derive(Debug, Clone)]
pub struct ChangeBatch<T> {
    pub added: Vec<T>,
    pub modified: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> ChangeBatch<T> {
    pub fn added(docs: Vec<T>) -> Self {
        Self {
            added: docs,
            modified: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn modified(docs: Vec<T>) -> Self {
        Self {
            added: Vec::new(),
            modified: docs,
            removed: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// A campaign observed on the change feed, with its owning tenant.
#[derive(Debug, Clone)]
pub struct CampaignChange {
    pub tenant: TenantId,
    pub campaign: Campaign,
}

/// A queued outbound message observed on the change feed.
#[derive(Debug, Clone)]
pub struct QueuedChange {
    pub tenant: TenantId,
    pub thread_id: String,
    pub message: InboxMessage,
}
