// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier messaging gateway.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Courier workspace. The orchestrator
//! crates depend on the collaborator traits defined here; concrete backends
//! (document store, transport, object storage, AI bridge) plug in behind
//! them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{
    Campaign, CampaignStatus, Contact, InboundEvent, MessageStatus, SendPayload, SessionStatus,
    TenantId,
};

// Re-export all collaborator traits at crate root.
pub use traits::{
    AiBridge, ConnectivityListener, InboundPlugin, InboundSink, ObjectStorage, Store, Transport,
    TransportHandle,
};
