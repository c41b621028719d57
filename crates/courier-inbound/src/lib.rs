// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event pipeline for the Courier gateway.
//!
//! Consumes transport events, deduplicates redeliveries, classifies media,
//! offers events to domain plugins, drives the AI auto-reply, persists to
//! the inbox, and fans inbound traffic out to webhook integrations.

pub mod classify;
pub mod pipeline;
pub mod ttl_cache;

pub use classify::{Classified, MediaDescriptor, classify};
pub use pipeline::InboundPipeline;
pub use ttl_cache::TtlCache;
