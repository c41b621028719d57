// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the Courier gateway.
//!
//! Each external collaborator (document store, transport, object storage,
//! AI bridge) and each extension seam (inbound plugins, connectivity hooks)
//! is a trait here, implemented behind `Arc<dyn Trait>` so the orchestrator
//! stays independent of any concrete backend.

pub mod bridge;
pub mod hooks;
pub mod media;
pub mod plugin;
pub mod store;
pub mod transport;

// Re-export all traits at the traits module level for convenience.
pub use bridge::AiBridge;
pub use hooks::{ConnectivityListener, InboundSink};
pub use media::ObjectStorage;
pub use plugin::{InboundPlugin, PluginContext};
pub use store::{ChangeStream, Store};
pub use transport::{Transport, TransportHandle, TransportSession};
