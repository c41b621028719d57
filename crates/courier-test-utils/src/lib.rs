// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Deterministic mock implementations of the collaborator traits:
//! injectable inbound events, captured outbound sends, scripted connection
//! updates, and failure injection.

pub mod mock_bridge;
pub mod mock_media;
pub mod mock_plugins;
pub mod mock_transport;
pub mod sinks;

pub use mock_bridge::MockBridge;
pub use mock_media::MockObjectStorage;
pub use mock_plugins::RecordingPlugin;
pub use mock_transport::{MockTransport, MockTransportHandle, SessionControl};
pub use sinks::{CollectingSink, NoopSink};
