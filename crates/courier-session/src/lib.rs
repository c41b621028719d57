// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant session registry and connection lifecycle management.
//!
//! One [`SessionManager`] owns the state machine of every tenant session:
//! start, backoff/retry, terminal failure, manual disconnect, and
//! force-reconnect. The [`SessionRegistry`] is the shared read surface the
//! executors use to answer "is tenant X connected".

pub mod lifecycle;
pub mod registry;

pub use lifecycle::{SessionManager, backoff_delay};
pub use registry::SessionRegistry;
