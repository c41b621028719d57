// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory reference implementation of the [`Store`] collaborator.
//!
//! The production document store lives outside this workspace; this adapter
//! backs the dev server and the test suite. It honors the full `Store`
//! contract including change-feed subscriptions (with Firestore-style
//! initial snapshot delivery) and the compare-and-set guards used as
//! mutual-exclusion gates by the executors.

mod memory;

pub use memory::{ChannelState, MemoryStore};
