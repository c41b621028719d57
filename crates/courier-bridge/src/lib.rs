// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP implementation of the [`AiBridge`](courier_core::AiBridge)
//! collaborator.

pub mod client;

pub use client::HttpBridge;
