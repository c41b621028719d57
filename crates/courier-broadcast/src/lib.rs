// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound dispatch for the Courier gateway: bulk broadcast campaigns and
//! individually queued messages, both throttled through the tenant's single
//! connected transport.

pub mod campaign;
pub mod dispatcher;
pub mod template;

pub use campaign::{CampaignExecutor, filter_recipients};
pub use dispatcher::PendingDispatcher;
pub use template::{MessageTemplate, infer_media_kind, normalize_phone, render_name};
