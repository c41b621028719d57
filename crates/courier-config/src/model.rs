// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier gateway.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Defaults mirror the production constants: retry
//! caps, backoff bounds, the dedup window, and broadcast throttling.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Control API server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Session lifecycle and reconnect policy.
    #[serde(default)]
    pub session: SessionConfig,

    /// Inbound pipeline settings.
    #[serde(default)]
    pub inbound: InboundConfig,

    /// Broadcast executor and dispatcher settings.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// AI bridge settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Control API server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// API key required by the media upload endpoint (`x-api-key`).
    #[serde(default)]
    pub api_key: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_key: None,
            log_level: default_log_level(),
        }
    }
}

/// Session lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Maximum automatic reconnect attempts before a tenant goes terminal.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// First backoff delay in milliseconds.
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    /// Backoff ceiling in milliseconds.
    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,

    /// Restore previously connected sessions at startup.
    #[serde(default = "default_true")]
    pub restore_on_start: bool,

    /// Delay between successive restores at startup, in milliseconds.
    #[serde(default = "default_restore_stagger_ms")]
    pub restore_stagger_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: default_max_retry_attempts(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
            restore_on_start: true,
            restore_stagger_ms: default_restore_stagger_ms(),
        }
    }
}

/// Inbound pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InboundConfig {
    /// How long an inbound provider message id is remembered for dedup,
    /// in seconds.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// How long an outbound action tag waits for its echo, in seconds.
    #[serde(default = "default_action_tag_ttl_secs")]
    pub action_tag_ttl_secs: u64,
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: default_dedup_window_secs(),
            action_tag_ttl_secs: default_action_tag_ttl_secs(),
        }
    }
}

/// Broadcast executor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BroadcastConfig {
    /// Fixed delay between successive sends in a broadcast, in milliseconds.
    /// A deliberate throttle for the transport's abuse limits.
    #[serde(default = "default_inter_send_delay_ms")]
    pub inter_send_delay_ms: u64,

    /// Progress checkpoint frequency, counted in send attempts.
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: u32,

    /// Country code prefixed to bare 10-digit phone numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            inter_send_delay_ms: default_inter_send_delay_ms(),
            checkpoint_every: default_checkpoint_every(),
            default_country_code: default_country_code(),
        }
    }
}

/// AI bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// Bridge endpoint URL.
    #[serde(default = "default_bridge_url")]
    pub url: String,

    /// Hard timeout for a bridge completion call, in seconds.
    #[serde(default = "default_bridge_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: default_bridge_url(),
            timeout_secs: default_bridge_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retry_attempts() -> u32 {
    10
}

fn default_initial_retry_delay_ms() -> u64 {
    2000
}

fn default_max_retry_delay_ms() -> u64 {
    60_000
}

fn default_restore_stagger_ms() -> u64 {
    1000
}

fn default_dedup_window_secs() -> u64 {
    60
}

fn default_action_tag_ttl_secs() -> u64 {
    10
}

fn default_inter_send_delay_ms() -> u64 {
    2000
}

fn default_checkpoint_every() -> u32 {
    5
}

fn default_country_code() -> String {
    "91".to_string()
}

fn default_bridge_url() -> String {
    "http://localhost:4000/widget/chat".to_string()
}

fn default_bridge_timeout_secs() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_constants() {
        let config = CourierConfig::default();
        assert_eq!(config.session.max_retry_attempts, 10);
        assert_eq!(config.session.initial_retry_delay_ms, 2000);
        assert_eq!(config.session.max_retry_delay_ms, 60_000);
        assert_eq!(config.inbound.dedup_window_secs, 60);
        assert_eq!(config.inbound.action_tag_ttl_secs, 10);
        assert_eq!(config.broadcast.checkpoint_every, 5);
        assert_eq!(config.broadcast.default_country_code, "91");
        assert_eq!(config.bridge.timeout_secs, 15);
    }
}
