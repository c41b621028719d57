// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Courier configuration system.

use courier_config::{load_and_validate_str, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_courier_config() {
    let toml = r#"
[server]
host = "127.0.0.1"
port = 4010
api_key = "secret-key-123"
log_level = "debug"

[session]
max_retry_attempts = 5
initial_retry_delay_ms = 1000
max_retry_delay_ms = 30000
restore_on_start = false
restore_stagger_ms = 250

[inbound]
dedup_window_secs = 120
action_tag_ttl_secs = 20

[broadcast]
inter_send_delay_ms = 1000
checkpoint_every = 10
default_country_code = "44"

[bridge]
url = "http://bridge.internal:4000/widget/chat"
timeout_secs = 30
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 4010);
    assert_eq!(config.server.api_key.as_deref(), Some("secret-key-123"));
    assert_eq!(config.session.max_retry_attempts, 5);
    assert_eq!(config.session.initial_retry_delay_ms, 1000);
    assert!(!config.session.restore_on_start);
    assert_eq!(config.inbound.dedup_window_secs, 120);
    assert_eq!(config.broadcast.default_country_code, "44");
    assert_eq!(config.bridge.timeout_secs, 30);
}

/// Empty TOML yields the compiled defaults.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML should deserialize");
    assert_eq!(config.server.port, 3002);
    assert_eq!(config.session.max_retry_attempts, 10);
    assert_eq!(config.session.initial_retry_delay_ms, 2000);
    assert_eq!(config.session.max_retry_delay_ms, 60_000);
    assert_eq!(config.broadcast.inter_send_delay_ms, 2000);
    assert!(config.session.restore_on_start);
}

/// Unknown keys are rejected rather than silently ignored.
#[test]
fn unknown_field_is_rejected() {
    let toml = r#"
[session]
max_retires = 3
"#;
    assert!(load_config_from_str(toml).is_err());
}

/// Partial sections keep defaults for unspecified fields.
#[test]
fn partial_section_keeps_defaults() {
    let toml = r#"
[broadcast]
inter_send_delay_ms = 500
"#;
    let config = load_config_from_str(toml).expect("partial section should deserialize");
    assert_eq!(config.broadcast.inter_send_delay_ms, 500);
    assert_eq!(config.broadcast.checkpoint_every, 5);
    assert_eq!(config.broadcast.default_country_code, "91");
}

/// Validation failures surface as error strings.
#[test]
fn validation_failure_reported() {
    let toml = r#"
[bridge]
timeout_secs = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(errors.iter().any(|e| e.contains("timeout_secs")));
}
