// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.

use crate::model::CourierConfig;

/// Validate cross-field constraints that serde cannot express.
///
/// Returns all violations at once so the operator fixes them in one pass.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.session.initial_retry_delay_ms == 0 {
        errors.push("session.initial_retry_delay_ms must be greater than 0".to_string());
    }
    if config.session.max_retry_delay_ms < config.session.initial_retry_delay_ms {
        errors.push(
            "session.max_retry_delay_ms must be >= session.initial_retry_delay_ms".to_string(),
        );
    }
    if config.inbound.dedup_window_secs == 0 {
        errors.push("inbound.dedup_window_secs must be greater than 0".to_string());
    }
    if config.broadcast.checkpoint_every == 0 {
        errors.push("broadcast.checkpoint_every must be greater than 0".to_string());
    }
    if !config
        .broadcast
        .default_country_code
        .chars()
        .all(|c| c.is_ascii_digit())
        || config.broadcast.default_country_code.is_empty()
    {
        errors.push("broadcast.default_country_code must be a non-empty digit string".to_string());
    }
    if config.bridge.timeout_secs == 0 {
        errors.push("bridge.timeout_secs must be greater than 0".to_string());
    }
    if !config.bridge.url.starts_with("http://") && !config.bridge.url.starts_with("https://") {
        errors.push("bridge.url must be an http(s) URL".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&CourierConfig::default()).is_ok());
    }

    #[test]
    fn zero_initial_delay_rejected() {
        let mut config = CourierConfig::default();
        config.session.initial_retry_delay_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("initial_retry_delay_ms")));
    }

    #[test]
    fn non_digit_country_code_rejected() {
        let mut config = CourierConfig::default();
        config.broadcast.default_country_code = "+91".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn multiple_violations_reported_together() {
        let mut config = CourierConfig::default();
        config.broadcast.checkpoint_every = 0;
        config.bridge.url = "ftp://bridge".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
