// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier messaging gateway.

use thiserror::Error;

/// The primary error type used across all Courier collaborator traits and
/// core operations.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Document store errors (read/write/merge failure, feed subscription loss).
    #[error("store error: {source}")]
    Store {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport errors (connect failure, send failure, media download).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// AI bridge errors (HTTP failure, malformed response).
    #[error("bridge error: {message}")]
    Bridge {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Object storage errors (media upload failure).
    #[error("media storage error: {message}")]
    Media {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The tenant has no connected transport handle.
    #[error("tenant {tenant} is not connected")]
    NotConnected { tenant: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Shorthand for a transport error without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        CourierError::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a store error wrapping an arbitrary source.
    pub fn store(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        CourierError::Store {
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct_and_display() {
        let e = CourierError::transport("socket disconnected");
        assert_eq!(e.to_string(), "transport error: socket disconnected");

        let e = CourierError::NotConnected {
            tenant: "acme".into(),
        };
        assert_eq!(e.to_string(), "tenant acme is not connected");

        let e = CourierError::Timeout {
            duration: std::time::Duration::from_secs(15),
        };
        assert!(e.to_string().contains("timed out"));
    }

    #[test]
    fn store_error_preserves_source() {
        let e = CourierError::store(std::io::Error::other("disk"));
        assert!(std::error::Error::source(&e).is_some());
    }
}
