// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the AI bridge completion service.
//!
//! The bridge is an external HTTP JSON service. Every call runs under the
//! configured client timeout so a stalled bridge cannot hang a tenant's
//! inbound pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use courier_config::model::BridgeConfig;
use courier_core::error::CourierError;
use courier_core::traits::bridge::{AiBridge, BridgeReply};
use courier_core::types::TenantId;

/// Request body for a bridge completion call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest<'a> {
    agent_id: &'a str,
    message: &'a str,
    customer_phone: &'a str,
}

/// Response body returned by the bridge.
#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    reply: Option<String>,
    image: Option<String>,
    action: Option<String>,
}

/// Bridge client over HTTP with a bounded per-call timeout.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    client: reqwest::Client,
    url: String,
}

impl HttpBridge {
    pub fn new(config: &BridgeConfig) -> Result<Self, CourierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CourierError::Bridge {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl AiBridge for HttpBridge {
    async fn complete(
        &self,
        tenant: &TenantId,
        text: &str,
        contact_phone: &str,
    ) -> Result<BridgeReply, CourierError> {
        let request = CompletionRequest {
            agent_id: tenant.as_str(),
            message: text,
            customer_phone: contact_phone,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CourierError::Bridge {
                message: format!("bridge request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CourierError::Bridge {
                message: format!("bridge returned status {status}"),
                source: None,
            });
        }

        let body: CompletionResponse =
            response.json().await.map_err(|e| CourierError::Bridge {
                message: format!("malformed bridge response: {e}"),
                source: Some(Box::new(e)),
            })?;

        debug!(
            tenant = %tenant,
            has_reply = body.reply.is_some(),
            has_action = body.action.is_some(),
            "bridge completion received"
        );

        Ok(BridgeReply {
            reply: body.reply,
            image_url: body.image,
            action: body.action,
        })
    }
}
