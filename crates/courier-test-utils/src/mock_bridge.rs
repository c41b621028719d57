// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock AI bridge with a scripted reply and call capture.

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::CourierError;
use courier_core::traits::bridge::{AiBridge, BridgeReply};
use courier_core::types::TenantId;

/// A recorded bridge call.
#[derive(Debug, Clone)]
pub struct BridgeCall {
    pub tenant: String,
    pub text: String,
    pub contact_phone: String,
}

/// Mock bridge returning a configurable reply.
#[derive(Default)]
pub struct MockBridge {
    reply: Mutex<BridgeReply>,
    fail: Mutex<bool>,
    calls: Mutex<Vec<BridgeCall>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the reply returned by subsequent calls.
    pub async fn set_reply(&self, reply: BridgeReply) {
        *self.reply.lock().await = reply;
    }

    /// Makes subsequent calls fail.
    pub async fn fail(&self) {
        *self.fail.lock().await = true;
    }

    pub async fn calls(&self) -> Vec<BridgeCall> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl AiBridge for MockBridge {
    async fn complete(
        &self,
        tenant: &TenantId,
        text: &str,
        contact_phone: &str,
    ) -> Result<BridgeReply, CourierError> {
        self.calls.lock().await.push(BridgeCall {
            tenant: tenant.0.clone(),
            text: text.to_string(),
            contact_phone: contact_phone.to_string(),
        });
        if *self.fail.lock().await {
            return Err(CourierError::Bridge {
                message: "mock bridge failure".to_string(),
                source: None,
            });
        }
        Ok(self.reply.lock().await.clone())
    }
}
