// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock object storage recording uploads.

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::error::CourierError;
use courier_core::traits::media::ObjectStorage;
use courier_core::types::TenantId;

/// A recorded upload.
#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub tenant: String,
    pub file_name: String,
    pub mime_type: String,
    pub byte_len: usize,
}

/// Mock object storage returning deterministic public URLs.
#[derive(Default)]
pub struct MockObjectStorage {
    uploads: Mutex<Vec<UploadRecord>>,
    fail: Mutex<bool>,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn uploads(&self) -> Vec<UploadRecord> {
        self.uploads.lock().await.clone()
    }

    /// Makes subsequent uploads fail.
    pub async fn fail(&self) {
        *self.fail.lock().await = true;
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload(
        &self,
        tenant: &TenantId,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, CourierError> {
        if *self.fail.lock().await {
            return Err(CourierError::Media {
                message: "mock upload failure".to_string(),
                source: None,
            });
        }
        self.uploads.lock().await.push(UploadRecord {
            tenant: tenant.0.clone(),
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            byte_len: bytes.len(),
        });
        Ok(format!("https://media.test/{tenant}/{file_name}"))
    }
}
