// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object-storage collaborator trait for media persistence.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::TenantId;

/// Stores media blobs and returns a public URL for each upload.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads `bytes` under the tenant's media namespace.
    async fn upload(
        &self,
        tenant: &TenantId,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<String, CourierError>;
}
