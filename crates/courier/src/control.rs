// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Control API built on axum.
//!
//! Exposes the operator surface for session management plus the guarded
//! media upload endpoint. The tenant-facing CRUD routes (CRM, email,
//! payments) live outside this workspace.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use courier_config::model::ServerConfig;
use courier_core::error::CourierError;
use courier_core::traits::media::ObjectStorage;
use courier_core::types::{SessionStatus, TenantId};
use courier_session::SessionManager;

/// Shared state for the control API handlers.
#[derive(Clone)]
pub struct ControlState {
    /// Lifecycle manager serving the session endpoints.
    pub manager: Arc<SessionManager>,
    /// Object storage backing the upload endpoint.
    pub media_store: Arc<dyn ObjectStorage>,
    /// Expected `x-api-key` for uploads. `None` rejects every upload.
    pub api_key: Option<String>,
}

/// Response body for GET /session-status/{tenant}.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub status: SessionStatus,
    pub retries: u32,
    pub has_session: bool,
}

/// Response body for the session control endpoints.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

/// Response body for PUT /upload/{tenant}/{filename}.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn internal_error(e: CourierError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

/// GET /session-status/{tenant}
pub async fn get_session_status(
    State(state): State<ControlState>,
    Path(tenant): Path<String>,
) -> Response {
    let tenant = TenantId(tenant);
    let registry = state.manager.registry();
    Json(StatusResponse {
        success: true,
        status: registry.status(&tenant),
        retries: registry.retry_count(&tenant),
        has_session: registry.has_handle(&tenant),
    })
    .into_response()
}

/// POST /start-session/{tenant}
///
/// Resets the retry counter and starts the session; reports when the
/// session was already active and connected.
pub async fn post_start_session(
    State(state): State<ControlState>,
    Path(tenant): Path<String>,
) -> Response {
    let tenant = TenantId(tenant);
    match state.manager.operator_start(&tenant).await {
        Ok(true) => Json(ActionResponse {
            success: true,
            message: "Session starting".to_string(),
        })
        .into_response(),
        Ok(false) => Json(ActionResponse {
            success: true,
            message: "Session already active and connected".to_string(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /disconnect/{tenant}
pub async fn post_disconnect(
    State(state): State<ControlState>,
    Path(tenant): Path<String>,
) -> Response {
    let tenant = TenantId(tenant);
    match state.manager.disconnect(&tenant).await {
        Ok(()) => Json(ActionResponse {
            success: true,
            message: "Disconnected successfully".to_string(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// POST /force-reconnect/{tenant}
pub async fn post_force_reconnect(
    State(state): State<ControlState>,
    Path(tenant): Path<String>,
) -> Response {
    let tenant = TenantId(tenant);
    match state.manager.force_reconnect(&tenant).await {
        Ok(()) => Json(ActionResponse {
            success: true,
            message: "Reconnecting".to_string(),
        })
        .into_response(),
        Err(e) => internal_error(e),
    }
}

/// Infers a mime type from the uploaded file's extension.
fn infer_mime_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "mp4" => "video/mp4",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// PUT /upload/{tenant}/{filename}
///
/// Guarded by `x-api-key`. Rejects all uploads when no key is configured.
pub async fn put_upload(
    State(state): State<ControlState>,
    Path((tenant, file_name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let provided = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let authorized = match (&state.api_key, provided) {
        (Some(expected), Some(key)) => expected == key,
        _ => false,
    };
    if !authorized {
        warn!(tenant = %tenant, "upload rejected: bad or missing api key");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Forbidden".to_string(),
            }),
        )
            .into_response();
    }
    if body.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "empty upload body".to_string(),
            }),
        )
            .into_response();
    }

    let tenant = TenantId(tenant);
    let mime_type = infer_mime_type(&file_name);
    match state
        .media_store
        .upload(&tenant, &file_name, body.to_vec(), mime_type)
        .await
    {
        Ok(url) => Json(UploadResponse { success: true, url }).into_response(),
        Err(e) => internal_error(e),
    }
}

/// Builds the control API router.
pub fn router(state: ControlState) -> Router {
    Router::new()
        .route("/session-status/{tenant}", get(get_session_status))
        .route("/start-session/{tenant}", post(post_start_session))
        .route("/disconnect/{tenant}", post(post_disconnect))
        .route("/force-reconnect/{tenant}", post(post_force_reconnect))
        .route("/upload/{tenant}/{filename}", put(put_upload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds and serves the control API until the shutdown token fires.
pub async fn start_server(
    config: &ServerConfig,
    state: ControlState,
    shutdown: CancellationToken,
) -> Result<(), CourierError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("failed to bind control API to {addr}: {e}")))?;

    info!("control API listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| CourierError::Internal(format!("control API server error: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_config::model::SessionConfig;
    use courier_core::traits::store::Store;
    use courier_store::MemoryStore;
    use courier_test_utils::{MockTransport, NoopSink};

    fn test_state(transport: Arc<MockTransport>) -> ControlState {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let registry = Arc::new(courier_session::SessionRegistry::new());
        let manager = Arc::new(SessionManager::new(
            registry,
            transport,
            store,
            Arc::new(NoopSink),
            SessionConfig::default(),
        ));
        ControlState {
            manager,
            media_store: Arc::new(crate::loopback::LoopbackMediaStore),
            api_key: Some("secret".to_string()),
        }
    }

    #[test]
    fn mime_inference_follows_extension() {
        assert_eq!(infer_mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(infer_mime_type("photo.jpeg"), "image/jpeg");
        assert_eq!(infer_mime_type("logo.png"), "image/png");
        assert_eq!(infer_mime_type("clip.mp4"), "video/mp4");
        assert_eq!(infer_mime_type("invoice.pdf"), "application/pdf");
        assert_eq!(infer_mime_type("data.bin"), "application/octet-stream");
        assert_eq!(infer_mime_type("no_extension"), "application/octet-stream");
    }

    #[tokio::test]
    async fn status_endpoint_reports_unknown_tenant_as_not_started() {
        let state = test_state(Arc::new(MockTransport::new()));
        let response =
            get_session_status(State(state), Path("ghost".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn start_session_connects_through_the_manager() {
        let transport = Arc::new(MockTransport::auto_opening());
        let state = test_state(Arc::clone(&transport));

        let response =
            post_start_session(State(state.clone()), Path("acme".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(transport.connect_count(&TenantId::from("acme")).await, 1);
    }

    #[tokio::test]
    async fn upload_without_key_is_forbidden() {
        let state = test_state(Arc::new(MockTransport::new()));
        let response = put_upload(
            State(state),
            Path(("acme".to_string(), "img.jpg".to_string())),
            HeaderMap::new(),
            Bytes::from_static(b"bytes"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn upload_with_key_returns_public_url() {
        let state = test_state(Arc::new(MockTransport::new()));
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", "secret".parse().unwrap());
        let response = put_upload(
            State(state),
            Path(("acme".to_string(), "img.jpg".to_string())),
            headers,
            Bytes::from_static(b"bytes"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
