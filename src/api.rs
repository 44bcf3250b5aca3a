use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::document::MapDocument;
use crate::error::AppError;
use crate::mapfile::{CloneRequest, RenameRequest};
use crate::session::{DocumentInfo, Session};
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────

#[derive(Serialize)]
struct ApiOk<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct ApiErr {
    ok: bool,
    error: String,
}

fn ok_json<T: Serialize>(data: T) -> impl IntoResponse {
    Json(ApiOk { ok: true, data })
}

fn err_json(status: StatusCode, msg: String) -> impl IntoResponse {
    (status, Json(ApiErr { ok: false, error: msg }))
}

fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::ValidationError { .. } | AppError::NoDocument => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ── Request types ────────────────────────────────────────────────

/// Document upload. The text travels in the body; the server never reads
/// client paths.
#[derive(Debug, Clone, Deserialize, ts_rs::TS)]
#[ts(export)]
pub struct LoadDocumentRequest {
    pub name: String,
    pub text: String,
}

// ── Handlers ─────────────────────────────────────────────────────

async fn post_document(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<LoadDocumentRequest>,
) -> impl IntoResponse {
    let LoadDocumentRequest { name, text } = body;
    let device_count = state.with_session_mut(|session| {
        session.load(MapDocument {
            name: name.clone(),
            text,
        })
    });
    ok_json(DocumentInfo { name, device_count })
}

async fn delete_document(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    state.with_session_mut(Session::reset);
    ok_json(serde_json::json!({ "cleared": true }))
}

async fn get_document(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    match state.with_session(Session::document_info) {
        Some(info) => ok_json(info).into_response(),
        None => err_json(StatusCode::NOT_FOUND, AppError::NoDocument.to_string()).into_response(),
    }
}

async fn get_devices(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    ok_json(state.with_session(|session| session.devices().to_vec()))
}

async fn post_rename(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<RenameRequest>,
) -> impl IntoResponse {
    match state.with_session(|session| session.rename(&request)) {
        Ok(patch) => ok_json(patch).into_response(),
        Err(e) => err_json(status_for(&e), e.to_string()).into_response(),
    }
}

async fn post_clone(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<CloneRequest>,
) -> impl IntoResponse {
    match state.with_session(|session| session.clone_calibration(&request)) {
        Ok(patch) => ok_json(patch).into_response(),
        Err(e) => err_json(status_for(&e), e.to_string()).into_response(),
    }
}

async fn get_health() -> impl IntoResponse {
    ok_json(serde_json::json!({ "status": "ok" }))
}

// ── Server startup ───────────────────────────────────────────────

/// Start the HTTP API on `port` (0 picks a free one). Returns the bound port.
pub async fn start_api_server(state: Arc<AppState>, port: u16) -> Result<u16, String> {
    let cors = CorsLayer::permissive();

    let app = Router::new()
        .route(
            "/api/document",
            get(get_document).post(post_document).delete(delete_document),
        )
        .route("/api/devices", get(get_devices))
        .route("/api/rename", post(post_rename))
        .route("/api/clone", post(post_clone))
        .route("/api/health", get(get_health))
        .layer(cors)
        .layer(Extension(state));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server: {e}"))?;
    let bound = listener
        .local_addr()
        .map_err(|e| format!("Failed to get API server port: {e}"))?
        .port();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("[MapConfig] API server error: {e}");
        }
    });

    Ok(bound)
}
