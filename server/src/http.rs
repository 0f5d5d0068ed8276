use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use larder_common::events::ChangeEvent;
use larder_common::item::{FoodItem, FoodItemDraft, ItemId};
use larder_common::TrackerError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::service::{FoodService, PasswordChange};

pub type AppState = Arc<FoodService>;

// ─── API types ───────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

impl StatusMessage {
    fn new(message: &str) -> Json<Self> {
        Json(StatusMessage {
            message: message.to_string(),
        })
    }
}

#[derive(Default, Deserialize)]
struct VerifyRequest {
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct VerifyResponse {
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[serde(default)]
    current_password: String,
    #[allow(dead_code)]
    #[serde(default)]
    new_password: String,
}

#[derive(Serialize)]
struct ChangePasswordResponse {
    success: bool,
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
    admin_configured: bool,
}

// ─── Body parsing ────────────────────────────────────────────────────────────

fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| TrackerError::validation(format!("Invalid input data: {e}")).into())
}

/// An empty body means "all defaults".
fn parse_optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        Ok(T::default())
    } else {
        parse_json(body)
    }
}

/// Pulls `adminPassword` out of a mutation body and hands back the rest
/// unchecked. Only JSON syntax is judged here; the fields are validated after
/// lookup and gate.
fn split_admin_password(body: &[u8]) -> Result<(Value, Option<String>), ApiError> {
    let mut body = match parse_optional_json::<Value>(body)? {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let admin_password = match body.as_object_mut().and_then(|o| o.remove("adminPassword")) {
        Some(Value::String(secret)) => Some(secret),
        _ => None,
    };
    Ok((body, admin_password))
}

// ─── Food item handlers ──────────────────────────────────────────────────────

async fn list_handler(State(svc): State<AppState>) -> Result<Json<Vec<FoodItem>>, ApiError> {
    Ok(Json(svc.list_active().await?))
}

async fn trash_handler(State(svc): State<AppState>) -> Result<Json<Vec<FoodItem>>, ApiError> {
    Ok(Json(svc.list_trash().await?))
}

async fn get_handler(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FoodItem>, ApiError> {
    Ok(Json(svc.get(&ItemId(id)).await?))
}

async fn create_handler(
    State(svc): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<FoodItem>), ApiError> {
    let draft: FoodItemDraft = parse_json(&body)?;
    let item = svc.create(draft, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update_handler(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<FoodItem>, ApiError> {
    let (patch, admin_password) = split_admin_password(&body)?;
    let item = svc
        .update(&ItemId(id), patch, admin_password.as_deref(), Utc::now())
        .await?;
    Ok(Json(item))
}

async fn delete_handler(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<StatusMessage>, ApiError> {
    let (_, admin_password) = split_admin_password(&body)?;
    svc.soft_delete(&ItemId(id), admin_password.as_deref(), Utc::now())
        .await?;
    Ok(StatusMessage::new("Food item moved to trash"))
}

async fn restore_handler(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusMessage>, ApiError> {
    svc.restore(&ItemId(id)).await?;
    Ok(StatusMessage::new("Food item restored"))
}

async fn purge_handler(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusMessage>, ApiError> {
    svc.purge(&ItemId(id)).await?;
    Ok(StatusMessage::new("Food item permanently deleted"))
}

async fn clear_trash_handler(
    State(svc): State<AppState>,
) -> Result<Json<StatusMessage>, ApiError> {
    svc.purge_all_deleted().await?;
    Ok(StatusMessage::new("Trash cleared"))
}

// ─── Password handlers ───────────────────────────────────────────────────────

async fn verify_password_handler(State(svc): State<AppState>, body: Bytes) -> Response {
    let request: VerifyRequest = match parse_optional_json(&body) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    match svc.verify_password(&request.password) {
        Ok(valid) => Json(VerifyResponse {
            valid,
            message: None,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(VerifyResponse {
                valid: false,
                message: Some(e.to_string()),
            }),
        )
            .into_response(),
    }
}

async fn change_password_handler(State(svc): State<AppState>, body: Bytes) -> Response {
    let request: ChangePasswordRequest = match parse_optional_json(&body) {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };
    let (status, message) = match svc.change_password(&request.current_password) {
        Ok(PasswordChange::Unsupported) => (
            StatusCode::OK,
            "Password change not supported. The admin password is read from configuration at startup.".to_string(),
        ),
        Ok(PasswordChange::WrongCurrentPassword) => (
            StatusCode::BAD_REQUEST,
            "Current password is incorrect".to_string(),
        ),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (
        status,
        Json(ChangePasswordResponse {
            success: false,
            message,
        }),
    )
        .into_response()
}

// ─── Events & health ─────────────────────────────────────────────────────────

async fn events_handler(ws: WebSocketUpgrade, State(svc): State<AppState>) -> Response {
    let rx = svc.subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, rx))
}

async fn forward_events(socket: WebSocket, mut rx: broadcast::Receiver<ChangeEvent>) {
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else { continue };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(missed, "event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn health_handler(State(svc): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        backend: svc.backend(),
        admin_configured: svc.admin_configured(),
    })
}

// ─── Request logging ─────────────────────────────────────────────────────────

async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    response
}

// ─── Router ──────────────────────────────────────────────────────────────────

pub fn router(service: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let api = Router::new()
        .route("/food-items", get(list_handler).post(create_handler))
        .route("/food-items/trash", get(trash_handler))
        .route("/food-items/trash/clear", delete(clear_trash_handler))
        .route(
            "/food-items/{id}",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/food-items/{id}/restore", post(restore_handler))
        .route("/food-items/{id}/permanent", delete(purge_handler))
        .route("/verify-password", post(verify_password_handler))
        .route("/change-password", post(change_password_handler))
        .route("/events", get(events_handler))
        .route("/health", get(health_handler));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn(log_requests))
        .layer(cors)
        .with_state(service)
}
