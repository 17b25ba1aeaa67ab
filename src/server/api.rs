use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use colored::*;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::document::{Document, Frame, WriteRequest};
use crate::error::SyncError;
use crate::server::auth::AdminKey;
use crate::store::{Database, StateStore};
use crate::sync::SyncHub;

#[derive(Clone)]
pub struct AppState {
    pub store: StateStore,
    pub hub: Arc<SyncHub>,
    pub admin: AdminKey,
    /// Serializes read-assign-persist so versions stay strictly sequential.
    write_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    pub fn new(store: StateStore, hub: Arc<SyncHub>, admin: AdminKey) -> Self {
        Self {
            store,
            hub,
            admin,
            write_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }
}

pub async fn serve(config: Config) -> Result<()> {
    let db = Arc::new(Database::new(&config.db_path)?);
    db.initialize()?;

    let state = AppState::new(
        StateStore::new(db),
        Arc::new(SyncHub::new()),
        AdminKey::new(&config.admin_password),
    );

    let index = ServeFile::new(config.static_dir.join("index.html"));
    let app = Router::new()
        .route("/api/state", get(get_state).post(set_state))
        .route("/ws", get(ws_handler))
        .route_service("/", index)
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    println!(
        "{} Map sync server running at {}",
        "✓".green(),
        format!("http://{}", config.bind_addr).bright_blue()
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `GET /api/state` — current document, no auth, no side effects.
async fn get_state(State(state): State<AppState>) -> Result<Json<Document>, ApiError> {
    let doc = state.store.get().await?;
    Ok(Json(doc))
}

/// `POST /api/state` — admin write: validate, bump version, persist,
/// then broadcast. The broadcast is strictly downstream of a successful
/// persist; a storage failure returns 500 and pushes nothing.
async fn set_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let presented = headers
        .get("x-admin-password")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if !state.admin.verify(presented) {
        return Err(SyncError::Unauthorized.into());
    }

    let request = WriteRequest::parse(body)?;

    let new_doc = {
        let _guard = state.write_lock.lock().await;
        let current = state.store.get().await?;
        let next = current.advance(request.objects);
        state.store.set(next.clone()).await?;
        next
    };

    let delivered = state.hub.broadcast(&Frame::state(new_doc.clone()));
    info!(
        version = new_doc.version,
        delivered, "state updated and broadcast"
    );

    Ok(Json(json!({ "ok": true, "version": new_doc.version })))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(state, socket))
}

/// One viewer connection: register, send the catch-up frame, then
/// forward broadcast frames until the socket closes. Inbound frames are
/// keepalive only and are discarded.
async fn handle_ws(state: AppState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();

    let (conn_id, mut rx) = state.hub.attach();
    info!(
        "viewer {conn_id} connected ({} online)",
        state.hub.connection_count()
    );

    // Catch-up frame so a new viewer is current before any future broadcast
    match state.store.get().await {
        Ok(doc) => {
            let _ = state.hub.send_to(&conn_id, &Frame::state(doc));
        }
        Err(err) => {
            error!("failed to load state for viewer {conn_id}: {err}");
            state.hub.detach(&conn_id);
            return;
        }
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender
                .send(Message::Text(payload.to_string().into()))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(other) => debug!("ignoring inbound frame: {other:?}"),
            }
        }
    });

    // Whichever half finishes first tears the connection down
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.detach(&conn_id);
    info!(
        "viewer {conn_id} disconnected ({} online)",
        state.hub.connection_count()
    );
}

/// Maps the error taxonomy onto HTTP responses.
struct ApiError(SyncError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            SyncError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            SyncError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            SyncError::Storage(err) => {
                error!("storage failure: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage unavailable".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<SyncError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
