//! HTTP routes.

use crate::{ChatService, IdentityResolver};
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parley_core::{ChatRequest, ConversationId, ConversationRecord};
use parley_error::{ParleyError, PersistenceError, PersistenceErrorKind, ValidationError};
use parley_interface::ConversationStore;
use serde_json::json;
use std::sync::Arc;

/// Header naming the conversation a reply belongs to.
pub const CONVERSATION_ID_HEADER: HeaderName = HeaderName::from_static("x-conversation-id");

/// Header telling whether a reply was replayed from the cache (`hit`) or not (`miss`).
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-parley-cache");

/// Header carrying a provider key that replaces the configured one for one request.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Shared state of every route.
#[derive(Clone)]
pub struct AppState {
    chat: ChatService,
    store: Arc<dyn ConversationStore>,
    identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    /// State for the given service, store and identity scheme.
    pub fn new(
        chat: ChatService,
        store: Arc<dyn ConversationStore>,
        identity: Arc<dyn IdentityResolver>,
    ) -> Self {
        Self {
            chat,
            store,
            identity,
        }
    }

    /// The chat service behind `POST /api/chat`.
    pub fn chat(&self) -> &ChatService {
        &self.chat
    }
}

/// Error response with a `{"error": "<message>"}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Status the response carries.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ParleyError> for ApiError {
    fn from(err: ParleyError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %err, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %err, status = status.as_u16(), "Request rejected");
        }
        Self {
            status,
            message: err.public_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.message}))).into_response()
    }
}

/// Creates the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat))
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/:id",
            get(get_conversation).delete(delete_conversation),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Stream a reply to the posted conversation.
async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let user = state.identity.resolve(&headers)?;
    let request = ChatRequest::from_json(&body)?;

    if let Some(id) = &request.conversation_id
        && HeaderValue::from_str(id.as_str()).is_err()
    {
        return Err(ParleyError::from(ValidationError::new(
            "conversationId contains characters not allowed in a header",
        ))
        .into());
    }

    let api_key = headers
        .get(&API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let reply = state.chat.handle(&user, request, api_key).await?;
    // Recording continues in the background after the response is sent.
    drop(reply.completion);

    let conversation_id = HeaderValue::from_str(reply.conversation_id.as_str())
        .map_err(|e| ParleyError::from(ValidationError::new(e.to_string())))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (CONVERSATION_ID_HEADER, conversation_id),
            (
                CACHE_STATUS_HEADER,
                HeaderValue::from_static(reply.source.as_str()),
            ),
        ],
        Body::from_stream(reply.body),
    )
        .into_response())
}

/// The caller's conversations, most recently updated first.
async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ConversationRecord>>, ApiError> {
    let user = state.identity.resolve(&headers)?;
    let records = state.store.list_for_user(user.as_str()).await?;
    Ok(Json(records))
}

/// One of the caller's conversations.
async fn get_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<ConversationRecord>, ApiError> {
    let user = state.identity.resolve(&headers)?;
    let id = ConversationId::new(id)?;

    match state.store.load(&id).await? {
        Some(record) if record.is_owned_by(user.as_str()) => Ok(Json(record)),
        _ => Err(not_found()),
    }
}

/// Delete one of the caller's conversations and its cached reply.
async fn delete_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user = state.identity.resolve(&headers)?;
    let id = ConversationId::new(id)?;

    if state.store.delete(&id, user.as_str()).await? {
        state.chat.cache().invalidate(&id);
        tracing::info!(conversation_id = %id, "Deleted conversation");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}

fn not_found() -> ApiError {
    ParleyError::from(PersistenceError::new(PersistenceErrorKind::NotFound)).into()
}
