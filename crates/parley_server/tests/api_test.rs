//! HTTP routes, driven through the router with `oneshot`.

mod test_utils;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use parley_core::{ChatMessage, Conversation, ConversationId, ConversationRecord};
use parley_database::InMemoryConversationStore;
use parley_interface::ConversationStore;
use parley_server::{AuthMode, Claims, build_state, create_router};
use serde_json::{Value, json};
use std::sync::Arc;
use test_utils::{JWT_SECRET, MockProvider, test_cache, test_config, wait_for_cache, wait_for_record};
use tower::ServiceExt;

struct Harness {
    router: Router,
    provider: MockProvider,
    store: InMemoryConversationStore,
    cache: parley_cache::ConversationCache,
}

fn harness(provider: MockProvider, mode: AuthMode) -> anyhow::Result<Harness> {
    let store = InMemoryConversationStore::new();
    let cache = test_cache();
    let state = build_state(
        &test_config(mode),
        Arc::new(provider.clone()),
        Arc::new(store.clone()),
        cache.clone(),
    )?;
    Ok(Harness {
        router: create_router(state),
        provider,
        store,
        cache,
    })
}

fn post_chat(user: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn get(uri: &str, user: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .uri(uri)
        .header("x-user-id", user)
        .body(Body::empty())?)
}

async fn text(response: Response) -> anyhow::Result<String> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

async fn json_body(response: Response) -> anyhow::Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn header_str<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_health() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&[]), AuthMode::Header)?;
    let response = h
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn test_chat_streams_reply_and_records() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&["Hel", "lo!"]), AuthMode::Header)?;

    let response = h
        .router
        .clone()
        .oneshot(post_chat(
            Some("user-1"),
            json!({"messages": [{"role": "user", "content": "Hi"}]}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        header_str(&response, "content-type"),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(header_str(&response, "x-parley-cache"), Some("miss"));
    let id = ConversationId::new(header_str(&response, "x-conversation-id").unwrap_or_default())?;
    assert_eq!(text(response).await?, "Hello!");

    let record = wait_for_record(&h.store, &id).await?;
    assert_eq!(
        record.messages,
        vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")]
    );
    assert_eq!(wait_for_cache(&h.cache, &id).await?, "Hello!");

    let again = h
        .router
        .oneshot(post_chat(
            Some("user-1"),
            json!({"conversationId": id.as_str(), "messages": [{"role": "user", "content": "Hi"}]}),
        )?)
        .await?;
    assert_eq!(header_str(&again, "x-parley-cache"), Some("hit"));
    assert_eq!(text(again).await?, "Hello!");
    assert_eq!(h.provider.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_missing_identity_is_401_and_stores_nothing() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&["Hel", "lo!"]), AuthMode::Header)?;

    let response = h
        .router
        .oneshot(post_chat(
            None,
            json!({"messages": [{"role": "user", "content": "Hi"}]}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await?,
        json!({"error": "Missing x-user-id header"})
    );
    assert_eq!(h.provider.call_count(), 0);
    assert!(h.store.is_empty().await);
    assert!(h.cache.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_invalid_bodies_are_400() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&["unused"]), AuthMode::Header)?;

    for body in [
        json!({"messages": []}),
        json!({"messages": [{"role": "wizard", "content": "Hi"}]}),
        json!({"conversation": "missing messages"}),
        json!({"messages": [{"role": "user", "content": "Hi"}], "data": {"imageUrl": " "}}),
    ] {
        let response = h.router.clone().oneshot(post_chat(Some("user-1"), body)?).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await?["error"].is_string());
    }

    let malformed = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("x-user-id", "user-1")
        .body(Body::from("{not json"))?;
    let response = h.router.oneshot(malformed).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(h.provider.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_provider_status_passes_through() -> anyhow::Result<()> {
    let h = harness(
        MockProvider::rejecting(429, "Rate limit reached"),
        AuthMode::Header,
    )?;

    let response = h
        .router
        .oneshot(post_chat(
            Some("user-1"),
            json!({"messages": [{"role": "user", "content": "Hi"}]}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json_body(response).await?,
        json!({"error": "Rate limit reached"})
    );
    assert!(h.store.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_api_key_header_overrides_provider_key() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&["ok"]), AuthMode::Header)?;

    let mut request = post_chat(
        Some("user-1"),
        json!({"messages": [{"role": "user", "content": "Hi"}]}),
    )?;
    request
        .headers_mut()
        .insert("x-api-key", "sk-caller".parse()?);
    let response = h.router.oneshot(request).await?;
    assert_eq!(text(response).await?, "ok");
    assert_eq!(
        h.provider.last_request().and_then(|r| r.api_key).as_deref(),
        Some("sk-caller")
    );
    Ok(())
}

#[tokio::test]
async fn test_jwt_identity() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&["Hel", "lo!"]), AuthMode::Jwt)?;
    let claims = Claims {
        sub: Some("user-9".to_string()),
        exp: Some(chrono::Utc::now().timestamp() as usize + 3600),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(
            json!({"conversationId": "jwt-1", "messages": [{"role": "user", "content": "Hi"}]})
                .to_string(),
        ))?;
    let response = h.router.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await?, "Hello!");

    let record = wait_for_record(&h.store, &ConversationId::new("jwt-1")?).await?;
    assert!(record.is_owned_by("user-9"));

    let forged = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"wrong-secret"),
    )?;
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::AUTHORIZATION, format!("Bearer {}", forged))
        .body(Body::from(
            json!({"messages": [{"role": "user", "content": "Hi"}]}).to_string(),
        ))?;
    let response = h.router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.provider.call_count(), 1);
    Ok(())
}

async fn seed(store: &InMemoryConversationStore, id: &str, user: &str) -> anyhow::Result<ConversationRecord> {
    let conversation = Conversation::new(
        ConversationId::new(id)?,
        Some(user.to_string()),
        vec![ChatMessage::user(format!("Question {}", id)), ChatMessage::assistant("Answer")],
    );
    let record = ConversationRecord::fold(&conversation, chrono::Utc::now());
    store.save(&record).await?;
    Ok(record)
}

#[tokio::test]
async fn test_history_is_scoped_to_caller() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&[]), AuthMode::Header)?;
    seed(&h.store, "mine", "user-1").await?;
    seed(&h.store, "theirs", "user-2").await?;

    let response = h.router.clone().oneshot(get("/api/conversations", "user-1")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let list = json_body(response).await?;
    let list = list.as_array().expect("array of records");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "mine");
    assert_eq!(list[0]["title"], "Question mine");
    assert_eq!(list[0]["path"], "/chat/mine");
    assert_eq!(list[0]["userId"], "user-1");

    let response = h
        .router
        .clone()
        .oneshot(get("/api/conversations/mine", "user-1")?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?["messages"].as_array().map(Vec::len), Some(2));

    let response = h
        .router
        .oneshot(get("/api/conversations/theirs", "user-1")?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await?, json!({"error": "Not found"}));
    Ok(())
}

#[tokio::test]
async fn test_delete_conversation() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&[]), AuthMode::Header)?;
    let record = seed(&h.store, "mine", "user-1").await?;
    h.cache.insert(&record.id, Some("user-1"), vec!["Answer".to_string()]);

    let delete = |user: &str| {
        Request::builder()
            .method("DELETE")
            .uri("/api/conversations/mine")
            .header("x-user-id", user)
            .body(Body::empty())
    };

    let response = h.router.clone().oneshot(delete("user-2")?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(h.store.load(&record.id).await?.is_some());

    let response = h.router.clone().oneshot(delete("user-1")?).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(h.store.load(&record.id).await?.is_none());
    assert!(h.cache.get(&record.id).is_none());

    let response = h.router.oneshot(delete("user-1")?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_chat_on_foreign_conversation_is_404() -> anyhow::Result<()> {
    let h = harness(MockProvider::tokens(&["Hel", "lo!"]), AuthMode::Header)?;
    let record = seed(&h.store, "mine", "user-1").await?;
    h.cache.insert(&record.id, Some("user-1"), vec!["Answer".to_string()]);

    let response = h
        .router
        .oneshot(post_chat(
            Some("user-2"),
            json!({"conversationId": "mine", "messages": [{"role": "user", "content": "Hi"}]}),
        )?)
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await?, json!({"error": "Not found"}));
    assert_eq!(h.provider.call_count(), 0);
    assert_eq!(h.store.load(&record.id).await?, Some(record));
    Ok(())
}
