//! Streaming chat endpoint for Parley.
//!
//! `POST /api/chat` forwards a conversation to the completion provider and
//! streams the reply back token by token. Once the last token has reached
//! the client the exchange is persisted and its reply cached, so a repeat
//! request for the same conversation is answered from the cache until the
//! entry expires.
//!
//! # Components
//!
//! - [`ChatService`]: validation, cache lookup, model choice, provider call
//! - [`relay()`]: bounded forwarding of provider tokens to the response body
//! - [`Recorder`]: persistence and cache refresh after a completed reply
//! - [`IdentityResolver`]: bearer token or trusted header identity
//! - [`create_router`]: the axum routes

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod auth;
mod config;
mod handler;
mod observability;
mod recorder;
mod relay;
mod server;

pub use api::{
    API_KEY_HEADER, ApiError, AppState, CACHE_STATUS_HEADER, CONVERSATION_ID_HEADER,
    create_router,
};
pub use auth::{
    Claims, HeaderIdentityResolver, IdentityResolver, JwtIdentityResolver, UserId,
    resolver_from_settings,
};
pub use config::{AuthMode, AuthSettings, CacheSettings, DatabaseSettings, ParleyConfig, ServerSettings};
pub use handler::{ChatReply, ChatService, ExchangeOutcome, ReplySource};
pub use observability::{ObservabilityConfig, init_observability};
pub use recorder::{CompletedExchange, Recorder};
pub use relay::{AbortReason, RelayOutcome, relay};
pub use server::{build_from_config, build_state, open_store, spawn_cache_sweeper};
