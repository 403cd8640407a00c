//! OpenAI-compatible streaming completion provider.
//!
//! [`OpenAiClient`] implements [`parley_interface::CompletionProvider`] over
//! the `/chat/completions` endpoint with `stream: true`, decoding the
//! Server-Sent Events reply into plain text tokens.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod request;
mod response;
mod selector;
mod sse;

pub use client::OpenAiClient;
pub use config::{OpenAiConfig, OpenAiConfigBuilder, OpenAiConfigBuilderError};
pub use convert::to_chat_request;
pub use request::{ChatCompletionRequest, ContentPart, ImageUrl, Message, MessageContent};
pub use response::{ApiErrorBody, ApiErrorEnvelope, ChatCompletionChunk, ChunkChoice, Delta};
pub use selector::ModelSelector;
pub use sse::{ChunkEvent, DONE_SENTINEL, SseDecoder, parse_event, token_stream};
