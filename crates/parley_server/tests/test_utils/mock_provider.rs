//! Scripted completion provider.

use async_trait::async_trait;
use futures::StreamExt;
use parley_error::{ParleyError, ParleyResult, UpstreamError, UpstreamErrorKind};
use parley_interface::{CompletionProvider, CompletionRequest, TokenStream};
use std::sync::{Arc, Mutex};

/// What the mock does when asked for a completion.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Stream these tokens, then end normally
    Tokens(Vec<String>),
    /// Refuse the request with a status
    Reject { status: u16, message: String },
    /// Stream these tokens, then fail
    FailAfter { tokens: Vec<String>, message: String },
    /// Stream these tokens, then never finish
    Stall(Vec<String>),
}

/// Completion provider returning scripted replies and recording requests.
///
/// Clones share call counts and recorded requests.
#[derive(Debug, Clone)]
pub struct MockProvider {
    behavior: MockBehavior,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

fn owned(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Provider streaming `tokens`.
    pub fn tokens(tokens: &[&str]) -> Self {
        Self::new(MockBehavior::Tokens(owned(tokens)))
    }

    /// Provider rejecting every request.
    pub fn rejecting(status: u16, message: &str) -> Self {
        Self::new(MockBehavior::Reject {
            status,
            message: message.to_string(),
        })
    }

    /// Provider failing after `tokens`.
    pub fn failing_after(tokens: &[&str], message: &str) -> Self {
        Self::new(MockBehavior::FailAfter {
            tokens: owned(tokens),
            message: message.to_string(),
        })
    }

    /// Provider hanging after `tokens`.
    pub fn stalling_after(tokens: &[&str]) -> Self {
        Self::new(MockBehavior::Stall(owned(tokens)))
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Most recent completion request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn stream_completion(&self, req: &CompletionRequest) -> ParleyResult<TokenStream> {
        self.requests.lock().unwrap().push(req.clone());

        let ok = |tokens: Vec<String>| futures::stream::iter(tokens.into_iter().map(Ok));
        match self.behavior.clone() {
            MockBehavior::Tokens(tokens) => Ok(Box::pin(ok(tokens))),
            MockBehavior::Reject { status, message } => {
                Err(UpstreamError::new(UpstreamErrorKind::Rejected { status, message }).into())
            }
            MockBehavior::FailAfter { tokens, message } => {
                let failure: ParleyResult<String> = Err(ParleyError::from(UpstreamError::new(
                    UpstreamErrorKind::Stream(message),
                )));
                Ok(Box::pin(ok(tokens).chain(futures::stream::once(async move {
                    failure
                }))))
            }
            MockBehavior::Stall(tokens) => {
                Ok(Box::pin(ok(tokens).chain(futures::stream::pending())))
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
