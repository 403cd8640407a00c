//! Forwarding of provider tokens to the client.
//!
//! A producer task drains the provider stream into a bounded channel that
//! the response body reads from. The task's result says whether the reply
//! reached the client whole.

use futures_util::StreamExt;
use parley_error::ParleyResult;
use parley_interface::TokenStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

/// Why a reply stopped before the provider finished it.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum AbortReason {
    /// The provider stream failed
    #[display("upstream failure: {}", _0)]
    Upstream(String),
    /// The client went away
    #[display("client disconnected")]
    ClientDisconnected,
    /// The relay task itself did not finish
    #[display("relay task failed: {}", _0)]
    TaskFailed(String),
}

/// How a relayed reply ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Every token reached the client and the provider ended the stream
    Completed {
        /// Tokens in the order they were forwarded
        tokens: Vec<String>,
    },
    /// The reply stopped early; forwarded tokens stay with the client
    Aborted {
        /// What stopped it
        reason: AbortReason,
        /// Tokens forwarded before it stopped
        tokens_sent: usize,
    },
}

impl RelayOutcome {
    /// Whether the reply finished normally.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Progress of one relay.
#[derive(Debug, Default)]
enum RelayState {
    #[default]
    Idle,
    Streaming { forwarded: Vec<String> },
}

impl RelayState {
    fn forwarded(self, token: String) -> Self {
        match self {
            Self::Idle => {
                tracing::trace!("First token forwarded");
                Self::Streaming {
                    forwarded: vec![token],
                }
            }
            Self::Streaming { mut forwarded } => {
                forwarded.push(token);
                Self::Streaming { forwarded }
            }
        }
    }

    fn tokens_sent(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Streaming { forwarded } => forwarded.len(),
        }
    }

    fn complete(self) -> RelayOutcome {
        let tokens = match self {
            Self::Idle => Vec::new(),
            Self::Streaming { forwarded } => forwarded,
        };
        tracing::debug!(tokens = tokens.len(), "Relay completed");
        RelayOutcome::Completed { tokens }
    }

    fn abort(self, reason: AbortReason) -> RelayOutcome {
        let tokens_sent = self.tokens_sent();
        tracing::warn!(%reason, tokens_sent, "Relay aborted");
        RelayOutcome::Aborted {
            reason,
            tokens_sent,
        }
    }
}

/// Start relaying `upstream` through a channel holding at most `capacity` tokens.
///
/// Returns the body stream for the client and the handle resolving to the
/// relay's outcome. Dropping the body stream counts as a client disconnect.
/// After an upstream failure the body yields that error as its last item.
pub fn relay(upstream: TokenStream, capacity: usize) -> (TokenStream, JoinHandle<RelayOutcome>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::spawn(drive(upstream, tx).in_current_span());
    (Box::pin(ReceiverStream::new(rx)), handle)
}

async fn drive(mut upstream: TokenStream, tx: mpsc::Sender<ParleyResult<String>>) -> RelayOutcome {
    let mut state = RelayState::Idle;

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => return state.abort(AbortReason::ClientDisconnected),
            next = upstream.next() => next,
        };

        match next {
            Some(Ok(token)) => {
                if tx.send(Ok(token.clone())).await.is_err() {
                    return state.abort(AbortReason::ClientDisconnected);
                }
                state = state.forwarded(token);
            }
            Some(Err(e)) => {
                let reason = AbortReason::Upstream(e.to_string());
                tracing::error!(error = %e, "Provider stream failed mid-reply");
                // The client may already be gone; the outcome is the same.
                let _ = tx.send(Err(e)).await;
                return state.abort(reason);
            }
            None => return state.complete(),
        }
    }
}
