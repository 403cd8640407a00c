//! Incremental decoding of the provider's Server-Sent Events stream.

use crate::{ApiErrorEnvelope, ChatCompletionChunk};
use futures_util::{Stream, StreamExt};
use parley_error::{ParleyError, UpstreamError, UpstreamErrorKind};
use parley_interface::TokenStream;

/// Payload that terminates an OpenAI-style stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Splits a byte stream into SSE `data` payloads.
///
/// Events may arrive split across network chunks or several to a chunk;
/// bytes are buffered until a blank line closes the event.
///
/// # Examples
///
/// ```
/// use parley_models::SseDecoder;
///
/// let mut decoder = SseDecoder::default();
/// assert!(decoder.push(b"data: {\"a\"").unwrap().is_empty());
/// let events = decoder.push(b":1}\n\ndata: [DONE]\n\n").unwrap();
/// assert_eq!(events, vec!["{\"a\":1}".to_string(), "[DONE]".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    // Prefix of `buffer` already searched for an event boundary
    scanned: usize,
}

impl SseDecoder {
    /// Feed bytes and collect the `data` payloads of every completed event.
    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, UpstreamError> {
        self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut payloads = Vec::new();
        let mut start = 0;
        // Back up one byte: the boundary may straddle the previous push
        let mut search_from = self.scanned.saturating_sub(1);
        while let Some(offset) = self.buffer[search_from..]
            .windows(2)
            .position(|w| w == b"\n\n")
        {
            let end = search_from + offset;
            if let Some(data) = Self::event_data(&self.buffer[start..end])? {
                payloads.push(data);
            }
            start = end + 2;
            search_from = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        Ok(payloads)
    }

    /// Flush an event left unterminated when the stream closed.
    pub fn finish(&mut self) -> Result<Option<String>, UpstreamError> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let trimmed = rest.strip_suffix(b"\n").unwrap_or(&rest);
        Self::event_data(trimmed)
    }

    fn event_data(event: &[u8]) -> Result<Option<String>, UpstreamError> {
        let text = std::str::from_utf8(event).map_err(|e| {
            UpstreamError::new(UpstreamErrorKind::Stream(format!("Invalid UTF-8: {}", e)))
        })?;

        let data: Vec<&str> = text
            .lines()
            .filter(|line| !line.starts_with(':'))
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|value| value.strip_prefix(' ').unwrap_or(value))
            .collect();

        if data.is_empty() {
            Ok(None)
        } else {
            Ok(Some(data.join("\n")))
        }
    }
}

/// What one `data` payload means for the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkEvent {
    /// Next piece of the reply
    Token(String),
    /// A chunk with no text (role announcement, finish reason)
    Empty,
    /// End of the reply
    Done,
}

/// Interpret one `data` payload.
pub fn parse_event(data: &str) -> Result<ChunkEvent, UpstreamError> {
    if data.trim() == DONE_SENTINEL {
        return Ok(ChunkEvent::Done);
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => Ok(chunk
            .token()
            .map(|t| ChunkEvent::Token(t.to_string()))
            .unwrap_or(ChunkEvent::Empty)),
        Err(e) => match serde_json::from_str::<ApiErrorEnvelope>(data) {
            Ok(envelope) => Err(UpstreamError::new(UpstreamErrorKind::Stream(
                envelope.error.message,
            ))),
            Err(_) => Err(UpstreamError::new(UpstreamErrorKind::Deserialization(
                format!("Failed to parse chunk: {}", e),
            ))),
        },
    }
}

/// Turn a raw SSE byte stream into the ordered stream of reply tokens.
///
/// The stream ends at `[DONE]` or when the bytes run out; the first
/// transport or decoding error is yielded and ends it.
pub fn token_stream<S, B, E>(bytes: S) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut bytes = std::pin::pin!(bytes);
        let mut decoder = SseDecoder::default();
        let mut tokens = 0_usize;

        loop {
            let chunk = match bytes.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, tokens, "Provider stream failed");
                    yield Err(ParleyError::from(UpstreamError::new(UpstreamErrorKind::Stream(
                        e.to_string(),
                    ))));
                    return;
                }
                None => break,
            };

            let payloads = match decoder.push(chunk.as_ref()) {
                Ok(payloads) => payloads,
                Err(e) => {
                    yield Err(ParleyError::from(e));
                    return;
                }
            };

            for data in payloads {
                match parse_event(&data) {
                    Ok(ChunkEvent::Token(token)) => {
                        tokens += 1;
                        yield Ok(token);
                    }
                    Ok(ChunkEvent::Empty) => {}
                    Ok(ChunkEvent::Done) => {
                        tracing::debug!(tokens, "Provider stream finished");
                        return;
                    }
                    Err(e) => {
                        yield Err(ParleyError::from(e));
                        return;
                    }
                }
            }
        }

        match decoder.finish() {
            Ok(Some(data)) => match parse_event(&data) {
                Ok(ChunkEvent::Token(token)) => yield Ok(token),
                Ok(_) => {}
                Err(e) => yield Err(ParleyError::from(e)),
            },
            Ok(None) => {}
            Err(e) => yield Err(ParleyError::from(e)),
        }
        tracing::debug!(tokens, "Provider stream closed without [DONE]");
    })
}
