//! Error types for the completion provider.

/// Error kinds for completion provider calls.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum UpstreamErrorKind {
    /// The provider answered with a non-success status.
    #[display("Provider rejected request ({}): {}", status, message)]
    Rejected {
        /// HTTP status returned by the provider
        status: u16,
        /// Provider-supplied error message
        message: String,
    },

    /// The request never reached the provider or the connection broke.
    #[display("Provider transport failed: {}", _0)]
    Transport(String),

    /// The response stream broke after it started.
    #[display("Provider stream error: {}", _0)]
    Stream(String),

    /// A streamed event could not be decoded.
    #[display("Failed to decode provider response: {}", _0)]
    Deserialization(String),
}

/// Error wrapper with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Upstream Error: {} at line {} in {}", kind, line, file)]
pub struct UpstreamError {
    /// The error kind
    pub kind: UpstreamErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl UpstreamError {
    /// Create a new UpstreamError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: UpstreamErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Status code reported by the provider, if it answered at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_error::{UpstreamError, UpstreamErrorKind};
    ///
    /// let err = UpstreamError::new(UpstreamErrorKind::Rejected {
    ///     status: 429,
    ///     message: "Rate limit reached".to_string(),
    /// });
    /// assert_eq!(err.status(), Some(429));
    ///
    /// let err = UpstreamError::new(UpstreamErrorKind::Transport("refused".to_string()));
    /// assert_eq!(err.status(), None);
    /// ```
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            UpstreamErrorKind::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message suitable for the client: the provider's own text when it gave one.
    pub fn public_message(&self) -> String {
        match &self.kind {
            UpstreamErrorKind::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
