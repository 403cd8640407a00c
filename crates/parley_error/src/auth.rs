//! Caller identity error types.

/// No authenticated user could be resolved for the request.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Authentication Error: {} at line {} in {}", message, line, file)]
pub struct AuthenticationError {
    /// Why the identity could not be resolved
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl AuthenticationError {
    /// Create a new AuthenticationError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_error::AuthenticationError;
    ///
    /// let err = AuthenticationError::new("missing bearer token");
    /// assert!(format!("{}", err).contains("Authentication Error"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
