//! Top-level error wrapper types.

use crate::{AuthenticationError, ConfigError, PersistenceError, UpstreamError, ValidationError};

/// Every failure a Parley component can report.
///
/// # Examples
///
/// ```
/// use parley_error::{ParleyError, ValidationError};
///
/// let err: ParleyError = ValidationError::new("messages must not be empty").into();
/// assert!(format!("{}", err).contains("Validation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ParleyErrorKind {
    /// Malformed or empty request
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Caller identity missing or invalid
    #[from(AuthenticationError)]
    Authentication(AuthenticationError),
    /// Completion provider failure
    #[from(UpstreamError)]
    Upstream(UpstreamError),
    /// Cache or conversation store failure
    #[from(PersistenceError)]
    Persistence(PersistenceError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Parley error with kind discrimination.
///
/// # Examples
///
/// ```
/// use parley_error::{AuthenticationError, ParleyResult};
///
/// fn resolve_user() -> ParleyResult<String> {
///     Err(AuthenticationError::new("missing bearer token"))?
/// }
///
/// let err = resolve_user().unwrap_err();
/// assert_eq!(err.status_code(), 401);
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Parley Error: {}", _0)]
pub struct ParleyError(Box<ParleyErrorKind>);

impl ParleyError {
    /// Create a new error from a kind.
    pub fn new(kind: ParleyErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ParleyErrorKind {
        &self.0
    }

    /// HTTP status an inbound request failing with this error answers with.
    ///
    /// Provider rejections pass the provider's status through; anything the
    /// caller cannot fix maps to 500.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ParleyErrorKind::Validation(_) => 400,
            ParleyErrorKind::Authentication(_) => 401,
            ParleyErrorKind::Upstream(e) => e.status().unwrap_or(500),
            ParleyErrorKind::Persistence(e) => match e.kind {
                crate::PersistenceErrorKind::NotFound => 404,
                _ => 500,
            },
            ParleyErrorKind::Config(_) => 500,
        }
    }

    /// Message safe to hand back to the HTTP caller.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ParleyErrorKind::Validation(e) => e.message.clone(),
            ParleyErrorKind::Authentication(e) => e.message.clone(),
            ParleyErrorKind::Upstream(e) => match e.status() {
                Some(_) => e.public_message(),
                None => "Internal server error".to_string(),
            },
            ParleyErrorKind::Persistence(e) => match e.kind {
                crate::PersistenceErrorKind::NotFound => "Not found".to_string(),
                _ => "Internal server error".to_string(),
            },
            ParleyErrorKind::Config(_) => "Internal server error".to_string(),
        }
    }
}

// Generic From implementation for any type that converts to ParleyErrorKind
impl<T> From<T> for ParleyError
where
    T: Into<ParleyErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Parley operations.
pub type ParleyResult<T> = std::result::Result<T, ParleyError>;
