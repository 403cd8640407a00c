//! Persistence error types for the cache and the conversation store.

/// Persistence error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PersistenceErrorKind {
    /// Connection failed
    #[display("Database connection error: {}", _0)]
    Connection(String),
    /// Query execution failed
    #[display("Database query error: {}", _0)]
    Query(String),
    /// Serialization/deserialization error
    #[display("Serialization error: {}", _0)]
    Serialization(String),
    /// Migration error
    #[display("Migration error: {}", _0)]
    Migration(String),
    /// Record not found
    #[display("Record not found")]
    NotFound,
    /// Blocking database task did not complete
    #[display("Database task failed: {}", _0)]
    TaskJoin(String),
}

/// Persistence error with source location tracking.
///
/// # Examples
///
/// ```
/// use parley_error::{PersistenceError, PersistenceErrorKind};
///
/// let err = PersistenceError::new(PersistenceErrorKind::NotFound);
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Persistence Error: {} at line {} in {}", kind, line, file)]
pub struct PersistenceError {
    /// The kind of error that occurred
    pub kind: PersistenceErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl PersistenceError {
    /// Create a new PersistenceError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PersistenceErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for PersistenceError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => PersistenceError::new(PersistenceErrorKind::NotFound),
            _ => PersistenceError::new(PersistenceErrorKind::Query(err.to_string())),
        }
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for PersistenceError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        PersistenceError::new(PersistenceErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<serde_json::Error> for PersistenceError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::new(PersistenceErrorKind::Serialization(err.to_string()))
    }
}
