//! Configuration error types.

/// Configuration error with source location.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", message, line, file)]
pub struct ConfigError {
    /// Error message
    pub message: String,
    /// Setting the error refers to, when there is one
    pub setting: Option<String>,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use parley_error::ConfigError;
    ///
    /// let err = ConfigError::new("Failed to parse parley.toml");
    /// assert!(err.message.contains("parley.toml"));
    /// assert!(err.setting.is_none());
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            setting: None,
            line: location.line(),
            file: location.file(),
        }
    }

    /// A required setting has no value.
    ///
    /// ```
    /// use parley_error::ConfigError;
    ///
    /// let err = ConfigError::missing("provider.api_key");
    /// assert_eq!(err.setting.as_deref(), Some("provider.api_key"));
    /// ```
    #[track_caller]
    pub fn missing(setting: impl Into<String>) -> Self {
        let setting = setting.into();
        let location = std::panic::Location::caller();
        Self {
            message: format!("{} is not set", setting),
            setting: Some(setting),
            line: location.line(),
            file: location.file(),
        }
    }
}
