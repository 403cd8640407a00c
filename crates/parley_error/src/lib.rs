//! Error types for Parley.
//!
//! # Error Hierarchy
//!
//! Errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - constructors use `#[track_caller]` for automatic location capture
//!
//! Everything converts into [`ParleyError`], which also knows the HTTP status
//! an inbound request failing with it should answer with.
//!
//! # Examples
//!
//! ```
//! use parley_error::{ParleyResult, ValidationError};
//!
//! fn check(messages: &[String]) -> ParleyResult<()> {
//!     if messages.is_empty() {
//!         Err(ValidationError::new("messages must not be empty"))?
//!     }
//!     Ok(())
//! }
//!
//! assert_eq!(check(&[]).unwrap_err().status_code(), 400);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod persistence;
mod upstream;
mod validation;

pub use auth::AuthenticationError;
pub use config::ConfigError;
pub use error::{ParleyError, ParleyErrorKind, ParleyResult};
pub use persistence::{PersistenceError, PersistenceErrorKind};
pub use upstream::{UpstreamError, UpstreamErrorKind};
pub use validation::ValidationError;
