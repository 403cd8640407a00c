//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Who authored a message. Nothing outside these three is accepted.
///
/// # Examples
///
/// ```
/// use parley_core::Role;
///
/// let role: Role = serde_json::from_str("\"assistant\"").unwrap();
/// assert_eq!(role, Role::Assistant);
/// assert_eq!(format!("{}", Role::System), "system");
///
/// assert!(serde_json::from_str::<Role>("\"function\"").is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System messages provide context and instructions
    #[display("system")]
    System,
    /// User messages are from the human
    #[display("user")]
    User,
    /// Assistant messages are from the model
    #[display("assistant")]
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}
