//! Policy store error kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PolicyError {
    /// Malformed domain, or minutes outside the allowed range.
    Validation { message: String },
    /// The domain is covered by an active hard lockout.
    LockoutRefusal { domain: String, locked_until: String },
    /// The on-disk document could not be read or parsed.
    Load { message: String },
    /// The on-disk document could not be durably written.
    Save { message: String },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::Validation { message } => write!(f, "invalid request: {message}"),
            PolicyError::LockoutRefusal { domain, locked_until } => {
                write!(f, "{domain} is hard-locked until {locked_until}")
            }
            PolicyError::Load { message } => write!(f, "failed to load policy: {message}"),
            PolicyError::Save { message } => write!(f, "failed to save policy: {message}"),
        }
    }
}

impl std::error::Error for PolicyError {}
