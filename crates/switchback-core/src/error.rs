#![forbid(unsafe_code)]

//! Typed failures for intent resolution.
//!
//! Resolution is synchronous and mutation-free: a failed lookup or a
//! malformed address reports here and leaves the registry untouched.

use std::fmt;

/// Errors raised while resolving keys, URLs, or intentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentError {
    /// The string could not be parsed as a URL, even after a
    /// percent-encoding retry.
    InvalidUrl { url: String },
    /// The URL parsed, but its scheme belongs to a different registry.
    InvalidScheme { scheme: String, expected: String },
    /// No intention is registered under this key.
    InvalidPath { path: String },
    /// An entry exists but its intention cannot serve this intent.
    InvalidIntention,
    /// Failures with no dedicated variant.
    Unknown { msg: String },
}

impl fmt::Display for IntentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { url } => write!(f, "invalid url {url:?}"),
            Self::InvalidScheme { scheme, expected } => write!(
                f,
                "scheme {scheme:?} does not match registry scheme {expected:?}"
            ),
            Self::InvalidPath { path } => {
                write!(f, "no intention registered for key {path:?}")
            }
            Self::InvalidIntention => {
                write!(f, "registered intention cannot serve this intent")
            }
            Self::Unknown { msg } => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for IntentError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_context() {
        let err = IntentError::InvalidScheme {
            scheme: "handler".into(),
            expected: "route".into(),
        };
        let text = err.to_string();
        assert!(text.contains("handler"), "got: {text}");
        assert!(text.contains("route"), "got: {text}");
    }

    #[test]
    fn is_a_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&IntentError::InvalidIntention);
    }
}
