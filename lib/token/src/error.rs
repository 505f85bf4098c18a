//! Error types for the token crate.
//!
//! - `TokenError`: a session or state token could not be trusted
//! - `StateError`: the anti-forgery state presented at callback time is invalid
//! - `KeyError`: a signing secret cannot be used

use chrono::{DateTime, Utc};
use std::fmt;

/// Errors from decoding a signed token.
///
/// Callers treat every variant as "no token": the distinction exists only so
/// the reason can be logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not structurally valid (bad encoding, truncated, oversized,
    /// or an unparseable payload).
    Malformed { reason: String },
    /// The signature does not match the payload.
    Integrity,
    /// The signature is valid but the token's lifetime has passed.
    Expired { expired_at: DateTime<Utc> },
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { reason } => {
                write!(f, "malformed token: {reason}")
            }
            Self::Integrity => {
                write!(f, "token signature mismatch")
            }
            Self::Expired { expired_at } => {
                write!(f, "token expired at {}", expired_at.to_rfc3339())
            }
        }
    }
}

impl std::error::Error for TokenError {}

/// Errors from verifying the anti-forgery state of a login callback.
///
/// All variants are the same failure from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// No stashed state token accompanied the callback.
    Missing,
    /// The stashed state token could not be decoded.
    Rejected { source: TokenError },
    /// The state echoed by the provider differs from the stashed value.
    Mismatch,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "invalid state: no state token presented"),
            Self::Rejected { source } => write!(f, "invalid state: {source}"),
            Self::Mismatch => write!(f, "invalid state: echoed value does not match"),
        }
    }
}

impl std::error::Error for StateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rejected { source } => Some(source),
            _ => None,
        }
    }
}

impl From<TokenError> for StateError {
    fn from(source: TokenError) -> Self {
        Self::Rejected { source }
    }
}

/// Errors from constructing a signing key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The secret is shorter than the minimum accepted length.
    TooShort { len: usize, min: usize },
    /// The MAC implementation refused the key.
    Unusable { reason: String },
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { len, min } => {
                write!(f, "signing secret is {len} bytes, at least {min} required")
            }
            Self::Unusable { reason } => {
                write!(f, "signing secret unusable: {reason}")
            }
        }
    }
}

impl std::error::Error for KeyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_error_malformed_display() {
        let err = TokenError::Malformed {
            reason: "bad base64".to_string(),
        };
        assert!(err.to_string().contains("malformed"));
        assert!(err.to_string().contains("bad base64"));
    }

    #[test]
    fn token_error_expired_display() {
        let expired_at = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
        let err = TokenError::Expired { expired_at };
        assert!(err.to_string().contains("expired"));
        assert!(err.to_string().contains("2023-11-14"));
    }

    #[test]
    fn state_error_wraps_token_error() {
        let err: StateError = TokenError::Integrity.into();
        assert_eq!(
            err,
            StateError::Rejected {
                source: TokenError::Integrity
            }
        );
        assert!(err.to_string().contains("signature mismatch"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn key_error_too_short_display() {
        let err = KeyError::TooShort { len: 4, min: 32 };
        assert!(err.to_string().contains("4 bytes"));
        assert!(err.to_string().contains("32"));
    }

    #[test]
    fn state_error_mismatch_display() {
        let err = StateError::Mismatch;
        assert!(err.to_string().contains("does not match"));
        assert!(std::error::Error::source(&err).is_none());
    }
}
