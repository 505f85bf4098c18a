//! Authentication error types.

use doorman_token::KeyError;
use std::fmt;

/// Errors raised while building an `Authenticator` from configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A configured URL does not parse.
    InvalidUrl {
        /// The offending configuration field.
        field: &'static str,
        /// Error details.
        details: String,
    },
    /// A configured path is not absolute.
    InvalidPath {
        /// The offending configuration field.
        field: &'static str,
        /// The configured value.
        path: String,
    },
    /// The callback path is not covered by the protected base path, so the
    /// cookies it needs would never reach it.
    CallbackOutsideBasePath {
        callback_path: String,
        base_path: String,
    },
    /// A numeric setting is outside its accepted range.
    OutOfRange {
        /// The offending configuration field.
        field: &'static str,
        /// The configured value.
        value: String,
        /// What the field accepts.
        expected: &'static str,
    },
    /// The signing secret is unusable.
    SigningKey { source: KeyError },
    /// The HTTP client could not be constructed.
    HttpClient {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { field, details } => {
                write!(f, "invalid URL in '{field}': {details}")
            }
            Self::InvalidPath { field, path } => {
                write!(f, "'{field}' must be an absolute path, got '{path}'")
            }
            Self::CallbackOutsideBasePath {
                callback_path,
                base_path,
            } => write!(
                f,
                "callback path '{callback_path}' is outside base path '{base_path}'"
            ),
            Self::OutOfRange {
                field,
                value,
                expected,
            } => write!(f, "'{field}' is {value}, expected {expected}"),
            Self::SigningKey { source } => write!(f, "invalid signing secret: {source}"),
            Self::HttpClient { details } => {
                write!(f, "failed to build HTTP client: {details}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SigningKey { source } => Some(source),
            _ => None,
        }
    }
}

/// Errors from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The authorization code could not be exchanged for an access token.
    TokenExchange {
        /// Error details.
        details: String,
    },
    /// The user profile could not be fetched.
    Profile {
        /// Error details.
        details: String,
    },
    /// The profile lacks a field every identity needs.
    IncompleteProfile {
        /// The missing field.
        field: &'static str,
    },
    /// The provider did not answer in time.
    Timeout {
        /// The call that timed out.
        operation: &'static str,
        /// The configured bound in seconds.
        seconds: u64,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TokenExchange { details } => write!(f, "code exchange failed: {details}"),
            Self::Profile { details } => write!(f, "profile fetch failed: {details}"),
            Self::IncompleteProfile { field } => {
                write!(f, "provider profile is missing '{field}'")
            }
            Self::Timeout { operation, seconds } => {
                write!(f, "{operation} timed out after {seconds}s")
            }
        }
    }
}

impl std::error::Error for ProviderError {}
