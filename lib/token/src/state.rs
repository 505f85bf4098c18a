//! Anti-forgery state for the login redirect round trip.
//!
//! A fresh random value is generated for every login attempt. The raw value
//! goes to the identity provider as the OAuth2 `state` parameter, and a signed,
//! short-lived state token carrying the same value (plus the path the browser
//! originally asked for) is stashed client-side. On callback the provider's
//! echo must match the stashed value exactly.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{StateError, TokenError};
use crate::signing::{Signer, SigningKey};

const STATE_PURPOSE: &str = "doorman-state";

/// Default lifetime of a state token: long enough for the provider round trip.
pub const DEFAULT_STATE_TTL_MINUTES: i64 = 10;

/// Return target used when none was recorded or the recorded one is unsafe.
const ROOT: &str = "/";

/// The value stashed for one login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AntiForgeryState {
    value: String,
    return_to: Option<String>,
}

impl AntiForgeryState {
    /// Creates state for a login attempt.
    ///
    /// `return_to` is the path (and query) to send the browser back to after
    /// login.
    #[must_use]
    pub fn new(value: impl Into<String>, return_to: Option<String>) -> Self {
        Self {
            value: value.into(),
            return_to,
        }
    }

    /// Returns the raw anti-forgery value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns where to send the browser after login.
    ///
    /// Falls back to `/` unless the recorded target is a local absolute path,
    /// so a forged target can never redirect off-site.
    #[must_use]
    pub fn return_to(&self) -> &str {
        match self.return_to.as_deref() {
            Some(target) if is_local_path(target) => target,
            _ => ROOT,
        }
    }
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}

#[derive(Debug, Serialize, Deserialize)]
struct StateClaims {
    v: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    r: Option<String>,
    iat: i64,
    exp: i64,
}

/// Encodes and verifies state tokens.
#[derive(Debug, Clone)]
pub struct StateCodec {
    signer: Signer,
    ttl: Duration,
}

impl StateCodec {
    /// Creates a state codec with the default lifetime.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self {
            signer: Signer::new(key, STATE_PURPOSE),
            ttl: Duration::minutes(DEFAULT_STATE_TTL_MINUTES),
        }
    }

    /// Overrides the state token lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Returns the state token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mints the client-side state token for `state`.
    ///
    /// # Panics
    ///
    /// Never in practice: the claims are plain strings and integers, which
    /// `serde_json` always serializes.
    #[must_use]
    pub fn encode(&self, state: &AntiForgeryState, issued_at: DateTime<Utc>) -> String {
        let iat = issued_at.timestamp();
        let claims = StateClaims {
            v: state.value.clone(),
            r: state.return_to.clone(),
            iat,
            exp: iat.saturating_add(self.ttl.num_seconds()),
        };

        let payload = serde_json::to_vec(&claims).expect("serialize state claims");
        self.signer.seal(&payload)
    }

    /// Decodes a state token against the current time.
    ///
    /// # Errors
    ///
    /// Returns `StateError::Rejected` if the token is malformed, tampered
    /// with, or expired.
    pub fn decode(&self, token: &str) -> Result<AntiForgeryState, StateError> {
        self.decode_at(token, Utc::now())
    }

    /// Decodes a state token as of `now`.
    ///
    /// # Errors
    ///
    /// See [`decode`](Self::decode).
    pub fn decode_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AntiForgeryState, StateError> {
        let payload = self.signer.open(token)?;

        let claims: StateClaims =
            serde_json::from_slice(&payload).map_err(|e| TokenError::Malformed {
                reason: format!("invalid state payload: {e}"),
            })?;

        if now.timestamp() > claims.exp {
            let expired_at =
                DateTime::from_timestamp(claims.exp, 0).unwrap_or(DateTime::UNIX_EPOCH);
            return Err(TokenError::Expired { expired_at }.into());
        }

        Ok(AntiForgeryState {
            value: claims.v,
            return_to: claims.r,
        })
    }

    /// Checks the provider-echoed `state` against the stashed token.
    ///
    /// # Errors
    ///
    /// - `StateError::Missing` if no token was stashed
    /// - `StateError::Rejected` if the token does not decode
    /// - `StateError::Mismatch` if the values differ
    pub fn verify(
        &self,
        stashed: Option<&str>,
        echoed: &str,
    ) -> Result<AntiForgeryState, StateError> {
        self.verify_at(stashed, echoed, Utc::now())
    }

    /// Like [`verify`](Self::verify), as of `now`.
    ///
    /// # Errors
    ///
    /// See [`verify`](Self::verify).
    pub fn verify_at(
        &self,
        stashed: Option<&str>,
        echoed: &str,
        now: DateTime<Utc>,
    ) -> Result<AntiForgeryState, StateError> {
        let stashed = stashed.ok_or(StateError::Missing)?;
        let state = self.decode_at(stashed, now)?;

        if !bool::from(state.value.as_bytes().ct_eq(echoed.as_bytes())) {
            return Err(StateError::Mismatch);
        }

        Ok(state)
    }
}
