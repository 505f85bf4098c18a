//! Session tokens carrying an authenticated identity.
//!
//! A session token is self-contained: the identity, issue time and optional
//! expiry travel in the token itself, signed with the server secret. There is
//! no server-side session record to look up or delete.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::identity::Identity;
use crate::signing::{Signer, SigningKey};

const SESSION_PURPOSE: &str = "doorman-session";

/// Signed payload of a session token.
///
/// Field order is fixed, so identical input always serializes to identical
/// bytes.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    name: String,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Encodes and decodes session tokens.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    signer: Signer,
}

impl SessionCodec {
    /// Creates a session codec signing with `key`.
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        Self {
            signer: Signer::new(key, SESSION_PURPOSE),
        }
    }

    /// Mints a session token for `identity`.
    ///
    /// With `ttl` set, the token stops verifying once `issued_at + ttl` has
    /// passed. Timestamps are kept at one-second resolution: `issued_at` is
    /// truncated to the whole second, so a session may end up to a second
    /// before `issued_at + ttl`.
    ///
    /// # Panics
    ///
    /// Never in practice: the claims are plain strings and integers, which
    /// `serde_json` always serializes.
    #[must_use]
    pub fn encode(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
        ttl: Option<Duration>,
    ) -> String {
        let iat = issued_at.timestamp();
        let claims = SessionClaims {
            sub: identity.id().to_string(),
            name: identity.name().to_string(),
            email: identity.email().to_string(),
            picture: identity.picture().map(str::to_string),
            iat,
            exp: ttl.map(|ttl| iat.saturating_add(ttl.num_seconds())),
        };

        let payload = serde_json::to_vec(&claims).expect("serialize session claims");
        self.signer.seal(&payload)
    }

    /// Decodes a session token against the current time.
    ///
    /// # Errors
    ///
    /// See [`decode_at`](Self::decode_at).
    pub fn decode(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_at(token, Utc::now())
    }

    /// Decodes a session token as of `now`.
    ///
    /// # Errors
    ///
    /// - `TokenError::Integrity` if the signature does not verify
    /// - `TokenError::Expired` if the token had a lifetime and `now` is past it
    /// - `TokenError::Malformed` for any structurally invalid token
    ///
    /// Expiry is compared in whole seconds; a token stays valid through the
    /// entire second of its expiry timestamp.
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let payload = self.signer.open(token)?;

        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|e| TokenError::Malformed {
                reason: format!("invalid session payload: {e}"),
            })?;

        if let Some(exp) = claims.exp
            && now.timestamp() > exp
        {
            let expired_at = DateTime::from_timestamp(exp, 0).unwrap_or(DateTime::UNIX_EPOCH);
            return Err(TokenError::Expired { expired_at });
        }

        Ok(Identity::new(claims.sub, claims.name, claims.email).with_picture(claims.picture))
    }
}
