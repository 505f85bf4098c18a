//! Keyed signing shared by the session and state codecs.
//!
//! A sealed token is `base64url(payload || HMAC-SHA256(purpose || 0 || payload))`
//! without padding. The purpose label keeps tokens minted for one use from
//! verifying as another, even under the same secret.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::error::{KeyError, TokenError};

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag in bytes.
const SIGNATURE_LEN: usize = 32;

/// Longest token accepted for decoding. Matches the practical cookie size limit.
pub const MAX_TOKEN_LEN: usize = 4096;

/// Shortest signing secret accepted, in bytes.
pub const MIN_KEY_LEN: usize = 32;

/// Server-held secret used to sign and verify tokens.
///
/// The secret never appears in `Debug` output.
#[derive(Clone)]
pub struct SigningKey {
    mac: HmacSha256,
    len: usize,
}

impl SigningKey {
    /// Creates a signing key from raw secret bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::TooShort` if the secret is shorter than
    /// [`MIN_KEY_LEN`] bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, KeyError> {
        let secret = secret.as_ref();
        if secret.len() < MIN_KEY_LEN {
            return Err(KeyError::TooShort {
                len: secret.len(),
                min: MIN_KEY_LEN,
            });
        }

        let mac = HmacSha256::new_from_slice(secret).map_err(|e| KeyError::Unusable {
            reason: e.to_string(),
        })?;

        Ok(Self {
            mac,
            len: secret.len(),
        })
    }

    /// Returns the secret length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false: empty secrets are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Seals and opens tokens for a single purpose.
#[derive(Debug, Clone)]
pub(crate) struct Signer {
    key: SigningKey,
    purpose: &'static str,
}

impl Signer {
    pub(crate) fn new(key: SigningKey, purpose: &'static str) -> Self {
        Self { key, purpose }
    }

    fn tag(&self, payload: &[u8]) -> HmacSha256 {
        let mut mac = self.key.mac.clone();
        mac.update(self.purpose.as_bytes());
        mac.update(&[0]);
        mac.update(payload);
        mac
    }

    /// Signs `payload` and returns the transport-safe token.
    pub(crate) fn seal(&self, payload: &[u8]) -> String {
        let signature = self.tag(payload).finalize().into_bytes();

        let mut raw = Vec::with_capacity(payload.len() + SIGNATURE_LEN);
        raw.extend_from_slice(payload);
        raw.extend_from_slice(&signature);

        URL_SAFE_NO_PAD.encode(raw)
    }

    /// Verifies `token` and returns its payload.
    ///
    /// The signature is checked in constant time before the payload is
    /// returned; nothing in the payload is inspected first.
    pub(crate) fn open(&self, token: &str) -> Result<Vec<u8>, TokenError> {
        if token.len() > MAX_TOKEN_LEN {
            return Err(TokenError::Malformed {
                reason: format!("token exceeds {MAX_TOKEN_LEN} bytes"),
            });
        }

        let mut raw = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| TokenError::Malformed {
                reason: format!("invalid encoding: {e}"),
            })?;

        if raw.len() <= SIGNATURE_LEN {
            return Err(TokenError::Malformed {
                reason: "token too short".to_string(),
            });
        }

        let signature = raw.split_off(raw.len() - SIGNATURE_LEN);
        self.tag(&raw)
            .verify_slice(&signature)
            .map_err(|_| TokenError::Integrity)?;

        Ok(raw)
    }
}
