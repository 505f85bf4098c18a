//! Signed, self-contained tokens for doorman.
//!
//! This crate provides:
//! - The authenticated principal (`Identity`)
//! - Session tokens carrying an identity (`SessionCodec`)
//! - Anti-forgery state tokens for the login round trip (`StateCodec`)
//! - Token error types
//!
//! Both codecs sign with HMAC-SHA256 under one server-held `SigningKey` and
//! produce URL-safe strings suitable for cookie values. Nothing is stored
//! server-side: every field a request needs travels in its tokens.
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use doorman_token::{Identity, SessionCodec, SigningKey, TokenError};
//!
//! let key = SigningKey::new("an example secret of at least 32 bytes").unwrap();
//! let sessions = SessionCodec::new(key);
//!
//! let alice = Identity::new("108", "Alice", "alice@example.com");
//! let token = sessions.encode(&alice, Utc::now(), Some(Duration::hours(8)));
//!
//! assert_eq!(sessions.decode(&token), Ok(alice));
//! assert!(matches!(
//!     sessions.decode("garbage"),
//!     Err(TokenError::Malformed { .. })
//! ));
//! ```

pub mod error;
pub mod identity;
pub mod session;
pub mod signing;
pub mod state;

// Re-export main types at crate root
pub use error::{KeyError, StateError, TokenError};
pub use identity::Identity;
pub use session::SessionCodec;
pub use signing::{MAX_TOKEN_LEN, MIN_KEY_LEN, SigningKey};
pub use state::{AntiForgeryState, DEFAULT_STATE_TTL_MINUTES, StateCodec};
