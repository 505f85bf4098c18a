//! OAuth2 login middleware for Axum applications.
//!
//! This crate provides:
//! - Configuration (`AuthConfig`, `ProviderConfig`)
//! - The shared `Authenticator` that wraps routers and serves the callback
//! - The middleware itself (`authenticate`)
//! - Identity access for handlers (`CurrentIdentity`, `current_identity`)
//! - The identity provider seam (`IdentityProvider`, `OAuthProvider`)
//!
//! Sessions are signed cookies; there is no server-side session store.
//!
//! # Example
//!
//! ```no_run
//! use axum::{Router, routing::get};
//! use doorman_auth::{AuthConfig, Authenticator, CurrentIdentity, ProviderConfig};
//!
//! # fn build() -> Router {
//! let config = AuthConfig::builder(ProviderConfig::new(
//!     "client-id",
//!     "client-secret",
//!     "http://localhost:8080/auth",
//! ))
//! .secure_cookies(false)
//! .build();
//! let auth = Authenticator::from_config(config).expect("valid config");
//!
//! let app = Router::new().route(
//!     "/",
//!     get(|user: CurrentIdentity| async move { format!("Hello, {}", user.name()) }),
//! );
//! auth.protect(app)
//! # }
//! ```

pub mod authenticator;
pub mod config;
pub mod cookies;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod provider;
pub mod routes;

#[cfg(test)]
mod test_support;

// Re-export main types at crate root
pub use authenticator::Authenticator;
pub use config::{AuthConfig, AuthConfigBuilder, ProviderConfig};
pub use cookies::{SESSION_COOKIE, STATE_COOKIE};
pub use doorman_token::Identity;
pub use error::{ConfigError, ProviderError};
pub use identity::{CurrentIdentity, MissingIdentity, OptionalIdentity, current_identity};
pub use middleware::authenticate;
pub use provider::{IdentityProvider, OAuthProvider};
pub use routes::CallbackError;
