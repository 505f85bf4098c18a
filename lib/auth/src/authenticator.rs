//! The authenticator: configuration, codecs and provider bundled for sharing
//! across requests.

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{MethodRouter, get},
};
use doorman_token::{SessionCodec, SigningKey, StateCodec};
use oauth2::{CsrfToken, RedirectUrl};
use rootcause::prelude::Report;
use std::sync::Arc;

use crate::config::{AuthConfig, is_under};
use crate::error::{ConfigError, ProviderError};
use crate::provider::{IdentityProvider, OAuthProvider};
use crate::{middleware, routes};

/// Shared authentication state.
///
/// Cloning is cheap. Everything inside is immutable after construction, so
/// one `Authenticator` serves any number of concurrent requests.
#[derive(Clone)]
pub struct Authenticator {
    inner: Arc<Inner>,
}

struct Inner {
    config: AuthConfig,
    callback_path: String,
    sessions: SessionCodec,
    states: StateCodec,
    provider: Arc<dyn IdentityProvider>,
}

impl Authenticator {
    /// Creates an authenticator using the OAuth2 provider described by
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: AuthConfig) -> Result<Self, Report<ConfigError>> {
        let provider = OAuthProvider::new(config.provider(), config.provider_timeout())?;
        Self::new(config, provider)
    }

    /// Creates an authenticator with an explicit identity provider.
    ///
    /// Without a configured signing secret a random key is generated, so
    /// sessions do not survive a restart.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the redirect URL does not parse
    /// - the base or callback path is not absolute
    /// - the callback path lies outside the base path
    /// - the signing secret is shorter than 32 bytes
    /// - the session lifetime is negative or too large to represent
    /// - the provider timeout is zero
    pub fn new(
        config: AuthConfig,
        provider: impl IdentityProvider,
    ) -> Result<Self, Report<ConfigError>> {
        let ttl_minutes = config.session_ttl_minutes();
        if ttl_minutes < 0 || chrono::Duration::try_minutes(ttl_minutes).is_none() {
            return Err(ConfigError::OutOfRange {
                field: "session_ttl_minutes",
                value: ttl_minutes.to_string(),
                expected: "zero (no expiry) or a positive number of minutes",
            }
            .into());
        }
        if config.provider_timeout_seconds() == 0 {
            return Err(ConfigError::OutOfRange {
                field: "provider_timeout_seconds",
                value: "0".to_string(),
                expected: "a positive number of seconds",
            }
            .into());
        }

        let base_path = config.base_path();
        if !base_path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                field: "base_path",
                path: base_path.to_string(),
            }
            .into());
        }

        let callback_path = match config.callback_path() {
            Some(path) => path.to_string(),
            None => RedirectUrl::new(config.provider().redirect_url().to_string())
                .map_err(|e| ConfigError::InvalidUrl {
                    field: "redirect_url",
                    details: e.to_string(),
                })?
                .url()
                .path()
                .to_string(),
        };
        if !callback_path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                field: "callback_path",
                path: callback_path,
            }
            .into());
        }
        if !is_under(&callback_path, base_path) {
            return Err(ConfigError::CallbackOutsideBasePath {
                callback_path,
                base_path: base_path.to_string(),
            }
            .into());
        }

        let key = match config.signing_secret() {
            Some(secret) => {
                SigningKey::new(secret).map_err(|source| ConfigError::SigningKey { source })?
            }
            None => {
                tracing::warn!(
                    "No signing secret configured; generated a random key. \
                     Sessions will not survive a restart"
                );
                SigningKey::new(CsrfToken::new_random_len(32).secret())
                    .map_err(|source| ConfigError::SigningKey { source })?
            }
        };

        tracing::info!(
            callback_path = %callback_path,
            base_path = %base_path,
            "Authenticator configured"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                sessions: SessionCodec::new(key.clone()),
                states: StateCodec::new(key),
                callback_path,
                provider: Arc::new(provider),
                config,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    /// Returns the path the provider redirects back to.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.inner.callback_path
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionCodec {
        &self.inner.sessions
    }

    #[must_use]
    pub fn states(&self) -> &StateCodec {
        &self.inner.states
    }

    #[must_use]
    pub fn provider(&self) -> &dyn IdentityProvider {
        self.inner.provider.as_ref()
    }

    /// Returns true if requests to `path` require a session.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        is_under(path, self.inner.config.base_path())
    }

    /// Wraps `router` so every route under the base path requires a session.
    ///
    /// The callback route is mounted on the router as well; do not add it
    /// separately.
    pub fn protect<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .route(self.callback_path(), self.callback_handler())
            .layer(from_fn_with_state(self.clone(), middleware::authenticate))
    }

    /// Returns the callback handler as a standalone route.
    pub fn callback_handler<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        get(routes::callback).with_state(self.clone())
    }

    /// Returns a handler that ends the session and redirects to the base path.
    pub fn logout_handler<S>(&self) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        get(routes::logout).with_state(self.clone())
    }

    /// Exchanges `code` with the provider and fetches the user's identity.
    ///
    /// Each provider call is bounded by the configured timeout.
    pub(crate) async fn resolve_identity(
        &self,
        code: &str,
    ) -> Result<doorman_token::Identity, Report<ProviderError>> {
        let timeout = self.inner.config.provider_timeout();
        let provider = self.provider();

        let token = match tokio::time::timeout(timeout, provider.exchange_code(code)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProviderError::Timeout {
                    operation: "code exchange",
                    seconds: timeout.as_secs(),
                }
                .into());
            }
        };

        match tokio::time::timeout(timeout, provider.fetch_profile(&token)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                operation: "profile fetch",
                seconds: timeout.as_secs(),
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("config", &self.inner.config)
            .field("callback_path", &self.inner.callback_path)
            .finish_non_exhaustive()
    }
}
