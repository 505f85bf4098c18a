//! Authentication configuration.
//!
//! Configuration is read once at startup and never mutated afterwards.
//! Fields with defaults can be omitted when loading from environment
//! variables.

use serde::Deserialize;
use std::fmt;

/// Google's OAuth2 authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Google's OAuth2 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google's userinfo endpoint.
pub const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Configuration for the OAuth2 identity provider.
///
/// Endpoints default to Google's. Point them elsewhere to use any provider
/// offering the authorization-code flow and a JSON userinfo endpoint.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The redirect URL registered with the provider (e.g., "https://app.example.com/auth").
    redirect_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Authorization endpoint the browser is redirected to.
    #[serde(default = "default_auth_url")]
    auth_url: String,
    /// Token endpoint for the code exchange.
    #[serde(default = "default_token_url")]
    token_url: String,
    /// Endpoint returning the user's profile for an access token.
    #[serde(default = "default_userinfo_url")]
    userinfo_url: String,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_auth_url() -> String {
    GOOGLE_AUTH_URL.to_string()
}

fn default_token_url() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

fn default_userinfo_url() -> String {
    GOOGLE_USERINFO_URL.to_string()
}

impl ProviderConfig {
    /// Creates a provider configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scopes: default_scopes(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            userinfo_url: default_userinfo_url(),
        }
    }

    /// Sets the scopes to request.
    #[must_use]
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scopes = scopes
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(",");
        self
    }

    /// Overrides the provider endpoints.
    #[must_use]
    pub fn with_endpoints(
        mut self,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
        userinfo_url: impl Into<String>,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    /// Returns the scopes to request, parsed from the comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    #[must_use]
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    #[must_use]
    pub fn userinfo_url(&self) -> &str {
        &self.userinfo_url
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_url", &self.redirect_url)
            .field("scopes", &self.scopes)
            .field("auth_url", &self.auth_url)
            .field("token_url", &self.token_url)
            .field("userinfo_url", &self.userinfo_url)
            .finish()
    }
}

/// Configuration for the authentication middleware.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Identity provider settings.
    provider: ProviderConfig,
    /// Path the provider redirects back to.
    /// Default: the path of the provider redirect URL.
    #[serde(default)]
    callback_path: Option<String>,
    /// Path prefix the middleware protects. Cookies are scoped to it.
    /// Default: "/"
    #[serde(default = "default_base_path")]
    base_path: String,
    /// Secret for signing session and state tokens (at least 32 bytes).
    /// When absent a random key is generated per process.
    #[serde(default)]
    signing_secret: Option<String>,
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Defaults to true for production safety; set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    secure_cookies: bool,
    /// Session lifetime in minutes. Zero disables expiry; negative values
    /// are rejected at startup.
    #[serde(default = "default_session_ttl_minutes")]
    session_ttl_minutes: i64,
    /// Upper bound on each identity provider call, in seconds. Must be
    /// positive.
    #[serde(default = "default_provider_timeout_seconds")]
    provider_timeout_seconds: u64,
}

fn default_base_path() -> String {
    "/".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

fn default_session_ttl_minutes() -> i64 {
    24 * 60
}

fn default_provider_timeout_seconds() -> u64 {
    10
}

impl AuthConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            callback_path: None,
            base_path: default_base_path(),
            signing_secret: None,
            secure_cookies: default_secure_cookies(),
            session_ttl_minutes: default_session_ttl_minutes(),
            provider_timeout_seconds: default_provider_timeout_seconds(),
        }
    }

    /// Creates a configuration builder for more customization.
    #[must_use]
    pub fn builder(provider: ProviderConfig) -> AuthConfigBuilder {
        AuthConfigBuilder::new(provider)
    }

    #[must_use]
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Returns the explicitly configured callback path, if any.
    #[must_use]
    pub fn callback_path(&self) -> Option<&str> {
        self.callback_path.as_deref()
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn signing_secret(&self) -> Option<&str> {
        self.signing_secret.as_deref()
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Returns the session lifetime, or `None` when sessions never expire.
    ///
    /// Negative or unrepresentable values also yield `None` here;
    /// `Authenticator::new` rejects them before any session is minted.
    #[must_use]
    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        if self.session_ttl_minutes <= 0 {
            return None;
        }
        chrono::Duration::try_minutes(self.session_ttl_minutes)
    }

    /// Returns the configured session lifetime in minutes, unvalidated.
    #[must_use]
    pub fn session_ttl_minutes(&self) -> i64 {
        self.session_ttl_minutes
    }

    #[must_use]
    pub fn provider_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.provider_timeout_seconds)
    }

    #[must_use]
    pub fn provider_timeout_seconds(&self) -> u64 {
        self.provider_timeout_seconds
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("provider", &self.provider)
            .field("callback_path", &self.callback_path)
            .field("base_path", &self.base_path)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("secure_cookies", &self.secure_cookies)
            .field("session_ttl_minutes", &self.session_ttl_minutes)
            .field("provider_timeout_seconds", &self.provider_timeout_seconds)
            .finish()
    }
}

/// Builder for `AuthConfig`.
#[derive(Debug)]
pub struct AuthConfigBuilder {
    config: AuthConfig,
}

impl AuthConfigBuilder {
    /// Creates a new builder with the required provider settings.
    #[must_use]
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            config: AuthConfig::new(provider),
        }
    }

    /// Sets the callback path explicitly.
    #[must_use]
    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.config.callback_path = Some(path.into());
        self
    }

    /// Sets the protected path prefix.
    #[must_use]
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.config.base_path = path.into();
        self
    }

    /// Sets the token signing secret.
    #[must_use]
    pub fn signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.signing_secret = Some(secret.into());
        self
    }

    /// Sets whether cookies carry the Secure flag.
    #[must_use]
    pub fn secure_cookies(mut self, secure: bool) -> Self {
        self.config.secure_cookies = secure;
        self
    }

    /// Sets the session lifetime in minutes. Zero disables expiry.
    #[must_use]
    pub fn session_ttl_minutes(mut self, minutes: i64) -> Self {
        self.config.session_ttl_minutes = minutes;
        self
    }

    /// Sets the per-call identity provider timeout in seconds.
    #[must_use]
    pub fn provider_timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.provider_timeout_seconds = seconds;
        self
    }

    /// Builds the `AuthConfig`.
    #[must_use]
    pub fn build(self) -> AuthConfig {
        self.config
    }
}

/// Returns true if `path` is `base` or lies beneath it.
pub(crate) fn is_under(path: &str, base: &str) -> bool {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return true;
    }
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
