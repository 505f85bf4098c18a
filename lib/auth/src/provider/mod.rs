//! Identity provider abstraction.
//!
//! The middleware only needs three things from a provider: where to send the
//! browser, how to turn an authorization code into an access token, and how
//! to turn that token into an [`Identity`]. `OAuthProvider` implements this
//! against any OAuth2 authorization-code provider; tests substitute fakes.

mod oauth;

pub use oauth::OAuthProvider;

use async_trait::async_trait;
use doorman_token::Identity;
use oauth2::AccessToken;
use rootcause::prelude::Report;

use crate::error::ProviderError;

/// An external OAuth2 identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    /// Returns the URL that starts a login, carrying `state` as the OAuth2
    /// `state` parameter.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Report<ProviderError>>;

    /// Fetches the profile of the user owning `token`.
    async fn fetch_profile(&self, token: &AccessToken) -> Result<Identity, Report<ProviderError>>;
}
