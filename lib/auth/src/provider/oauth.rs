//! OAuth2 authorization-code provider with a JSON userinfo endpoint.

use async_trait::async_trait;
use doorman_token::Identity;
use oauth2::{
    AccessToken, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl,
    Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use rootcause::prelude::Report;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

use super::IdentityProvider;
use crate::config::ProviderConfig;
use crate::error::{ConfigError, ProviderError};

/// Identity provider speaking OAuth2 plus a userinfo endpoint.
///
/// URLs are validated once at construction; the oauth2 client is rebuilt per
/// call from the parsed values.
#[derive(Clone)]
pub struct OAuthProvider {
    client_id: ClientId,
    client_secret: ClientSecret,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    redirect_url: RedirectUrl,
    userinfo_url: reqwest::Url,
    scopes: Vec<Scope>,
    http_client: reqwest::Client,
}

impl OAuthProvider {
    /// Creates a provider from configuration.
    ///
    /// `timeout` bounds every HTTP request the provider makes.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self, Report<ConfigError>> {
        let auth_url =
            AuthUrl::new(config.auth_url().to_string()).map_err(|e| ConfigError::InvalidUrl {
                field: "auth_url",
                details: e.to_string(),
            })?;
        let token_url =
            TokenUrl::new(config.token_url().to_string()).map_err(|e| ConfigError::InvalidUrl {
                field: "token_url",
                details: e.to_string(),
            })?;
        let redirect_url = RedirectUrl::new(config.redirect_url().to_string()).map_err(|e| {
            ConfigError::InvalidUrl {
                field: "redirect_url",
                details: e.to_string(),
            }
        })?;
        let userinfo_url =
            reqwest::Url::parse(config.userinfo_url()).map_err(|e| ConfigError::InvalidUrl {
                field: "userinfo_url",
                details: e.to_string(),
            })?;

        // Provider endpoints are never followed through redirects.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient {
                details: e.to_string(),
            })?;

        Ok(Self {
            client_id: ClientId::new(config.client_id().to_string()),
            client_secret: ClientSecret::new(config.client_secret().to_string()),
            auth_url,
            token_url,
            redirect_url,
            userinfo_url,
            scopes: config
                .scopes()
                .into_iter()
                .map(|s| Scope::new(s.to_string()))
                .collect(),
            http_client,
        })
    }
}

#[async_trait]
impl IdentityProvider for OAuthProvider {
    fn authorization_url(&self, state: &str) -> String {
        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let state = state.to_string();
        let (url, _) = client
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.scopes.iter().cloned())
            .url();

        url.to_string()
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Report<ProviderError>> {
        let client = BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let token_result = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| ProviderError::TokenExchange {
                details: e.to_string(),
            })?;

        Ok(token_result.access_token().clone())
    }

    #[instrument(skip_all)]
    async fn fetch_profile(&self, token: &AccessToken) -> Result<Identity, Report<ProviderError>> {
        let response = self
            .http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| ProviderError::Profile {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Profile {
                details: format!("userinfo endpoint returned {status}"),
            }
            .into());
        }

        let profile: UserInfo = response.json().await.map_err(|e| ProviderError::Profile {
            details: e.to_string(),
        })?;

        Ok(profile.into_identity()?)
    }
}

/// Profile returned by the userinfo endpoint.
///
/// Google's v2 endpoint names the subject `id`; OpenID Connect names it `sub`.
#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(alias = "sub")]
    id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

impl UserInfo {
    fn into_identity(self) -> Result<Identity, ProviderError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ProviderError::IncompleteProfile { field: "id" })?;
        let email = self
            .email
            .filter(|email| !email.is_empty())
            .ok_or(ProviderError::IncompleteProfile { field: "email" })?;
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| email.clone());

        Ok(Identity::new(id, name, email).with_picture(self.picture))
    }
}
