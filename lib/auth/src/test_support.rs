//! Shared fixtures for the crate's tests.

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
    routing::get,
};
use axum_extra::extract::cookie::Cookie;
use doorman_token::Identity;
use oauth2::AccessToken;
use rootcause::prelude::Report;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use crate::authenticator::Authenticator;
use crate::config::{AuthConfig, ProviderConfig};
use crate::error::ProviderError;
use crate::identity::CurrentIdentity;
use crate::provider::IdentityProvider;

pub(crate) const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// Provider double that records how often a code was exchanged.
#[derive(Clone)]
pub(crate) struct FakeProvider {
    identity: Identity,
    behavior: Behavior,
    exchanges: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self {
            identity: alice(),
            behavior: Behavior::Succeed,
            exchanges: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            behavior: Behavior::Fail,
            ..Self::new()
        }
    }

    pub(crate) fn hanging() -> Self {
        Self {
            behavior: Behavior::Hang,
            ..Self::new()
        }
    }

    pub(crate) fn exchange_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.exchanges)
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn authorization_url(&self, state: &str) -> String {
        format!(
            "https://provider.example/auth?client_id=client-id&response_type=code&state={state}"
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, Report<ProviderError>> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(AccessToken::new(format!("token-for-{code}"))),
            Behavior::Fail => Err(ProviderError::TokenExchange {
                details: "invalid_grant".to_string(),
            }
            .into()),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(AccessToken::new(format!("token-for-{code}")))
            }
        }
    }

    async fn fetch_profile(&self, _token: &AccessToken) -> Result<Identity, Report<ProviderError>> {
        Ok(self.identity.clone())
    }
}

pub(crate) fn alice() -> Identity {
    Identity::new("108", "Alice", "alice@example.com")
}

/// Configuration for a plain-HTTP app on localhost with `/auth` as callback.
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig::builder(ProviderConfig::new(
        "client-id",
        "client-secret",
        "http://localhost:8080/auth",
    ))
    .signing_secret(TEST_SECRET)
    .secure_cookies(false)
    .build()
}

pub(crate) fn authenticator(provider: FakeProvider) -> Authenticator {
    Authenticator::new(test_config(), provider).expect("valid test config")
}

/// A protected app whose `/dashboard` greets the user and counts hits.
pub(crate) fn protected_app(auth: &Authenticator, hits: Arc<AtomicUsize>) -> Router {
    let router = Router::new().route(
        "/dashboard",
        get(move |CurrentIdentity(identity): CurrentIdentity| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                format!("Hello, {}", identity.name())
            }
        }),
    );
    auth.protect(router)
}

pub(crate) fn request(uri: &str, cookies: &[&Cookie<'_>]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if !cookies.is_empty() {
        let header = cookies
            .iter()
            .map(|c| format!("{}={}", c.name(), c.value()))
            .collect::<Vec<_>>()
            .join("; ");
        builder = builder.header(header::COOKIE, header);
    }
    builder.body(Body::empty()).expect("valid request")
}

pub(crate) fn set_cookies<B>(response: &Response<B>) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| {
            let value = value.to_str().expect("ascii set-cookie").to_string();
            Cookie::parse(value).expect("valid set-cookie")
        })
        .collect()
}

pub(crate) fn find_cookie<'a>(
    cookies: &'a [Cookie<'static>],
    name: &str,
) -> Option<&'a Cookie<'static>> {
    cookies.iter().find(|c| c.name() == name)
}

pub(crate) fn location<B>(response: &Response<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
        .to_string()
}

pub(crate) fn query_param(url: &str, name: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .expect("absolute URL")
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub(crate) async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
