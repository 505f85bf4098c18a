//! Authentication middleware for Axum.
//!
//! Every request under the base path either carries a valid session cookie,
//! in which case its identity is attached to the request extensions, or is
//! redirected to the identity provider to log in. Requests to the callback
//! path are handed to the callback handler instead.

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use doorman_token::{AntiForgeryState, Identity, TokenError};
use oauth2::CsrfToken;
use std::fmt;

use crate::authenticator::Authenticator;
use crate::cookies::{self, SESSION_COOKIE};
use crate::routes;

/// Middleware entry point; install with `axum::middleware::from_fn_with_state`
/// or [`Authenticator::protect`].
pub async fn authenticate(
    State(auth): State<Authenticator>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if path == auth.callback_path() {
        return routes::complete_login(&auth, jar, request.uri()).await;
    }

    if !auth.covers(&path) {
        return next.run(request).await;
    }

    match read_session(&auth, &jar) {
        Ok(identity) => {
            tracing::debug!(email = %identity.email(), path = %path, "Session verified");
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(reason) => {
            // An expired session and a first visit look the same to the user.
            tracing::debug!(path = %path, reason = %reason, "No valid session, starting login");
            begin_login(&auth, jar, request.uri()).into_response()
        }
    }
}

/// Why a request carried no usable session.
#[derive(Debug)]
enum SessionRejection {
    Missing,
    Invalid(TokenError),
}

impl fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "no session cookie"),
            Self::Invalid(e) => write!(f, "{e}"),
        }
    }
}

fn read_session(auth: &Authenticator, jar: &CookieJar) -> Result<Identity, SessionRejection> {
    let cookie = jar.get(SESSION_COOKIE).ok_or(SessionRejection::Missing)?;
    auth.sessions()
        .decode(cookie.value())
        .map_err(SessionRejection::Invalid)
}

/// Starts a login: stashes a fresh anti-forgery state and redirects to the
/// provider.
fn begin_login(auth: &Authenticator, jar: CookieJar, uri: &Uri) -> (CookieJar, Redirect) {
    let return_to = uri.path_and_query().map(|pq| pq.as_str().to_string());
    let attempt = AntiForgeryState::new(CsrfToken::new_random().into_secret(), return_to);

    let token = auth.states().encode(&attempt, Utc::now());
    let cookie = cookies::state_cookie(token, auth.states().ttl(), auth.config());
    let auth_url = auth.provider().authorization_url(attempt.value());

    (jar.add(cookie), Redirect::to(&auth_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::STATE_COOKIE;
    use crate::test_support::*;
    use axum::http::StatusCode;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[tokio::test]
    async fn unauthenticated_request_redirects_to_provider() {
        let auth = authenticator(FakeProvider::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let app = protected_app(&auth, Arc::clone(&hits));

        let response = app
            .oneshot(request("/dashboard", &[]))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = location(&response);
        assert!(target.starts_with("https://provider.example/auth?"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let cookies = set_cookies(&response);
        let state_cookie = find_cookie(&cookies, STATE_COOKIE).expect("state cookie set");
        let stashed = auth
            .states()
            .decode(state_cookie.value())
            .expect("valid state token");

        assert_eq!(query_param(&target, "state").as_deref(), Some(stashed.value()));
        assert_eq!(stashed.return_to(), "/dashboard");
        assert!(find_cookie(&cookies, SESSION_COOKIE).is_none());
    }

    #[tokio::test]
    async fn each_login_attempt_gets_fresh_state() {
        let auth = authenticator(FakeProvider::new());
        let app = protected_app(&auth, Arc::new(AtomicUsize::new(0)));

        let first = app
            .clone()
            .oneshot(request("/dashboard", &[]))
            .await
            .expect("response");
        let second = app
            .oneshot(request("/dashboard", &[]))
            .await
            .expect("response");

        assert_ne!(
            query_param(&location(&first), "state"),
            query_param(&location(&second), "state")
        );
    }

    #[tokio::test]
    async fn valid_session_reaches_handler() {
        let auth = authenticator(FakeProvider::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let app = protected_app(&auth, Arc::clone(&hits));

        let token = auth.sessions().encode(&alice(), Utc::now(), None);
        let session = axum_extra::extract::cookie::Cookie::new(SESSION_COOKIE, token);

        let response = app
            .oneshot(request("/dashboard", &[&session]))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(body_string(response).await, "Hello, Alice");
    }

    #[tokio::test]
    async fn tampered_session_redirects_to_login() {
        let auth = authenticator(FakeProvider::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let app = protected_app(&auth, Arc::clone(&hits));

        let mut token = auth.sessions().encode(&alice(), Utc::now(), None);
        token.insert(0, 'A');
        let session = axum_extra::extract::cookie::Cookie::new(SESSION_COOKIE, token);

        let response = app
            .oneshot(request("/dashboard", &[&session]))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn expired_session_redirects_to_login() {
        let auth = authenticator(FakeProvider::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let app = protected_app(&auth, Arc::clone(&hits));

        let token = auth.sessions().encode(
            &alice(),
            Utc::now() - chrono::Duration::hours(2),
            Some(chrono::Duration::hours(1)),
        );
        let session = axum_extra::extract::cookie::Cookie::new(SESSION_COOKIE, token);

        let response = app
            .oneshot(request("/dashboard", &[&session]))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(location(&response).starts_with("https://provider.example/auth?"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn paths_outside_base_path_pass_through() {
        let config = crate::config::AuthConfig::builder(crate::config::ProviderConfig::new(
            "client-id",
            "client-secret",
            "http://localhost:8080/app/auth",
        ))
        .base_path("/app")
        .signing_secret(TEST_SECRET)
        .build();
        let auth = Authenticator::new(config, FakeProvider::new()).expect("valid config");

        let router = axum::Router::new()
            .route("/app/home", axum::routing::get(|| async { "private" }))
            .route("/health", axum::routing::get(|| async { "ok" }));
        let app = auth.protect(router);

        let response = app
            .clone()
            .oneshot(request("/health", &[]))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");

        let response = app
            .oneshot(request("/app/home", &[]))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let cookies = set_cookies(&response);
        let state_cookie = find_cookie(&cookies, STATE_COOKIE).expect("state cookie set");
        assert_eq!(state_cookie.path(), Some("/app"));
    }

    #[tokio::test]
    async fn return_target_keeps_query_string() {
        let auth = authenticator(FakeProvider::new());
        let app = protected_app(&auth, Arc::new(AtomicUsize::new(0)));

        let response = app
            .oneshot(request("/dashboard?tab=2", &[]))
            .await
            .expect("response");

        let cookies = set_cookies(&response);
        let state_cookie = find_cookie(&cookies, STATE_COOKIE).expect("state cookie set");
        let stashed = auth
            .states()
            .decode(state_cookie.value())
            .expect("valid state token");
        assert_eq!(stashed.return_to(), "/dashboard?tab=2");
    }
}
