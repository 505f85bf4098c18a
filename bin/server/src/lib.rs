//! Example server protected by doorman.
//!
//! Every route requires login. The greeting at `/` additionally checks the
//! logged-in email against an optional allow-listed address.

pub mod config;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use doorman_auth::{Authenticator, CurrentIdentity};
use std::sync::Arc;

/// Application state for the greeting handler.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    authorized: Option<Arc<str>>,
}

impl AppState {
    /// Creates state allowing only `authorized`, or everyone when `None`.
    #[must_use]
    pub fn new(authorized: Option<String>) -> Self {
        Self {
            authorized: authorized.map(Arc::from),
        }
    }
}

/// Builds the application router.
pub fn app(auth: &Authenticator, state: AppState) -> Router {
    let protected = Router::new().route("/", get(greet)).with_state(state);

    auth.protect(protected)
        .route("/logout", auth.logout_handler())
}

async fn greet(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
) -> Response {
    if let Some(authorized) = state.authorized.as_deref()
        && identity.email() != authorized
    {
        tracing::info!(email = %identity.email(), "Rejected user not on the allow list");
        return (
            StatusCode::FORBIDDEN,
            format!("User {} not allowed", identity.email()),
        )
            .into_response();
    }

    format!("Hello, {}", identity.name()).into_response()
}
