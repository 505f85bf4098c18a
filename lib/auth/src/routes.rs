//! Login callback and logout routes.

use axum::{
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use doorman_token::StateError;
use rootcause::prelude::Report;
use serde::Deserialize;

use crate::authenticator::Authenticator;
use crate::cookies::{self, STATE_COOKIE};
use crate::error::ProviderError;

/// Query parameters the provider sends to the callback.
#[derive(Debug, Default, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Handles the provider redirect after the user authenticates.
pub async fn callback(State(auth): State<Authenticator>, jar: CookieJar, uri: Uri) -> Response {
    complete_login(&auth, jar, &uri).await
}

/// Verifies the callback and, on success, starts a session.
///
/// The state cookie is consumed whatever the outcome.
pub(crate) async fn complete_login(auth: &Authenticator, jar: CookieJar, uri: &Uri) -> Response {
    let query = Query::<CallbackQuery>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_default();

    let stashed = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(cookies::clear_state_cookie(auth.config()));

    match login(auth, query, stashed.as_deref()).await {
        Ok((session, return_to)) => (jar.add(session), Redirect::to(&return_to)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn login(
    auth: &Authenticator,
    query: CallbackQuery,
    stashed: Option<&str>,
) -> Result<(Cookie<'static>, String), CallbackError> {
    // State is checked before anything else the provider sent is trusted.
    let echoed = query.state.as_deref().unwrap_or_default();
    let attempt = auth
        .states()
        .verify(stashed, echoed)
        .map_err(CallbackError::InvalidState)?;

    if let Some(error) = query.error {
        return Err(CallbackError::Declined {
            error,
            description: query.error_description,
        });
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let identity = auth
        .resolve_identity(&code)
        .await
        .map_err(CallbackError::Provider)?;

    let token = auth
        .sessions()
        .encode(&identity, Utc::now(), auth.config().session_ttl());
    tracing::info!(email = %identity.email(), "Login succeeded");

    Ok((
        cookies::session_cookie(token, auth.config()),
        attempt.return_to().to_string(),
    ))
}

/// Ends the session by clearing the session cookie.
///
/// Session tokens are self-contained, so a copy of the cookie taken before
/// logout stays valid until it expires.
pub async fn logout(State(auth): State<Authenticator>, jar: CookieJar) -> impl IntoResponse {
    (
        jar.add(cookies::clear_session_cookie(auth.config())),
        Redirect::to(auth.config().base_path()),
    )
}

/// Callback errors.
#[derive(Debug)]
pub enum CallbackError {
    /// The echoed state is missing, stale or does not match the stashed one.
    InvalidState(StateError),
    /// The provider reported that the user did not grant access.
    Declined {
        error: String,
        description: Option<String>,
    },
    /// The callback carried no authorization code.
    MissingCode,
    /// The provider failed during the code exchange or profile fetch.
    Provider(Report<ProviderError>),
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::InvalidState(e) => {
                tracing::warn!("Rejected login callback: {}", e);
                (StatusCode::UNAUTHORIZED, "Invalid login state")
            }
            Self::Declined { error, description } => {
                tracing::warn!(
                    error = %error,
                    description = description.as_deref().unwrap_or_default(),
                    "Provider declined login"
                );
                (StatusCode::UNAUTHORIZED, "Login was not completed")
            }
            Self::MissingCode => (StatusCode::BAD_REQUEST, "Missing authorization code"),
            Self::Provider(report) => {
                tracing::error!("Identity provider failed: {}", report);
                (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed")
            }
        };

        (status, message).into_response()
    }
}
