//! Access to the identity the middleware attached to a request.

use axum::{
    extract::FromRequestParts,
    http::{Extensions, StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use doorman_token::Identity;
use std::ops::Deref;

/// Returns the identity attached to a request, if any.
///
/// Always `None` for requests that did not pass through the middleware.
#[must_use]
pub fn current_identity(extensions: &Extensions) -> Option<&Identity> {
    extensions.get::<Identity>()
}

/// Extractor for requiring an authenticated identity.
///
/// Rejects with 401 when the handler is reached without the middleware.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl Deref for CurrentIdentity {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = MissingIdentity;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_identity(&parts.extensions)
            .cloned()
            .map(CurrentIdentity)
            .ok_or(MissingIdentity)
    }
}

/// Extractor for optionally getting the authenticated identity.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(current_identity(&parts.extensions).cloned()))
    }
}

/// Rejection for [`CurrentIdentity`].
#[derive(Debug)]
pub struct MissingIdentity;

impl IntoResponse for MissingIdentity {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, "Not authorized").into_response()
    }
}
