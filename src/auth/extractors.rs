//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::header::get_bearer_token;
use super::state::HasAuthenticator;
use crate::jwt::Subject;

/// Extractor for endpoints that require a valid access token.
/// Reads `Authorization: Bearer <token>` and verifies it statelessly.
pub struct BearerAuth(pub Subject);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: HasAuthenticator + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = get_bearer_token(&parts.headers)
            .ok_or(ApiAuthError::new(AuthErrorKind::NotAuthenticated))?;

        state
            .authenticator()
            .authorize(token)
            .map(BearerAuth)
            .map_err(|_| ApiAuthError::new(AuthErrorKind::InvalidToken))
    }
}

/// Optional authentication extractor - never fails.
/// Useful for endpoints that work both authenticated and unauthenticated.
pub struct OptionalAuth(pub Option<Subject>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasAuthenticator + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let subject = get_bearer_token(&parts.headers)
            .and_then(|token| state.authenticator().authorize(token).ok());
        Ok(OptionalAuth(subject))
    }
}
