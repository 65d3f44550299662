//! Token issuance endpoints.
//!
//! - POST `/login` - Exchange username and password for a token pair
//! - POST `/refresh` - Exchange a refresh token for a new token pair

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::Uri,
    routing::post,
};
use serde::Deserialize;

use super::error::{ApiError, ResultExt};
use crate::auth::{Authenticator, TokenPair};

const LOGIN_FAILED: &str = "Incorrect username or password";
const REFRESH_FAILED: &str = "Invalid refresh token";

#[derive(Clone)]
pub struct TokensState {
    pub auth: Authenticator,
}

pub fn router(state: TokensState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .with_state(state)
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshRequest {
    refresh_token: String,
}

/// Check credentials and issue an access/refresh token pair.
async fn login(
    State(state): State<TokensState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let pair = state
        .auth
        .login(&payload.username, &payload.password)
        .await
        .auth_err(LOGIN_FAILED)?;

    Ok(Json(pair))
}

/// Reissue both tokens from a valid refresh token.
/// The token is read from the `refresh_token` query parameter, or a JSON body.
async fn refresh(
    State(state): State<TokensState>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<TokenPair>, ApiError> {
    let refresh_token = refresh_token_from(&uri, &body)
        .ok_or_else(|| ApiError::unauthorized(REFRESH_FAILED))?;

    let pair = state.auth.refresh(&refresh_token).auth_err(REFRESH_FAILED)?;

    Ok(Json(pair))
}

fn refresh_token_from(uri: &Uri, body: &[u8]) -> Option<String> {
    if let Ok(Query(params)) = Query::<RefreshRequest>::try_from_uri(uri) {
        return Some(params.refresh_token);
    }
    serde_json::from_slice::<RefreshRequest>(body)
        .ok()
        .map(|request| request.refresh_token)
}
