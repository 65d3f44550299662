mod config;
mod error;
mod protected;
mod tokens;

use axum::Router;

use crate::auth::Authenticator;

pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(auth: Authenticator) -> Router {
    let tokens_state = tokens::TokensState { auth: auth.clone() };

    let protected_state = protected::ProtectedState { auth: auth.clone() };

    let config_state = config::ConfigState { auth };

    Router::new()
        .merge(tokens::router(tokens_state))
        .merge(protected::router(protected_state))
        .merge(config::router(config_state))
}
