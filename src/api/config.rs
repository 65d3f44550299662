//! Public configuration endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::auth::{Authenticator, BEARER, OptionalAuth};
use crate::impl_has_authenticator;

/// Version embedded at compile time from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct ConfigState {
    pub auth: Authenticator,
}

impl_has_authenticator!(ConfigState);

#[derive(Serialize)]
struct ConfigResponse {
    authenticated: bool,
    token_type: &'static str,
    access_token_ttl: i64,
    refresh_token_ttl: i64,
    version: &'static str,
}

pub fn router(state: ConfigState) -> Router {
    Router::new().route("/config", get(get_config)).with_state(state)
}

async fn get_config(
    State(state): State<ConfigState>,
    OptionalAuth(subject): OptionalAuth,
) -> Json<ConfigResponse> {
    let settings = state.auth.codec().settings();
    Json(ConfigResponse {
        authenticated: subject.is_some(),
        token_type: BEARER,
        access_token_ttl: settings.access_ttl_secs,
        refresh_token_ttl: settings.refresh_ttl_secs,
        version: VERSION,
    })
}
