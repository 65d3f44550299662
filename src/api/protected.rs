//! Example protected resource.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::auth::{Authenticator, BearerAuth};
use crate::impl_has_authenticator;

#[derive(Clone)]
pub struct ProtectedState {
    pub auth: Authenticator,
}

impl_has_authenticator!(ProtectedState);

pub fn router(state: ProtectedState) -> Router {
    Router::new()
        .route("/protected", get(protected))
        .with_state(state)
}

#[derive(Serialize)]
struct WelcomeResponse {
    message: String,
}

async fn protected(BearerAuth(subject): BearerAuth) -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("Welcome, {}!", subject),
    })
}
