pub mod api;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod credentials;
pub mod db;
pub mod jwt;
pub mod password;
pub mod secrets;

use api::create_api_router;
use auth::Authenticator;
use axum::Router;
use clock::Clock;
use credentials::CredentialStore;
use jwt::{TokenCodec, TokenSettings};
use secrets::SigningSecrets;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Where user credentials are looked up
    pub store: Arc<dyn CredentialStore>,
    /// Independent secrets for the access and refresh signing contexts
    pub secrets: SigningSecrets,
    /// Token lifetimes and expiry leeway
    pub token_settings: TokenSettings,
    /// Time source for issuing and checking tokens
    pub clock: Arc<dyn Clock>,
}

/// Build the authenticator described by the configuration.
pub fn create_authenticator(config: &ServerConfig) -> Authenticator {
    let codec = Arc::new(TokenCodec::new(
        &config.secrets,
        config.token_settings,
        config.clock.clone(),
    ));
    Authenticator::new(codec, config.store.clone())
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    create_api_router(create_authenticator(config))
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
