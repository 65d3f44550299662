//! Login, refresh and authorization.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::credentials::CredentialStore;
use crate::jwt::{JwtError, Subject, TokenCodec, subject_claims};

/// Token type label returned with every pair.
pub const BEARER: &str = "bearer";

/// Tokens handed to the caller after login or refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Authentication outcome errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user, wrong password or invalid token. Never says which.
    Failure,
    /// The credential store or token encoder failed.
    Internal,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Failure => write!(f, "Authentication failed"),
            AuthError::Internal => write!(f, "Internal authentication error"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Drives the credential store and token codec. Holds no mutable state.
#[derive(Clone)]
pub struct Authenticator {
    codec: Arc<TokenCodec>,
    store: Arc<dyn CredentialStore>,
}

impl Authenticator {
    pub fn new(codec: Arc<TokenCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Check a username and password and issue a fresh token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let record = self.store.find(username).await.map_err(|e| {
            error!(error = %e, "Failed to look up credentials");
            AuthError::Internal
        })?;

        // Unknown users are checked against the decoy so both paths cost one bcrypt run.
        let verifier = match &record {
            Some(record) => record.verifier.clone(),
            None => self.store.decoy_verifier().to_string(),
        };

        let store = self.store.clone();
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || store.verify(&password, &verifier))
            .await
            .map_err(|e| {
                error!(error = %e, "Password check task failed");
                AuthError::Internal
            })?;

        match record {
            Some(record) if matched => {
                info!(username = %record.username, "Login succeeded");
                self.issue_pair(&record.username)
            }
            _ => {
                debug!("Login rejected");
                Err(AuthError::Failure)
            }
        }
    }

    /// Exchange a refresh token for a brand-new pair.
    /// The presented refresh token stays valid until it expires.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let subject = self
            .codec
            .verify_refresh(refresh_token)
            .map_err(|_| AuthError::Failure)?;

        debug!(username = %subject, "Refreshing token pair");
        self.issue_pair(subject.as_str())
    }

    /// Recover the caller identity from an access token.
    pub fn authorize(&self, access_token: &str) -> Result<Subject, AuthError> {
        self.codec
            .verify_access(access_token)
            .map_err(|_| AuthError::Failure)
    }

    fn issue_pair(&self, subject: &str) -> Result<TokenPair, AuthError> {
        let claims = subject_claims(subject);

        let issue_err = |e: JwtError| {
            error!(error = %e, "Failed to issue token");
            AuthError::Internal
        };

        Ok(TokenPair {
            access_token: self.codec.issue_access(&claims).map_err(issue_err)?,
            refresh_token: self.codec.issue_refresh(&claims).map_err(issue_err)?,
            token_type: BEARER.to_string(),
        })
    }
}
