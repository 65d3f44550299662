//! JWT token generation and validation.
//!
//! Two signing contexts share one algorithm (HS256) but never share a key:
//! - Access tokens: short-lived (15 minutes by default)
//! - Refresh tokens: long-lived (7 days by default)
//!
//! Tokens carry no type marker. An access token fails refresh verification
//! only because its signature was made with the other secret.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;
use crate::secrets::SigningSecrets;

/// Claims supplied by the caller at issuance time.
pub type ClaimsSet = Map<String, Value>;

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_DURATION_SECS: i64 = 15 * 60;

/// Refresh token duration: 7 days
pub const REFRESH_TOKEN_DURATION_SECS: i64 = 7 * 24 * 60 * 60;

/// Which trust domain a signing context belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Lifetimes and clock tolerance for issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Default access token lifetime in seconds
    pub access_ttl_secs: i64,
    /// Default refresh token lifetime in seconds
    pub refresh_ttl_secs: i64,
    /// Seconds past `exp` during which a token is still accepted
    pub leeway_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl_secs: ACCESS_TOKEN_DURATION_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_DURATION_SECS,
            leeway_secs: 0,
        }
    }
}

/// Identity recovered from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject(String);

impl Subject {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The only verification failure. Malformed, forged, expired and subject-less
/// tokens are deliberately indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invalid;

impl std::fmt::Display for Invalid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid token")
    }
}

impl std::error::Error for Invalid {}

/// Build a claims set holding only a subject.
pub fn subject_claims(sub: &str) -> ClaimsSet {
    let mut claims = ClaimsSet::new();
    claims.insert("sub".to_string(), Value::from(sub));
    claims
}

/// The subset of claims verification relies on.
#[derive(Deserialize)]
struct VerifiedClaims {
    sub: String,
    exp: u64,
}

/// Keys and validation rules for one trust domain.
#[derive(Clone)]
struct SigningContext {
    token_type: TokenType,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl SigningContext {
    fn new(token_type: TokenType, secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock instead.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            token_type,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    fn sign(&self, claims: &ClaimsSet) -> Result<String, JwtError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(JwtError::Encoding)
    }

    fn decode(&self, token: &str) -> Result<VerifiedClaims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<VerifiedClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
    }
}

/// Issues and verifies access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access: SigningContext,
    refresh: SigningContext,
    settings: TokenSettings,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(secrets: &SigningSecrets, settings: TokenSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            access: SigningContext::new(TokenType::Access, secrets.access()),
            refresh: SigningContext::new(TokenType::Refresh, secrets.refresh()),
            settings,
            clock,
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Issue an access token with the configured default lifetime.
    pub fn issue_access(&self, claims: &ClaimsSet) -> Result<String, JwtError> {
        self.issue_access_with_ttl(claims, self.settings.access_ttl_secs)
    }

    /// Issue an access token that expires `ttl_secs` from now.
    pub fn issue_access_with_ttl(
        &self,
        claims: &ClaimsSet,
        ttl_secs: i64,
    ) -> Result<String, JwtError> {
        self.issue(&self.access, claims, ttl_secs)
    }

    /// Issue a refresh token with the configured default lifetime.
    pub fn issue_refresh(&self, claims: &ClaimsSet) -> Result<String, JwtError> {
        self.issue_refresh_with_ttl(claims, self.settings.refresh_ttl_secs)
    }

    /// Issue a refresh token that expires `ttl_secs` from now.
    pub fn issue_refresh_with_ttl(
        &self,
        claims: &ClaimsSet,
        ttl_secs: i64,
    ) -> Result<String, JwtError> {
        self.issue(&self.refresh, claims, ttl_secs)
    }

    /// Verify an access token and return its subject.
    pub fn verify_access(&self, token: &str) -> Result<Subject, Invalid> {
        self.verify(&self.access, token)
    }

    /// Verify a refresh token and return its subject.
    pub fn verify_refresh(&self, token: &str) -> Result<Subject, Invalid> {
        self.verify(&self.refresh, token)
    }

    fn issue(
        &self,
        context: &SigningContext,
        claims: &ClaimsSet,
        ttl_secs: i64,
    ) -> Result<String, JwtError> {
        let now = self.clock.now();

        // Caller-supplied exp/iat are always overwritten.
        let mut claims = claims.clone();
        claims.insert("iat".to_string(), Value::from(now));
        claims.insert(
            "exp".to_string(),
            Value::from(now.saturating_add_signed(ttl_secs)),
        );

        context.sign(&claims)
    }

    fn verify(&self, context: &SigningContext, token: &str) -> Result<Subject, Invalid> {
        let token_type = context.token_type.as_str();

        let claims = context.decode(token).map_err(|e| {
            debug!(token_type, error = %e, "Token rejected");
            Invalid
        })?;

        if claims.sub.is_empty() {
            debug!(token_type, "Token has an empty subject");
            return Err(Invalid);
        }

        if claims.exp.saturating_add(self.settings.leeway_secs) <= self.clock.now() {
            debug!(token_type, exp = claims.exp, "Token expired");
            return Err(Invalid);
        }

        Ok(Subject(claims.sub))
    }
}

/// Errors that can occur while issuing a token.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
        }
    }
}

impl std::error::Error for JwtError {}
