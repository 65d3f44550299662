//! Signing secret provisioning.
//!
//! Access and refresh tokens are signed with two independent secrets. A token
//! minted under one secret never verifies under the other, so a leaked refresh
//! key cannot forge access tokens and a refresh token cannot be replayed as an
//! access token.

use tracing::error;

/// Minimum secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Environment variable holding the access token secret.
pub const ACCESS_SECRET_ENV: &str = "ACCESS_TOKEN_SECRET";

/// Environment variable holding the refresh token secret.
pub const REFRESH_SECRET_ENV: &str = "REFRESH_TOKEN_SECRET";

/// The two signing secrets, validated at startup.
#[derive(Clone)]
pub struct SigningSecrets {
    access: Vec<u8>,
    refresh: Vec<u8>,
}

impl SigningSecrets {
    pub fn new(
        access: impl Into<Vec<u8>>,
        refresh: impl Into<Vec<u8>>,
    ) -> Result<Self, ConfigError> {
        let access = access.into();
        let refresh = refresh.into();

        check_secret("access", &access)?;
        check_secret("refresh", &refresh)?;

        if access == refresh {
            return Err(ConfigError::SharedSecret);
        }

        Ok(Self { access, refresh })
    }

    pub fn access(&self) -> &[u8] {
        &self.access
    }

    pub fn refresh(&self) -> &[u8] {
        &self.refresh
    }
}

impl std::fmt::Debug for SigningSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningSecrets")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

fn check_secret(context: &'static str, secret: &[u8]) -> Result<(), ConfigError> {
    if secret.is_empty() {
        return Err(ConfigError::MissingSecret(context));
    }
    if secret.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::ShortSecret(context));
    }
    Ok(())
}

/// Load a secret from an environment variable or a file.
/// Returns None and logs an error if the secret cannot be loaded.
pub fn load_secret(env_var: &str, secret_file: Option<&str>) -> Option<String> {
    if let Ok(secret) = std::env::var(env_var) {
        // Clear the environment variable to prevent leaking
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(env_var) };
        return Some(secret);
    }

    let Some(path) = secret_file else {
        error!(
            variable = %env_var,
            "Signing secret is required. Set {} (recommended) or pass a secret file",
            env_var
        );
        return None;
    };

    match std::fs::read_to_string(path) {
        Ok(content) => Some(content.trim().to_string()),
        Err(e) => {
            error!(path = %path, error = %e, "Failed to read secret file");
            None
        }
    }
}

/// Fatal configuration problems detected at startup.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A secret is empty
    MissingSecret(&'static str),
    /// A secret is shorter than `MIN_SECRET_LENGTH`
    ShortSecret(&'static str),
    /// Access and refresh secrets are identical
    SharedSecret,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingSecret(ctx) => write!(f, "The {} token secret is empty", ctx),
            ConfigError::ShortSecret(ctx) => write!(
                f,
                "The {} token secret is shorter than {} bytes",
                ctx, MIN_SECRET_LENGTH
            ),
            ConfigError::SharedSecret => {
                write!(f, "Access and refresh token secrets must be different")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
