//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::clock::SystemClock;
use crate::db::Database;
use crate::jwt::{ACCESS_TOKEN_DURATION_SECS, REFRESH_TOKEN_DURATION_SECS, TokenSettings};
use crate::password::{DEFAULT_BCRYPT_COST, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
use crate::secrets::{ACCESS_SECRET_ENV, REFRESH_SECRET_ENV, SigningSecrets, load_secret};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

/// Environment variable holding the password for `--create-user`.
pub const NEW_USER_PASSWORD_ENV: &str = "NEW_USER_PASSWORD";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "Tollgate",
    about = "Password login with signed access and refresh tokens"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "TOLLGATE_PORT")]
    pub port: u16,

    /// Path to SQLite database file holding user credentials
    #[arg(short, long, default_value = "tollgate.db", env = "TOLLGATE_DATABASE")]
    pub database: String,

    /// Path to file containing the access token secret. Prefer ACCESS_TOKEN_SECRET env var instead
    #[arg(long)]
    pub access_secret_file: Option<String>,

    /// Path to file containing the refresh token secret. Prefer REFRESH_TOKEN_SECRET env var instead
    #[arg(long)]
    pub refresh_secret_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = ACCESS_TOKEN_DURATION_SECS,
        value_parser = clap::value_parser!(i64).range(1..))]
    pub access_ttl: i64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = REFRESH_TOKEN_DURATION_SECS,
        value_parser = clap::value_parser!(i64).range(1..))]
    pub refresh_ttl: i64,

    /// Seconds an expired token is still accepted, to absorb clock skew
    #[arg(long, default_value_t = 0)]
    pub leeway: u64,

    /// Bcrypt cost for newly stored passwords
    #[arg(long, default_value_t = DEFAULT_BCRYPT_COST,
        value_parser = clap::value_parser!(u32)
            .range(MIN_BCRYPT_COST as i64..=MAX_BCRYPT_COST as i64))]
    pub bcrypt_cost: u32,

    /// Create (or reset the password of) a user on startup.
    /// The password is read from the NEW_USER_PASSWORD env var
    #[arg(long, value_name = "USERNAME", value_parser = validate_username)]
    pub create_user: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn validate_username(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Username cannot be empty".to_string());
    }

    if s.len() > 64 {
        return Err("Username cannot be longer than 64 characters".to_string());
    }

    if s.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return Err(format!("Username contains invalid characters: {}", s));
    }

    Ok(s.to_string())
}

impl Args {
    /// Token lifetimes and leeway from the parsed arguments.
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_ttl_secs: self.access_ttl,
            refresh_ttl_secs: self.refresh_ttl,
            leeway_secs: self.leeway,
        }
    }
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load and validate both signing secrets.
/// Returns None and logs an error if either secret is missing or unusable.
pub fn load_signing_secrets(
    access_secret_file: Option<&str>,
    refresh_secret_file: Option<&str>,
) -> Option<SigningSecrets> {
    let access = load_secret(ACCESS_SECRET_ENV, access_secret_file)?;
    let refresh = load_secret(REFRESH_SECRET_ENV, refresh_secret_file)?;

    match SigningSecrets::new(access, refresh) {
        Ok(secrets) => Some(secrets),
        Err(e) => {
            error!(error = %e, "Invalid signing secrets");
            None
        }
    }
}

/// Handle the --create-user flag: create the user, or reset the password if it exists.
/// Returns false and logs an error on failure.
pub async fn handle_create_user(db: &Database, username: &str) -> bool {
    let Ok(password) = std::env::var(NEW_USER_PASSWORD_ENV) else {
        error!(
            "Password is required for --create-user. Set the {} environment variable",
            NEW_USER_PASSWORD_ENV
        );
        return false;
    };
    // SAFETY: We're single-threaded at this point during startup,
    // and no other code is reading this environment variable.
    unsafe { std::env::remove_var(NEW_USER_PASSWORD_ENV) };

    if password.is_empty() {
        error!("Password for --create-user cannot be empty");
        return false;
    }

    let existing = match db.users().get_by_username(username).await {
        Ok(existing) => existing,
        Err(e) => {
            error!(error = %e, "Failed to check for existing user");
            return false;
        }
    };

    let result = match existing {
        Some(_) => db.users().set_password(username, &password).await.map(|_| ()),
        None => db.users().create(username, &password).await.map(|_| ()),
    };

    match result {
        Ok(()) => {
            info!(username = %username, "User credentials stored");
            true
        }
        Err(e) => {
            error!(username = %username, error = %e, "Failed to store user");
            false
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    secrets: SigningSecrets,
    token_settings: TokenSettings,
) -> ServerConfig {
    ServerConfig {
        store: Arc::new(db),
        secrets,
        token_settings,
        clock: Arc::new(SystemClock),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str, bcrypt_cost: u32) -> Option<Database> {
    match Database::open(path, bcrypt_cost).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}
