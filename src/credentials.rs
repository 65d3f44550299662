//! Credential store capability and an in-memory implementation.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::password::{self, PasswordError};

/// A user's stored credentials. The verifier is a one-way hash, never the password.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub username: String,
    pub verifier: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("verifier", &"<redacted>")
            .finish()
    }
}

/// Lookup and verification of user credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find the record for a username.
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// Verifier checked when a username is unknown, so both failure paths do the same work.
    fn decoy_verifier(&self) -> &str;

    /// Check a password against a verifier. This is CPU-bound.
    fn verify(&self, plaintext: &str, verifier: &str) -> bool {
        password::verify_password(plaintext, verifier)
    }

    /// Look up a user and check their password in one call.
    async fn check(&self, username: &str, plaintext: &str) -> Result<bool, StoreError> {
        match self.find(username).await? {
            Some(record) => Ok(self.verify(plaintext, &record.verifier)),
            None => {
                self.verify(plaintext, self.decoy_verifier());
                Ok(false)
            }
        }
    }
}

/// Credential store kept entirely in memory.
pub struct MemoryCredentialStore {
    users: HashMap<String, CredentialRecord>,
    cost: u32,
    decoy: String,
}

impl MemoryCredentialStore {
    /// Create an empty store hashing new passwords at the given bcrypt cost.
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        Ok(Self {
            users: HashMap::new(),
            cost,
            decoy: password::decoy_verifier(cost)?,
        })
    }

    /// Add a user, hashing the password. Replaces any existing user with that name.
    pub fn with_user(mut self, username: &str, plaintext: &str) -> Result<Self, PasswordError> {
        self.insert(username, plaintext)?;
        Ok(self)
    }

    /// Add or replace a user.
    pub fn insert(&mut self, username: &str, plaintext: &str) -> Result<(), PasswordError> {
        let verifier = password::hash_password(plaintext, self.cost)?;
        self.users.insert(
            username.to_string(),
            CredentialRecord {
                username: username.to_string(),
                verifier,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.users.get(username).cloned())
    }

    fn decoy_verifier(&self) -> &str {
        &self.decoy
    }
}

/// Errors from a credential store backend.
#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Password(PasswordError),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::Password(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

impl From<PasswordError> for StoreError {
    fn from(e: PasswordError) -> Self {
        StoreError::Password(e)
    }
}
