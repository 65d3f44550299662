//! Bcrypt password verifiers.
//!
//! Only credential stores call into this module. Raw passwords never leave the
//! call that hashes or checks them.

use pwhash::bcrypt::{self, BcryptSetup, BcryptVariant};

/// Default bcrypt cost for new verifiers.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest cost bcrypt accepts. Tests use it to stay fast.
pub const MIN_BCRYPT_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_BCRYPT_COST: u32 = 31;

/// Phrase hashed into decoy verifiers. Its value is irrelevant.
const DECOY_PHRASE: &str = "tollgate-decoy-password";

/// Hash a password into a `$2b$` bcrypt verifier.
pub fn hash_password(plaintext: &str, cost: u32) -> Result<String, PasswordError> {
    let setup = BcryptSetup {
        salt: None,
        cost: Some(cost.clamp(MIN_BCRYPT_COST, MAX_BCRYPT_COST)),
        variant: Some(BcryptVariant::V2b),
    };
    bcrypt::hash_with(setup, plaintext).map_err(PasswordError::Hash)
}

/// Check a password against a verifier. Malformed verifiers never match.
pub fn verify_password(plaintext: &str, verifier: &str) -> bool {
    bcrypt::verify(plaintext, verifier)
}

/// A verifier for checks against users that do not exist, so that an unknown
/// username costs the same bcrypt work as a wrong password.
pub fn decoy_verifier(cost: u32) -> Result<String, PasswordError> {
    hash_password(DECOY_PHRASE, cost)
}

/// Errors from password hashing.
#[derive(Debug)]
pub enum PasswordError {
    Hash(pwhash::error::Error),
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Hash(e) => write!(f, "Failed to hash password: {}", e),
        }
    }
}

impl std::error::Error for PasswordError {}
