//! Accepted operator credentials.
//!
//! Secrets are only ever held as argon2 PHC strings; a plain secret coming
//! from configuration is hashed when the set is built and then dropped.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to hash secret: {0}")]
    Hash(String),

    #[error("invalid secret hash for '{identifier}': {reason}")]
    InvalidHash { identifier: String, reason: String },
}

/// Hashes a secret with Argon2id and a fresh salt.
pub fn hash_secret(secret: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hash(e.to_string()))
}

/// Checks a secret against a PHC hash. Malformed hashes never verify.
pub fn verify_secret(secret: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Result of checking an (identifier, secret) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    Accepted,
    UnknownIdentifier,
    WrongSecret,
}

#[derive(Debug, Clone)]
struct Entry {
    identifier: String,
    hash: String,
}

/// The set of (identifier, secret) pairs allowed to log in.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    entries: Vec<Entry>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pair given its plain secret.
    pub fn with_secret(mut self, identifier: &str, secret: &str) -> Result<Self, CredentialError> {
        let hash = hash_secret(secret)?;
        self.entries.push(Entry {
            identifier: identifier.to_string(),
            hash,
        });
        Ok(self)
    }

    /// Adds a pair given an existing PHC hash.
    pub fn with_hash(mut self, identifier: &str, hash: &str) -> Result<Self, CredentialError> {
        PasswordHash::new(hash).map_err(|e| CredentialError::InvalidHash {
            identifier: identifier.to_string(),
            reason: e.to_string(),
        })?;
        self.entries.push(Entry {
            identifier: identifier.to_string(),
            hash: hash.to_string(),
        });
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Identifiers match exactly; secrets are verified against their hash.
    pub fn check(&self, identifier: &str, secret: &str) -> CredentialCheck {
        let mut known = false;
        for entry in self.entries.iter().filter(|e| e.identifier == identifier) {
            known = true;
            if verify_secret(secret, &entry.hash) {
                return CredentialCheck::Accepted;
            }
        }
        if known {
            CredentialCheck::WrongSecret
        } else {
            CredentialCheck::UnknownIdentifier
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_secret("AVANTE").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_secret("AVANTE", &hash));
        assert!(!verify_secret("avante", &hash));
        assert!(!verify_secret("AVANTE", "not-a-hash"));
    }

    #[test]
    fn test_check_distinguishes_failures() {
        let set = CredentialSet::new().with_secret("Sigma", "AVANTE").unwrap();
        assert_eq!(set.check("Sigma", "AVANTE"), CredentialCheck::Accepted);
        assert_eq!(set.check("Sigma", "wrong"), CredentialCheck::WrongSecret);
        assert_eq!(set.check("sigma", "AVANTE"), CredentialCheck::UnknownIdentifier);
        assert_eq!(set.check("", ""), CredentialCheck::UnknownIdentifier);
    }

    #[test]
    fn test_with_hash_accepts_existing_phc() {
        let hash = hash_secret("s3cret").unwrap();
        let set = CredentialSet::new().with_hash("ops", &hash).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.check("ops", "s3cret"), CredentialCheck::Accepted);
    }

    #[test]
    fn test_with_hash_rejects_garbage() {
        let result = CredentialSet::new().with_hash("ops", "plaintext");
        assert!(matches!(result, Err(CredentialError::InvalidHash { .. })));
    }

    #[test]
    fn test_same_identifier_multiple_secrets() {
        let set = CredentialSet::new()
            .with_secret("Sigma", "first")
            .unwrap()
            .with_secret("Sigma", "second")
            .unwrap();
        assert_eq!(set.check("Sigma", "second"), CredentialCheck::Accepted);
        assert_eq!(set.check("Sigma", "third"), CredentialCheck::WrongSecret);
    }

    #[test]
    fn test_empty_set_rejects_everyone() {
        let set = CredentialSet::new();
        assert!(set.is_empty());
        assert_eq!(set.check("Sigma", "AVANTE"), CredentialCheck::UnknownIdentifier);
    }
}
