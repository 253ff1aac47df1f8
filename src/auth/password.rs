//! Password hashing

use crate::error::Result;

pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;
pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

/// One-way password hashing
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password with a fresh salt
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash.
    /// A malformed hash never matches.
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}

/// bcrypt-backed hasher
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!(error = %e, "Stored password hash could not be parsed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> BcryptHasher {
        BcryptHasher::new(MIN_COST)
    }

    #[test]
    fn test_hash_and_verify() {
        let h = hasher();
        let hash = h.hash("correct horse").unwrap();
        assert!(h.verify("correct horse", &hash));
        assert!(!h.verify("wrong horse", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let h = hasher();
        let a = h.hash("same password").unwrap();
        let b = h.hash("same password").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("same password", &a));
        assert!(h.verify("same password", &b));
    }

    #[test]
    fn test_malformed_hash_fails_closed() {
        let h = hasher();
        assert!(!h.verify("anything", ""));
        assert!(!h.verify("anything", "not-a-hash"));
        assert!(!h.verify("anything", "$2b$12$tooshort"));
    }

    #[test]
    fn test_default_cost() {
        assert_eq!(BcryptHasher::default().cost(), 12);
        assert_eq!(BcryptHasher::new(1).cost(), MIN_COST);
    }

    #[test]
    fn test_hash_encodes_cost() {
        let hash = hasher().hash("pw").unwrap();
        assert!(hash.starts_with("$2b$04$"));
    }
}
