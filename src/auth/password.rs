use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// bcrypt hashing with a fixed cost and a dummy digest for unknown accounts
pub struct PasswordHasher {
    cost: u32,
    dummy_hash: String,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Result<Self, PasswordError> {
        // Verified against when the account does not exist, so both failure paths do the same work
        let dummy_hash = bcrypt::hash("bookshelf-dummy-password", cost)?;
        Ok(Self { cost, dummy_hash })
    }

    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        Ok(bcrypt::verify(password, hash)?)
    }

    /// Burn one verification against the dummy digest. Always false.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = bcrypt::verify(password, &self.dummy_hash);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = PasswordHasher::new(4).unwrap();
        let digest = hasher.hash("hunter2").unwrap();

        assert_ne!(digest, "hunter2");
        assert!(digest.starts_with("$2"));
        assert!(hasher.verify("hunter2", &digest).unwrap());
        assert!(!hasher.verify("hunter3", &digest).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn dummy_never_matches() {
        let hasher = PasswordHasher::new(4).unwrap();
        assert!(!hasher.verify_dummy("bookshelf-dummy-password"));
    }

    #[test]
    fn invalid_cost_rejected() {
        assert!(PasswordHasher::new(2).is_err());
    }
}
