//! Password hashing behind a trait so tests can pick a cheap cost factor.

/// Credential service consumed by the identity workflow.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, CredentialError>;
    fn verify(&self, password: &str, digest: &str) -> Result<bool, CredentialError>;
}

#[derive(Debug, thiserror::Error)]
#[error("credential hashing failed: {0}")]
pub struct CredentialError(#[from] bcrypt::BcryptError);

/// bcrypt-backed hasher.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(bcrypt::hash(password, self.cost)?)
    }

    fn verify(&self, password: &str, digest: &str) -> Result<bool, CredentialError> {
        Ok(bcrypt::verify(password, digest)?)
    }
}
