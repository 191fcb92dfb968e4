//! bcrypt credential verifier

use ledger_core::{CredentialVerifier, LedgerError, Result};

/// bcrypt-backed [`CredentialVerifier`]
#[derive(Debug, Clone, Copy)]
pub struct BcryptVerifier {
    cost: u32,
}

impl Default for BcryptVerifier {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl BcryptVerifier {
    /// Verifier with a custom work factor (tests use the minimum)
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }
}

impl CredentialVerifier for BcryptVerifier {
    fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost).map_err(|e| LedgerError::Credential(e.to_string()))
    }

    fn verify_password(&self, password: &str, credential: &str) -> Result<bool> {
        match bcrypt::verify(password, credential) {
            Ok(matches) => Ok(matches),
            Err(e) => {
                tracing::debug!(error = %e, "Stored credential is not a bcrypt hash");
                Ok(false)
            }
        }
    }
}
